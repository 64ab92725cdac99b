//! devnet-mint: a wallet-connected mint page for Solana devnet

#[cfg(not(target_arch = "wasm32"))]
use eframe::egui;

mod app;
mod bridge;
mod ui;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = devnet_mint_adapters::MintAdapterConfig::from_env()?;
    tracing::info!(
        cluster = %config.cluster,
        endpoint = config.rpc_endpoint(),
        profile = ?config.runtime_profile,
        "Starting devnet-mint"
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Dev Net Mint Page")
            .with_inner_size([760.0, 620.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        "devnet-mint",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::App::new(cc, config)))),
    )
    .map_err(|e| eyre::eyre!("ui event loop failed: {e}"))
}

#[cfg(target_arch = "wasm32")]
fn main() {
    use wasm_bindgen::JsCast;

    tracing_wasm::set_as_global_default();
    let config = devnet_mint_adapters::MintAdapterConfig::from_env().unwrap_or_default();

    wasm_bindgen_futures::spawn_local(async move {
        let canvas = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("mint_canvas"))
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok());
        let Some(canvas) = canvas else {
            tracing::error!("canvas #mint_canvas not found");
            return;
        };
        let started = eframe::WebRunner::new()
            .start(
                canvas,
                eframe::WebOptions::default(),
                Box::new(move |cc| Ok(Box::new(app::App::new(cc, config)))),
            )
            .await;
        if let Err(e) = started {
            tracing::error!(error = ?e, "failed to start app");
        }
    });
}
