//! Main application state and update loop

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use devnet_mint_adapters::MintAdapterConfig;

use crate::bridge::{MintAction, MintBridge, DEFAULT_SIGN_MESSAGE};
use crate::ui;

/// Wallet notifications arrive outside egui's input loop; poll at this pace.
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Outcome of the one-shot provider lookup.
pub enum Session {
    NoProvider,
    Ready(MintBridge),
}

/// The main application state
pub struct App {
    session: Session,
    config: MintAdapterConfig,
    /// Actions still running off the UI thread
    in_flight: Arc<AtomicUsize>,
    /// Text submitted by "Sign message"
    message: String,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, config: MintAdapterConfig) -> Self {
        let session = match MintBridge::bootstrap(&config) {
            Some(bridge) => Session::Ready(bridge),
            None => Session::NoProvider,
        };
        let app = Self {
            session,
            config,
            in_flight: Arc::new(AtomicUsize::new(0)),
            message: DEFAULT_SIGN_MESSAGE.to_owned(),
        };
        app.spawn_action(&cc.egui_ctx, MintAction::Mount);
        app
    }

    /// Runs `action` off the UI thread and repaints when it settles.
    fn spawn_action(&self, ctx: &egui::Context, action: MintAction) {
        let Session::Ready(bridge) = &self.session else {
            return;
        };
        let bridge = bridge.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let ctx = ctx.clone();
        in_flight.fetch_add(1, Ordering::SeqCst);

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                bridge.run(action).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                ctx.request_repaint();
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            std::thread::spawn(move || {
                match tokio::runtime::Runtime::new() {
                    Ok(rt) => rt.block_on(bridge.run(action)),
                    Err(e) => tracing::error!(error = %e, action = action.label(), "failed to start runtime"),
                }
                in_flight.fetch_sub(1, Ordering::SeqCst);
                ctx.request_repaint();
            });
        }
    }

    fn busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        if let Session::Ready(bridge) = &self.session {
            bridge.poll_events();
            ctx.request_repaint_after(EVENT_POLL_INTERVAL);
        }

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(ui::footer_text(
                    self.config.cluster.name(),
                    self.config.rpc_endpoint(),
                    env!("GIT_HASH"),
                    env!("BUILD_TIME"),
                ))
                .small()
                .weak(),
            );
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                ui::styled_heading(ui, "Dev Net Mint Page");
                ui.add_space(10.0);
                let bridge = match &self.session {
                    Session::Ready(bridge) => Some(bridge.clone()),
                    Session::NoProvider => None,
                };
                match bridge {
                    Some(bridge) => self.render_wallet(ui, ctx, &bridge),
                    None => self.render_no_provider(ui),
                }
                ui.add_space(20.0);
            });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let Session::Ready(bridge) = &self.session else {
            return;
        };
        tracing::info!("tearing down wallet session");

        #[cfg(target_arch = "wasm32")]
        {
            let bridge = bridge.clone();
            wasm_bindgen_futures::spawn_local(async move {
                bridge.run(MintAction::Teardown).await;
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(bridge.run(MintAction::Teardown)),
            Err(e) => tracing::warn!(error = %e, "teardown skipped"),
        }
    }
}

impl App {
    fn render_no_provider(&self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Could not find a provider").size(18.0).strong());
        ui.add_space(6.0);
        ui.hyperlink_to("Install Phantom", &self.config.install_url);
    }

    fn render_wallet(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, bridge: &MintBridge) {
        let state = bridge.state();

        match bridge.public_key() {
            Some(key) => {
                let address = key.to_string();
                if ui::labeled_field_with_copy(ui, "Wallet address", &address) {
                    ui::copy_to_clipboard(&address);
                }
                ui::labeled_value(
                    ui,
                    "isConnected",
                    if bridge.provider_connected() { "true" } else { "false" },
                );
                ui.add_space(8.0);

                ui.horizontal_wrapped(|ui| {
                    if ui.button("Mint").clicked() {
                        self.spawn_action(ctx, MintAction::Mint);
                    }
                    if ui.button("Sign two transactions").clicked() {
                        self.spawn_action(ctx, MintAction::SignBatch { only_first: false });
                    }
                    if ui.button("Sign first only").clicked() {
                        self.spawn_action(ctx, MintAction::SignBatch { only_first: true });
                    }
                    if ui.button("Disconnect").clicked() {
                        self.spawn_action(ctx, MintAction::Disconnect);
                    }
                });

                ui::section_header(ui, "Message");
                ui.add(
                    egui::TextEdit::multiline(&mut self.message)
                        .desired_rows(2)
                        .desired_width(f32::INFINITY)
                        .font(egui::TextStyle::Monospace),
                );
                let can_sign = !self.message.trim().is_empty();
                if ui
                    .add_enabled(can_sign, egui::Button::new("Sign message"))
                    .clicked()
                {
                    self.spawn_action(ctx, MintAction::SignMessage(self.message.clone()));
                }
            }
            None => {
                if ui.button("Connect to Phantom").clicked() {
                    self.spawn_action(ctx, MintAction::Connect);
                }
            }
        }

        ui::section_header(ui, "Activity");
        ui.horizontal(|ui| {
            ui.label(if state.connected { "Connected" } else { "Not connected" });
            if self.busy() {
                ui.spinner();
            }
        });
        ui.add_space(4.0);
        ui::log_view(ui, &state.logs);
    }
}
