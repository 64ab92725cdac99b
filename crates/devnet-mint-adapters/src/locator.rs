use std::fmt;

use devnet_mint_core::ProviderLocator;

use crate::{MintAdapterConfig, PhantomAdapter};

/// Finds the injected Phantom provider, or sends the user to install it.
#[derive(Clone)]
pub struct PhantomLocator {
    config: MintAdapterConfig,
    opener: fn(&str),
}

impl PhantomLocator {
    pub fn new(config: MintAdapterConfig) -> Self {
        Self::with_opener(config, open_url_new_tab)
    }

    /// Swaps how the install page is opened.
    pub fn with_opener(config: MintAdapterConfig, opener: fn(&str)) -> Self {
        Self { config, opener }
    }

    fn open_install_page(&self) {
        tracing::info!(url = %self.config.install_url, "wallet provider missing, opening install page");
        (self.opener)(&self.config.install_url);
    }
}

impl fmt::Debug for PhantomLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhantomLocator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProviderLocator for PhantomLocator {
    type Provider = PhantomAdapter;

    #[cfg(target_arch = "wasm32")]
    fn locate(&self) -> Option<PhantomAdapter> {
        if crate::phantom::browser::available() {
            return Some(PhantomAdapter::browser());
        }
        self.open_install_page();
        None
    }

    /// Desktop builds have nothing injected; the development profile gets the
    /// in-process wallet instead.
    #[cfg(not(target_arch = "wasm32"))]
    fn locate(&self) -> Option<PhantomAdapter> {
        if self.config.strict_runtime_required() {
            self.open_install_page();
            return None;
        }
        Some(PhantomAdapter::deterministic(&self.config))
    }
}

#[cfg(target_arch = "wasm32")]
pub fn open_url_new_tab(url: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.open_with_url_and_target(url, "_blank");
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn open_url_new_tab(url: &str) {
    if let Err(e) = open::that(url) {
        tracing::warn!(url, error = %e, "failed to open browser");
    }
}
