pub mod config;
pub mod locator;
pub mod phantom;
pub mod rpc;

pub use config::{Cluster, ConfigError, MintAdapterConfig, RuntimeProfile, DEFAULT_INSTALL_URL};
pub use locator::{open_url_new_tab, PhantomLocator};
pub use phantom::PhantomAdapter;
pub use rpc::SolanaRpcAdapter;
