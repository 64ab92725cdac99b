use std::fmt;
use std::str::FromStr;

use devnet_mint_core::Commitment;
use thiserror::Error;

const ENV_PREFIX: &str = "DEVNET_MINT_";

pub const DEFAULT_INSTALL_URL: &str = "https://phantom.app/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeProfile {
    /// Deterministic fallbacks stand in for a missing wallet or RPC runtime.
    #[default]
    Development,
    /// Real wallet and RPC runtimes are required.
    Production,
}

impl FromStr for RuntimeProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown runtime profile: {other}")),
        }
    }
}

/// Public clusters the page can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
}

impl Cluster {
    pub fn endpoint(self) -> &'static str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Localnet => "localnet",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "mainnet-beta" | "mainnet" => Ok(Cluster::MainnetBeta),
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            other => Err(format!("unknown cluster: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MintAdapterConfig {
    pub runtime_profile: RuntimeProfile,
    pub cluster: Cluster,
    /// Overrides the cluster endpoint when set.
    pub rpc_url: Option<String>,
    pub rpc_http_enabled: bool,
    pub rpc_timeout_ms: u64,
    pub commitment: Commitment,
    pub confirm_poll_interval_ms: u64,
    pub confirm_max_attempts: u32,
    pub install_url: String,
    /// Whether the deterministic wallet treats this origin as already approved.
    pub trusted_origin: bool,
}

impl Default for MintAdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            cluster: Cluster::Devnet,
            rpc_url: None,
            rpc_http_enabled: cfg!(target_arch = "wasm32"),
            rpc_timeout_ms: 15_000,
            commitment: Commitment::Confirmed,
            confirm_poll_interval_ms: 1_000,
            confirm_max_attempts: 60,
            install_url: DEFAULT_INSTALL_URL.to_owned(),
            trusted_origin: false,
        }
    }
}

impl MintAdapterConfig {
    /// Reads `DEVNET_MINT_*` variables. The browser has no environment and
    /// always gets the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        #[cfg(target_arch = "wasm32")]
        {
            Ok(Self::default())
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::from_lookup(|key| std::env::var(key).ok())
        }
    }

    /// Builds a config from a key lookup. The lookup receives full variable
    /// names, e.g. `DEVNET_MINT_CLUSTER`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let mut cfg = Self::default();

        if let Some(v) = get("PROFILE") {
            cfg.runtime_profile = parse_value("PROFILE", &v)?;
        }
        if let Some(v) = get("CLUSTER") {
            cfg.cluster = parse_value("CLUSTER", &v)?;
        }
        if let Some(v) = get("RPC_URL") {
            cfg.rpc_url = Some(v);
            cfg.rpc_http_enabled = true;
        }
        if let Some(v) = get("RPC_HTTP") {
            cfg.rpc_http_enabled = parse_bool("RPC_HTTP", &v)?;
        }
        if let Some(v) = get("RPC_TIMEOUT_MS") {
            cfg.rpc_timeout_ms = parse_value("RPC_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("COMMITMENT") {
            cfg.commitment = parse_value("COMMITMENT", &v)?;
        }
        if let Some(v) = get("CONFIRM_POLL_MS") {
            cfg.confirm_poll_interval_ms = parse_value("CONFIRM_POLL_MS", &v)?;
        }
        if let Some(v) = get("CONFIRM_MAX_ATTEMPTS") {
            cfg.confirm_max_attempts = parse_value("CONFIRM_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = get("INSTALL_URL") {
            cfg.install_url = v;
        }
        if let Some(v) = get("TRUSTED_ORIGIN") {
            cfg.trusted_origin = parse_bool("TRUSTED_ORIGIN", &v)?;
        }
        Ok(cfg)
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn rpc_endpoint(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.cluster.endpoint())
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: format!("{ENV_PREFIX}{name}"),
        reason: e.to_string(),
    })
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            key: format!("{ENV_PREFIX}{name}"),
            reason: format!("expected boolean, got {other}"),
        }),
    }
}
