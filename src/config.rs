//! Engine configuration
//!
//! Loaded from TOML, with `.env` support and environment overrides for the
//! values that differ per deployment (`TXFLOW_RPC_URL`, `TXFLOW_KEYPAIR_PATH`).

use crate::amount::{to_raw_amount, SOL_DECIMALS};
use crate::broadcast::ConfirmConfig;
use crate::registry::{ProgramRegistry, RegistryOverrides};
use crate::tx_builder::{FeeParams, DEFAULT_COMPUTE_UNIT_LIMIT};
use crate::wallet::WalletManager;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

pub const ENV_RPC_URL: &str = "TXFLOW_RPC_URL";
pub const ENV_KEYPAIR_PATH: &str = "TXFLOW_KEYPAIR_PATH";

/// Upper bound the runtime accepts for a transaction's compute unit limit
pub const MAX_COMPUTE_UNIT_LIMIT: u32 = 1_400_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub confirm: ConfirmSettings,

    #[serde(default)]
    pub fees: FeeConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub wallet: WalletConfig,

    /// Program id overrides for non-mainnet clusters
    #[serde(default)]
    pub registry: RegistryOverrides,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Endpoint used for blockhashes, submissions and polling
    #[serde(default = "default_rpc_url")]
    pub primary_url: String,

    /// Extra endpoints that get one fire-and-forget copy
    #[serde(default)]
    pub broadcast_urls: Vec<String>,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_true")]
    pub skip_preflight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmSettings {
    #[serde(default = "default_confirm_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_stale_backoff")]
    pub stale_blockhash_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Default price in micro-lamports per compute unit (0 = no budget instructions)
    #[serde(default)]
    pub compute_unit_price_micro_lamports: u64,

    #[serde(default = "default_compute_unit_limit")]
    pub compute_unit_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Relay submission endpoint; relay mode is off when unset
    #[serde(default)]
    pub url: Option<String>,

    /// Account receiving the relay tip
    #[serde(default)]
    pub tip_account: Option<String>,

    /// Tip in SOL, e.g. "0.0001"
    #[serde(default = "default_tip_amount")]
    pub tip_amount_sol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,
}

// Default value functions
fn default_rpc_url() -> String { "https://api.mainnet-beta.solana.com".to_string() }
fn default_rpc_timeout() -> u64 { 30 }
fn default_true() -> bool { true }
fn default_confirm_timeout() -> u64 { 90 }
fn default_poll_interval() -> u64 { 2_000 }
fn default_stale_backoff() -> u64 { 500 }
fn default_compute_unit_limit() -> u32 { DEFAULT_COMPUTE_UNIT_LIMIT }
fn default_tip_amount() -> String { "0.0001".to_string() }
fn default_keypair_path() -> String { "~/.config/solana/id.json".to_string() }

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            primary_url: default_rpc_url(),
            broadcast_urls: Vec::new(),
            timeout_secs: default_rpc_timeout(),
            skip_preflight: default_true(),
        }
    }
}

impl Default for ConfirmSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_confirm_timeout(),
            poll_interval_ms: default_poll_interval(),
            stale_blockhash_backoff_ms: default_stale_backoff(),
        }
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            compute_unit_price_micro_lamports: 0,
            compute_unit_limit: default_compute_unit_limit(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: None,
            tip_account: None,
            tip_amount_sol: default_tip_amount(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keypair_path: default_keypair_path(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration, then apply `.env` and process environment overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_RPC_URL).filter(|v| !v.is_empty()) {
            self.rpc.primary_url = url;
        }
        if let Some(path) = lookup(ENV_KEYPAIR_PATH).filter(|v| !v.is_empty()) {
            self.wallet.keypair_path = path;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        validate_url("rpc.primary_url", &self.rpc.primary_url)?;
        for url in &self.rpc.broadcast_urls {
            validate_url("rpc.broadcast_urls", url)?;
        }
        if self.rpc.timeout_secs == 0 {
            anyhow::bail!("rpc.timeout_secs must be greater than 0");
        }

        if self.confirm.timeout_secs == 0 {
            anyhow::bail!("confirm.timeout_secs must be greater than 0");
        }
        if self.confirm.poll_interval_ms == 0 || self.confirm.stale_blockhash_backoff_ms == 0 {
            anyhow::bail!("confirm intervals must be greater than 0");
        }
        if self.confirm.poll_interval_ms >= self.confirm.timeout_secs.saturating_mul(1000) {
            anyhow::bail!("confirm.poll_interval_ms must be shorter than confirm.timeout_secs");
        }

        if self.fees.compute_unit_limit == 0 || self.fees.compute_unit_limit > MAX_COMPUTE_UNIT_LIMIT
        {
            anyhow::bail!(
                "fees.compute_unit_limit must be in 1..={}, got {}",
                MAX_COMPUTE_UNIT_LIMIT,
                self.fees.compute_unit_limit
            );
        }

        if let Some(url) = &self.relay.url {
            validate_url("relay.url", url)?;
            if self.relay.tip_account.is_none() {
                anyhow::bail!("relay.tip_account is required when relay.url is set");
            }
        }
        self.tip_account()?;
        to_raw_amount(&self.relay.tip_amount_sol, SOL_DECIMALS)
            .context("Invalid relay.tip_amount_sol")?;

        ProgramRegistry::with_overrides(&self.registry)?;
        Ok(())
    }

    pub fn confirm_config(&self) -> ConfirmConfig {
        ConfirmConfig {
            timeout: Duration::from_secs(self.confirm.timeout_secs),
            poll_interval: Duration::from_millis(self.confirm.poll_interval_ms),
            stale_blockhash_backoff: Duration::from_millis(self.confirm.stale_blockhash_backoff_ms),
            skip_preflight: self.rpc.skip_preflight,
        }
    }

    pub fn fee_params(&self) -> FeeParams {
        FeeParams::new(
            self.fees.compute_unit_price_micro_lamports,
            self.fees.compute_unit_limit,
        )
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc.timeout_secs)
    }

    pub fn registry(&self) -> anyhow::Result<ProgramRegistry> {
        Ok(ProgramRegistry::with_overrides(&self.registry)?)
    }

    /// Load the fee-payer keypair named by `wallet.keypair_path`.
    ///
    /// A leading `~/` resolves against `$HOME`.
    pub fn load_wallet(&self) -> anyhow::Result<WalletManager> {
        let path = expand_home(&self.wallet.keypair_path, std::env::var("HOME").ok());
        WalletManager::from_file(&path).context("Failed to load wallet")
    }

    pub fn tip_account(&self) -> anyhow::Result<Option<Pubkey>> {
        self.relay
            .tip_account
            .as_deref()
            .map(|s| Pubkey::from_str(s).with_context(|| format!("Invalid relay.tip_account: {s}")))
            .transpose()
    }
}

fn expand_home(path: &str, home: Option<String>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => Path::new(&home).join(rest),
        _ => PathBuf::from(path),
    }
}

fn validate_url(field: &str, url: &str) -> anyhow::Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        anyhow::bail!("{field} must be an http(s) URL, got '{url}'");
    }
    Ok(())
}
