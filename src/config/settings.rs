use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use eyre::{Result, WrapErr};
use serde::Deserialize;
use zeroize::Zeroizing;

use super::WalletKeychain;

const CONFIG_DIR: &str = "deployer";
const CONFIG_FILE: &str = "config.toml";

/// Deployer configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,

    #[serde(default)]
    pub wallets: HashMap<String, WalletConfig>,

    #[serde(default)]
    pub defaults: Option<Defaults>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    /// Expected chain id, checked against the node before deploying
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// Keychain entry holding the private key
    pub keychain: Option<String>,
    /// Environment variable containing private key
    pub env_var: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Defaults {
    pub network: Option<String>,
    pub wallet: Option<String>,
    /// Sender used when none is given on the command line
    pub from: Option<Address>,
}

impl AppConfig {
    /// Load configuration from the default location, or an empty one
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file at {:?}", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {:?}", path))?;

        toml::from_str(&content).wrap_err("Failed to parse config file")
    }

    /// Get the default configuration file path
    fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre::eyre!("Could not determine config directory"))?;

        Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get a network by name, falling back to the default network
    pub fn get_network(&self, name: Option<&str>) -> Option<(&String, &NetworkConfig)> {
        let name = name.or_else(|| self.defaults.as_ref()?.network.as_deref())?;
        self.networks.get_key_value(name)
    }

    pub fn default_wallet(&self) -> Option<&str> {
        self.defaults.as_ref()?.wallet.as_deref()
    }

    pub fn default_sender(&self) -> Option<Address> {
        self.defaults.as_ref()?.from
    }

    /// Resolve a wallet private key
    pub fn resolve_wallet_key(&self, name: &str) -> Result<Option<Zeroizing<String>>> {
        let wallet = self
            .wallets
            .get(name)
            .ok_or_else(|| eyre::eyre!("Wallet '{}' is not configured", name))?;

        if let Some(keychain_ref) = &wallet.keychain {
            WalletKeychain::new().private_key(keychain_ref)
        } else if let Some(env_var) = &wallet.env_var {
            Ok(std::env::var(env_var).ok().map(Zeroizing::new))
        } else {
            Ok(None)
        }
    }
}
