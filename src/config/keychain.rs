use eyre::{Result, WrapErr};
use keyring::Entry;
use zeroize::Zeroizing;

/// Keychain service under which wallet keys are stored
const SERVICE_NAME: &str = "deployer";

/// Wallet private keys kept in the OS keychain.
///
/// The deployer never writes here; keys are added with the platform's own
/// tooling (e.g. `security add-generic-password -s deployer -a <entry>`).
pub struct WalletKeychain {
    service: &'static str,
}

impl WalletKeychain {
    pub fn new() -> Self {
        Self::for_service(SERVICE_NAME)
    }

    pub fn for_service(service: &'static str) -> Self {
        Self { service }
    }

    /// Private key stored under `entry`, `None` when there is no such entry.
    /// The key is wiped from memory once dropped.
    pub fn private_key(&self, entry: &str) -> Result<Option<Zeroizing<String>>> {
        let secret = Entry::new(self.service, entry)
            .and_then(|entry| entry.get_password())
            .map(Zeroizing::new);

        match secret {
            Ok(key) => Ok(Some(key)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).wrap_err_with(|| {
                format!("Failed to read keychain entry '{}' of {}", entry, self.service)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Touches the real OS keychain
    #[test]
    #[ignore]
    fn test_missing_entry_is_none() {
        let keychain = WalletKeychain::for_service("deployer-tests");
        assert!(keychain.private_key("no_such_wallet").unwrap().is_none());
    }
}
