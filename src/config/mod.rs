mod keychain;
mod settings;

pub use keychain::WalletKeychain;
pub use settings::AppConfig;
