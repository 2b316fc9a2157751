mod abi;
mod artifact;
mod deployer;
mod events;
mod transport;

pub use abi::parse_constructor_args;
pub use artifact::ArtifactTable;
pub use deployer::{Deployer, Deployment};
pub use events::{DeployEvent, DeployOptions};
#[cfg(test)]
pub(crate) use events::fixtures;
pub use transport::ProviderTransport;
