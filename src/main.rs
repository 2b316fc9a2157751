mod config;
mod contracts;
mod project;
mod report;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use alloy::dyn_abi::DynSolValue;
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use alloy::signers::local::PrivateKeySigner;
use clap::Parser;
use color_eyre::Result;
use eyre::{WrapErr, eyre};

use crate::config::AppConfig;
use crate::contracts::{
    ArtifactTable, DeployOptions, Deployer, ProviderTransport, parse_constructor_args,
};
use crate::report::EventLog;

const DEFAULT_RPC_URL: &str = "http://localhost:8545";

#[derive(Parser, Debug)]
#[command(name = "deployer")]
#[command(about = "Deploy compiled Foundry and Hardhat contracts to EVM networks")]
#[command(version)]
struct Cli {
    /// Name of the contract to deploy
    contract: String,

    /// Constructor arguments, parsed according to the constructor's parameter types
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,

    /// Path to the project directory
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Skip project detection and force a specific project type
    #[arg(long, value_parser = ["foundry", "hardhat"])]
    project_type: Option<String>,

    /// Read artifacts from this directory instead of a detected project
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Network name from the config file
    #[arg(long)]
    network: Option<String>,

    /// RPC endpoint, overrides --network
    #[arg(long)]
    rpc_url: Option<String>,

    /// Wallet name from the config file
    #[arg(long)]
    wallet: Option<String>,

    /// Sender address
    #[arg(long)]
    from: Option<Address>,

    /// Wei to send to a payable constructor
    #[arg(long)]
    value: Option<U256>,

    /// Path to the config file
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Where and how to reach the network
struct Endpoint {
    rpc_url: String,
    chain_id: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Diagnostics go to stderr, stdout carries the deployment events
    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .init();
    }

    match run(cli).await {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("Error: {:?}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(cli: Cli) -> Result<TransactionReceipt> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    let artifacts = Arc::new(load_artifacts(&cli)?);
    if artifacts.is_empty() {
        tracing::warn!("No deployable artifacts found");
    }
    let artifact = artifacts.get(&cli.contract).ok_or_else(|| {
        eyre!(
            "Unknown contract: {}\nAvailable: {}",
            cli.contract,
            artifacts.names().join(", ")
        )
    })?;
    let constructor_args = parse_constructor_args(&artifact.abi, &cli.args)?;

    let endpoint = resolve_endpoint(&cli, &config)?;
    let wallet_name = cli.wallet.as_deref().or(config.default_wallet());
    let signer = wallet_name
        .map(|name| load_signer(&config, name))
        .transpose()?;

    let preferred_sender = resolve_sender(
        cli.from,
        config.default_sender(),
        signer.as_ref().map(|signer| signer.address()),
    )?;
    let options = (cli.from.is_some() || cli.value.is_some()).then(|| DeployOptions {
        from: cli.from,
        value: cli.value,
    });

    match signer {
        Some(signer) => {
            let provider = ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect(&endpoint.rpc_url)
                .await
                .wrap_err("Failed to connect to RPC")?;
            deploy_with(
                provider,
                &endpoint,
                artifacts,
                &cli.contract,
                constructor_args,
                options,
                preferred_sender,
            )
            .await
        }
        None => {
            let provider = ProviderBuilder::new()
                .connect(&endpoint.rpc_url)
                .await
                .wrap_err("Failed to connect to RPC")?;
            deploy_with(
                provider,
                &endpoint,
                artifacts,
                &cli.contract,
                constructor_args,
                options,
                preferred_sender,
            )
            .await
        }
    }
}

async fn deploy_with<P: Provider + 'static>(
    provider: P,
    endpoint: &Endpoint,
    artifacts: Arc<ArtifactTable>,
    contract_name: &str,
    constructor_args: Vec<DynSolValue>,
    options: Option<DeployOptions>,
    preferred_sender: Option<Address>,
) -> Result<TransactionReceipt> {
    let transport = ProviderTransport::new(provider);

    if let Some(expected) = endpoint.chain_id {
        let actual = transport.chain_id().await?;
        if actual != expected {
            return Err(eyre!(
                "Chain id mismatch at {}: expected {}, node reports {}",
                endpoint.rpc_url,
                expected,
                actual
            ));
        }
    }

    // Fall back to the node's coinbase, as an unlocked dev node would sign
    let default_sender = match preferred_sender {
        Some(sender) => sender,
        None => transport.coinbase().await?.ok_or_else(|| {
            eyre!("No sender available: pass --from, configure a wallet, or unlock a node account")
        })?,
    };

    let deployer = Deployer::new(artifacts, Arc::new(transport), default_sender);
    tracing::debug!("Default sender {:?}", deployer.default_sender());

    let deployment = deployer.deploy(contract_name, constructor_args, options)?;
    let abort = deployment.abort_handle();

    let mut log = EventLog::new(io::stdout());
    tokio::select! {
        outcome = deployment.report(&mut log) => outcome,
        _ = tokio::signal::ctrl_c() => {
            abort.abort();
            Err(eyre!("Interrupted before the deployment settled"))
        }
    }
}

fn load_artifacts(cli: &Cli) -> Result<ArtifactTable> {
    if let Some(dir) = &cli.artifacts {
        return ArtifactTable::load_dir(dir);
    }

    let project_path = cli.project.canonicalize().unwrap_or_else(|_| cli.project.clone());

    let project = match cli.project_type.as_deref() {
        Some("foundry") => project::Project::new_foundry(&project_path)?,
        Some("hardhat") => project::Project::new_hardhat(&project_path)?,
        _ => project::detect(&project_path)?,
    };

    tracing::info!("Using project {} at {:?}", project.name, project.root);
    ArtifactTable::load(&project)
}

fn resolve_endpoint(cli: &Cli, config: &AppConfig) -> Result<Endpoint> {
    if let Some(rpc_url) = &cli.rpc_url {
        return Ok(Endpoint {
            rpc_url: rpc_url.clone(),
            chain_id: None,
        });
    }

    match config.get_network(cli.network.as_deref()) {
        Some((name, network)) => {
            tracing::info!("Using network {} ({})", name, network.rpc_url);
            Ok(Endpoint {
                rpc_url: network.rpc_url.clone(),
                chain_id: network.chain_id,
            })
        }
        None => match &cli.network {
            Some(name) => Err(eyre!("Network '{}' is not configured", name)),
            None => Ok(Endpoint {
                rpc_url: DEFAULT_RPC_URL.to_string(),
                chain_id: None,
            }),
        },
    }
}

/// Picks the sender before connecting. With a wallet, only the wallet's own
/// address can sign, so an explicit `--from` must match it and the config
/// default is ignored.
fn resolve_sender(
    cli_from: Option<Address>,
    config_from: Option<Address>,
    signer: Option<Address>,
) -> Result<Option<Address>> {
    let Some(signer) = signer else {
        return Ok(cli_from.or(config_from));
    };

    match cli_from {
        Some(from) if from != signer => Err(eyre!(
            "--from {:?} does not match the wallet address {:?}",
            from,
            signer
        )),
        _ => {
            if let Some(from) = config_from.filter(|from| *from != signer) {
                tracing::warn!(
                    "Ignoring defaults.from {:?}, the wallet signs as {:?}",
                    from,
                    signer
                );
            }
            Ok(Some(signer))
        }
    }
}

fn load_signer(config: &AppConfig, wallet_name: &str) -> Result<PrivateKeySigner> {
    let private_key = config
        .resolve_wallet_key(wallet_name)?
        .ok_or_else(|| eyre!("No private key found for wallet '{}'", wallet_name))?;

    let key_str = private_key.as_str().trim();
    let clean_key = key_str.strip_prefix("0x").unwrap_or(key_str);

    clean_key
        .parse::<PrivateKeySigner>()
        .wrap_err_with(|| format!("Failed to parse private key for wallet '{}'", wallet_name))
}
