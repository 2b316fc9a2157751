use std::io::Write;
use std::sync::Arc;

use alloy::dyn_abi::DynSolValue;
use alloy::network::TransactionBuilder;
use alloy::primitives::Address;
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use eyre::{Result, WrapErr};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{AbortHandle, JoinHandle};

use super::abi::encode_deploy_code;
use super::artifact::ArtifactTable;
use super::events::{DeployEvent, DeployOptions};
use super::transport::DeployTransport;
use crate::report::EventLog;

/// Deploys contracts from an artifact table through a transport
pub struct Deployer<T> {
    artifacts: Arc<ArtifactTable>,
    transport: Arc<T>,
    default_sender: Address,
}

/// An in-flight deployment.
///
/// Events arrive in order: `TransactionHash` before `Receipt`, or a single
/// `Error` in place of whatever has not happened yet. The stream ends when
/// the deployment settles.
pub struct Deployment {
    events: UnboundedReceiver<DeployEvent>,
    task: JoinHandle<Result<TransactionReceipt>>,
}

impl<T: DeployTransport> Deployer<T> {
    pub fn new(artifacts: Arc<ArtifactTable>, transport: Arc<T>, default_sender: Address) -> Self {
        Self {
            artifacts,
            transport,
            default_sender,
        }
    }

    pub fn default_sender(&self) -> Address {
        self.default_sender
    }

    /// Build the contract creation transaction without sending it
    pub fn build_transaction(
        &self,
        contract_name: &str,
        constructor_args: &[DynSolValue],
        options: Option<&DeployOptions>,
    ) -> Result<TransactionRequest> {
        let artifact = self
            .artifacts
            .get(contract_name)
            .ok_or_else(|| eyre::eyre!("Unknown contract: {}", contract_name))?;

        let code = encode_deploy_code(&artifact.abi, &artifact.bytecode, constructor_args)
            .wrap_err_with(|| format!("Failed to build deployment of {}", contract_name))?;

        let from = options
            .and_then(|o| o.from)
            .unwrap_or(self.default_sender);

        let mut tx = TransactionRequest::default()
            .with_deploy_code(code)
            .with_from(from);

        if let Some(value) = options.and_then(|o| o.value) {
            tx = tx.with_value(value);
        }

        Ok(tx)
    }

    /// Start deploying `contract_name`.
    ///
    /// Lookup and argument encoding happen before this returns, so an unknown
    /// contract never reaches the network. Broadcast and confirmation run on
    /// a spawned task and are observed through the returned [`Deployment`].
    pub fn deploy(
        &self,
        contract_name: &str,
        constructor_args: Vec<DynSolValue>,
        options: Option<DeployOptions>,
    ) -> Result<Deployment> {
        let tx = self.build_transaction(contract_name, &constructor_args, options.as_ref())?;

        tracing::info!(
            "Deploying {} from {:?}",
            contract_name,
            tx.from.unwrap_or(self.default_sender)
        );

        let (events_tx, events) = mpsc::unbounded_channel();
        let transport = Arc::clone(&self.transport);
        let contract = contract_name.to_string();

        let task = tokio::spawn(async move {
            let outcome = submit(transport.as_ref(), tx, &events_tx).await;

            match &outcome {
                Ok(receipt) => tracing::info!(
                    "{} deployed at {:?}",
                    contract,
                    receipt.contract_address.unwrap_or_default()
                ),
                Err(e) => {
                    tracing::warn!("Deployment of {} failed: {:#}", contract, e);
                    let _ = events_tx.send(DeployEvent::Error(format!("{:#}", e)));
                }
            }

            outcome
        });

        Ok(Deployment { events, task })
    }
}

async fn submit<T: DeployTransport>(
    transport: &T,
    tx: TransactionRequest,
    events: &UnboundedSender<DeployEvent>,
) -> Result<TransactionReceipt> {
    let tx_hash = transport.send_transaction(tx).await?;
    tracing::debug!("Deployment transaction sent: {:?}", tx_hash);
    let _ = events.send(DeployEvent::TransactionHash(tx_hash));

    let receipt = transport.wait_for_receipt(tx_hash).await?;

    if !receipt.status() {
        return Err(eyre::eyre!(
            "Transaction {:?} was reverted by the EVM",
            tx_hash
        ));
    }
    if receipt.contract_address.is_none() {
        return Err(eyre::eyre!(
            "Receipt for {:?} has no contract address",
            tx_hash
        ));
    }

    let _ = events.send(DeployEvent::Receipt(receipt.clone()));
    Ok(receipt)
}

impl Deployment {
    /// Next progress event, `None` once the deployment has settled
    pub async fn next_event(&mut self) -> Option<DeployEvent> {
        self.events.recv().await
    }

    /// Wait for the outcome, discarding events not yet consumed
    pub async fn settle(self) -> Result<TransactionReceipt> {
        self.task.await.wrap_err("Deployment task did not complete")?
    }

    /// Write every event to `log`, then settle
    pub async fn report<W: Write>(mut self, log: &mut EventLog<W>) -> Result<TransactionReceipt> {
        while let Some(event) = self.next_event().await {
            log.record(&event)?;
        }
        self.settle().await
    }

    /// Handle that cancels the deployment task. A transaction already
    /// broadcast stays in the node's pool.
    pub fn abort_handle(&self) -> AbortHandle {
        self.task.abort_handle()
    }
}
