use std::future::Future;
use std::time::Duration;

use alloy::primitives::{Address, TxHash};
use alloy::providers::Provider;
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use eyre::{Result, WrapErr};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Network side of a deployment: broadcast, then wait for mining
pub trait DeployTransport: Send + Sync + 'static {
    /// Sign (when a wallet is attached), fill and broadcast a transaction
    fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> impl Future<Output = Result<TxHash>> + Send;

    /// Wait until the transaction is mined
    fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<TransactionReceipt>> + Send;
}

/// Deploys through an alloy provider
pub struct ProviderTransport<P> {
    provider: P,
    poll_interval: Duration,
}

impl<P: Provider + 'static> ProviderTransport<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Delay between `eth_getTransactionReceipt` polls
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// First account managed by the node (`eth_accounts`)
    pub async fn coinbase(&self) -> Result<Option<Address>> {
        let accounts = self
            .provider
            .get_accounts()
            .await
            .wrap_err("Failed to query node accounts")?;
        Ok(accounts.into_iter().next())
    }

    pub async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .wrap_err("Failed to query chain id")
    }
}

impl<P: Provider + 'static> DeployTransport for ProviderTransport<P> {
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let pending_tx = self
            .provider
            .send_transaction(tx)
            .await
            .wrap_err("Failed to send deployment transaction")?;

        Ok(*pending_tx.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt> {
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .wrap_err_with(|| format!("Failed to fetch receipt for {:?}", tx_hash))?;

            match receipt {
                Some(receipt) => return Ok(receipt),
                None => {
                    tracing::debug!("{:?} not mined yet", tx_hash);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}
