use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::TransactionReceipt;

/// Per-call deployment settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Sender; the deployer's default sender when unset
    pub from: Option<Address>,
    /// Wei sent to a payable constructor
    pub value: Option<U256>,
}

impl From<Address> for DeployOptions {
    fn from(address: Address) -> Self {
        Self {
            from: Some(address),
            value: None,
        }
    }
}

/// Progress of a single deployment attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    /// Terminal failure; the contract was not deployed
    Error(String),
    /// Accepted by the node, not yet mined
    TransactionHash(TxHash),
    /// Mined with a contract address
    Receipt(TransactionReceipt),
}

/// Receipts in node JSON-RPC form, shared by the test modules
#[cfg(test)]
pub(crate) mod fixtures {
    use alloy::primitives::{Address, B256, TxHash};
    use alloy::rpc::types::TransactionReceipt;
    use serde_json::{Value, json};

    pub fn receipt_json(
        tx_hash: TxHash,
        status: bool,
        contract_address: Option<Address>,
    ) -> Value {
        json!({
            "type": "0x2",
            "status": if status { "0x1" } else { "0x0" },
            "transactionHash": tx_hash,
            "transactionIndex": "0x0",
            "blockHash": B256::repeat_byte(0x22),
            "blockNumber": "0x1",
            "from": Address::repeat_byte(0xab),
            "to": null,
            "contractAddress": contract_address,
            "cumulativeGasUsed": "0x1d4c0",
            "gasUsed": "0x1d4c0",
            "effectiveGasPrice": "0x3b9aca00",
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
        })
    }

    pub fn receipt(
        tx_hash: TxHash,
        status: bool,
        contract_address: Option<Address>,
    ) -> TransactionReceipt {
        serde_json::from_value(receipt_json(tx_hash, status, contract_address)).unwrap()
    }
}
