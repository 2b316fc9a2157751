use std::io::Write;

use eyre::{Result, WrapErr};

use crate::contracts::DeployEvent;

/// Plain-text sink for deployment events, one line per event
pub struct EventLog<W> {
    out: W,
}

impl<W: Write> EventLog<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn record(&mut self, event: &DeployEvent) -> Result<()> {
        let written = match event {
            DeployEvent::Error(message) => writeln!(self.out, "{}", message),
            DeployEvent::TransactionHash(hash) => writeln!(self.out, "{:?}", hash),
            DeployEvent::Receipt(receipt) => {
                let json = serde_json::to_string(receipt).wrap_err("Failed to serialize receipt")?;
                writeln!(self.out, "{}", json)
            }
        };
        written.wrap_err("Failed to write event")?;

        self.out.flush().wrap_err("Failed to flush event log")
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, B256};

    use super::*;
    use crate::contracts::fixtures;

    fn lines(log: EventLog<Vec<u8>>) -> Vec<String> {
        String::from_utf8(log.into_inner())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_record_hash_then_receipt() {
        let hash = B256::repeat_byte(0x11);
        let contract = Address::repeat_byte(0xcd);
        let receipt = fixtures::receipt(hash, true, Some(contract));

        let mut log = EventLog::new(Vec::new());
        log.record(&DeployEvent::TransactionHash(hash)).unwrap();
        log.record(&DeployEvent::Receipt(receipt)).unwrap();

        let lines = lines(log);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("{:?}", hash));

        // The node's receipt is logged whole, not a summary of it
        let json: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(json["blockNumber"], "0x1");
        assert_eq!(json["status"], "0x1");
        assert_eq!(json["cumulativeGasUsed"], "0x1d4c0");
        assert!(json["logs"].as_array().is_some_and(|logs| logs.is_empty()));
        assert!(json["logsBloom"].is_string());
        assert_eq!(
            json["contractAddress"].as_str().unwrap().to_lowercase(),
            format!("0x{}", "cd".repeat(20))
        );
    }

    #[test]
    fn test_record_error_message() {
        let mut log = EventLog::new(Vec::new());
        log.record(&DeployEvent::Error("insufficient funds".to_string()))
            .unwrap();

        assert_eq!(lines(log), vec!["insufficient funds".to_string()]);
    }
}
