//! Mock ledger publishing
//!
//! Stand-in for publishing a result on a blockchain: each published run is
//! hashed and chained onto the previous transaction, producing a receipt
//! that looks like an on-chain record. Nothing leaves the process.

use crate::error::{LabError, Result};
use crate::gateway::ExperimentRun;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

const GENESIS_HASH: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub tx_hash: String,
    pub block_number: u64,
    /// SHA-256 of the published run, hex encoded
    pub payload_digest: String,
    pub network: String,
    pub run_id: i64,
    pub published_at: DateTime<Utc>,
}

/// In-memory chain of published runs
#[derive(Debug, Clone)]
pub struct MockLedger {
    network: String,
    receipts: Vec<PublishReceipt>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new("quantum-testnet")
    }
}

impl MockLedger {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            receipts: Vec::new(),
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn receipts(&self) -> &[PublishReceipt] {
        &self.receipts
    }

    pub fn head(&self) -> &str {
        self.receipts
            .last()
            .map(|r| r.tx_hash.as_str())
            .unwrap_or(GENESIS_HASH)
    }

    /// Publish a run. Placeholder runs are refused.
    pub fn publish(&mut self, run: &ExperimentRun) -> Result<PublishReceipt> {
        if run.is_placeholder() {
            return Err(LabError::InvalidState(
                "placeholder results cannot be published".to_string(),
            ));
        }

        let payload = serde_json::to_vec(run)?;
        let payload_digest = hex::encode(Sha256::digest(&payload));

        let mut hasher = Sha256::new();
        hasher.update(self.head().as_bytes());
        hasher.update(payload_digest.as_bytes());
        let tx_hash = format!("0x{}", hex::encode(hasher.finalize()));

        let receipt = PublishReceipt {
            tx_hash,
            block_number: self.receipts.len() as u64 + 1,
            payload_digest,
            network: self.network.clone(),
            run_id: run.id,
            published_at: Utc::now(),
        };
        info!(run_id = run.id, block = receipt.block_number, tx = %receipt.tx_hash, "Run published");
        self.receipts.push(receipt.clone());
        Ok(receipt)
    }

    /// Check that every receipt chains onto its predecessor
    pub fn verify(&self, runs: &[ExperimentRun]) -> bool {
        if runs.len() != self.receipts.len() {
            return false;
        }
        let mut previous = GENESIS_HASH.to_string();
        for (receipt, run) in self.receipts.iter().zip(runs) {
            let Ok(payload) = serde_json::to_vec(run) else {
                return false;
            };
            let digest = hex::encode(Sha256::digest(&payload));
            let mut hasher = Sha256::new();
            hasher.update(previous.as_bytes());
            hasher.update(digest.as_bytes());
            let expected = format!("0x{}", hex::encode(hasher.finalize()));
            if digest != receipt.payload_digest || expected != receipt.tx_hash {
                return false;
            }
            previous = expected;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::DataSource;

    fn run(id: i64, energy: f64) -> ExperimentRun {
        ExperimentRun {
            id,
            experiment_id: Some(id),
            system_id: Some("h2o".to_string()),
            basis_set: Some("sto-3g".to_string()),
            energy,
            reference_energy: Some(-74.963),
            iterations: 12,
            runtime: 1.0,
            converged: Some(true),
            convergence: None,
            data: serde_json::Value::Null,
            created_at: None,
            source: DataSource::Live,
        }
    }

    #[test]
    fn test_publish_chains_receipts() {
        let mut ledger = MockLedger::default();
        let first = ledger.publish(&run(1, -74.96)).unwrap();
        let second = ledger.publish(&run(2, -74.97)).unwrap();

        assert_eq!(first.block_number, 1);
        assert_eq!(second.block_number, 2);
        assert!(first.tx_hash.starts_with("0x"));
        assert_eq!(first.tx_hash.len(), 66);
        assert_eq!(first.payload_digest.len(), 64);
        assert_ne!(first.tx_hash, second.tx_hash);
        assert_eq!(ledger.head(), second.tx_hash);
        assert!(ledger.verify(&[run(1, -74.96), run(2, -74.97)]));
    }

    #[test]
    fn test_verify_detects_tampering() {
        let mut ledger = MockLedger::default();
        ledger.publish(&run(1, -74.96)).unwrap();
        assert!(!ledger.verify(&[run(1, -70.0)]));
        assert!(!ledger.verify(&[]));
    }

    #[test]
    fn test_placeholder_refused() {
        let mut ledger = MockLedger::new("devnet");
        let mut placeholder = run(0, -74.96);
        placeholder.source = DataSource::Placeholder;

        let err = ledger.publish(&placeholder).unwrap_err();
        assert!(matches!(err, LabError::InvalidState(_)));
        assert!(ledger.receipts().is_empty());
        assert_eq!(ledger.head(), GENESIS_HASH);
    }
}
