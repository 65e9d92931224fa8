use log::warn;
use serde::{Deserialize, Serialize};

use super::compute::ComputeExecutor;
use super::hashing;

/// A commitment that algorithm A applied to input I produced an output with
/// the claimed hash. Algorithm and input live in an external content store;
/// the ledger only records their refs and content hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Digest of the canonical encoding, with `id` itself zeroed during hashing
    pub id: String,

    /// Content ref of the algorithm payload
    pub algorithm_ref: String,

    /// Content hash of the algorithm payload
    pub algorithm_hash: String,

    /// Content ref of the input payload
    pub input_ref: String,

    /// Content hash of the input payload
    pub input_hash: String,

    /// Claimed digest of the algorithm's output on that input
    pub output_hash: String,
}

impl Transaction {
    /// Creates a new transaction; pure construction, fills `id`.
    pub fn new(
        algorithm_ref: impl Into<String>,
        algorithm_hash: impl Into<String>,
        input_ref: impl Into<String>,
        input_hash: impl Into<String>,
        output_hash: impl Into<String>,
    ) -> Self {
        let mut tx = Transaction {
            id: String::new(),
            algorithm_ref: algorithm_ref.into(),
            algorithm_hash: algorithm_hash.into(),
            input_ref: input_ref.into(),
            input_hash: input_hash.into(),
            output_hash: output_hash.into(),
        };
        tx.id = tx.compute_id();
        tx
    }

    /// Recomputes the identity digest from the five payload fields.
    pub fn compute_id(&self) -> String {
        let unsigned = Transaction {
            id: String::new(),
            ..self.clone()
        };
        hashing::hash_encoded(&unsigned)
    }

    /// Re-derives the output hash through the compute executor and compares
    /// it against the claim. An executor failure is a verification failure.
    pub fn verify(&self, executor: &dyn ComputeExecutor) -> bool {
        match executor.execute(&self.algorithm_ref, &self.input_ref) {
            Ok(output_hash) => output_hash == self.output_hash,
            Err(err) => {
                warn!("Executor failed for transaction {}: {}", self.id, err);
                false
            }
        }
    }

    /// Canonical byte encoding, including `id`. Part of the block hash preimage.
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        hashing::canonical_bytes(self)
    }
}
