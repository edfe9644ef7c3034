//! Interface boundary to the multisig account ("the Safe").
//!
//! Only what the governance components need is modelled here: module
//! execution, signature checking, owner lookup and the pre-execution guard
//! hook. [`crate::memory::MemorySafe`] implements all of it in memory.

use crate::address::Address;
use crate::guard::GuardError;
use crate::transaction::{Transaction, TxHash};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvatarError {
    #[error("module {0} is not enabled")]
    ModuleNotEnabled(Address),

    #[error("threshold {threshold} is invalid for {owners} owners")]
    InvalidThreshold { threshold: usize, owners: usize },

    #[error("expected nonce {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    #[error("malformed signatures")]
    MalformedSignatures,

    #[error("{0} is not an owner")]
    NotOwner(Address),

    #[error("{provided} valid signatures, {required} required")]
    InsufficientSignatures { required: usize, provided: usize },

    #[error("transaction rejected by guard")]
    Guard(#[from] GuardError),

    #[error("transaction {index} failed: {reason}")]
    TxFailed { index: usize, reason: String },
}

/// The account that actually executes governance decisions
pub trait Avatar: Debug + Send + Sync {
    /// Execute `transactions` on behalf of an enabled module. Either every
    /// transaction applies or none does.
    fn exec_transactions_from_module(
        &self,
        module: &Address,
        transactions: &[Transaction],
    ) -> Result<(), AvatarError>;
}

/// Signature verification of a multisig
pub trait SignatureChecker: Debug + Send + Sync {
    /// Nonce the next multisig transaction must carry
    fn nonce(&self) -> u64;

    /// Fails unless `signatures` meet the threshold for `tx_hash`
    fn check_signatures(&self, tx_hash: &TxHash, signatures: &[u8]) -> Result<(), AvatarError>;
}

pub trait SafeOwners: Debug + Send + Sync {
    fn is_owner(&self, address: &Address) -> bool;
}

/// A transaction submitted through the multisig's own signature path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeTransaction {
    pub safe: Address,
    pub transaction: Transaction,
    pub nonce: u64,
}

impl SafeTransaction {
    /// Hash the owners sign, binding the call to one safe and nonce
    pub fn hash(&self) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update(b"azorius.safe-tx");
        hasher.update(self.safe.as_bytes());
        hasher.update(self.transaction.hash().as_bytes());
        hasher.update(self.nonce.to_be_bytes());
        TxHash(hasher.finalize().into())
    }
}

/// Pre-execution hook installed on the multisig itself
pub trait SafeGuard: Debug + Send + Sync {
    fn check_safe_transaction(
        &self,
        tx: &SafeTransaction,
        signatures: &[u8],
        executor: &Address,
    ) -> Result<(), GuardError>;

    fn check_after_safe_execution(&self, _tx_hash: &TxHash, _success: bool) {}
}
