use crate::address::Address;
use crate::transaction::{Transaction, TxHash};
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("the DAO is frozen")]
    DaoFrozen,

    #[error("transaction was built for safe {got}, guard protects {expected}")]
    WrongSafe { expected: Address, got: Address },

    #[error("transaction {0} has not been timelocked")]
    NotTimelocked(TxHash),

    #[error("transaction {0} is still timelocked")]
    Timelocked(TxHash),

    #[error("execution window for transaction {0} has expired")]
    Expired(TxHash),
}

/// Pre/post execution hook consulted by the proposal engine.
///
/// `check_transaction` runs for every transaction of a batch before any
/// state changes. `check_after_execution` only observes the outcome.
pub trait Guard: Debug + Send + Sync {
    fn check_transaction(&self, tx: &Transaction, executor: &Address) -> Result<(), GuardError>;

    fn check_after_execution(&self, _tx_hash: &TxHash, _success: bool) {}
}
