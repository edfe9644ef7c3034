#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Azorius is a proposal engine installed as a module on a multisig
//! account. Proposals are batches of transactions; a pluggable
//! [`strategy::VotingStrategy`] decides when voting ends and whether the
//! batch passed, after which the engine enforces a timelock and an
//! execution window before forwarding the transactions to the multisig.

pub mod access;
pub mod address;
pub mod avatar;
mod azorius;
pub mod clock;
pub mod config;
pub mod event;
pub mod factory;
pub mod guard;
pub mod math;
pub mod memory;
pub mod proposal;
pub mod registry;
pub mod strategy;
#[cfg(test)]
mod testing;
pub mod transaction;
pub mod votes;

pub use self::azorius::{Azorius, AzoriusDeps, AzoriusError, Result};
pub use address::Address;
pub use proposal::{ProposalId, ProposalState};
pub use transaction::{Operation, Transaction, TxHash};
