use crate::address::Address;
use crate::strategy::SharedStrategy;
use crate::transaction::TxHash;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

pub type ProposalId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    /// Voting is open
    Active,

    /// Passed, waiting out the timelock
    Timelocked,

    /// Inside the execution window
    Executable,

    /// Every transaction has been executed
    Executed,

    /// The execution window closed before every transaction was executed
    Expired,

    /// Voting ended without the proposal passing
    Failed,
}

impl ProposalState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalState::Executed | ProposalState::Expired | ProposalState::Failed
        )
    }
}

impl Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProposalState::Active => "active",
            ProposalState::Timelocked => "timelocked",
            ProposalState::Executable => "executable",
            ProposalState::Executed => "executed",
            ProposalState::Expired => "expired",
            ProposalState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A proposal as stored by the engine
#[derive(Debug, Clone)]
pub(crate) struct Proposal {
    pub strategy: SharedStrategy,
    pub strategy_address: Address,
    pub proposer: Address,
    pub tx_hashes: Vec<TxHash>,
    pub timelock_period: u32,
    pub execution_period: u32,
    pub execution_counter: u32,
    pub metadata: String,
}

impl Proposal {
    pub fn info(&self) -> ProposalInfo {
        ProposalInfo {
            strategy: self.strategy_address,
            proposer: self.proposer,
            tx_hashes: self.tx_hashes.clone(),
            timelock_period: self.timelock_period,
            execution_period: self.execution_period,
            execution_counter: self.execution_counter,
            metadata: self.metadata.clone(),
        }
    }
}

/// Read-only view of a stored proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalInfo {
    pub strategy: Address,
    pub proposer: Address,
    pub tx_hashes: Vec<TxHash>,
    pub timelock_period: u32,
    pub execution_period: u32,
    pub execution_counter: u32,
    pub metadata: String,
}
