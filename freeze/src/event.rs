use azorius::{Address, TxHash};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FreezeEvent {
    FreezeVotingSetUp {
        owner: Address,
        parent: Address,
    },

    /// A new freeze round was opened by `creator`'s vote
    FreezeProposalCreated {
        creator: Address,
    },

    FreezeVoteCast {
        voter: Address,
        votes_cast: u128,
    },

    /// The owner cleared the vote count
    Unfrozen,

    FreezeVotesThresholdUpdated {
        freeze_votes_threshold: u128,
    },

    FreezeProposalPeriodUpdated {
        freeze_proposal_period: u32,
    },

    FreezePeriodUpdated {
        freeze_period: u32,
    },

    AccessPolicyChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardEvent {
    MultisigFreezeGuardSetUp {
        owner: Address,
        child_safe: Address,
    },

    TransactionTimelocked {
        timelocker: Address,
        tx_hash: TxHash,
        block: u64,
    },

    TimelockPeriodUpdated {
        timelock_period: u32,
    },

    ExecutionPeriodUpdated {
        execution_period: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerEvent {
    FractalModuleSetUp {
        owner: Address,
        avatar: Address,
        target: Address,
    },

    ControllersAdded {
        controllers: Vec<Address>,
    },

    ControllersRemoved {
        controllers: Vec<Address>,
    },

    AccessPolicyChanged,
}
