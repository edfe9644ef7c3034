use crate::address::Address;
use crate::proposal::ProposalId;
use crate::transaction::{Transaction, TxHash};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AzoriusEvent {
    /// Module constructed and bound to its avatar/target
    AzoriusSetUp {
        creator: Address,
        owner: Address,
        avatar: Address,
        target: Address,
    },

    /// A new proposal, carrying the full transaction bodies since only
    /// their hashes are stored
    ProposalCreated {
        strategy: Address,
        proposal_id: ProposalId,
        proposer: Address,
        transactions: Vec<Transaction>,
        metadata: String,
    },

    /// Some (or all) of a proposal's transactions were executed
    ProposalExecuted {
        proposal_id: ProposalId,
        tx_hashes: Vec<TxHash>,
    },

    EnabledStrategy { strategy: Address },

    DisabledStrategy { strategy: Address },

    TimelockPeriodUpdated { timelock_period: u32 },

    ExecutionPeriodUpdated { execution_period: u32 },

    /// A guard was installed (`true`) or removed (`false`)
    ChangedGuard { installed: bool },

    AvatarSet { previous: Address, avatar: Address },

    TargetSet { previous: Address, target: Address },

    AccessPolicyChanged,
}
