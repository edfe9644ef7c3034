use crate::hats::HatId;
use crate::tally::VoteType;
use azorius::{Address, ProposalId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyEvent {
    StrategySetUp {
        azorius: Address,
        owner: Address,
    },

    AzoriusSet {
        azorius: Address,
    },

    /// Voting opened on a new proposal
    ProposalInitialized {
        proposal_id: ProposalId,
        voting_end_block: u64,
    },

    Voted {
        voter: Address,
        proposal_id: ProposalId,
        vote_type: VoteType,
        weight: u128,
    },

    VotingPeriodUpdated {
        voting_period: u32,
    },

    QuorumNumeratorUpdated {
        quorum_numerator: u128,
    },

    QuorumThresholdUpdated {
        quorum_threshold: u128,
    },

    BasisNumeratorUpdated {
        basis_numerator: u128,
    },

    RequiredProposerWeightUpdated {
        required_proposer_weight: u128,
    },

    GovernanceTokenAdded {
        token: Address,
        weight: u128,
    },

    GovernanceTokenRemoved {
        token: Address,
    },

    HatWhitelisted {
        hat_id: HatId,
    },

    HatRemovedFromWhitelist {
        hat_id: HatId,
    },

    AccessPolicyChanged,
}
