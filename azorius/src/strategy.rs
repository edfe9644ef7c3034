use crate::address::Address;
use crate::math::MathError;
use crate::proposal::ProposalId;
use crate::votes::VotesError;
use parking_lot::RwLock;
use std::fmt::Debug;
use std::sync::Arc;

/// Handle to a voting strategy shared between the engine and voters
pub type SharedStrategy = Arc<RwLock<dyn VotingStrategy>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrategyError {
    #[error("only the bound Azorius module may call this, got {0}")]
    OnlyAzorius(Address),

    #[error("proposal {0} is not known to this strategy")]
    InvalidProposal(ProposalId),

    #[error("proposal {0} was already initialized")]
    ProposalAlreadyInitialized(ProposalId),

    #[error("voting on proposal {0} has ended")]
    VotingEnded(ProposalId),

    #[error("{voter} already voted on proposal {proposal_id}")]
    AlreadyVoted {
        voter: Address,
        proposal_id: ProposalId,
    },

    #[error("{0} has no voting weight")]
    NoVotingWeight(Address),

    #[error("quorum numerator {0} exceeds the denominator")]
    InvalidQuorumNumerator(u128),

    #[error("basis numerator {0} must be between 50% and 100%")]
    InvalidBasisNumerator(u128),

    #[error("token address and id arrays must be non-empty and of equal length")]
    InvalidParams,

    #[error("{0} is not a governance token")]
    InvalidTokenAddress(Address),

    #[error("token {token} #{id} is not owned by the voter")]
    IdNotOwned { token: Address, id: u64 },

    #[error("token {token} #{id} already voted on this proposal")]
    IdAlreadyVoted { token: Address, id: u64 },

    #[error("governance token {0} is already registered")]
    DuplicateToken(Address),

    #[error("at least one hat must be whitelisted")]
    NoHatsWhitelisted,

    #[error("hat {0} is already whitelisted")]
    HatAlreadyWhitelisted(u128),

    #[error("hat {0} is not whitelisted")]
    HatNotWhitelisted(u128),

    #[error("this operation does not apply to the strategy's proposer gate")]
    UnsupportedProposerGate,

    #[error("unauthorized")]
    Unauthorized(#[from] crate::access::Unauthorized),

    #[error("votes lookup failed")]
    Votes(#[from] VotesError),

    #[error("arithmetic error")]
    Math(#[from] MathError),
}

/// A pluggable policy deciding who may propose, how long voting lasts, and
/// whether a proposal passed.
///
/// The proposal engine only ever talks to a strategy through this trait.
/// Casting votes is strategy specific and not part of it.
pub trait VotingStrategy: Debug + Send + Sync {
    /// Address the strategy is registered under
    fn address(&self) -> Address;

    /// Called by the engine when a proposal bound to this strategy is
    /// created. `caller` is the engine's own address.
    fn initialize_proposal(
        &mut self,
        caller: &Address,
        proposal_id: ProposalId,
        proposer: &Address,
        data: &[u8],
    ) -> Result<(), StrategyError>;

    /// Whether voting has ended and the proposal met its thresholds.
    /// Unknown proposals never pass.
    fn is_passed(&self, proposal_id: ProposalId) -> bool;

    /// The block at which voting ends, `None` for unknown proposals
    fn voting_end_block(&self, proposal_id: ProposalId) -> Option<u64>;

    /// Whether `address` may submit proposals using this strategy
    fn is_proposer(&self, address: &Address) -> bool;
}
