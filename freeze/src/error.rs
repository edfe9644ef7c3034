use azorius::access::Unauthorized;
use azorius::avatar::AvatarError;
use azorius::votes::VotesError;
use azorius::{Address, TxHash};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{0} has no freeze votes")]
    NoVotes(Address),

    #[error("{voter} already voted in the freeze round opened at block {round}")]
    AlreadyVoted { voter: Address, round: u64 },

    #[error("{0} is not an owner of the parent multisig")]
    NotOwner(Address),

    #[error("nonce {nonce} was already used (current {current})")]
    StaleNonce { nonce: u64, current: u64 },

    #[error("freeze voting handle {bound} does not match configured {configured}")]
    FreezeVotingMismatch { configured: Address, bound: Address },

    #[error("transaction {0} is already timelocked")]
    AlreadyTimelocked(TxHash),

    #[error("transaction failed")]
    TxFailed(#[source] AvatarError),

    #[error("signature check failed")]
    Signatures(#[from] AvatarError),

    #[error("unauthorized")]
    Unauthorized(#[from] Unauthorized),

    #[error("votes lookup failed")]
    Votes(#[from] VotesError),
}
