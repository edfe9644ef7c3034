#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Voting strategies for the Azorius proposal engine.

pub mod event;
pub mod hats;
pub mod linear_erc20;
pub mod linear_erc721;
pub mod nft;
pub mod proposer;
pub mod tally;

pub use event::StrategyEvent;
pub use linear_erc20::{LinearErc20Voting, LinearErc20VotingConfig};
pub use linear_erc721::{GovernanceToken, LinearErc721Voting, LinearErc721VotingConfig};
pub use proposer::ProposerGate;
pub use tally::{ProposalVotes, VoteType};
