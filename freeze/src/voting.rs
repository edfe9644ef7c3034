//! Veto voting by a parent organization.
//!
//! Votes accumulate in rounds. A vote cast while no round is open (or the
//! last one is older than the freeze proposal period) opens a new round and
//! resets the count. The child is frozen while the count of the latest round
//! meets the threshold and the round is younger than the freeze period.

use crate::error::{Error, Result};
use crate::event::FreezeEvent;
use azorius::access::{AccessPolicy, Ownable};
use azorius::avatar::SafeOwners;
use azorius::clock::Clock;
use azorius::config::InitializerBlob;
use azorius::votes::VotingPower;
use azorius::Address;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info};

pub type SharedFreezeVoting = Arc<RwLock<FreezeVoting>>;

/// Where a voter's freeze weight comes from
pub trait FreezeWeight: Debug + Send + Sync {
    /// Weight of `voter` as of the end of `block`. `None` means before the
    /// first block, when nobody has weight.
    fn freeze_weight(&self, voter: &Address, block: Option<u64>) -> Result<u128>;
}

/// Delegated votes of the parent's governance token
#[derive(Debug, Clone)]
pub struct TokenFreezeWeight {
    votes: Arc<dyn VotingPower>,
}

impl TokenFreezeWeight {
    pub fn new(votes: Arc<dyn VotingPower>) -> Self {
        Self { votes }
    }
}

impl FreezeWeight for TokenFreezeWeight {
    fn freeze_weight(&self, voter: &Address, block: Option<u64>) -> Result<u128> {
        match block {
            Some(block) => Ok(self.votes.past_votes(voter, block)?),
            None => Ok(0),
        }
    }
}

/// One vote per owner of the parent multisig
#[derive(Debug, Clone)]
pub struct MultisigFreezeWeight {
    parent: Arc<dyn SafeOwners>,
}

impl MultisigFreezeWeight {
    pub fn new(parent: Arc<dyn SafeOwners>) -> Self {
        Self { parent }
    }
}

impl FreezeWeight for MultisigFreezeWeight {
    fn freeze_weight(&self, voter: &Address, _block: Option<u64>) -> Result<u128> {
        if !self.parent.is_owner(voter) {
            return Err(Error::NotOwner(*voter));
        }
        Ok(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeVotingConfig {
    pub owner: Address,

    /// The parent organization (token or multisig) whose members vote
    pub parent: Address,

    /// Votes needed within a round to freeze
    pub freeze_votes_threshold: u128,

    /// Blocks a round stays open for votes
    pub freeze_proposal_period: u32,

    /// Blocks a freeze lasts, counted from the round's start
    pub freeze_period: u32,
}

impl InitializerBlob for FreezeVotingConfig {}

#[derive(Debug)]
pub struct FreezeVoting {
    address: Address,
    access: Box<dyn AccessPolicy>,
    clock: Arc<dyn Clock>,
    weights: Box<dyn FreezeWeight>,

    freeze_votes_threshold: u128,
    freeze_proposal_period: u32,
    freeze_period: u32,

    /// Block the latest round was opened at
    round: Option<u64>,
    vote_count: u128,
    /// (voter, round start block)
    has_voted: HashSet<(Address, u64)>,

    events: VecDeque<FreezeEvent>,
}

impl FreezeVoting {
    pub fn new(
        address: Address,
        config: FreezeVotingConfig,
        clock: Arc<dyn Clock>,
        weights: Box<dyn FreezeWeight>,
    ) -> Self {
        let mut events = VecDeque::new();
        events.push_back(FreezeEvent::FreezeVotingSetUp {
            owner: config.owner,
            parent: config.parent,
        });

        Self {
            address,
            access: Box::new(Ownable::new(config.owner)),
            clock,
            weights,
            freeze_votes_threshold: config.freeze_votes_threshold,
            freeze_proposal_period: config.freeze_proposal_period,
            freeze_period: config.freeze_period,
            round: None,
            vote_count: 0,
            has_voted: HashSet::new(),
            events,
        }
    }

    pub fn shared(self) -> SharedFreezeVoting {
        Arc::new(RwLock::new(self))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn freeze_votes_threshold(&self) -> u128 {
        self.freeze_votes_threshold
    }

    pub fn freeze_proposal_period(&self) -> u32 {
        self.freeze_proposal_period
    }

    pub fn freeze_period(&self) -> u32 {
        self.freeze_period
    }

    /// Start block of the latest round, 0 if none was ever opened
    pub fn freeze_proposal_created_block(&self) -> u64 {
        self.round.unwrap_or(0)
    }

    pub fn freeze_proposal_vote_count(&self) -> u128 {
        self.vote_count
    }

    pub fn user_has_freeze_voted(&self, voter: &Address, round: u64) -> bool {
        self.has_voted.contains(&(*voter, round))
    }

    pub fn drain_events(&mut self) -> Vec<FreezeEvent> {
        self.events.drain(..).collect()
    }

    fn open_round(&self, now: u64) -> Option<u64> {
        self.round
            .filter(|created| now < created.saturating_add(self.freeze_proposal_period as u64))
    }

    pub fn is_frozen(&self) -> bool {
        let now = self.clock.block_number();
        match self.round {
            Some(created) => {
                self.vote_count >= self.freeze_votes_threshold
                    && now < created.saturating_add(self.freeze_period as u64)
            }
            None => false,
        }
    }

    /// Add `voter`'s weight to the open round, or open a new one
    #[tracing::instrument(skip(self))]
    pub fn cast_freeze_vote(&mut self, voter: &Address) -> Result<u128> {
        let now = self.clock.block_number();

        let weight = match self.open_round(now) {
            Some(created) => {
                let weight = self.weights.freeze_weight(voter, created.checked_sub(1))?;
                if weight == 0 {
                    return Err(Error::NoVotes(*voter));
                }
                if self.has_voted.contains(&(*voter, created)) {
                    return Err(Error::AlreadyVoted {
                        voter: *voter,
                        round: created,
                    });
                }

                self.vote_count = self.vote_count.saturating_add(weight);
                self.has_voted.insert((*voter, created));
                weight
            }
            None => {
                let weight = self.weights.freeze_weight(voter, now.checked_sub(1))?;
                if weight == 0 {
                    return Err(Error::NoVotes(*voter));
                }

                self.round = Some(now);
                self.vote_count = weight;
                self.has_voted.insert((*voter, now));
                self.events
                    .push_back(FreezeEvent::FreezeProposalCreated { creator: *voter });
                info!(%voter, block = now, "freeze round opened");
                weight
            }
        };

        self.events.push_back(FreezeEvent::FreezeVoteCast {
            voter: *voter,
            votes_cast: weight,
        });
        debug!(%voter, weight, count = self.vote_count, "freeze vote cast");

        if self.is_frozen() {
            info!(count = self.vote_count, "dao frozen");
        }

        Ok(weight)
    }

    /// Clear the vote count. The round keeps its start block.
    pub fn unfreeze(&mut self, caller: &Address) -> Result<()> {
        self.access.ensure_authorized(caller)?;
        self.vote_count = 0;
        self.events.push_back(FreezeEvent::Unfrozen);
        info!("dao unfrozen");
        Ok(())
    }

    pub fn update_freeze_votes_threshold(
        &mut self,
        caller: &Address,
        threshold: u128,
    ) -> Result<()> {
        self.access.ensure_authorized(caller)?;
        self.freeze_votes_threshold = threshold;
        self.events.push_back(FreezeEvent::FreezeVotesThresholdUpdated {
            freeze_votes_threshold: threshold,
        });
        Ok(())
    }

    pub fn update_freeze_proposal_period(&mut self, caller: &Address, period: u32) -> Result<()> {
        self.access.ensure_authorized(caller)?;
        self.freeze_proposal_period = period;
        self.events.push_back(FreezeEvent::FreezeProposalPeriodUpdated {
            freeze_proposal_period: period,
        });
        Ok(())
    }

    pub fn update_freeze_period(&mut self, caller: &Address, period: u32) -> Result<()> {
        self.access.ensure_authorized(caller)?;
        self.freeze_period = period;
        self.events.push_back(FreezeEvent::FreezePeriodUpdated {
            freeze_period: period,
        });
        Ok(())
    }

    pub fn set_access_policy(
        &mut self,
        caller: &Address,
        access: Box<dyn AccessPolicy>,
    ) -> Result<()> {
        self.access.ensure_authorized(caller)?;
        self.access = access;
        self.events.push_back(FreezeEvent::AccessPolicyChanged);
        Ok(())
    }
}
