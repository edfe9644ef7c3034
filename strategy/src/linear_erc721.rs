use crate::event::StrategyEvent;
use crate::hats::HatId;
use crate::nft::NftOwnership;
use crate::proposer::ProposerGate;
use crate::tally::{self, ProposalVotes, VoteType};
use azorius::access::{AccessPolicy, Ownable};
use azorius::clock::Clock;
use azorius::config::InitializerBlob;
use azorius::strategy::{StrategyError, VotingStrategy};
use azorius::{Address, ProposalId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceToken {
    pub address: Address,
    /// Weight of each id of this token
    pub weight: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearErc721VotingConfig {
    pub owner: Address,
    pub tokens: Vec<GovernanceToken>,
    pub azorius: Address,
    pub voting_period: u32,

    /// Absolute yes + abstain weight a proposal needs
    pub quorum_threshold: u128,

    pub basis_numerator: u128,
}

impl InitializerBlob for LinearErc721VotingConfig {}

/// Voting with non-fungible tokens: every (token, id) pair votes at most
/// once per proposal, with the weight configured for its token contract.
#[derive(Debug)]
pub struct LinearErc721Voting {
    address: Address,
    azorius: Address,
    access: Box<dyn AccessPolicy>,
    clock: Arc<dyn Clock>,
    nfts: Arc<dyn NftOwnership>,
    proposer: ProposerGate,

    /// Weight per governance token, in registration order
    tokens: Vec<GovernanceToken>,
    voting_period: u32,
    quorum_threshold: u128,
    basis_numerator: u128,

    proposals: HashMap<ProposalId, ProposalVotes>,
    voted_ids: HashSet<(ProposalId, Address, u64)>,

    events: VecDeque<StrategyEvent>,
}

impl LinearErc721Voting {
    pub fn new(
        address: Address,
        config: LinearErc721VotingConfig,
        clock: Arc<dyn Clock>,
        nfts: Arc<dyn NftOwnership>,
        proposer: ProposerGate,
    ) -> Result<Self, StrategyError> {
        tally::validate_basis_numerator(config.basis_numerator)?;

        let mut strategy = Self {
            address,
            azorius: config.azorius,
            access: Box::new(Ownable::new(config.owner)),
            clock,
            nfts,
            proposer,
            tokens: Vec::with_capacity(config.tokens.len()),
            voting_period: config.voting_period,
            quorum_threshold: config.quorum_threshold,
            basis_numerator: config.basis_numerator,
            proposals: HashMap::new(),
            voted_ids: HashSet::new(),
            events: VecDeque::new(),
        };

        strategy.events.push_back(StrategyEvent::StrategySetUp {
            azorius: config.azorius,
            owner: config.owner,
        });
        for token in config.tokens {
            strategy.insert_token(token)?;
        }

        Ok(strategy)
    }

    pub fn tokens(&self) -> &[GovernanceToken] {
        &self.tokens
    }

    pub fn quorum_threshold(&self) -> u128 {
        self.quorum_threshold
    }

    pub fn drain_events(&mut self) -> Vec<StrategyEvent> {
        self.events.drain(..).collect()
    }

    fn token_weight(&self, token: &Address) -> Option<u128> {
        self.tokens
            .iter()
            .find(|t| t.address == *token)
            .map(|t| t.weight)
    }

    fn insert_token(&mut self, token: GovernanceToken) -> Result<(), StrategyError> {
        if token.address.is_zero() {
            return Err(StrategyError::InvalidTokenAddress(token.address));
        }
        if self.token_weight(&token.address).is_some() {
            return Err(StrategyError::DuplicateToken(token.address));
        }
        self.tokens.push(token);
        self.events.push_back(StrategyEvent::GovernanceTokenAdded {
            token: token.address,
            weight: token.weight,
        });
        Ok(())
    }

    /// Current weight of every governance token `holder` owns
    pub fn held_weight(&self, holder: &Address) -> u128 {
        self.tokens.iter().fold(0u128, |acc, token| {
            let held = self.nfts.balance_of(&token.address, holder);
            acc.saturating_add(held.saturating_mul(token.weight))
        })
    }

    /// Vote with the given token ids. Returns the weight counted.
    #[tracing::instrument(skip(self, token_addresses, token_ids), fields(ids = token_ids.len()))]
    pub fn vote(
        &mut self,
        voter: &Address,
        proposal_id: ProposalId,
        vote_type: VoteType,
        token_addresses: &[Address],
        token_ids: &[u64],
    ) -> Result<u128, StrategyError> {
        if token_addresses.is_empty() || token_addresses.len() != token_ids.len() {
            return Err(StrategyError::InvalidParams);
        }

        let votes = self
            .proposals
            .get(&proposal_id)
            .ok_or(StrategyError::InvalidProposal(proposal_id))?;
        if votes.has_ended(self.clock.block_number()) {
            return Err(StrategyError::VotingEnded(proposal_id));
        }

        let mut weight = 0u128;
        let mut used = HashSet::with_capacity(token_ids.len());
        for (token, id) in token_addresses.iter().zip(token_ids) {
            let token_weight = self
                .token_weight(token)
                .ok_or(StrategyError::InvalidTokenAddress(*token))?;

            if self.nfts.owner_of(token, *id) != Some(*voter) {
                return Err(StrategyError::IdNotOwned {
                    token: *token,
                    id: *id,
                });
            }

            if self.voted_ids.contains(&(proposal_id, *token, *id)) || !used.insert((*token, *id)) {
                return Err(StrategyError::IdAlreadyVoted {
                    token: *token,
                    id: *id,
                });
            }

            weight = weight.saturating_add(token_weight);
        }

        if weight == 0 {
            return Err(StrategyError::NoVotingWeight(*voter));
        }

        if let Some(votes) = self.proposals.get_mut(&proposal_id) {
            votes.record(vote_type, weight);
        }
        self.voted_ids
            .extend(used.into_iter().map(|(token, id)| (proposal_id, token, id)));

        self.events.push_back(StrategyEvent::Voted {
            voter: *voter,
            proposal_id,
            vote_type,
            weight,
        });
        debug!(%voter, proposal_id, ?vote_type, weight, "vote cast");

        Ok(weight)
    }

    pub fn has_id_voted(&self, proposal_id: ProposalId, token: &Address, id: u64) -> bool {
        self.voted_ids.contains(&(proposal_id, *token, id))
    }

    pub fn get_proposal_votes(&self, proposal_id: ProposalId) -> Option<ProposalVotes> {
        self.proposals.get(&proposal_id).copied()
    }

    // Owner operations

    pub fn add_governance_token(
        &mut self,
        caller: &Address,
        token: Address,
        weight: u128,
    ) -> Result<(), StrategyError> {
        self.access.ensure_authorized(caller)?;
        self.insert_token(GovernanceToken {
            address: token,
            weight,
        })?;
        info!(%token, weight, "governance token added");
        Ok(())
    }

    pub fn remove_governance_token(
        &mut self,
        caller: &Address,
        token: Address,
    ) -> Result<(), StrategyError> {
        self.access.ensure_authorized(caller)?;
        let idx = self
            .tokens
            .iter()
            .position(|t| t.address == token)
            .ok_or(StrategyError::InvalidTokenAddress(token))?;
        self.tokens.remove(idx);
        self.events
            .push_back(StrategyEvent::GovernanceTokenRemoved { token });
        Ok(())
    }

    pub fn set_azorius(&mut self, caller: &Address, azorius: Address) -> Result<(), StrategyError> {
        self.access.ensure_authorized(caller)?;
        self.azorius = azorius;
        self.events.push_back(StrategyEvent::AzoriusSet { azorius });
        Ok(())
    }

    pub fn update_voting_period(
        &mut self,
        caller: &Address,
        voting_period: u32,
    ) -> Result<(), StrategyError> {
        self.access.ensure_authorized(caller)?;
        self.voting_period = voting_period;
        self.events
            .push_back(StrategyEvent::VotingPeriodUpdated { voting_period });
        Ok(())
    }

    pub fn update_quorum_threshold(
        &mut self,
        caller: &Address,
        quorum_threshold: u128,
    ) -> Result<(), StrategyError> {
        self.access.ensure_authorized(caller)?;
        self.quorum_threshold = quorum_threshold;
        self.events
            .push_back(StrategyEvent::QuorumThresholdUpdated { quorum_threshold });
        Ok(())
    }

    pub fn update_basis_numerator(
        &mut self,
        caller: &Address,
        basis_numerator: u128,
    ) -> Result<(), StrategyError> {
        self.access.ensure_authorized(caller)?;
        tally::validate_basis_numerator(basis_numerator)?;
        self.basis_numerator = basis_numerator;
        self.events
            .push_back(StrategyEvent::BasisNumeratorUpdated { basis_numerator });
        Ok(())
    }

    pub fn update_proposer_threshold(
        &mut self,
        caller: &Address,
        proposer_threshold: u128,
    ) -> Result<(), StrategyError> {
        self.access.ensure_authorized(caller)?;
        self.proposer.set_required_weight(proposer_threshold)?;
        self.events
            .push_back(StrategyEvent::RequiredProposerWeightUpdated {
                required_proposer_weight: proposer_threshold,
            });
        Ok(())
    }

    pub fn whitelist_hat(&mut self, caller: &Address, hat_id: HatId) -> Result<(), StrategyError> {
        self.access.ensure_authorized(caller)?;
        self.proposer.hats_mut()?.whitelist(hat_id)?;
        self.events.push_back(StrategyEvent::HatWhitelisted { hat_id });
        Ok(())
    }

    pub fn remove_hat_from_whitelist(
        &mut self,
        caller: &Address,
        hat_id: HatId,
    ) -> Result<(), StrategyError> {
        self.access.ensure_authorized(caller)?;
        self.proposer.hats_mut()?.remove(hat_id)?;
        self.events
            .push_back(StrategyEvent::HatRemovedFromWhitelist { hat_id });
        Ok(())
    }
}

impl VotingStrategy for LinearErc721Voting {
    fn address(&self) -> Address {
        self.address
    }

    fn initialize_proposal(
        &mut self,
        caller: &Address,
        proposal_id: ProposalId,
        _proposer: &Address,
        _data: &[u8],
    ) -> Result<(), StrategyError> {
        if *caller != self.azorius {
            return Err(StrategyError::OnlyAzorius(*caller));
        }
        if self.proposals.contains_key(&proposal_id) {
            return Err(StrategyError::ProposalAlreadyInitialized(proposal_id));
        }

        let start = self.clock.block_number();
        let end = start.saturating_add(self.voting_period as u64);
        self.proposals
            .insert(proposal_id, ProposalVotes::new(start, end));
        self.events.push_back(StrategyEvent::ProposalInitialized {
            proposal_id,
            voting_end_block: end,
        });

        Ok(())
    }

    fn is_passed(&self, proposal_id: ProposalId) -> bool {
        let Some(votes) = self.proposals.get(&proposal_id) else {
            return false;
        };

        votes.has_ended(self.clock.block_number())
            && votes.quorum_votes_cast() >= self.quorum_threshold
            && tally::meets_basis(votes.yes_votes, votes.no_votes, self.basis_numerator)
    }

    fn voting_end_block(&self, proposal_id: ProposalId) -> Option<u64> {
        self.proposals
            .get(&proposal_id)
            .map(|votes| votes.voting_end_block)
    }

    fn is_proposer(&self, address: &Address) -> bool {
        self.proposer
            .admits(address, |address| self.held_weight(address))
    }
}
