use crate::event::StrategyEvent;
use crate::hats::HatId;
use crate::proposer::ProposerGate;
use crate::tally::{self, ProposalVotes, VoteType};
use azorius::access::{AccessPolicy, Ownable};
use azorius::clock::Clock;
use azorius::config::InitializerBlob;
use azorius::math::ppm_of;
use azorius::strategy::{StrategyError, VotingStrategy};
use azorius::votes::VotingPower;
use azorius::{Address, ProposalId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearErc20VotingConfig {
    pub owner: Address,

    /// Token whose delegated balances are the voting weight
    pub governance_token: Address,

    /// The only module allowed to initialize proposals
    pub azorius: Address,

    /// Length of voting in blocks
    pub voting_period: u32,

    /// Share of the total supply (parts per million) that must vote yes or
    /// abstain
    pub quorum_numerator: u128,

    /// Share of yes + no votes (parts per million) that must be yes
    pub basis_numerator: u128,
}

impl Default for LinearErc20VotingConfig {
    fn default() -> Self {
        LinearErc20VotingConfig {
            owner: Address::ZERO,
            governance_token: Address::ZERO,
            azorius: Address::ZERO,
            voting_period: 100,
            quorum_numerator: 40_000,
            basis_numerator: 500_000,
        }
    }
}

impl InitializerBlob for LinearErc20VotingConfig {}

/// Token weighted voting where each token counts once, as delegated at the
/// block before the proposal was created.
#[derive(Debug)]
pub struct LinearErc20Voting {
    address: Address,
    azorius: Address,
    governance_token: Address,
    access: Box<dyn AccessPolicy>,
    clock: Arc<dyn Clock>,
    votes: Arc<dyn VotingPower>,
    proposer: ProposerGate,

    voting_period: u32,
    quorum_numerator: u128,
    basis_numerator: u128,

    proposals: HashMap<ProposalId, ProposalVotes>,
    has_voted: HashSet<(ProposalId, Address)>,

    events: VecDeque<StrategyEvent>,
}

impl LinearErc20Voting {
    pub fn new(
        address: Address,
        config: LinearErc20VotingConfig,
        clock: Arc<dyn Clock>,
        votes: Arc<dyn VotingPower>,
        proposer: ProposerGate,
    ) -> Result<Self, StrategyError> {
        tally::validate_quorum_numerator(config.quorum_numerator)?;
        tally::validate_basis_numerator(config.basis_numerator)?;

        let mut events = VecDeque::new();
        events.push_back(StrategyEvent::StrategySetUp {
            azorius: config.azorius,
            owner: config.owner,
        });

        Ok(Self {
            address,
            azorius: config.azorius,
            governance_token: config.governance_token,
            access: Box::new(Ownable::new(config.owner)),
            clock,
            votes,
            proposer,
            voting_period: config.voting_period,
            quorum_numerator: config.quorum_numerator,
            basis_numerator: config.basis_numerator,
            proposals: HashMap::new(),
            has_voted: HashSet::new(),
            events,
        })
    }

    pub fn azorius(&self) -> Address {
        self.azorius
    }

    pub fn governance_token(&self) -> Address {
        self.governance_token
    }

    pub fn voting_period(&self) -> u32 {
        self.voting_period
    }

    pub fn quorum_numerator(&self) -> u128 {
        self.quorum_numerator
    }

    pub fn basis_numerator(&self) -> u128 {
        self.basis_numerator
    }

    pub fn proposer_gate(&self) -> &ProposerGate {
        &self.proposer
    }

    pub fn drain_events(&mut self) -> Vec<StrategyEvent> {
        self.events.drain(..).collect()
    }

    /// Cast `voter`'s full weight on a proposal. Returns the weight counted.
    #[tracing::instrument(skip(self))]
    pub fn vote(
        &mut self,
        voter: &Address,
        proposal_id: ProposalId,
        vote_type: VoteType,
    ) -> Result<u128, StrategyError> {
        let votes = self
            .proposals
            .get(&proposal_id)
            .ok_or(StrategyError::InvalidProposal(proposal_id))?;

        if votes.has_ended(self.clock.block_number()) {
            return Err(StrategyError::VotingEnded(proposal_id));
        }

        if self.has_voted.contains(&(proposal_id, *voter)) {
            return Err(StrategyError::AlreadyVoted {
                voter: *voter,
                proposal_id,
            });
        }

        let weight = self.weight_at_start(voter, votes.voting_start_block)?;
        if weight == 0 {
            return Err(StrategyError::NoVotingWeight(*voter));
        }

        if let Some(votes) = self.proposals.get_mut(&proposal_id) {
            votes.record(vote_type, weight);
        }
        self.has_voted.insert((proposal_id, *voter));

        self.events.push_back(StrategyEvent::Voted {
            voter: *voter,
            proposal_id,
            vote_type,
            weight,
        });
        debug!(%voter, proposal_id, ?vote_type, weight, "vote cast");

        Ok(weight)
    }

    pub fn has_voted(&self, proposal_id: ProposalId, voter: &Address) -> bool {
        self.has_voted.contains(&(proposal_id, *voter))
    }

    pub fn get_proposal_votes(&self, proposal_id: ProposalId) -> Option<ProposalVotes> {
        self.proposals.get(&proposal_id).copied()
    }

    pub fn voting_start_block(&self, proposal_id: ProposalId) -> Option<u64> {
        self.proposals
            .get(&proposal_id)
            .map(|votes| votes.voting_start_block)
    }

    /// Weight `voter` has (or had) on a proposal
    pub fn get_voting_weight(
        &self,
        voter: &Address,
        proposal_id: ProposalId,
    ) -> Result<u128, StrategyError> {
        let votes = self
            .proposals
            .get(&proposal_id)
            .ok_or(StrategyError::InvalidProposal(proposal_id))?;
        self.weight_at_start(voter, votes.voting_start_block)
    }

    /// Yes + abstain votes a proposal needs
    pub fn quorum_votes(&self, proposal_id: ProposalId) -> Result<u128, StrategyError> {
        let votes = self
            .proposals
            .get(&proposal_id)
            .ok_or(StrategyError::InvalidProposal(proposal_id))?;
        let supply = match votes.voting_start_block.checked_sub(1) {
            Some(block) => self.votes.past_total_supply(block)?,
            None => 0,
        };
        Ok(ppm_of(supply, self.quorum_numerator)?)
    }

    pub fn meets_quorum(&self, proposal_id: ProposalId) -> bool {
        match (self.proposals.get(&proposal_id), self.quorum_votes(proposal_id)) {
            (Some(votes), Ok(quorum)) => votes.quorum_votes_cast() >= quorum,
            _ => false,
        }
    }

    pub fn meets_basis(&self, yes_votes: u128, no_votes: u128) -> bool {
        tally::meets_basis(yes_votes, no_votes, self.basis_numerator)
    }

    // Weights are read at the block before voting started, so balances
    // moved in the proposal's own block do not count.
    fn weight_at_start(
        &self,
        voter: &Address,
        voting_start_block: u64,
    ) -> Result<u128, StrategyError> {
        match voting_start_block.checked_sub(1) {
            Some(block) => Ok(self.votes.past_votes(voter, block)?),
            None => Ok(0),
        }
    }

    fn proposer_weight(&self, address: &Address) -> u128 {
        self.clock
            .block_number()
            .checked_sub(1)
            .and_then(|block| self.votes.past_votes(address, block).ok())
            .unwrap_or(0)
    }

    // Owner operations

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

    pub fn update_quorum_numerator(
        &mut self,
        caller: &Address,
        quorum_numerator: u128,
    ) -> Result<(), StrategyError> {
        self.access.ensure_authorized(caller)?;
        tally::validate_quorum_numerator(quorum_numerator)?;
        self.quorum_numerator = quorum_numerator;
        self.events
            .push_back(StrategyEvent::QuorumNumeratorUpdated { quorum_numerator });
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

    pub fn update_required_proposer_weight(
        &mut self,
        caller: &Address,
        required_proposer_weight: u128,
    ) -> Result<(), StrategyError> {
        self.access.ensure_authorized(caller)?;
        self.proposer.set_required_weight(required_proposer_weight)?;
        self.events
            .push_back(StrategyEvent::RequiredProposerWeightUpdated {
                required_proposer_weight,
            });
        Ok(())
    }

    pub fn whitelist_hat(&mut self, caller: &Address, hat_id: HatId) -> Result<(), StrategyError> {
        self.access.ensure_authorized(caller)?;
        self.proposer.hats_mut()?.whitelist(hat_id)?;
        self.events.push_back(StrategyEvent::HatWhitelisted { hat_id });
        info!(hat_id, "hat whitelisted");
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
        info!(hat_id, "hat removed from whitelist");
        Ok(())
    }

    pub fn set_access_policy(
        &mut self,
        caller: &Address,
        access: Box<dyn AccessPolicy>,
    ) -> Result<(), StrategyError> {
        self.access.ensure_authorized(caller)?;
        self.access = access;
        self.events.push_back(StrategyEvent::AccessPolicyChanged);
        Ok(())
    }
}

impl VotingStrategy for LinearErc20Voting {
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
        info!(proposal_id, voting_end_block = end, "voting opened");

        Ok(())
    }

    fn is_passed(&self, proposal_id: ProposalId) -> bool {
        let Some(votes) = self.proposals.get(&proposal_id) else {
            return false;
        };

        votes.has_ended(self.clock.block_number())
            && self.meets_quorum(proposal_id)
            && self.meets_basis(votes.yes_votes, votes.no_votes)
    }

    fn voting_end_block(&self, proposal_id: ProposalId) -> Option<u64> {
        self.proposals
            .get(&proposal_id)
            .map(|votes| votes.voting_end_block)
    }

    fn is_proposer(&self, address: &Address) -> bool {
        self.proposer
            .admits(address, |address| self.proposer_weight(address))
    }
}
