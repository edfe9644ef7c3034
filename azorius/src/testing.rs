use crate::address::Address;
use crate::clock::Clock;
use crate::proposal::ProposalId;
use crate::strategy::{SharedStrategy, StrategyError, VotingStrategy};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub(crate) fn shared<S: VotingStrategy + 'static>(strategy: &Arc<RwLock<S>>) -> SharedStrategy {
    strategy.clone()
}

/// A strategy whose outcome is set directly by the test
#[derive(Debug)]
pub(crate) struct ScriptedStrategy {
    address: Address,
    azorius: Address,
    clock: Arc<dyn Clock>,
    voting_period: u64,
    proposers: HashSet<Address>,
    voting_end: HashMap<ProposalId, u64>,
    passed: HashSet<ProposalId>,
    fail_next: bool,
}

impl ScriptedStrategy {
    pub fn new(
        address: Address,
        azorius: Address,
        clock: Arc<dyn Clock>,
        voting_period: u64,
    ) -> Self {
        Self {
            address,
            azorius,
            clock,
            voting_period,
            proposers: HashSet::new(),
            voting_end: HashMap::new(),
            passed: HashSet::new(),
            fail_next: false,
        }
    }

    pub fn allow_proposer(&mut self, proposer: Address) {
        self.proposers.insert(proposer);
    }

    pub fn set_passed(&mut self, proposal_id: ProposalId, passed: bool) {
        if passed {
            self.passed.insert(proposal_id);
        } else {
            self.passed.remove(&proposal_id);
        }
    }

    pub fn fail_next_initialization(&mut self) {
        self.fail_next = true;
    }
}

impl VotingStrategy for ScriptedStrategy {
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
        if std::mem::take(&mut self.fail_next) {
            return Err(StrategyError::InvalidParams);
        }
        let end = self.clock.block_number() + self.voting_period;
        self.voting_end.insert(proposal_id, end);
        Ok(())
    }

    fn is_passed(&self, proposal_id: ProposalId) -> bool {
        let ended = self
            .voting_end
            .get(&proposal_id)
            .map(|end| self.clock.block_number() >= *end)
            .unwrap_or(false);
        ended && self.passed.contains(&proposal_id)
    }

    fn voting_end_block(&self, proposal_id: ProposalId) -> Option<u64> {
        self.voting_end.get(&proposal_id).copied()
    }

    fn is_proposer(&self, address: &Address) -> bool {
        self.proposers.contains(address)
    }
}
