//! Checkpointed voting power.
//!
//! Strategies and freeze voting read historical weights through
//! [`VotingPower`]. [`VotesLedger`] is an in-memory token with delegation
//! that records a checkpoint whenever a delegate's votes or the total supply
//! change, so weights can be read as of any past block.

use crate::address::Address;
use crate::clock::Clock;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VotesError {
    #[error("block {requested} is not yet final (current block {current})")]
    FutureLookup { requested: u64, current: u64 },

    #[error("{account} has balance {balance}, cannot move {amount}")]
    InsufficientBalance {
        account: Address,
        balance: u128,
        amount: u128,
    },

    #[error("supply overflow")]
    Overflow,
}

pub trait VotingPower: Debug + Send + Sync {
    /// Votes delegated to `account` at the end of `block`
    fn past_votes(&self, account: &Address, block: u64) -> Result<u128, VotesError>;

    /// Total supply at the end of `block`
    fn past_total_supply(&self, block: u64) -> Result<u128, VotesError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Checkpoint {
    block: u64,
    value: u128,
}

#[derive(Debug, Default)]
struct Checkpoints(Vec<Checkpoint>);

impl Checkpoints {
    fn latest(&self) -> u128 {
        self.0.last().map(|c| c.value).unwrap_or(0)
    }

    fn at(&self, block: u64) -> u128 {
        // index of the first checkpoint after `block`
        let idx = self.0.partition_point(|c| c.block <= block);
        match idx {
            0 => 0,
            idx => self.0[idx - 1].value,
        }
    }

    fn push(&mut self, block: u64, value: u128) {
        match self.0.last_mut() {
            Some(last) if last.block == block => last.value = value,
            _ => self.0.push(Checkpoint { block, value }),
        }
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Address, u128>,
    delegates: HashMap<Address, Address>,
    votes: HashMap<Address, Checkpoints>,
    total_supply: Checkpoints,
}

impl LedgerState {
    fn move_votes(&mut self, block: u64, from: Option<Address>, to: Option<Address>, amount: u128) {
        if from == to || amount == 0 {
            return;
        }

        if let Some(from) = from {
            let checkpoints = self.votes.entry(from).or_default();
            let value = checkpoints.latest().saturating_sub(amount);
            checkpoints.push(block, value);
        }

        if let Some(to) = to {
            let checkpoints = self.votes.entry(to).or_default();
            let value = checkpoints.latest().saturating_add(amount);
            checkpoints.push(block, value);
        }
    }
}

/// An in-memory governance token with delegation and vote checkpoints.
///
/// Balances only count as votes once delegated (self-delegation included).
#[derive(Debug)]
pub struct VotesLedger {
    clock: Arc<dyn Clock>,
    state: RwLock<LedgerState>,
}

impl VotesLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: RwLock::new(LedgerState::default()),
        }
    }

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.state
            .read()
            .balances
            .get(account)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.state.read().total_supply.latest()
    }

    pub fn delegates(&self, account: &Address) -> Option<Address> {
        self.state.read().delegates.get(account).copied()
    }

    /// Current votes of `account`
    pub fn votes(&self, account: &Address) -> u128 {
        self.state
            .read()
            .votes
            .get(account)
            .map(Checkpoints::latest)
            .unwrap_or(0)
    }

    pub fn mint(&self, to: Address, amount: u128) -> Result<(), VotesError> {
        let block = self.clock.block_number();
        let mut state = self.state.write();

        let supply = state
            .total_supply
            .latest()
            .checked_add(amount)
            .ok_or(VotesError::Overflow)?;
        state.total_supply.push(block, supply);
        *state.balances.entry(to).or_default() += amount;

        let delegate = state.delegates.get(&to).copied();
        state.move_votes(block, None, delegate, amount);

        Ok(())
    }

    pub fn transfer(&self, from: Address, to: Address, amount: u128) -> Result<(), VotesError> {
        let block = self.clock.block_number();
        let mut state = self.state.write();

        let balance = state.balances.get(&from).copied().unwrap_or(0);
        if balance < amount {
            return Err(VotesError::InsufficientBalance {
                account: from,
                balance,
                amount,
            });
        }

        state.balances.insert(from, balance - amount);
        *state.balances.entry(to).or_default() += amount;

        let from_delegate = state.delegates.get(&from).copied();
        let to_delegate = state.delegates.get(&to).copied();
        state.move_votes(block, from_delegate, to_delegate, amount);

        Ok(())
    }

    /// Point all of `delegator`'s current and future balance at `delegatee`
    pub fn delegate(&self, delegator: Address, delegatee: Address) {
        let block = self.clock.block_number();
        let mut state = self.state.write();

        let previous = state.delegates.insert(delegator, delegatee);
        let balance = state.balances.get(&delegator).copied().unwrap_or(0);
        state.move_votes(block, previous, Some(delegatee), balance);
    }

    fn ensure_final(&self, block: u64) -> Result<(), VotesError> {
        let current = self.clock.block_number();
        if block >= current {
            return Err(VotesError::FutureLookup {
                requested: block,
                current,
            });
        }
        Ok(())
    }
}

impl VotingPower for VotesLedger {
    fn past_votes(&self, account: &Address, block: u64) -> Result<u128, VotesError> {
        self.ensure_final(block)?;
        Ok(self
            .state
            .read()
            .votes
            .get(account)
            .map(|c| c.at(block))
            .unwrap_or(0))
    }

    fn past_total_supply(&self, block: u64) -> Result<u128, VotesError> {
        self.ensure_final(block)?;
        Ok(self.state.read().total_supply.at(block))
    }
}
