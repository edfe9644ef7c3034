use crate::access::{AccessPolicy, Ownable, Unauthorized};
use crate::address::Address;
use crate::avatar::{Avatar, AvatarError};
use crate::clock::Clock;
use crate::config::AzoriusConfig;
use crate::event::AzoriusEvent;
use crate::guard::{Guard, GuardError};
use crate::proposal::{Proposal, ProposalId, ProposalInfo, ProposalState};
use crate::registry::{RegistryError, StrategyRegistry};
use crate::strategy::{SharedStrategy, StrategyError};
use crate::transaction::{Operation, Transaction, TxHash};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type Result<T> = std::result::Result<T, AzoriusError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AzoriusError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("unauthorized")]
    Unauthorized(#[from] Unauthorized),

    #[error("strategy registry error")]
    Registry(#[from] RegistryError),

    #[error("strategy {0} is not enabled")]
    StrategyDisabled(Address),

    #[error("{0} may not submit proposals with this strategy")]
    InvalidProposer(Address),

    #[error("strategy error")]
    Strategy(#[from] StrategyError),

    #[error("proposal {0} does not exist")]
    InvalidProposal(ProposalId),

    #[error("transaction arrays must be non-empty and of equal length")]
    InvalidArrayLengths,

    #[error("{supplied} transactions after {counter} executed exceeds the {total} in the proposal")]
    InvalidTxsCount {
        counter: u32,
        supplied: usize,
        total: usize,
    },

    #[error("proposal {proposal_id} is {state}, not executable")]
    ProposalNotExecutable {
        proposal_id: ProposalId,
        state: ProposalState,
    },

    #[error("transaction {index} does not match proposal {proposal_id}")]
    InvalidTxs {
        proposal_id: ProposalId,
        index: usize,
    },

    #[error("proposal {proposal_id} has no transaction {index}")]
    InvalidTxIndex {
        proposal_id: ProposalId,
        index: usize,
    },

    #[error("rejected by guard")]
    Guard(#[from] GuardError),

    #[error("execution failed")]
    TxFailed(#[from] AvatarError),

    #[error("proposal id space exhausted")]
    TooManyProposals,
}

/// Collaborators an [`Azorius`] module is constructed with
#[derive(Debug)]
pub struct AzoriusDeps {
    pub clock: Arc<dyn Clock>,

    /// Execution handle of the configured target
    pub target: Arc<dyn Avatar>,

    /// Initially enabled strategies, enabled in order
    pub strategies: Vec<SharedStrategy>,

    /// Replaces the single owner policy derived from the config
    pub access: Option<Box<dyn AccessPolicy>>,
}

/// The proposal engine.
///
/// Owns proposal records and the strategy registry, asks each proposal's
/// strategy when voting ends and whether it passed, enforces the timelock
/// and execution windows, and forwards approved transactions to the target.
#[derive(Debug)]
pub struct Azorius {
    address: Address,
    avatar: Address,
    target: Address,
    executor: Arc<dyn Avatar>,
    access: Box<dyn AccessPolicy>,
    clock: Arc<dyn Clock>,
    guard: Option<Arc<dyn Guard>>,

    /// Enabled strategies, in registry order
    strategies: StrategyRegistry,
    /// Handles of enabled strategies
    handles: HashMap<Address, SharedStrategy>,

    /// Indexed by proposal id
    proposals: Vec<Proposal>,

    /// Applied to proposals submitted from now on
    timelock_period: u32,
    execution_period: u32,

    events: VecDeque<AzoriusEvent>,
}

impl Azorius {
    /// Construct a module at `address`. `creator` is only reported in the
    /// set-up event.
    pub fn new(
        address: Address,
        creator: Address,
        config: AzoriusConfig,
        deps: AzoriusDeps,
    ) -> Result<Self> {
        if config.avatar.is_zero() {
            return Err(AzoriusError::InvalidConfig("avatar is the zero address"));
        }
        if config.target.is_zero() {
            return Err(AzoriusError::InvalidConfig("target is the zero address"));
        }

        let access = match deps.access {
            Some(access) => access,
            None if config.owner.is_zero() => {
                return Err(AzoriusError::InvalidConfig("owner is the zero address"))
            }
            None => Box::new(Ownable::new(config.owner)),
        };

        let mut azorius = Azorius {
            address,
            avatar: config.avatar,
            target: config.target,
            executor: deps.target,
            access,
            clock: deps.clock,
            guard: None,
            strategies: StrategyRegistry::new(),
            handles: HashMap::new(),
            proposals: Vec::new(),
            timelock_period: config.timelock_period,
            execution_period: config.execution_period,
            events: VecDeque::new(),
        };

        for strategy in deps.strategies {
            azorius.insert_strategy(strategy)?;
        }

        azorius.events.push_back(AzoriusEvent::AzoriusSetUp {
            creator,
            owner: config.owner,
            avatar: config.avatar,
            target: config.target,
        });
        azorius
            .events
            .push_back(AzoriusEvent::TimelockPeriodUpdated {
                timelock_period: config.timelock_period,
            });
        azorius
            .events
            .push_back(AzoriusEvent::ExecutionPeriodUpdated {
                execution_period: config.execution_period,
            });

        info!(%address, avatar = %config.avatar, target = %config.target, "azorius set up");

        Ok(azorius)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn avatar(&self) -> Address {
        self.avatar
    }

    pub fn target(&self) -> Address {
        self.target
    }

    pub fn timelock_period(&self) -> u32 {
        self.timelock_period
    }

    pub fn execution_period(&self) -> u32 {
        self.execution_period
    }

    pub fn total_proposal_count(&self) -> u32 {
        self.proposals.len() as u32
    }

    pub fn guard(&self) -> Option<&Arc<dyn Guard>> {
        self.guard.as_ref()
    }

    /// Take all events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<AzoriusEvent> {
        self.events.drain(..).collect()
    }

    fn insert_strategy(&mut self, strategy: SharedStrategy) -> Result<Address> {
        let address = strategy.read().address();
        self.strategies.enable(address)?;
        self.handles.insert(address, strategy);
        self.events
            .push_back(AzoriusEvent::EnabledStrategy { strategy: address });
        Ok(address)
    }

    // Strategy registry

    #[tracing::instrument(skip(self, strategy))]
    pub fn enable_strategy(&mut self, caller: &Address, strategy: SharedStrategy) -> Result<()> {
        self.access.ensure_authorized(caller)?;
        let address = self.insert_strategy(strategy)?;
        info!(strategy = %address, "strategy enabled");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn disable_strategy(
        &mut self,
        caller: &Address,
        prev: Address,
        strategy: Address,
    ) -> Result<()> {
        self.access.ensure_authorized(caller)?;
        self.strategies.disable(prev, strategy)?;
        self.handles.remove(&strategy);
        self.events
            .push_back(AzoriusEvent::DisabledStrategy { strategy });
        info!(%strategy, "strategy disabled");
        Ok(())
    }

    pub fn is_strategy_enabled(&self, strategy: &Address) -> bool {
        self.strategies.is_enabled(strategy)
    }

    /// See [`StrategyRegistry::page`]
    pub fn get_strategies(&self, start: Address, page_size: usize) -> (Vec<Address>, Address) {
        self.strategies.page(start, page_size)
    }

    /// Handle of an enabled strategy
    pub fn strategy(&self, strategy: &Address) -> Option<SharedStrategy> {
        self.handles.get(strategy).cloned()
    }

    // Owner parameters

    pub fn update_timelock_period(&mut self, caller: &Address, timelock_period: u32) -> Result<()> {
        self.access.ensure_authorized(caller)?;
        self.timelock_period = timelock_period;
        self.events
            .push_back(AzoriusEvent::TimelockPeriodUpdated { timelock_period });
        Ok(())
    }

    pub fn update_execution_period(
        &mut self,
        caller: &Address,
        execution_period: u32,
    ) -> Result<()> {
        self.access.ensure_authorized(caller)?;
        self.execution_period = execution_period;
        self.events
            .push_back(AzoriusEvent::ExecutionPeriodUpdated { execution_period });
        Ok(())
    }

    pub fn set_guard(&mut self, caller: &Address, guard: Option<Arc<dyn Guard>>) -> Result<()> {
        self.access.ensure_authorized(caller)?;
        let installed = guard.is_some();
        self.guard = guard;
        self.events
            .push_back(AzoriusEvent::ChangedGuard { installed });
        info!(installed, "guard changed");
        Ok(())
    }

    pub fn set_avatar(&mut self, caller: &Address, avatar: Address) -> Result<()> {
        self.access.ensure_authorized(caller)?;
        if avatar.is_zero() {
            return Err(AzoriusError::InvalidConfig("avatar is the zero address"));
        }
        let previous = std::mem::replace(&mut self.avatar, avatar);
        self.events
            .push_back(AzoriusEvent::AvatarSet { previous, avatar });
        Ok(())
    }

    pub fn set_target(
        &mut self,
        caller: &Address,
        target: Address,
        executor: Arc<dyn Avatar>,
    ) -> Result<()> {
        self.access.ensure_authorized(caller)?;
        if target.is_zero() {
            return Err(AzoriusError::InvalidConfig("target is the zero address"));
        }
        let previous = std::mem::replace(&mut self.target, target);
        self.executor = executor;
        self.events
            .push_back(AzoriusEvent::TargetSet { previous, target });
        Ok(())
    }

    /// Replace the authorization policy, e.g. to transfer ownership
    pub fn set_access_policy(
        &mut self,
        caller: &Address,
        access: Box<dyn AccessPolicy>,
    ) -> Result<()> {
        self.access.ensure_authorized(caller)?;
        self.access = access;
        self.events.push_back(AzoriusEvent::AccessPolicyChanged);
        Ok(())
    }

    // Proposals

    /// Submit a batch of transactions to be voted on by `strategy`
    #[tracing::instrument(
        skip(self, data, transactions, metadata),
        fields(txs = transactions.len())
    )]
    pub fn submit_proposal(
        &mut self,
        caller: &Address,
        strategy: Address,
        data: &[u8],
        transactions: Vec<Transaction>,
        metadata: String,
    ) -> Result<ProposalId> {
        let handle = self
            .handles
            .get(&strategy)
            .cloned()
            .ok_or(AzoriusError::StrategyDisabled(strategy))?;

        if !handle.read().is_proposer(caller) {
            return Err(AzoriusError::InvalidProposer(*caller));
        }

        let proposal_id =
            ProposalId::try_from(self.proposals.len()).map_err(|_| AzoriusError::TooManyProposals)?;
        if u32::try_from(transactions.len()).is_err() {
            return Err(AzoriusError::InvalidArrayLengths);
        }

        handle
            .write()
            .initialize_proposal(&self.address, proposal_id, caller, data)?;

        let tx_hashes = transactions.iter().map(Transaction::hash).collect();
        self.proposals.push(Proposal {
            strategy: handle,
            strategy_address: strategy,
            proposer: *caller,
            tx_hashes,
            timelock_period: self.timelock_period,
            execution_period: self.execution_period,
            execution_counter: 0,
            metadata: metadata.clone(),
        });

        self.events.push_back(AzoriusEvent::ProposalCreated {
            strategy,
            proposal_id,
            proposer: *caller,
            transactions,
            metadata,
        });

        info!(proposal_id, %strategy, "proposal created");

        Ok(proposal_id)
    }

    fn proposal(&self, proposal_id: ProposalId) -> Result<&Proposal> {
        self.proposals
            .get(proposal_id as usize)
            .ok_or(AzoriusError::InvalidProposal(proposal_id))
    }

    /// Current lifecycle state, derived from the stored record, the
    /// proposal's strategy and the clock
    pub fn proposal_state(&self, proposal_id: ProposalId) -> Result<ProposalState> {
        let proposal = self.proposal(proposal_id)?;
        let strategy = proposal.strategy.read();

        let voting_end = strategy
            .voting_end_block(proposal_id)
            .ok_or(StrategyError::InvalidProposal(proposal_id))?;
        let now = self.clock.block_number();

        if now < voting_end {
            return Ok(ProposalState::Active);
        }

        if !strategy.is_passed(proposal_id) {
            return Ok(ProposalState::Failed);
        }

        if proposal.execution_counter as usize == proposal.tx_hashes.len() {
            return Ok(ProposalState::Executed);
        }

        let timelock_end = voting_end.saturating_add(proposal.timelock_period as u64);
        if now < timelock_end {
            return Ok(ProposalState::Timelocked);
        }

        let execution_end = timelock_end.saturating_add(proposal.execution_period as u64);
        if now < execution_end {
            return Ok(ProposalState::Executable);
        }

        Ok(ProposalState::Expired)
    }

    /// Execute the next `targets.len()` transactions of a proposal.
    ///
    /// The supplied bodies must hash to the proposal's next unexecuted
    /// hashes, in order. The whole batch is forwarded as one call; if it
    /// fails nothing changes.
    #[tracing::instrument(
        skip(self, targets, values, data, operations),
        fields(txs = targets.len())
    )]
    pub fn execute_proposal(
        &mut self,
        caller: &Address,
        proposal_id: ProposalId,
        targets: &[Address],
        values: &[u128],
        data: &[Vec<u8>],
        operations: &[Operation],
    ) -> Result<()> {
        if targets.is_empty() {
            return Err(AzoriusError::InvalidArrayLengths);
        }
        let transactions = Transaction::zip(targets, values, data, operations)
            .ok_or(AzoriusError::InvalidArrayLengths)?;

        let state = self.proposal_state(proposal_id)?;
        if state != ProposalState::Executable {
            warn!(proposal_id, %state, "proposal not executable");
            return Err(AzoriusError::ProposalNotExecutable { proposal_id, state });
        }

        let proposal = self.proposal(proposal_id)?;
        let counter = proposal.execution_counter;
        let start = counter as usize;
        if start + transactions.len() > proposal.tx_hashes.len() {
            return Err(AzoriusError::InvalidTxsCount {
                counter,
                supplied: transactions.len(),
                total: proposal.tx_hashes.len(),
            });
        }

        let mut tx_hashes = Vec::with_capacity(transactions.len());
        for (index, tx) in transactions.iter().enumerate() {
            let hash = tx.hash();
            if hash != proposal.tx_hashes[start + index] {
                return Err(AzoriusError::InvalidTxs {
                    proposal_id,
                    index: start + index,
                });
            }
            tx_hashes.push(hash);
        }

        if let Some(guard) = &self.guard {
            for tx in &transactions {
                guard.check_transaction(tx, caller)?;
            }
        }

        // effects before interaction
        let executed = transactions.len() as u32;
        self.proposals[proposal_id as usize].execution_counter = counter + executed;

        let outcome = self
            .executor
            .exec_transactions_from_module(&self.address, &transactions);

        if let Some(guard) = &self.guard {
            for hash in &tx_hashes {
                guard.check_after_execution(hash, outcome.is_ok());
            }
        }

        if let Err(err) = outcome {
            self.proposals[proposal_id as usize].execution_counter = counter;
            warn!(proposal_id, error = %err, "proposal execution failed");
            return Err(err.into());
        }

        debug!(proposal_id, executed, "transactions forwarded");
        info!(proposal_id, counter = counter + executed, "proposal executed");

        self.events.push_back(AzoriusEvent::ProposalExecuted {
            proposal_id,
            tx_hashes,
        });

        Ok(())
    }

    /// Convenience wrapper over [`Azorius::execute_proposal`] taking
    /// transaction structs
    pub fn execute_transactions(
        &mut self,
        caller: &Address,
        proposal_id: ProposalId,
        transactions: &[Transaction],
    ) -> Result<()> {
        let targets = transactions.iter().map(|tx| tx.to).collect::<Vec<_>>();
        let values = transactions.iter().map(|tx| tx.value).collect::<Vec<_>>();
        let data = transactions
            .iter()
            .map(|tx| tx.data.clone())
            .collect::<Vec<_>>();
        let operations = transactions
            .iter()
            .map(|tx| tx.operation)
            .collect::<Vec<_>>();

        self.execute_proposal(caller, proposal_id, &targets, &values, &data, &operations)
    }

    pub fn get_proposal(&self, proposal_id: ProposalId) -> Result<ProposalInfo> {
        Ok(self.proposal(proposal_id)?.info())
    }

    pub fn get_proposal_tx_hash(&self, proposal_id: ProposalId, index: usize) -> Result<TxHash> {
        self.proposal(proposal_id)?
            .tx_hashes
            .get(index)
            .copied()
            .ok_or(AzoriusError::InvalidTxIndex { proposal_id, index })
    }

    pub fn get_proposal_tx_hashes(&self, proposal_id: ProposalId) -> Result<Vec<TxHash>> {
        Ok(self.proposal(proposal_id)?.tx_hashes.clone())
    }

    pub fn get_tx_hash(tx: &Transaction) -> TxHash {
        tx.hash()
    }
}
