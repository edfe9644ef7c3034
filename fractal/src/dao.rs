//! A child DAO governed by token voting, frozen by a parent token DAO.
//!
//! Everything lives in memory on one [`BlockClock`]: the child multisig with
//! an Azorius module and a linear token voting strategy, the child and
//! parent governance tokens, and the parent's freeze voting with the guard
//! that makes the child's module honour it. The parent can also act on the
//! child directly through a [`FractalModule`].

use crate::config::Config;
use crate::scenario::{Ledger, Step};
use azorius::avatar::AvatarError;
use azorius::clock::{BlockClock, Clock};
use azorius::config::{AzoriusConfig, InitializerBlob};
use azorius::event::AzoriusEvent;
use azorius::factory::{FactoryError, ModuleFactory};
use azorius::guard::Guard;
use azorius::memory::MemorySafe;
use azorius::strategy::{SharedStrategy, StrategyError, VotingStrategy};
use azorius::votes::{VotesError, VotesLedger};
use azorius::{Address, Azorius, AzoriusDeps, AzoriusError, ProposalId, ProposalState, Transaction};
use freeze::{
    AzoriusFreezeGuard, AzoriusFreezeGuardConfig, ControllerEvent, FractalModule,
    FractalModuleConfig, FreezeEvent, FreezeVoting, FreezeVotingConfig, SharedFreezeVoting,
    TokenFreezeWeight,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use strategy::{LinearErc20Voting, LinearErc20VotingConfig, ProposerGate, StrategyEvent};
use tracing::{debug, info};

/// The child multisig
pub const SAFE: Address = Address::from_low_u64(0x5afe);

/// Label of the child's governance token
pub const GOVERNANCE_TOKEN: Address = Address::from_low_u64(0x70);

/// The parent organization. Signs for the child multisig and owns the
/// freeze contracts.
pub const PARENT: Address = Address::from_low_u64(0xbeef);

const AZORIUS_MASTERCOPY: &str = "Azorius";
const STRATEGY_MASTERCOPY: &str = "LinearErc20Voting";
const FREEZE_VOTING_MASTERCOPY: &str = "FreezeVoting";
const FREEZE_GUARD_MASTERCOPY: &str = "AzoriusFreezeGuard";
const FRACTAL_MODULE_MASTERCOPY: &str = "FractalModule";

#[derive(Debug, thiserror::Error)]
pub enum DaoError {
    #[error("deployment failed")]
    Factory(#[from] FactoryError),

    #[error("azorius error")]
    Azorius(#[from] AzoriusError),

    #[error("strategy error")]
    Strategy(#[from] StrategyError),

    #[error("freeze error")]
    Freeze(#[from] freeze::Error),

    #[error("token error")]
    Votes(#[from] VotesError),

    #[error("multisig error")]
    Avatar(#[from] AvatarError),

    #[error("proposal {0} was not submitted in this scenario")]
    UnknownProposal(ProposalId),
}

/// Governance parameters of the DAO pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaoConfig {
    pub timelock_period: u32,
    pub execution_period: u32,
    pub voting_period: u32,
    pub quorum_numerator: u128,
    pub basis_numerator: u128,
    pub required_proposer_weight: u128,
    pub freeze_votes_threshold: u128,
    pub freeze_proposal_period: u32,
    pub freeze_period: u32,
}

impl Default for DaoConfig {
    fn default() -> Self {
        let azorius = AzoriusConfig::default();
        let voting = LinearErc20VotingConfig::default();
        DaoConfig {
            timelock_period: azorius.timelock_period,
            execution_period: azorius.execution_period,
            voting_period: voting.voting_period,
            quorum_numerator: voting.quorum_numerator,
            basis_numerator: voting.basis_numerator,
            required_proposer_weight: 0,
            freeze_votes_threshold: 1,
            freeze_proposal_period: 100,
            freeze_period: 200,
        }
    }
}

impl From<&Config> for DaoConfig {
    fn from(config: &Config) -> Self {
        DaoConfig {
            timelock_period: config.timelock_period,
            execution_period: config.execution_period,
            voting_period: config.voting_period,
            quorum_numerator: config.quorum_numerator.into(),
            basis_numerator: config.basis_numerator.into(),
            required_proposer_weight: config.required_proposer_weight.into(),
            freeze_votes_threshold: config.freeze_votes_threshold.into(),
            freeze_proposal_period: config.freeze_proposal_period,
            freeze_period: config.freeze_period,
        }
    }
}

impl DaoConfig {
    fn azorius(&self) -> AzoriusConfig {
        AzoriusConfig {
            owner: SAFE,
            avatar: SAFE,
            target: SAFE,
            timelock_period: self.timelock_period,
            execution_period: self.execution_period,
        }
    }
}

/// One line of `fractal run` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Report {
    Azorius(AzoriusEvent),
    Strategy(StrategyEvent),
    Freeze(FreezeEvent),
    Controller(ControllerEvent),
    State {
        block: u64,
        proposal_id: ProposalId,
        state: ProposalState,
    },
    Failed {
        step: usize,
        error: String,
    },
}

#[derive(Debug)]
pub struct Dao {
    clock: Arc<BlockClock>,
    token: Arc<VotesLedger>,
    parent_token: Arc<VotesLedger>,
    safe: Arc<MemorySafe>,
    azorius: Azorius,
    strategy: Arc<RwLock<LinearErc20Voting>>,
    strategy_address: Address,
    freeze_voting: SharedFreezeVoting,
    fractal_module: FractalModule,

    /// Transaction bodies of submitted proposals, needed to execute them
    bodies: HashMap<ProposalId, Vec<Transaction>>,
    reports: Vec<Report>,
}

impl Dao {
    /// Address the Azorius module of a DAO with `config` is deployed at
    pub fn predict_azorius(config: &DaoConfig, salt: u64) -> Result<Address, DaoError> {
        let initializer = config.azorius().to_initializer().map_err(FactoryError::from)?;
        Ok(ModuleFactory::predict_address(
            AZORIUS_MASTERCOPY,
            &initializer,
            salt,
        ))
    }

    #[tracing::instrument]
    pub fn new(config: &DaoConfig, salt: u64) -> Result<Self, DaoError> {
        let clock = Arc::new(BlockClock::new(1));
        let token = Arc::new(VotesLedger::new(clock.clone()));
        let parent_token = Arc::new(VotesLedger::new(clock.clone()));
        let safe = Arc::new(MemorySafe::new(SAFE, vec![PARENT], 1)?);

        let mut factory = ModuleFactory::new();

        // the strategy must know the module before the module exists
        let azorius_address = Self::predict_azorius(config, salt)?;

        let strategy = factory.deploy_module(
            STRATEGY_MASTERCOPY,
            &LinearErc20VotingConfig {
                owner: SAFE,
                governance_token: GOVERNANCE_TOKEN,
                azorius: azorius_address,
                voting_period: config.voting_period,
                quorum_numerator: config.quorum_numerator,
                basis_numerator: config.basis_numerator,
            },
            salt,
            |address, strategy_config| {
                LinearErc20Voting::new(
                    address,
                    strategy_config,
                    clock.clone(),
                    token.clone(),
                    ProposerGate::token_weight(config.required_proposer_weight),
                )
            },
        )?;
        let strategy_address = strategy.address();
        let strategy = Arc::new(RwLock::new(strategy));

        let freeze_voting = factory.deploy_module(
            FREEZE_VOTING_MASTERCOPY,
            &FreezeVotingConfig {
                owner: PARENT,
                parent: PARENT,
                freeze_votes_threshold: config.freeze_votes_threshold,
                freeze_proposal_period: config.freeze_proposal_period,
                freeze_period: config.freeze_period,
            },
            salt,
            |address, freeze_config| {
                Ok::<_, freeze::Error>(FreezeVoting::new(
                    address,
                    freeze_config,
                    clock.clone(),
                    Box::new(TokenFreezeWeight::new(parent_token.clone())),
                ))
            },
        )?;
        let freeze_voting_address = freeze_voting.address();
        let freeze_voting = freeze_voting.shared();

        let guard = factory.deploy_module(
            FREEZE_GUARD_MASTERCOPY,
            &AzoriusFreezeGuardConfig {
                owner: PARENT,
                freeze_voting: freeze_voting_address,
            },
            salt,
            |_, guard_config| {
                AzoriusFreezeGuard::new(guard_config, freeze_voting.clone()).map(Arc::new)
            },
        )?;

        let strategy_handle: SharedStrategy = strategy.clone();
        let mut azorius = factory.deploy_module(
            AZORIUS_MASTERCOPY,
            &config.azorius(),
            salt,
            |address, azorius_config| {
                Azorius::new(
                    address,
                    PARENT,
                    azorius_config,
                    AzoriusDeps {
                        clock: clock.clone(),
                        target: safe.clone(),
                        strategies: vec![strategy_handle],
                        access: None,
                    },
                )
            },
        )?;

        safe.enable_module(azorius.address());
        azorius.set_guard(&SAFE, Some(guard as Arc<dyn Guard>))?;

        let fractal_module = factory.deploy_module(
            FRACTAL_MODULE_MASTERCOPY,
            &FractalModuleConfig {
                owner: PARENT,
                avatar: SAFE,
                target: SAFE,
                controllers: Vec::new(),
            },
            salt,
            |address, module_config| {
                Ok::<_, freeze::Error>(FractalModule::new(address, module_config, safe.clone()))
            },
        )?;
        safe.enable_module(fractal_module.address());

        info!(azorius = %azorius.address(), safe = %SAFE, "dao deployed");

        Ok(Self {
            clock,
            token,
            parent_token,
            safe,
            azorius,
            strategy,
            strategy_address,
            freeze_voting,
            fractal_module,
            bodies: HashMap::new(),
            reports: Vec::new(),
        })
    }

    pub fn block_number(&self) -> u64 {
        self.clock.block_number()
    }

    pub fn azorius(&self) -> &Azorius {
        &self.azorius
    }

    pub fn safe(&self) -> &MemorySafe {
        &self.safe
    }

    pub fn strategy_address(&self) -> Address {
        self.strategy_address
    }

    pub fn fractal_module(&self) -> &FractalModule {
        &self.fractal_module
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_voting.read().is_frozen()
    }

    pub fn proposal_state(&self, proposal_id: ProposalId) -> Result<ProposalState, DaoError> {
        Ok(self.azorius.proposal_state(proposal_id)?)
    }

    fn ledger(&self, ledger: Ledger) -> &VotesLedger {
        match ledger {
            Ledger::Child => &self.token,
            Ledger::Parent => &self.parent_token,
        }
    }

    /// Apply one scenario step
    #[tracing::instrument(skip(self))]
    pub fn apply(&mut self, step: Step) -> Result<(), DaoError> {
        match step {
            Step::Mine { blocks } => {
                let block = self.clock.mine(blocks);
                debug!(block, "mined");
            }
            Step::Mint {
                account,
                amount,
                ledger,
            } => self.ledger(ledger).mint(account, amount)?,
            Step::Delegate {
                account,
                delegatee,
                ledger,
            } => self.ledger(ledger).delegate(account, delegatee),
            Step::Fund { token, amount } => self.safe.mint(token, SAFE, amount),
            Step::Submit {
                proposer,
                transactions,
                metadata,
            } => {
                let transactions = transactions
                    .into_iter()
                    .map(|tx| tx.into_transaction())
                    .collect::<Vec<_>>();
                let proposal_id = self.azorius.submit_proposal(
                    &proposer,
                    self.strategy_address,
                    &[],
                    transactions.clone(),
                    metadata,
                )?;
                self.bodies.insert(proposal_id, transactions);
            }
            Step::Vote {
                voter,
                proposal_id,
                vote,
            } => {
                self.strategy.write().vote(&voter, proposal_id, vote)?;
            }
            Step::Execute {
                executor,
                proposal_id,
                count,
            } => {
                let bodies = self
                    .bodies
                    .get(&proposal_id)
                    .ok_or(DaoError::UnknownProposal(proposal_id))?;
                let counter = self.azorius.get_proposal(proposal_id)?.execution_counter as usize;
                let end = count
                    .map_or(bodies.len(), |count| counter.saturating_add(count))
                    .min(bodies.len());
                let batch = bodies.get(counter..end).unwrap_or_default().to_vec();

                self.azorius
                    .execute_transactions(&executor, proposal_id, &batch)?;
            }
            Step::FreezeVote { voter } => {
                self.freeze_voting.write().cast_freeze_vote(&voter)?;
            }
            Step::Unfreeze { caller } => self.freeze_voting.write().unfreeze(&caller)?,
            Step::AddControllers {
                caller,
                controllers,
            } => self.fractal_module.add_controllers(&caller, controllers)?,
            Step::RemoveControllers {
                caller,
                controllers,
            } => self.fractal_module.remove_controllers(&caller, controllers)?,
            Step::Control {
                caller,
                transaction,
            } => self
                .fractal_module
                .exec_tx(&caller, transaction.into_transaction())?,
            Step::State { proposal_id } => {
                let state = self.azorius.proposal_state(proposal_id)?;
                self.reports.push(Report::State {
                    block: self.clock.block_number(),
                    proposal_id,
                    state,
                });
            }
        }

        Ok(())
    }

    /// Events emitted since the last call, followed by requested states
    pub fn drain_reports(&mut self) -> Vec<Report> {
        let mut reports = Vec::new();
        reports.extend(self.azorius.drain_events().into_iter().map(Report::Azorius));
        reports.extend(
            self.strategy
                .write()
                .drain_events()
                .into_iter()
                .map(Report::Strategy),
        );
        reports.extend(
            self.freeze_voting
                .write()
                .drain_events()
                .into_iter()
                .map(Report::Freeze),
        );
        reports.extend(
            self.fractal_module
                .drain_events()
                .into_iter()
                .map(Report::Controller),
        );
        reports.append(&mut self.reports);
        reports
    }
}
