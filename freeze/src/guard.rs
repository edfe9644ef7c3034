use crate::error::{Error, Result};
use crate::event::GuardEvent;
use crate::voting::SharedFreezeVoting;
use azorius::access::{AccessPolicy, Ownable};
use azorius::avatar::{SafeGuard, SafeTransaction, SignatureChecker};
use azorius::clock::Clock;
use azorius::config::InitializerBlob;
use azorius::guard::{Guard, GuardError};
use azorius::{Address, Transaction, TxHash};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzoriusFreezeGuardConfig {
    pub owner: Address,

    /// The freeze voting contract consulted before every execution
    pub freeze_voting: Address,
}

impl InitializerBlob for AzoriusFreezeGuardConfig {}

/// Blocks proposal execution on an Azorius module while the parent has
/// frozen the organization
#[derive(Debug)]
pub struct AzoriusFreezeGuard {
    access: RwLock<Box<dyn AccessPolicy>>,
    freeze_voting: RwLock<SharedFreezeVoting>,
}

impl AzoriusFreezeGuard {
    pub fn new(
        config: AzoriusFreezeGuardConfig,
        freeze_voting: SharedFreezeVoting,
    ) -> Result<Self> {
        let bound = freeze_voting.read().address();
        if bound != config.freeze_voting {
            return Err(Error::FreezeVotingMismatch {
                configured: config.freeze_voting,
                bound,
            });
        }
        info!(owner = %config.owner, freeze_voting = %bound, "azorius freeze guard set up");

        Ok(Self {
            access: RwLock::new(Box::new(Ownable::new(config.owner))),
            freeze_voting: RwLock::new(freeze_voting),
        })
    }

    pub fn freeze_voting(&self) -> Address {
        self.freeze_voting.read().read().address()
    }

    pub fn set_freeze_voting(
        &self,
        caller: &Address,
        freeze_voting: SharedFreezeVoting,
    ) -> Result<()> {
        self.access.read().ensure_authorized(caller)?;
        *self.freeze_voting.write() = freeze_voting;
        Ok(())
    }

    pub fn set_access_policy(&self, caller: &Address, access: Box<dyn AccessPolicy>) -> Result<()> {
        let mut current = self.access.write();
        current.ensure_authorized(caller)?;
        *current = access;
        Ok(())
    }
}

impl Guard for AzoriusFreezeGuard {
    fn check_transaction(
        &self,
        tx: &Transaction,
        executor: &Address,
    ) -> std::result::Result<(), GuardError> {
        let freeze_voting = self.freeze_voting.read().clone();
        if freeze_voting.read().is_frozen() {
            warn!(to = %tx.to, %executor, "execution blocked, dao frozen");
            return Err(GuardError::DaoFrozen);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigFreezeGuardConfig {
    pub owner: Address,

    /// The multisig this guard is installed on
    pub child_safe: Address,

    /// Blocks between timelocking a transaction and being able to execute it
    pub timelock_period: u32,

    /// Blocks after the timelock during which execution is allowed
    pub execution_period: u32,
}

impl InitializerBlob for MultisigFreezeGuardConfig {}

#[derive(Debug)]
struct MultisigGuardState {
    access: Box<dyn AccessPolicy>,
    timelock_period: u32,
    execution_period: u32,
    /// Block each signed transaction was timelocked at
    timelocked: HashMap<TxHash, u64>,
}

/// Guard installed on a child multisig: signed transactions must first be
/// timelocked, may only execute inside their execution window, and never
/// while the parent has frozen the child.
#[derive(Debug)]
pub struct MultisigFreezeGuard {
    child_safe: Address,
    clock: Arc<dyn Clock>,
    freeze_voting: SharedFreezeVoting,
    signatures: Arc<dyn SignatureChecker>,
    state: RwLock<MultisigGuardState>,
    events: Mutex<VecDeque<GuardEvent>>,
}

impl MultisigFreezeGuard {
    pub fn new(
        config: MultisigFreezeGuardConfig,
        clock: Arc<dyn Clock>,
        freeze_voting: SharedFreezeVoting,
        signatures: Arc<dyn SignatureChecker>,
    ) -> Self {
        let events = VecDeque::from([
            GuardEvent::MultisigFreezeGuardSetUp {
                owner: config.owner,
                child_safe: config.child_safe,
            },
            GuardEvent::TimelockPeriodUpdated {
                timelock_period: config.timelock_period,
            },
            GuardEvent::ExecutionPeriodUpdated {
                execution_period: config.execution_period,
            },
        ]);

        Self {
            child_safe: config.child_safe,
            clock,
            freeze_voting,
            signatures,
            state: RwLock::new(MultisigGuardState {
                access: Box::new(Ownable::new(config.owner)),
                timelock_period: config.timelock_period,
                execution_period: config.execution_period,
                timelocked: HashMap::new(),
            }),
            events: Mutex::new(events),
        }
    }

    pub fn child_safe(&self) -> Address {
        self.child_safe
    }

    pub fn timelock_period(&self) -> u32 {
        self.state.read().timelock_period
    }

    pub fn execution_period(&self) -> u32 {
        self.state.read().execution_period
    }

    pub fn transaction_timelocked_block(&self, tx_hash: &TxHash) -> Option<u64> {
        self.state.read().timelocked.get(tx_hash).copied()
    }

    pub fn drain_events(&self) -> Vec<GuardEvent> {
        self.events.lock().drain(..).collect()
    }

    /// Start the timelock of a fully signed multisig transaction
    #[tracing::instrument(skip(self, tx, signatures), fields(nonce = tx.nonce))]
    pub fn timelock_transaction(
        &self,
        caller: &Address,
        tx: &SafeTransaction,
        signatures: &[u8],
    ) -> Result<TxHash> {
        let current = self.signatures.nonce();
        if tx.nonce < current {
            return Err(Error::StaleNonce {
                nonce: tx.nonce,
                current,
            });
        }

        let tx_hash = tx.hash();
        self.signatures.check_signatures(&tx_hash, signatures)?;

        let block = self.clock.block_number();
        {
            let mut state = self.state.write();
            if state.timelocked.contains_key(&tx_hash) {
                return Err(Error::AlreadyTimelocked(tx_hash));
            }
            state.timelocked.insert(tx_hash, block);
        }

        self.events.lock().push_back(GuardEvent::TransactionTimelocked {
            timelocker: *caller,
            tx_hash,
            block,
        });
        info!(%tx_hash, block, "transaction timelocked");

        Ok(tx_hash)
    }

    pub fn update_timelock_period(&self, caller: &Address, timelock_period: u32) -> Result<()> {
        let mut state = self.state.write();
        state.access.ensure_authorized(caller)?;
        state.timelock_period = timelock_period;
        self.events
            .lock()
            .push_back(GuardEvent::TimelockPeriodUpdated { timelock_period });
        Ok(())
    }

    pub fn update_execution_period(&self, caller: &Address, execution_period: u32) -> Result<()> {
        let mut state = self.state.write();
        state.access.ensure_authorized(caller)?;
        state.execution_period = execution_period;
        self.events
            .lock()
            .push_back(GuardEvent::ExecutionPeriodUpdated { execution_period });
        Ok(())
    }

    pub fn set_access_policy(&self, caller: &Address, access: Box<dyn AccessPolicy>) -> Result<()> {
        let mut state = self.state.write();
        state.access.ensure_authorized(caller)?;
        state.access = access;
        Ok(())
    }
}

impl SafeGuard for MultisigFreezeGuard {
    fn check_safe_transaction(
        &self,
        tx: &SafeTransaction,
        _signatures: &[u8],
        executor: &Address,
    ) -> std::result::Result<(), GuardError> {
        if tx.safe != self.child_safe {
            return Err(GuardError::WrongSafe {
                expected: self.child_safe,
                got: tx.safe,
            });
        }

        let tx_hash = tx.hash();
        let now = self.clock.block_number();

        {
            let state = self.state.read();
            let timelocked = *state
                .timelocked
                .get(&tx_hash)
                .ok_or(GuardError::NotTimelocked(tx_hash))?;

            let timelock_end = timelocked.saturating_add(state.timelock_period as u64);
            if now < timelock_end {
                return Err(GuardError::Timelocked(tx_hash));
            }

            let execution_end = timelock_end.saturating_add(state.execution_period as u64);
            if now >= execution_end {
                return Err(GuardError::Expired(tx_hash));
            }
        }

        if self.freeze_voting.read().is_frozen() {
            warn!(%tx_hash, %executor, "execution blocked, dao frozen");
            return Err(GuardError::DaoFrozen);
        }

        debug!(%tx_hash, "multisig transaction allowed");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::voting::{FreezeVoting, FreezeVotingConfig, MultisigFreezeWeight};
    use azorius::avatar::AvatarError;
    use azorius::clock::BlockClock;
    use azorius::memory::{MemorySafe, TokenCall};
    use pretty_assertions::assert_eq;

    const OWNER: Address = Address::from_low_u64(0x0a);
    const CHILD: Address = Address::from_low_u64(0xc1);
    const PARENT: Address = Address::from_low_u64(0xbeef);
    const TOKEN: Address = Address::from_low_u64(0x70);
    const A: Address = Address::from_low_u64(1);
    const B: Address = Address::from_low_u64(2);
    const P1: Address = Address::from_low_u64(0x21);

    struct Fixture {
        clock: Arc<BlockClock>,
        child: Arc<MemorySafe>,
        freeze_voting: SharedFreezeVoting,
        guard: Arc<MultisigFreezeGuard>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(BlockClock::new(1));
        let child = Arc::new(MemorySafe::new(CHILD, vec![A, B], 2).unwrap());
        child.mint(TOKEN, CHILD, 100);
        let parent = Arc::new(MemorySafe::new(PARENT, vec![P1], 1).unwrap());

        let freeze_voting = FreezeVoting::new(
            Address::from_low_u64(0xf2),
            FreezeVotingConfig {
                owner: OWNER,
                parent: PARENT,
                freeze_votes_threshold: 1,
                freeze_proposal_period: 10,
                freeze_period: 50,
            },
            clock.clone(),
            Box::new(MultisigFreezeWeight::new(parent)),
        )
        .shared();

        let guard = Arc::new(MultisigFreezeGuard::new(
            MultisigFreezeGuardConfig {
                owner: OWNER,
                child_safe: CHILD,
                timelock_period: 5,
                execution_period: 10,
            },
            clock.clone(),
            freeze_voting.clone(),
            child.clone(),
        ));
        child.set_guard(Some(guard.clone() as Arc<dyn SafeGuard>));

        Fixture {
            clock,
            child,
            freeze_voting,
            guard,
        }
    }

    fn blocked(err: GuardError) -> AvatarError {
        AvatarError::Guard(err)
    }

    impl Fixture {
        fn signed(&self, amount: u128) -> (SafeTransaction, Vec<u8>) {
            let tx = self.child.transaction(Transaction::call(
                TOKEN,
                0,
                TokenCall::Transfer { to: A, amount }.encode(),
            ));
            self.child.approve_hash(A, tx.hash()).unwrap();
            self.child.approve_hash(B, tx.hash()).unwrap();
            (tx, MemorySafe::signatures(&[A, B]))
        }
    }

    #[test]
    fn timelock_then_execute_in_window() {
        let f = fixture();
        let (tx, sigs) = f.signed(10);

        assert_eq!(
            f.child.exec_transaction(&tx, &sigs, &A).unwrap_err(),
            blocked(GuardError::NotTimelocked(tx.hash()))
        );

        f.guard.timelock_transaction(&A, &tx, &sigs).unwrap();
        assert_eq!(f.guard.transaction_timelocked_block(&tx.hash()), Some(1));
        assert_eq!(
            f.child.exec_transaction(&tx, &sigs, &A).unwrap_err(),
            blocked(GuardError::Timelocked(tx.hash()))
        );

        f.clock.advance_to(6);
        f.child.exec_transaction(&tx, &sigs, &A).unwrap();
        assert_eq!(f.child.balance_of(TOKEN, A), 10);
    }

    #[test]
    fn execution_window_expires() {
        let f = fixture();
        let (tx, sigs) = f.signed(10);
        f.guard.timelock_transaction(&A, &tx, &sigs).unwrap();

        // executable during [6, 16)
        f.clock.advance_to(16);
        assert_eq!(
            f.child.exec_transaction(&tx, &sigs, &A).unwrap_err(),
            blocked(GuardError::Expired(tx.hash()))
        );
    }

    #[test]
    fn frozen_child_cannot_execute() {
        let f = fixture();
        let (tx, sigs) = f.signed(10);
        f.guard.timelock_transaction(&A, &tx, &sigs).unwrap();
        f.clock.advance_to(6);

        f.freeze_voting.write().cast_freeze_vote(&P1).unwrap();
        assert_eq!(
            f.child.exec_transaction(&tx, &sigs, &A).unwrap_err(),
            blocked(GuardError::DaoFrozen)
        );

        f.freeze_voting.write().unfreeze(&OWNER).unwrap();
        f.child.exec_transaction(&tx, &sigs, &A).unwrap();
    }

    #[test]
    fn timelock_requires_signatures_once() {
        let f = fixture();
        let tx = f.child.transaction(Transaction::call(TOKEN, 0, vec![]));
        f.child.approve_hash(A, tx.hash()).unwrap();

        assert!(matches!(
            f.guard
                .timelock_transaction(&A, &tx, &MemorySafe::signatures(&[A])),
            Err(Error::Signatures(_))
        ));

        let (tx, sigs) = f.signed(1);
        f.guard.timelock_transaction(&A, &tx, &sigs).unwrap();
        assert_eq!(
            f.guard.timelock_transaction(&B, &tx, &sigs),
            Err(Error::AlreadyTimelocked(tx.hash()))
        );
    }

    #[test]
    fn stale_nonce_rejected() {
        let f = fixture();
        let (tx, sigs) = f.signed(1);
        f.guard.timelock_transaction(&A, &tx, &sigs).unwrap();
        f.clock.advance_to(6);
        f.child.exec_transaction(&tx, &sigs, &A).unwrap();

        assert_eq!(
            f.guard.timelock_transaction(&A, &tx, &sigs),
            Err(Error::StaleNonce {
                nonce: 0,
                current: 1
            })
        );
    }

    #[test]
    fn transaction_for_another_safe_rejected() {
        let f = fixture();
        let (tx, sigs) = f.signed(10);
        f.guard.timelock_transaction(&A, &tx, &sigs).unwrap();
        f.clock.advance_to(6);

        let mut foreign = tx.clone();
        foreign.safe = PARENT;
        assert_eq!(
            f.guard.check_safe_transaction(&foreign, &sigs, &A),
            Err(GuardError::WrongSafe {
                expected: CHILD,
                got: PARENT
            })
        );
        assert_eq!(f.guard.check_safe_transaction(&tx, &sigs, &A), Ok(()));
    }

    #[test]
    fn owner_updates_periods() {
        let f = fixture();
        assert!(f.guard.update_timelock_period(&A, 1).is_err());
        f.guard.update_timelock_period(&OWNER, 1).unwrap();
        f.guard.update_execution_period(&OWNER, 2).unwrap();
        assert_eq!(f.guard.timelock_period(), 1);
        assert_eq!(f.guard.execution_period(), 2);
        assert!(f
            .guard
            .drain_events()
            .contains(&GuardEvent::ExecutionPeriodUpdated {
                execution_period: 2
            }));
    }

    #[test]
    fn azorius_guard_follows_freeze_voting() {
        let f = fixture();
        let freeze_voting = f.freeze_voting.read().address();
        let guard = AzoriusFreezeGuard::new(
            AzoriusFreezeGuardConfig {
                owner: OWNER,
                freeze_voting,
            },
            f.freeze_voting.clone(),
        )
        .unwrap();
        assert_eq!(guard.freeze_voting(), Address::from_low_u64(0xf2));
        let tx = Transaction::call(TOKEN, 0, vec![]);

        assert_eq!(guard.check_transaction(&tx, &A), Ok(()));
        f.freeze_voting.write().cast_freeze_vote(&P1).unwrap();
        assert_eq!(guard.check_transaction(&tx, &A), Err(GuardError::DaoFrozen));

        f.clock.advance_to(51);
        assert_eq!(guard.check_transaction(&tx, &A), Ok(()));
    }

    #[test]
    fn azorius_guard_rejects_mismatched_freeze_voting() {
        let f = fixture();
        let err = AzoriusFreezeGuard::new(
            AzoriusFreezeGuardConfig {
                owner: OWNER,
                freeze_voting: Address::from_low_u64(0xf9),
            },
            f.freeze_voting.clone(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            Error::FreezeVotingMismatch {
                configured: Address::from_low_u64(0xf9),
                bound: Address::from_low_u64(0xf2),
            }
        );
    }

    #[test]
    fn azorius_guard_can_be_repointed_by_owner() {
        let f = fixture();
        let freeze_voting = f.freeze_voting.read().address();
        let guard = AzoriusFreezeGuard::new(
            AzoriusFreezeGuardConfig {
                owner: OWNER,
                freeze_voting,
            },
            f.freeze_voting.clone(),
        )
        .unwrap();
        f.freeze_voting.write().cast_freeze_vote(&P1).unwrap();

        let idle = FreezeVoting::new(
            Address::from_low_u64(0xf3),
            FreezeVotingConfig {
                owner: OWNER,
                parent: PARENT,
                freeze_votes_threshold: 1,
                freeze_proposal_period: 10,
                freeze_period: 50,
            },
            f.clock.clone(),
            Box::new(MultisigFreezeWeight::new(f.child.clone())),
        )
        .shared();

        assert!(matches!(
            guard.set_freeze_voting(&A, idle.clone()),
            Err(Error::Unauthorized(_))
        ));
        guard.set_freeze_voting(&OWNER, idle).unwrap();
        assert_eq!(guard.freeze_voting(), Address::from_low_u64(0xf3));
        assert_eq!(
            guard.check_transaction(&Transaction::call(TOKEN, 0, vec![]), &A),
            Ok(())
        );
    }
}
