//! A child multisig without a proposal engine, guarded directly and frozen
//! by its parent's token holders.

use crate::*;
use azorius::avatar::{AvatarError, SafeGuard};
use azorius::clock::BlockClock;
use azorius::guard::GuardError;
use azorius::memory::{MemorySafe, TokenCall};
use azorius::votes::VotesLedger;
use azorius::Transaction;
use freeze::{
    FreezeVoting, FreezeVotingConfig, MultisigFreezeGuard, MultisigFreezeGuardConfig,
    TokenFreezeWeight,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const CHILD: Address = Address::from_low_u64(0xc1);
const PARENT_DAO: Address = Address::from_low_u64(0xbeef);
const SIGNER_1: Address = Address::from_low_u64(0x31);
const SIGNER_2: Address = Address::from_low_u64(0x32);

#[test]
fn token_parent_freezes_guarded_multisig() {
    let clock = Arc::new(BlockClock::new(1));
    let parent_token = Arc::new(VotesLedger::new(clock.clone()));
    parent_token.mint(ALICE, 10).unwrap();
    parent_token.delegate(ALICE, ALICE);
    clock.mine(1);

    let child = Arc::new(MemorySafe::new(CHILD, vec![SIGNER_1, SIGNER_2], 2).unwrap());
    child.mint(USDC, CHILD, 50);

    let freeze_voting = FreezeVoting::new(
        Address::from_low_u64(0xf2),
        FreezeVotingConfig {
            owner: PARENT_DAO,
            parent: PARENT_DAO,
            freeze_votes_threshold: 10,
            freeze_proposal_period: 5,
            freeze_period: 8,
        },
        clock.clone(),
        Box::new(TokenFreezeWeight::new(parent_token)),
    )
    .shared();

    let guard = Arc::new(MultisigFreezeGuard::new(
        MultisigFreezeGuardConfig {
            owner: PARENT_DAO,
            child_safe: CHILD,
            timelock_period: 2,
            execution_period: 20,
        },
        clock.clone(),
        freeze_voting.clone(),
        child.clone(),
    ));
    child.set_guard(Some(guard.clone() as Arc<dyn SafeGuard>));

    let tx = child.transaction(Transaction::call(
        USDC,
        0,
        TokenCall::Transfer {
            to: CAROL,
            amount: 50,
        }
        .encode(),
    ));
    child.approve_hash(SIGNER_1, tx.hash()).unwrap();
    child.approve_hash(SIGNER_2, tx.hash()).unwrap();
    let signatures = MemorySafe::signatures(&[SIGNER_1, SIGNER_2]);

    guard.timelock_transaction(&SIGNER_1, &tx, &signatures).unwrap();
    freeze_voting.write().cast_freeze_vote(&ALICE).unwrap();

    // timelock over at 4, frozen until 10
    clock.advance_to(4);
    assert_eq!(
        child.exec_transaction(&tx, &signatures, &SIGNER_1),
        Err(AvatarError::Guard(GuardError::DaoFrozen))
    );

    clock.advance_to(10);
    child.exec_transaction(&tx, &signatures, &SIGNER_1).unwrap();
    assert_eq!(child.balance_of(USDC, CAROL), 50);
    assert_eq!(child.balance_of(USDC, CHILD), 0);
}
