use crate::*;
use azorius::access::Unauthorized;
use azorius::guard::GuardError;
use azorius::{AzoriusError, ProposalState};
use fractal::dao::{DaoError, PARENT};
use pretty_assertions::assert_eq;
use strategy::VoteType;

const P1: Address = Address::from_low_u64(0x21);
const P2: Address = Address::from_low_u64(0x22);
const OUTSIDER: Address = Address::from_low_u64(0x23);

/// Threshold 100, rounds open 10 blocks, freezes last 30
fn freeze_config() -> DaoConfig {
    DaoConfig {
        freeze_votes_threshold: 100,
        freeze_proposal_period: 10,
        freeze_period: 30,
        ..config()
    }
}

/// A passed two-transfer proposal, parent holders P1 (60) and P2 (50),
/// clock at block 2
fn passed_proposal() -> Dao {
    let mut dao = funded_dao(&freeze_config(), &[(ALICE, 600), (BOB, 400)]);
    submit_two_transfers(&mut dao);
    apply_all(
        &mut dao,
        [Step::Vote {
            voter: ALICE,
            proposal_id: 0,
            vote: VoteType::Yes,
        }],
    );

    for (holder, amount) in [(P1, 60), (P2, 50)] {
        apply_all(
            &mut dao,
            [
                Step::Mint {
                    account: holder,
                    amount,
                    ledger: Ledger::Parent,
                },
                Step::Delegate {
                    account: holder,
                    delegatee: holder,
                    ledger: Ledger::Parent,
                },
            ],
        );
    }
    // parent weight is read from the previous block
    apply_all(&mut dao, [Step::Mine { blocks: 1 }]);
    dao
}

fn freeze_vote(voter: Address) -> Step {
    Step::FreezeVote { voter }
}

fn execute_all() -> Step {
    Step::Execute {
        executor: BOB,
        proposal_id: 0,
        count: None,
    }
}

fn is_dao_frozen(result: Result<(), DaoError>) -> bool {
    matches!(
        result,
        Err(DaoError::Azorius(AzoriusError::Guard(GuardError::DaoFrozen)))
    )
}

#[test]
fn frozen_child_cannot_execute_until_freeze_expires() {
    let mut dao = passed_proposal();

    apply_all(&mut dao, [freeze_vote(P1)]);
    assert!(!dao.is_frozen());
    apply_all(&mut dao, [freeze_vote(P2)]);
    assert!(dao.is_frozen());

    // executable from 17, frozen until 3 + 30
    apply_all(&mut dao, [Step::Mine { blocks: 14 }]);
    assert_eq!(dao.block_number(), 17);
    assert_eq!(dao.proposal_state(0).unwrap(), ProposalState::Executable);
    assert!(is_dao_frozen(dao.apply(execute_all())));
    assert_eq!(dao.azorius().get_proposal(0).unwrap().execution_counter, 0);

    apply_all(&mut dao, [Step::Mine { blocks: 16 }]);
    assert!(!dao.is_frozen());
    apply_all(&mut dao, [execute_all()]);
    assert_eq!(dao.proposal_state(0).unwrap(), ProposalState::Executed);
}

#[test]
fn parent_owner_unfreezes() {
    let mut dao = passed_proposal();
    apply_all(
        &mut dao,
        [freeze_vote(P1), freeze_vote(P2), Step::Mine { blocks: 14 }],
    );

    assert!(matches!(
        dao.apply(Step::Unfreeze { caller: ALICE }),
        Err(DaoError::Freeze(freeze::Error::Unauthorized(Unauthorized(ALICE))))
    ));
    assert!(is_dao_frozen(dao.apply(execute_all())));

    apply_all(&mut dao, [Step::Unfreeze { caller: PARENT }, execute_all()]);
    assert_eq!(dao.safe().balance_of(USDC, DAVE), 20);
}

#[test]
fn freeze_votes_need_parent_weight() {
    let mut dao = passed_proposal();

    assert!(matches!(
        dao.apply(freeze_vote(OUTSIDER)),
        Err(DaoError::Freeze(freeze::Error::NoVotes(OUTSIDER)))
    ));
    // child token holders have no say in the parent
    assert!(matches!(
        dao.apply(freeze_vote(ALICE)),
        Err(DaoError::Freeze(freeze::Error::NoVotes(ALICE)))
    ));
}

#[test]
fn stale_round_restarts_count() {
    let mut dao = passed_proposal();
    apply_all(&mut dao, [freeze_vote(P1), Step::Mine { blocks: 10 }]);

    // first round closed at 13, this opens a new one
    apply_all(&mut dao, [freeze_vote(P2)]);
    assert!(!dao.is_frozen());

    apply_all(&mut dao, [freeze_vote(P1)]);
    assert!(dao.is_frozen());
}
