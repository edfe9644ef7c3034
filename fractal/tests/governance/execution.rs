use crate::*;
use azorius::{AzoriusError, ProposalState};
use fractal::dao::{DaoError, SAFE};
use pretty_assertions::assert_eq;
use strategy::VoteType;

fn execute(count: Option<usize>) -> Step {
    Step::Execute {
        executor: BOB,
        proposal_id: 0,
        count,
    }
}

fn yes(voter: Address) -> Step {
    Step::Vote {
        voter,
        proposal_id: 0,
        vote: VoteType::Yes,
    }
}

#[test]
fn two_transfers_executed_one_at_a_time() {
    let mut dao = funded_dao(&config(), &[(ALICE, 600), (BOB, 400)]);
    submit_two_transfers(&mut dao);
    apply_all(&mut dao, [yes(ALICE)]);
    assert_eq!(dao.proposal_state(0).unwrap(), ProposalState::Active);

    // voting ends at 7, timelock until 17
    apply_all(&mut dao, [Step::Mine { blocks: 5 }]);
    assert_eq!(dao.proposal_state(0).unwrap(), ProposalState::Timelocked);
    assert!(matches!(
        dao.apply(execute(Some(1))),
        Err(DaoError::Azorius(AzoriusError::ProposalNotExecutable {
            proposal_id: 0,
            state: ProposalState::Timelocked,
        }))
    ));

    apply_all(&mut dao, [Step::Mine { blocks: 10 }, execute(Some(1))]);
    assert_eq!(dao.safe().balance_of(USDC, CAROL), 10);
    assert_eq!(dao.safe().balance_of(USDC, DAVE), 0);
    assert_eq!(dao.proposal_state(0).unwrap(), ProposalState::Executable);
    assert_eq!(dao.azorius().get_proposal(0).unwrap().execution_counter, 1);

    apply_all(&mut dao, [execute(None)]);
    assert_eq!(dao.safe().balance_of(USDC, DAVE), 20);
    assert_eq!(dao.safe().balance_of(USDC, SAFE), 70);
    assert_eq!(dao.proposal_state(0).unwrap(), ProposalState::Executed);
}

#[test]
fn half_the_supply_meets_quorum() {
    let mut dao = funded_dao(&config(), &[(ALICE, 500), (BOB, 500)]);
    submit_two_transfers(&mut dao);
    apply_all(&mut dao, [yes(ALICE), Step::Mine { blocks: 5 }]);

    assert_eq!(dao.proposal_state(0).unwrap(), ProposalState::Timelocked);
}

#[test]
fn just_below_quorum_fails() {
    let mut dao = funded_dao(&config(), &[(ALICE, 499), (BOB, 501)]);
    submit_two_transfers(&mut dao);
    apply_all(&mut dao, [yes(ALICE), Step::Mine { blocks: 15 }]);

    assert_eq!(dao.proposal_state(0).unwrap(), ProposalState::Failed);
    assert!(matches!(
        dao.apply(execute(None)),
        Err(DaoError::Azorius(AzoriusError::ProposalNotExecutable {
            state: ProposalState::Failed,
            ..
        }))
    ));
}

#[test]
fn missed_window_expires() {
    let mut dao = funded_dao(&config(), &[(ALICE, 600), (BOB, 400)]);
    submit_two_transfers(&mut dao);
    apply_all(&mut dao, [yes(ALICE), Step::Mine { blocks: 15 }, execute(Some(1))]);

    // window closes at 7 + 10 + 20
    apply_all(&mut dao, [Step::Mine { blocks: 19 }]);
    assert_eq!(dao.block_number(), 36);
    assert_eq!(dao.proposal_state(0).unwrap(), ProposalState::Executable);

    apply_all(&mut dao, [Step::Mine { blocks: 1 }]);
    assert_eq!(dao.proposal_state(0).unwrap(), ProposalState::Expired);
    assert!(dao.apply(execute(None)).is_err());
    assert_eq!(dao.safe().balance_of(USDC, DAVE), 0);
}

#[test]
fn failed_transfer_leaves_counter() {
    let mut dao = funded_dao(&config(), &[(ALICE, 600), (BOB, 400)]);
    apply_all(
        &mut dao,
        [
            Step::Submit {
                proposer: ALICE,
                transactions: vec![transfer(CAROL, 60), transfer(DAVE, 60)],
                metadata: String::new(),
            },
            yes(ALICE),
            Step::Mine { blocks: 15 },
        ],
    );

    assert!(matches!(
        dao.apply(execute(None)),
        Err(DaoError::Azorius(AzoriusError::TxFailed(_)))
    ));
    assert_eq!(dao.azorius().get_proposal(0).unwrap().execution_counter, 0);
    assert_eq!(dao.safe().balance_of(USDC, CAROL), 0);

    // the first transfer alone still fits the treasury
    apply_all(&mut dao, [execute(Some(1))]);
    assert_eq!(dao.safe().balance_of(USDC, CAROL), 60);
}

#[test]
fn proposer_threshold_applies() {
    let config = DaoConfig {
        required_proposer_weight: 500,
        ..config()
    };
    let mut dao = funded_dao(&config, &[(ALICE, 600), (BOB, 400)]);

    let err = dao
        .apply(Step::Submit {
            proposer: BOB,
            transactions: vec![transfer(CAROL, 1)],
            metadata: String::new(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        DaoError::Azorius(AzoriusError::InvalidProposer(BOB))
    ));

    submit_two_transfers(&mut dao);
    assert_eq!(dao.azorius().total_proposal_count(), 1);
}
