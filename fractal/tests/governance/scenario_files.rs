use crate::*;
use azorius::ProposalState;
use fractal::dao::Report;
use fractal::scenario::Scenario;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn demo(name: &str) -> Scenario {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name);
    Scenario::load(&path).unwrap()
}

#[test]
fn partial_execution_demo_replays() {
    let scenario = demo("partial_execution.json");
    let mut dao = Dao::new(&config(), 0).unwrap();
    apply_all(&mut dao, scenario.steps);

    let states = dao
        .drain_reports()
        .into_iter()
        .filter_map(|report| match report {
            Report::State { state, .. } => Some(state),
            _ => None,
        })
        .collect::<Vec<_>>();

    assert_eq!(
        states,
        vec![
            ProposalState::Active,
            ProposalState::Timelocked,
            ProposalState::Executable,
            ProposalState::Executed,
        ]
    );
    assert_eq!(dao.safe().balance_of(USDC, CAROL), 10);
    assert_eq!(dao.safe().balance_of(USDC, DAVE), 20);
}
