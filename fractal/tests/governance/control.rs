use crate::*;
use azorius::access::Unauthorized;
use azorius::avatar::AvatarError;
use fractal::dao::{DaoError, Report, PARENT, SAFE};
use freeze::ControllerEvent;
use pretty_assertions::assert_eq;

const CONTROLLER: Address = Address::from_low_u64(0xc0);

fn control(caller: Address, to: Address, amount: u128) -> Step {
    Step::Control {
        caller,
        transaction: transfer(to, amount),
    }
}

#[test]
fn parent_executes_on_child_directly() {
    let mut dao = funded_dao(&config(), &[(ALICE, 100)]);
    assert!(dao.safe().is_module_enabled(&dao.fractal_module().address()));

    apply_all(&mut dao, [control(PARENT, CAROL, 40)]);
    assert_eq!(dao.safe().balance_of(USDC, CAROL), 40);
}

#[test]
fn controllers_added_by_parent_can_execute() {
    let mut dao = funded_dao(&config(), &[(ALICE, 100)]);
    dao.drain_reports();

    let outsider = dao.apply(control(CONTROLLER, CAROL, 10));
    assert!(matches!(
        outsider,
        Err(DaoError::Freeze(freeze::Error::Unauthorized(Unauthorized(caller))))
            if caller == CONTROLLER
    ));
    assert!(matches!(
        dao.apply(Step::AddControllers {
            caller: ALICE,
            controllers: vec![CONTROLLER],
        }),
        Err(DaoError::Freeze(freeze::Error::Unauthorized(_)))
    ));

    apply_all(
        &mut dao,
        [
            Step::AddControllers {
                caller: PARENT,
                controllers: vec![CONTROLLER],
            },
            control(CONTROLLER, CAROL, 10),
            Step::RemoveControllers {
                caller: PARENT,
                controllers: vec![CONTROLLER],
            },
        ],
    );
    assert_eq!(dao.safe().balance_of(USDC, CAROL), 10);
    assert!(dao.apply(control(CONTROLLER, CAROL, 10)).is_err());

    assert_eq!(
        dao.drain_reports(),
        vec![
            Report::Controller(ControllerEvent::ControllersAdded {
                controllers: vec![CONTROLLER]
            }),
            Report::Controller(ControllerEvent::ControllersRemoved {
                controllers: vec![CONTROLLER]
            }),
        ]
    );
}

#[test]
fn failed_transfer_leaves_treasury_untouched() {
    let mut dao = funded_dao(&config(), &[(ALICE, 100)]);

    let failed = dao.apply(control(PARENT, CAROL, 101));
    assert!(matches!(
        failed,
        Err(DaoError::Freeze(freeze::Error::TxFailed(
            AvatarError::TxFailed { index: 0, .. }
        )))
    ));
    assert_eq!(dao.safe().balance_of(USDC, SAFE), 100);
}
