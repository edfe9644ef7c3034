mod control;
mod execution;
mod freezing;
mod multisig;
mod scenario_files;

use azorius::Address;
use fractal::dao::{Dao, DaoConfig};
use fractal::scenario::{Ledger, ProposedTx, Step};

pub const ALICE: Address = Address::from_low_u64(0x11);
pub const BOB: Address = Address::from_low_u64(0x12);
pub const CAROL: Address = Address::from_low_u64(0x13);
pub const DAVE: Address = Address::from_low_u64(0x14);
pub const USDC: Address = Address::from_low_u64(0x0c);

/// Voting 5 blocks, timelock 10, execution window 20, 50% quorum and basis
pub fn config() -> DaoConfig {
    DaoConfig {
        timelock_period: 10,
        execution_period: 20,
        voting_period: 5,
        quorum_numerator: 500_000,
        basis_numerator: 500_000,
        ..Default::default()
    }
}

pub fn apply_all(dao: &mut Dao, steps: impl IntoIterator<Item = Step>) {
    for step in steps {
        let described = format!("{step:?}");
        if let Err(err) = dao.apply(step) {
            panic!("{described} failed: {err:?}");
        }
    }
}

/// Child tokens minted and self-delegated at block 1, the treasury holding
/// 100 USDC, clock at block 2
pub fn funded_dao(config: &DaoConfig, holders: &[(Address, u128)]) -> Dao {
    let mut dao = Dao::new(config, 0).unwrap();
    for (holder, amount) in holders {
        apply_all(
            &mut dao,
            [
                Step::Mint {
                    account: *holder,
                    amount: *amount,
                    ledger: Ledger::Child,
                },
                Step::Delegate {
                    account: *holder,
                    delegatee: *holder,
                    ledger: Ledger::Child,
                },
            ],
        );
    }
    apply_all(
        &mut dao,
        [
            Step::Fund {
                token: USDC,
                amount: 100,
            },
            Step::Mine { blocks: 1 },
        ],
    );
    dao
}

pub fn transfer(to: Address, amount: u128) -> ProposedTx {
    ProposedTx::Transfer {
        token: USDC,
        to,
        amount,
    }
}

/// Alice submits a proposal paying Carol 10 and Dave 20
pub fn submit_two_transfers(dao: &mut Dao) {
    apply_all(
        dao,
        [Step::Submit {
            proposer: ALICE,
            transactions: vec![transfer(CAROL, 10), transfer(DAVE, 20)],
            metadata: "pay contributors".into(),
        }],
    );
}
