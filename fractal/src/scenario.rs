//! Scenario files: a JSON list of governance actions replayed in order.
//!
//! ```json
//! { "steps": [
//!     { "mint": { "account": "0x…11", "amount": 600 } },
//!     { "delegate": { "account": "0x…11", "delegatee": "0x…11" } },
//!     { "mine": { "blocks": 1 } }
//! ] }
//! ```

use crate::errors::Result;
use azorius::memory::{TokenCall, NATIVE};
use azorius::{Address, ProposalId, Transaction};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use strategy::VoteType;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

/// Which organization's governance token a step touches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ledger {
    #[default]
    Child,
    Parent,
}

// Externally tagged: internally tagged enums buffer their content, which
// cannot hold u128 amounts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Mine {
        blocks: u64,
    },

    Mint {
        account: Address,
        amount: u128,
        #[serde(default)]
        ledger: Ledger,
    },

    Delegate {
        account: Address,
        delegatee: Address,
        #[serde(default)]
        ledger: Ledger,
    },

    /// Credit the child multisig with `amount` of `token` (zero address for
    /// the native asset)
    Fund {
        token: Address,
        amount: u128,
    },

    Submit {
        proposer: Address,
        transactions: Vec<ProposedTx>,
        #[serde(default)]
        metadata: String,
    },

    Vote {
        voter: Address,
        proposal_id: ProposalId,
        vote: VoteType,
    },

    /// Execute the next `count` transactions, all remaining ones if unset
    Execute {
        executor: Address,
        proposal_id: ProposalId,
        #[serde(default)]
        count: Option<usize>,
    },

    FreezeVote {
        voter: Address,
    },

    Unfreeze {
        caller: Address,
    },

    AddControllers {
        caller: Address,
        controllers: Vec<Address>,
    },

    RemoveControllers {
        caller: Address,
        controllers: Vec<Address>,
    },

    /// Execute directly on the child multisig through the parent's module
    Control {
        caller: Address,
        transaction: ProposedTx,
    },

    State {
        proposal_id: ProposalId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposedTx {
    Transfer {
        token: Address,
        to: Address,
        amount: u128,
    },

    Call(Transaction),
}

impl ProposedTx {
    pub fn into_transaction(self) -> Transaction {
        match self {
            ProposedTx::Transfer { token, to, amount } if token == NATIVE => {
                Transaction::call(to, amount, Vec::new())
            }
            ProposedTx::Transfer { token, to, amount } => {
                Transaction::call(token, 0, TokenCall::Transfer { to, amount }.encode())
            }
            ProposedTx::Call(tx) => tx,
        }
    }
}
