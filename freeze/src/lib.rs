#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Parent-controlled freezing of child organizations.
//!
//! [`FreezeVoting`] collects veto votes from the parent. The guards consult
//! it before the child executes anything, either through the Azorius module
//! ([`AzoriusFreezeGuard`]) or directly on the child multisig
//! ([`MultisigFreezeGuard`]), which also enforces a timelock.
//! [`FractalModule`] is the parent's other lever: it lets the parent and its
//! controllers execute on the child multisig directly.

pub mod controller;
pub mod error;
pub mod event;
pub mod guard;
pub mod voting;

pub use controller::{FractalModule, FractalModuleConfig};
pub use error::{Error, Result};
pub use event::{ControllerEvent, FreezeEvent, GuardEvent};
pub use guard::{
    AzoriusFreezeGuard, AzoriusFreezeGuardConfig, MultisigFreezeGuard, MultisigFreezeGuardConfig,
};
pub use voting::{
    FreezeVoting, FreezeVotingConfig, FreezeWeight, MultisigFreezeWeight, SharedFreezeVoting,
    TokenFreezeWeight,
};
