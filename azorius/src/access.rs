//! Authorization policies for privileged operations.
//!
//! Components never compare the caller against a stored owner directly, they
//! ask the [`AccessPolicy`] they were constructed with. Replacing the policy
//! (through the component's own gated setter) is how ownership moves.

use crate::address::Address;
use std::collections::BTreeSet;
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("caller {0} is not authorized")]
pub struct Unauthorized(pub Address);

pub trait AccessPolicy: Debug + Send + Sync {
    /// Whether `caller` may perform privileged operations
    fn is_authorized(&self, caller: &Address) -> bool;

    /// Fails with [`Unauthorized`] unless `caller` is authorized
    fn ensure_authorized(&self, caller: &Address) -> Result<(), Unauthorized> {
        if self.is_authorized(caller) {
            Ok(())
        } else {
            Err(Unauthorized(*caller))
        }
    }
}

/// A single owner account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownable {
    owner: Address,
}

impl Ownable {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }
}

impl AccessPolicy for Ownable {
    fn is_authorized(&self, caller: &Address) -> bool {
        !caller.is_zero() && *caller == self.owner
    }
}

/// Any member of a fixed set of accounts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnyOf {
    members: BTreeSet<Address>,
}

impl AnyOf {
    pub fn new(members: impl IntoIterator<Item = Address>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }
}

impl AccessPolicy for AnyOf {
    fn is_authorized(&self, caller: &Address) -> bool {
        self.members.contains(caller)
    }
}
