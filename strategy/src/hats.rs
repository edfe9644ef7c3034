//! Role based proposer gating.
//!
//! A hat is a role id in an external role tree. Proposers qualify by
//! wearing any hat on the strategy's whitelist.

use azorius::address::Address;
use azorius::strategy::StrategyError;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

pub type HatId = u128;

pub trait Hats: Debug + Send + Sync {
    fn is_wearer_of_hat(&self, wearer: &Address, hat_id: HatId) -> bool;
}

/// In-memory role tree
#[derive(Debug, Default)]
pub struct MemoryHats {
    worn: RwLock<HashSet<(Address, HatId)>>,
}

impl MemoryHats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint_hat(&self, hat_id: HatId, wearer: Address) {
        self.worn.write().insert((wearer, hat_id));
    }

    pub fn burn_hat(&self, hat_id: HatId, wearer: &Address) {
        self.worn.write().remove(&(*wearer, hat_id));
    }
}

impl Hats for MemoryHats {
    fn is_wearer_of_hat(&self, wearer: &Address, hat_id: HatId) -> bool {
        self.worn.read().contains(&(*wearer, hat_id))
    }
}

#[derive(Debug, Clone)]
pub struct HatsWhitelist {
    hats: Arc<dyn Hats>,
    whitelisted: Vec<HatId>,
}

impl HatsWhitelist {
    pub fn new(hats: Arc<dyn Hats>, hat_ids: Vec<HatId>) -> Result<Self, StrategyError> {
        if hat_ids.is_empty() {
            return Err(StrategyError::NoHatsWhitelisted);
        }

        let mut whitelist = Self {
            hats,
            whitelisted: Vec::with_capacity(hat_ids.len()),
        };
        for hat_id in hat_ids {
            whitelist.whitelist(hat_id)?;
        }

        Ok(whitelist)
    }

    pub fn whitelist(&mut self, hat_id: HatId) -> Result<(), StrategyError> {
        if self.whitelisted.contains(&hat_id) {
            return Err(StrategyError::HatAlreadyWhitelisted(hat_id));
        }
        self.whitelisted.push(hat_id);
        Ok(())
    }

    /// Removing the last hat is allowed, after which nobody can propose
    pub fn remove(&mut self, hat_id: HatId) -> Result<(), StrategyError> {
        let idx = self
            .whitelisted
            .iter()
            .position(|h| *h == hat_id)
            .ok_or(StrategyError::HatNotWhitelisted(hat_id))?;
        self.whitelisted.swap_remove(idx);
        Ok(())
    }

    pub fn is_whitelisted(&self, hat_id: HatId) -> bool {
        self.whitelisted.contains(&hat_id)
    }

    pub fn whitelisted_hats(&self) -> &[HatId] {
        &self.whitelisted
    }

    pub fn wears_whitelisted_hat(&self, address: &Address) -> bool {
        self.whitelisted
            .iter()
            .any(|hat_id| self.hats.is_wearer_of_hat(address, *hat_id))
    }
}
