use crate::hats::{HatId, HatsWhitelist};
use azorius::address::Address;
use azorius::strategy::StrategyError;

/// Who may create proposals with a strategy
#[derive(Debug, Clone)]
pub enum ProposerGate {
    /// The proposer's weight, as measured by the strategy, must reach
    /// `required`
    TokenWeight { required: u128 },

    /// The proposer must wear a whitelisted hat
    Hats(HatsWhitelist),
}

impl ProposerGate {
    pub fn token_weight(required: u128) -> Self {
        ProposerGate::TokenWeight { required }
    }

    /// Evaluate the gate. `weight` is only called for the token weight gate.
    pub(crate) fn admits(&self, address: &Address, weight: impl FnOnce(&Address) -> u128) -> bool {
        match self {
            ProposerGate::TokenWeight { required } => weight(address) >= *required,
            ProposerGate::Hats(whitelist) => whitelist.wears_whitelisted_hat(address),
        }
    }

    pub(crate) fn set_required_weight(&mut self, weight: u128) -> Result<(), StrategyError> {
        match self {
            ProposerGate::TokenWeight { required } => {
                *required = weight;
                Ok(())
            }
            ProposerGate::Hats(_) => Err(StrategyError::UnsupportedProposerGate),
        }
    }

    pub(crate) fn hats_mut(&mut self) -> Result<&mut HatsWhitelist, StrategyError> {
        match self {
            ProposerGate::Hats(whitelist) => Ok(whitelist),
            ProposerGate::TokenWeight { .. } => Err(StrategyError::UnsupportedProposerGate),
        }
    }

    pub fn required_weight(&self) -> Option<u128> {
        match self {
            ProposerGate::TokenWeight { required } => Some(*required),
            ProposerGate::Hats(_) => None,
        }
    }

    pub fn whitelisted_hats(&self) -> &[HatId] {
        match self {
            ProposerGate::Hats(whitelist) => whitelist.whitelisted_hats(),
            ProposerGate::TokenWeight { .. } => &[],
        }
    }
}
