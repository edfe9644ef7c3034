use crate::address::Address;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Construction parameters of an [`crate::Azorius`] module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzoriusConfig {
    /// Account allowed to manage strategies and periods
    pub owner: Address,

    /// The multisig the module acts for
    pub avatar: Address,

    /// The account transactions are forwarded to, usually the avatar
    pub target: Address,

    /// Blocks between the end of voting and the start of execution
    pub timelock_period: u32,

    /// Blocks during which a timelocked proposal may be executed
    pub execution_period: u32,
}

impl Default for AzoriusConfig {
    fn default() -> Self {
        AzoriusConfig {
            owner: Address::ZERO,
            avatar: Address::ZERO,
            target: Address::ZERO,
            timelock_period: 60,
            execution_period: 600,
        }
    }
}

/// Encoding of module configs into the opaque initializer blob used by
/// [`crate::factory::ModuleFactory`]
pub trait InitializerBlob: Serialize + DeserializeOwned {
    fn to_initializer(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    fn from_initializer(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

impl InitializerBlob for AzoriusConfig {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn initializer_round_trip() {
        let config = AzoriusConfig {
            owner: Address::from_low_u64(1),
            avatar: Address::from_low_u64(2),
            target: Address::from_low_u64(2),
            ..Default::default()
        };

        let bytes = config.to_initializer().unwrap();
        assert_eq!(AzoriusConfig::from_initializer(&bytes).unwrap(), config);
    }

    #[test]
    fn truncated_initializer_fails() {
        let bytes = AzoriusConfig::default().to_initializer().unwrap();
        assert!(AzoriusConfig::from_initializer(&bytes[..bytes.len() - 1]).is_err());
    }
}
