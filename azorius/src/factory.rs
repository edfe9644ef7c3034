//! Deterministic module deployment.
//!
//! Modules are constructed through [`ModuleFactory::deploy_module`], which
//! derives the instance address from the module kind, the encoded config and
//! a salt. The same triple always yields the same address, and an address
//! can only ever be initialized once.

use crate::address::Address;
use crate::config::InitializerBlob;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::error::Error as StdError;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("address {0} is already taken")]
    TakenAddress(Address),

    #[error("failed to encode initializer")]
    Encoding(#[from] bincode::Error),

    #[error("module initialization failed")]
    FailedInitialization(#[source] Box<dyn StdError + Send + Sync>),
}

#[derive(Debug, Default)]
pub struct ModuleFactory {
    deployed: HashSet<Address>,
}

impl ModuleFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address a module of kind `mastercopy` with the given initializer
    /// blob and salt is deployed at
    pub fn predict_address(mastercopy: &str, initializer: &[u8], salt: u64) -> Address {
        let initializer_hash = Sha256::digest(initializer);

        let mut hasher = Sha256::new();
        hasher.update(b"azorius.module");
        hasher.update((mastercopy.len() as u64).to_be_bytes());
        hasher.update(mastercopy.as_bytes());
        hasher.update(initializer_hash);
        hasher.update(salt.to_be_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Address::new(bytes)
    }

    pub fn is_deployed(&self, address: &Address) -> bool {
        self.deployed.contains(address)
    }

    /// Construct a module at its predicted address.
    ///
    /// `set_up` receives the address and the config decoded back from the
    /// initializer, so the module is built from exactly what the address
    /// commits to.
    pub fn deploy_module<C, M, E, F>(
        &mut self,
        mastercopy: &str,
        config: &C,
        salt: u64,
        set_up: F,
    ) -> Result<M, FactoryError>
    where
        C: InitializerBlob,
        E: StdError + Send + Sync + 'static,
        F: FnOnce(Address, C) -> Result<M, E>,
    {
        let initializer = config.to_initializer()?;
        let address = Self::predict_address(mastercopy, &initializer, salt);

        if self.deployed.contains(&address) {
            return Err(FactoryError::TakenAddress(address));
        }

        let config = C::from_initializer(&initializer)?;
        let module = set_up(address, config)
            .map_err(|err| FactoryError::FailedInitialization(Box::new(err)))?;

        self.deployed.insert(address);
        info!(%address, mastercopy, salt, "module deployed");

        Ok(module)
    }
}
