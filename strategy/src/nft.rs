use azorius::address::Address;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;

pub trait NftOwnership: Debug + Send + Sync {
    fn owner_of(&self, token: &Address, id: u64) -> Option<Address>;

    /// Number of `token` ids held by `holder`
    fn balance_of(&self, token: &Address, holder: &Address) -> u128;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NftError {
    #[error("token {token} #{id} already exists")]
    AlreadyMinted { token: Address, id: u64 },

    #[error("token {token} #{id} is not owned by {from}")]
    NotOwner { token: Address, id: u64, from: Address },
}

/// In-memory registry of non-fungible tokens
#[derive(Debug, Default)]
pub struct NftLedger {
    owners: RwLock<HashMap<(Address, u64), Address>>,
}

impl NftLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&self, token: Address, id: u64, to: Address) -> Result<(), NftError> {
        let mut owners = self.owners.write();
        if owners.contains_key(&(token, id)) {
            return Err(NftError::AlreadyMinted { token, id });
        }
        owners.insert((token, id), to);
        Ok(())
    }

    pub fn transfer(
        &self,
        token: Address,
        id: u64,
        from: Address,
        to: Address,
    ) -> Result<(), NftError> {
        let mut owners = self.owners.write();
        match owners.get_mut(&(token, id)) {
            Some(owner) if *owner == from => {
                *owner = to;
                Ok(())
            }
            _ => Err(NftError::NotOwner { token, id, from }),
        }
    }
}

impl NftOwnership for NftLedger {
    fn owner_of(&self, token: &Address, id: u64) -> Option<Address> {
        self.owners.read().get(&(*token, id)).copied()
    }

    fn balance_of(&self, token: &Address, holder: &Address) -> u128 {
        self.owners
            .read()
            .iter()
            .filter(|((t, _), owner)| t == token && *owner == holder)
            .count() as u128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NFT: Address = Address::from_low_u64(0x721);
    const ALICE: Address = Address::from_low_u64(1);
    const BOB: Address = Address::from_low_u64(2);

    #[test]
    fn mint_and_transfer() {
        let ledger = NftLedger::new();
        ledger.mint(NFT, 1, ALICE).unwrap();
        ledger.mint(NFT, 2, ALICE).unwrap();
        assert_eq!(
            ledger.mint(NFT, 1, BOB),
            Err(NftError::AlreadyMinted { token: NFT, id: 1 })
        );
        assert_eq!(ledger.balance_of(&NFT, &ALICE), 2);

        ledger.transfer(NFT, 1, ALICE, BOB).unwrap();
        assert_eq!(ledger.owner_of(&NFT, 1), Some(BOB));
        assert_eq!(
            ledger.transfer(NFT, 1, ALICE, BOB),
            Err(NftError::NotOwner {
                token: NFT,
                id: 1,
                from: ALICE
            })
        );
    }
}
