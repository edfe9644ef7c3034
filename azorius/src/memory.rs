//! In-memory multisig used to run governance end to end.
//!
//! Tokens are modelled as balances keyed by token address. A transaction
//! with non-empty `data` targeting a token address is decoded as a
//! [`TokenCall`]; a non-zero `value` moves the native balance, which is kept
//! under [`Address::ZERO`]. Signatures use the approved-hash mode: owners
//! approve a hash first, and the signature blob is the concatenation of
//! the approving owners' addresses in ascending order.

use crate::address::Address;
use crate::avatar::{Avatar, AvatarError, SafeGuard, SafeOwners, SafeTransaction, SignatureChecker};
use crate::transaction::{Operation, Transaction, TxHash};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// The native currency's token key
pub const NATIVE: Address = Address::ZERO;

/// Calls understood by token targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCall {
    Transfer { to: Address, amount: u128 },
}

impl TokenCall {
    const TRANSFER: u8 = 1;

    pub fn encode(&self) -> Vec<u8> {
        match self {
            TokenCall::Transfer { to, amount } => {
                let mut data = Vec::with_capacity(37);
                data.push(Self::TRANSFER);
                data.extend_from_slice(to.as_bytes());
                data.extend_from_slice(&amount.to_be_bytes());
                data
            }
        }
    }

    pub fn decode(data: &[u8]) -> Option<TokenCall> {
        match data.split_first() {
            Some((&Self::TRANSFER, rest)) if rest.len() == 36 => {
                let to: [u8; 20] = rest[..20].try_into().ok()?;
                let amount: [u8; 16] = rest[20..].try_into().ok()?;
                Some(TokenCall::Transfer {
                    to: Address::new(to),
                    amount: u128::from_be_bytes(amount),
                })
            }
            _ => None,
        }
    }
}

type Balances = HashMap<Address, HashMap<Address, u128>>;

#[derive(Debug)]
struct SafeState {
    owners: Vec<Address>,
    threshold: usize,
    nonce: u64,
    modules: HashSet<Address>,
    approved: HashSet<(Address, TxHash)>,
    balances: Balances,
}

#[derive(Debug)]
pub struct MemorySafe {
    address: Address,
    state: RwLock<SafeState>,
    guard: RwLock<Option<Arc<dyn SafeGuard>>>,
}

impl MemorySafe {
    pub fn new(
        address: Address,
        owners: Vec<Address>,
        threshold: usize,
    ) -> Result<Self, AvatarError> {
        if threshold == 0 || threshold > owners.len() {
            return Err(AvatarError::InvalidThreshold {
                threshold,
                owners: owners.len(),
            });
        }

        Ok(Self {
            address,
            state: RwLock::new(SafeState {
                owners,
                threshold,
                nonce: 0,
                modules: HashSet::new(),
                approved: HashSet::new(),
                balances: HashMap::new(),
            }),
            guard: RwLock::new(None),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owners(&self) -> Vec<Address> {
        self.state.read().owners.clone()
    }

    pub fn threshold(&self) -> usize {
        self.state.read().threshold
    }

    pub fn enable_module(&self, module: Address) {
        self.state.write().modules.insert(module);
    }

    pub fn disable_module(&self, module: &Address) {
        self.state.write().modules.remove(module);
    }

    pub fn is_module_enabled(&self, module: &Address) -> bool {
        self.state.read().modules.contains(module)
    }

    pub fn set_guard(&self, guard: Option<Arc<dyn SafeGuard>>) {
        *self.guard.write() = guard;
    }

    /// Credit `amount` of `token` to `holder` out of thin air
    pub fn mint(&self, token: Address, holder: Address, amount: u128) {
        let mut state = self.state.write();
        let balance = state
            .balances
            .entry(token)
            .or_default()
            .entry(holder)
            .or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn balance_of(&self, token: Address, holder: Address) -> u128 {
        self.state
            .read()
            .balances
            .get(&token)
            .and_then(|holders| holders.get(&holder))
            .copied()
            .unwrap_or(0)
    }

    /// Build a transaction for the current nonce
    pub fn transaction(&self, transaction: Transaction) -> SafeTransaction {
        SafeTransaction {
            safe: self.address,
            transaction,
            nonce: self.state.read().nonce,
        }
    }

    pub fn approve_hash(&self, owner: Address, hash: TxHash) -> Result<(), AvatarError> {
        let mut state = self.state.write();
        if !state.owners.contains(&owner) {
            return Err(AvatarError::NotOwner(owner));
        }
        state.approved.insert((owner, hash));
        Ok(())
    }

    /// Signature blob for the given approving owners
    pub fn signatures(owners: &[Address]) -> Vec<u8> {
        let mut owners = owners.to_vec();
        owners.sort();
        owners.dedup();
        owners.iter().flat_map(|o| *o.as_bytes()).collect()
    }

    /// Execute through the multisig's own signature path, consulting the
    /// installed guard first
    #[tracing::instrument(skip(self, tx, signatures), fields(nonce = tx.nonce))]
    pub fn exec_transaction(
        &self,
        tx: &SafeTransaction,
        signatures: &[u8],
        executor: &Address,
    ) -> Result<(), AvatarError> {
        let nonce = self.nonce();
        if tx.nonce != nonce {
            return Err(AvatarError::InvalidNonce {
                expected: nonce,
                got: tx.nonce,
            });
        }

        let hash = tx.hash();
        self.check_signatures(&hash, signatures)?;

        let guard = self.guard.read().clone();
        if let Some(guard) = &guard {
            guard.check_safe_transaction(tx, signatures, executor)?;
        }

        let outcome = self.apply(std::slice::from_ref(&tx.transaction));
        if outcome.is_ok() {
            self.state.write().nonce += 1;
        }

        if let Some(guard) = &guard {
            guard.check_after_safe_execution(&hash, outcome.is_ok());
        }

        outcome
    }

    fn apply(&self, transactions: &[Transaction]) -> Result<(), AvatarError> {
        let mut state = self.state.write();
        let mut balances = state.balances.clone();

        for (index, tx) in transactions.iter().enumerate() {
            Self::apply_one(&mut balances, self.address, tx)
                .map_err(|reason| AvatarError::TxFailed { index, reason })?;
        }

        state.balances = balances;
        Ok(())
    }

    fn apply_one(balances: &mut Balances, from: Address, tx: &Transaction) -> Result<(), String> {
        if tx.operation == Operation::DelegateCall {
            return Err("delegate calls are not supported".into());
        }

        if tx.value > 0 {
            Self::move_balance(balances, NATIVE, from, tx.to, tx.value)?;
        }

        if !tx.data.is_empty() {
            match TokenCall::decode(&tx.data) {
                Some(TokenCall::Transfer { to, amount }) => {
                    Self::move_balance(balances, tx.to, from, to, amount)?
                }
                None => return Err(format!("unrecognised call data for {}", tx.to)),
            }
        }

        debug!(to = %tx.to, value = tx.value, "applied transaction");
        Ok(())
    }

    fn move_balance(
        balances: &mut Balances,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), String> {
        let holders = balances.entry(token).or_default();
        let balance = holders.get(&from).copied().unwrap_or(0);
        if balance < amount {
            return Err(format!(
                "insufficient {token} balance: have {balance}, need {amount}"
            ));
        }
        holders.insert(from, balance - amount);
        let to_balance = holders.entry(to).or_default();
        *to_balance = to_balance.saturating_add(amount);
        Ok(())
    }
}

impl Avatar for MemorySafe {
    fn exec_transactions_from_module(
        &self,
        module: &Address,
        transactions: &[Transaction],
    ) -> Result<(), AvatarError> {
        if !self.is_module_enabled(module) {
            return Err(AvatarError::ModuleNotEnabled(*module));
        }
        self.apply(transactions)
    }
}

impl SignatureChecker for MemorySafe {
    fn nonce(&self) -> u64 {
        self.state.read().nonce
    }

    fn check_signatures(&self, tx_hash: &TxHash, signatures: &[u8]) -> Result<(), AvatarError> {
        if signatures.len() % 20 != 0 {
            return Err(AvatarError::MalformedSignatures);
        }

        let state = self.state.read();
        let mut last = Address::ZERO;
        let mut provided = 0;
        for chunk in signatures.chunks_exact(20) {
            let signer: [u8; 20] = chunk
                .try_into()
                .map_err(|_| AvatarError::MalformedSignatures)?;
            let signer = Address::new(signer);

            // ascending order rules out duplicate signers
            if signer <= last {
                return Err(AvatarError::MalformedSignatures);
            }
            last = signer;

            if state.owners.contains(&signer) && state.approved.contains(&(signer, *tx_hash)) {
                provided += 1;
            }
        }

        if provided < state.threshold {
            return Err(AvatarError::InsufficientSignatures {
                required: state.threshold,
                provided,
            });
        }

        Ok(())
    }
}

impl SafeOwners for MemorySafe {
    fn is_owner(&self, address: &Address) -> bool {
        self.state.read().owners.contains(address)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::guard::GuardError;

    const SAFE: Address = Address::from_low_u64(0x5afe);
    const TOKEN: Address = Address::from_low_u64(0x70);
    const A: Address = Address::from_low_u64(1);
    const B: Address = Address::from_low_u64(2);
    const C: Address = Address::from_low_u64(3);
    const MODULE: Address = Address::from_low_u64(0xa2);

    fn safe() -> MemorySafe {
        let safe = MemorySafe::new(SAFE, vec![A, B, C], 2).unwrap();
        safe.mint(TOKEN, SAFE, 100);
        safe
    }

    fn transfer(to: Address, amount: u128) -> Transaction {
        Transaction::call(TOKEN, 0, TokenCall::Transfer { to, amount }.encode())
    }

    #[test]
    fn token_call_round_trip() {
        let call = TokenCall::Transfer {
            to: A,
            amount: 12345,
        };
        assert_eq!(TokenCall::decode(&call.encode()), Some(call));
        assert_eq!(TokenCall::decode(&[1, 2, 3]), None);
    }

    #[test]
    fn invalid_threshold() {
        assert_eq!(
            MemorySafe::new(SAFE, vec![A], 2).unwrap_err(),
            AvatarError::InvalidThreshold {
                threshold: 2,
                owners: 1
            }
        );
    }

    #[test]
    fn module_batch_is_atomic() {
        let safe = safe();
        safe.enable_module(MODULE);

        let err = safe
            .exec_transactions_from_module(&MODULE, &[transfer(A, 60), transfer(B, 60)])
            .unwrap_err();
        assert!(matches!(err, AvatarError::TxFailed { index: 1, .. }));
        assert_eq!(safe.balance_of(TOKEN, SAFE), 100);
        assert_eq!(safe.balance_of(TOKEN, A), 0);

        safe.exec_transactions_from_module(&MODULE, &[transfer(A, 60), transfer(B, 40)])
            .unwrap();
        assert_eq!(safe.balance_of(TOKEN, A), 60);
        assert_eq!(safe.balance_of(TOKEN, B), 40);
    }

    #[test]
    fn native_value_transfer() {
        let safe = safe();
        safe.enable_module(MODULE);
        safe.mint(NATIVE, SAFE, 10);

        safe.exec_transactions_from_module(&MODULE, &[Transaction::call(A, 7, vec![])])
            .unwrap();
        assert_eq!(safe.balance_of(NATIVE, A), 7);
        assert_eq!(safe.balance_of(NATIVE, SAFE), 3);
    }

    #[test]
    fn unknown_module_rejected() {
        let safe = safe();
        assert_eq!(
            safe.exec_transactions_from_module(&MODULE, &[]),
            Err(AvatarError::ModuleNotEnabled(MODULE))
        );
    }

    #[test]
    fn signatures_need_threshold_of_approvals() {
        let safe = safe();
        let tx = safe.transaction(transfer(C, 10));
        let hash = tx.hash();

        safe.approve_hash(A, hash).unwrap();
        assert_eq!(
            safe.exec_transaction(&tx, &MemorySafe::signatures(&[A, B]), &A),
            Err(AvatarError::InsufficientSignatures {
                required: 2,
                provided: 1
            })
        );

        safe.approve_hash(B, hash).unwrap();
        safe.exec_transaction(&tx, &MemorySafe::signatures(&[B, A]), &A)
            .unwrap();
        assert_eq!(safe.balance_of(TOKEN, C), 10);
        assert_eq!(safe.nonce(), 1);

        // replay is rejected by the nonce
        assert_eq!(
            safe.exec_transaction(&tx, &MemorySafe::signatures(&[A, B]), &A),
            Err(AvatarError::InvalidNonce {
                expected: 1,
                got: 0
            })
        );
    }

    #[test]
    fn duplicate_signers_are_malformed() {
        let safe = safe();
        let mut sigs = A.as_bytes().to_vec();
        sigs.extend_from_slice(A.as_bytes());
        assert_eq!(
            safe.check_signatures(&TxHash::default(), &sigs),
            Err(AvatarError::MalformedSignatures)
        );
    }

    #[test]
    fn non_owner_cannot_approve() {
        let safe = safe();
        assert_eq!(
            safe.approve_hash(Address::from_low_u64(9), TxHash::default()),
            Err(AvatarError::NotOwner(Address::from_low_u64(9)))
        );
    }

    #[derive(Debug)]
    struct Reject;

    impl SafeGuard for Reject {
        fn check_safe_transaction(
            &self,
            _: &SafeTransaction,
            _: &[u8],
            _: &Address,
        ) -> Result<(), GuardError> {
            Err(GuardError::DaoFrozen)
        }
    }

    #[test]
    fn guard_is_consulted() {
        let safe = safe();
        safe.set_guard(Some(Arc::new(Reject)));

        let tx = safe.transaction(transfer(C, 10));
        safe.approve_hash(A, tx.hash()).unwrap();
        safe.approve_hash(B, tx.hash()).unwrap();

        assert_eq!(
            safe.exec_transaction(&tx, &MemorySafe::signatures(&[A, B]), &A),
            Err(AvatarError::Guard(GuardError::DaoFrozen))
        );
        assert_eq!(safe.nonce(), 0);
    }
}
