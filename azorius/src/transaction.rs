use crate::address::Address;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    #[default]
    Call,
    DelegateCall,
}

impl Operation {
    fn tag(self) -> u8 {
        match self {
            Operation::Call => 0,
            Operation::DelegateCall => 1,
        }
    }
}

/// A single call the avatar is asked to perform
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub to: Address,
    pub value: u128,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub operation: Operation,
}

impl Transaction {
    pub fn call(to: Address, value: u128, data: Vec<u8>) -> Self {
        Self {
            to,
            value,
            data,
            operation: Operation::Call,
        }
    }

    /// Deterministic hash over every field of the transaction
    pub fn hash(&self) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update(b"azorius.tx");
        hasher.update(self.to.as_bytes());
        hasher.update(self.value.to_be_bytes());
        hasher.update((self.data.len() as u64).to_be_bytes());
        hasher.update(&self.data);
        hasher.update([self.operation.tag()]);
        TxHash(hasher.finalize().into())
    }

    /// Zip parallel arrays into transactions, `None` if the lengths differ
    pub fn zip(
        targets: &[Address],
        values: &[u128],
        data: &[Vec<u8>],
        operations: &[Operation],
    ) -> Option<Vec<Transaction>> {
        let len = targets.len();
        if values.len() != len || data.len() != len || operations.len() != len {
            return None;
        }

        Some(
            targets
                .iter()
                .zip(values)
                .zip(data)
                .zip(operations)
                .map(|(((to, value), data), operation)| Transaction {
                    to: *to,
                    value: *value,
                    data: data.clone(),
                    operation: *operation,
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

mod hex_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(de::Error::custom)
    }
}
