use crate::address::Address;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{0} can never be a strategy")]
    InvalidStrategy(Address),

    #[error("strategy {0} is already enabled")]
    DuplicateStrategy(Address),

    #[error("strategy {0} is not enabled")]
    StrategyNotFound(Address),

    #[error("{prev} does not point to {strategy}")]
    InvalidPrev { prev: Address, strategy: Address },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Link {
    prev: Address,
    next: Address,
}

/// Ordered set of enabled strategy addresses.
///
/// Observed from outside, the registry behaves like a singly linked list
/// rooted at [`Address::SENTINEL`]: iteration starts at the most recently
/// enabled strategy and ends at the sentinel. Internally every node also
/// knows its predecessor, so removal only has to confirm the caller's
/// `prev` instead of walking the list.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    links: HashMap<Address, Link>,
    head: Address,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            links: HashMap::new(),
            head: Address::SENTINEL,
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn is_enabled(&self, strategy: &Address) -> bool {
        self.links.contains_key(strategy)
    }

    /// The entry following `strategy`, i.e. `strategies[strategy]` in the
    /// singly linked view. The sentinel maps to the head. Unknown addresses
    /// map to zero.
    pub fn next(&self, strategy: &Address) -> Address {
        if *strategy == Address::SENTINEL {
            return self.head;
        }

        self.links
            .get(strategy)
            .map(|link| link.next)
            .unwrap_or(Address::ZERO)
    }

    /// Insert at the head
    pub fn enable(&mut self, strategy: Address) -> Result<(), RegistryError> {
        if strategy.is_zero() || strategy == Address::SENTINEL {
            return Err(RegistryError::InvalidStrategy(strategy));
        }

        if self.links.contains_key(&strategy) {
            return Err(RegistryError::DuplicateStrategy(strategy));
        }

        let old_head = self.head;
        if let Some(link) = self.links.get_mut(&old_head) {
            link.prev = strategy;
        }

        self.links.insert(
            strategy,
            Link {
                prev: Address::SENTINEL,
                next: old_head,
            },
        );
        self.head = strategy;

        Ok(())
    }

    /// Unlink `strategy`, which must directly follow `prev`
    pub fn disable(&mut self, prev: Address, strategy: Address) -> Result<(), RegistryError> {
        if strategy.is_zero() || strategy == Address::SENTINEL {
            return Err(RegistryError::InvalidStrategy(strategy));
        }

        let link = *self
            .links
            .get(&strategy)
            .ok_or(RegistryError::StrategyNotFound(strategy))?;

        if link.prev != prev {
            return Err(RegistryError::InvalidPrev { prev, strategy });
        }

        if link.prev == Address::SENTINEL {
            self.head = link.next;
        } else if let Some(prev_link) = self.links.get_mut(&link.prev) {
            prev_link.next = link.next;
        }

        if let Some(next_link) = self.links.get_mut(&link.next) {
            next_link.prev = link.prev;
        }

        self.links.remove(&strategy);

        Ok(())
    }

    /// Up to `page_size` entries following `start` (exclusive), plus the
    /// address to resume from.
    ///
    /// The continuation is the last returned entry while more remain and the
    /// sentinel once the list is exhausted. A `start` that is neither the
    /// sentinel nor enabled yields an empty page and the zero address.
    pub fn page(&self, start: Address, page_size: usize) -> (Vec<Address>, Address) {
        let mut cursor = if start == Address::SENTINEL {
            self.head
        } else {
            match self.links.get(&start) {
                Some(link) => link.next,
                None => return (vec![], Address::ZERO),
            }
        };

        let mut page = Vec::with_capacity(page_size.min(self.links.len()));
        while cursor != Address::SENTINEL && page.len() < page_size {
            page.push(cursor);
            cursor = self.next(&cursor);
        }

        let next = if cursor == Address::SENTINEL {
            Address::SENTINEL
        } else {
            page.last().copied().unwrap_or(start)
        };

        (page, next)
    }

    /// All entries, most recently enabled first
    pub fn iter(&self) -> impl Iterator<Item = Address> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            if cursor == Address::SENTINEL {
                return None;
            }
            let current = cursor;
            cursor = self.next(&current);
            Some(current)
        })
    }
}
