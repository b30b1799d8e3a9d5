//! Per-scope refresh serialization

use dashmap::DashMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use types::Address;

/// Unit of refresh isolation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeKey {
    Factory,
    Account(Address),
    Exchange(Address),
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKey::Factory => f.write_str("factory"),
            ScopeKey::Account(a) => write!(f, "account {a}"),
            ScopeKey::Exchange(e) => write!(f, "exchange {e}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct ScopeLocks {
    locks: DashMap<ScopeKey, Arc<Mutex<()>>>,
}

/// Held for the duration of one refresh
#[derive(Debug)]
pub struct ScopeGuard {
    guards: Vec<OwnedMutexGuard<()>>,
}

impl ScopeGuard {
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every key, always in ascending key order
    pub async fn acquire(&self, keys: impl IntoIterator<Item = ScopeKey>) -> ScopeGuard {
        let ordered: BTreeSet<ScopeKey> = keys.into_iter().collect();
        let mut guards = Vec::with_capacity(ordered.len());
        for key in ordered {
            let lock = self.locks.entry(key).or_default().clone();
            guards.push(lock.lock_owned().await);
        }
        ScopeGuard { guards }
    }
}
