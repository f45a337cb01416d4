//! Counter sink for retry observability.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Destination for named counter increments.
///
/// Implementations are shared across every in-flight request, so they must
/// handle their own synchronisation.
pub trait StatsSink: Send + Sync {
    fn increment(&self, key: &str);
}

/// In-process counters, keyed and ordered by name.
#[derive(Debug, Default)]
pub struct MemoryStats {
    counters: Mutex<BTreeMap<String, u64>>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key` (0 if never incremented).
    pub fn get(&self, key: &str) -> u64 {
        self.lock().get(key).copied().unwrap_or(0)
    }

    /// Copy of all counters.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.lock().clone()
    }

    /// Counters whose name starts with `prefix`.
    pub fn with_prefix(&self, prefix: &str) -> BTreeMap<String, u64> {
        self.lock()
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    // Counters stay usable even if a holder panicked mid-increment.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, u64>> {
        self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StatsSink for MemoryStats {
    fn increment(&self, key: &str) {
        let mut counters = self.lock();
        match counters.get_mut(key) {
            Some(n) => *n += 1,
            None => {
                counters.insert(key.to_string(), 1);
            }
        }
    }
}
