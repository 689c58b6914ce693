//! Byte-bounded most-recently-used buffer keyed by element id.
//!
//! Strain and displacement tensors are expensive to reconstruct, so each mesh
//! handle keeps one buffer per field kind. The protocol is
//! `contains` → `get`/`add`: `contains` counts a hit or a miss, `get`
//! refreshes recency, `add` inserts and then evicts strictly
//! least-recently-used entries until the byte total fits the budget again.
//!
//! Recency is a monotonic sequence number per entry; eviction scans for the
//! minimum. Buffers hold at most a few hundred elements, so the scan is
//! cheaper than maintaining an intrusive list.

use std::collections::HashMap;

/// Nominal in-memory size of a buffered value.
pub trait ByteSized {
    /// Byte count used for budget accounting.
    fn size_bytes(&self) -> u64;
}

impl<D: ndarray::Dimension> ByteSized for ndarray::Array<f64, D> {
    fn size_bytes(&self) -> u64 {
        (self.len() * std::mem::size_of::<f64>()) as u64
    }
}

struct Entry<V> {
    value: V,
    bytes: u64,
    last_used: u64,
}

/// Bounded MRU buffer with hit/miss accounting.
pub struct LruBuffer<V> {
    entries: HashMap<u64, Entry<V>>,
    max_bytes: u64,
    total_bytes: u64,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl<V: ByteSized> LruBuffer<V> {
    /// Create a buffer with a budget given in whole megabytes.
    #[must_use]
    pub fn with_budget_mb(megabytes: u64) -> Self {
        Self {
            entries: HashMap::new(),
            max_bytes: megabytes * 1024 * 1024,
            total_bytes: 0,
            clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Whether `key` is buffered; updates the hit/miss counters.
    pub fn contains(&mut self, key: u64) -> bool {
        let contains = self.entries.contains_key(&key);
        if contains {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        contains
    }

    /// Fetch a buffered value and mark it most-recently-used.
    pub fn get(&mut self, key: u64) -> Option<&V> {
        self.clock += 1;
        let clock = self.clock;
        self.entries.get_mut(&key).map(|e| {
            e.last_used = clock;
            &e.value
        })
    }

    /// Insert a value, then evict least-recently-used entries until the byte
    /// total fits the budget. A value larger than the whole budget is evicted
    /// immediately, leaving the buffer unchanged apart from the counters.
    pub fn add(&mut self, key: u64, value: V) {
        let bytes = value.size_bytes();
        self.clock += 1;
        if let Some(old) = self.entries.insert(
            key,
            Entry {
                value,
                bytes,
                last_used: self.clock,
            },
        ) {
            self.total_bytes -= old.bytes;
        }
        self.total_bytes += bytes;

        while self.total_bytes > self.max_bytes {
            let Some((&oldest, _)) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
            else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&oldest) {
                self.total_bytes -= evicted.bytes;
            }
        }
    }

    /// Current byte total of all buffered values.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Fraction of `contains` calls that were hits (0 when never queried).
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use proptest::prelude::*;

    fn value(len_bytes: u64) -> Array1<f64> {
        Array1::zeros((len_bytes / 8) as usize)
    }

    /// Buffer with a budget of exactly `n` bytes (test granularity).
    fn buffer_with_bytes(n: u64) -> LruBuffer<Array1<f64>> {
        let mut b = LruBuffer::with_budget_mb(0);
        b.max_bytes = n;
        b
    }

    #[test]
    fn added_key_is_contained() {
        let mut b = buffer_with_bytes(1024);
        assert!(!b.contains(7));
        b.add(7, value(64));
        assert!(b.contains(7));
        assert_eq!(b.size_bytes(), 64);
    }

    #[test]
    fn byte_total_never_exceeds_budget() {
        let mut b = buffer_with_bytes(256);
        for k in 0..32 {
            b.add(k, value(64));
            assert!(b.size_bytes() <= 256);
        }
    }

    #[test]
    fn get_refreshes_recency_and_eviction_targets_lru() {
        let mut b = buffer_with_bytes(192);
        b.add(1, value(64));
        b.add(2, value(64));
        b.add(3, value(64));
        // Refresh 1; the next eviction must take 2.
        assert!(b.contains(1));
        let _ = b.get(1);
        b.add(4, value(64));
        assert!(b.contains(1));
        assert!(!b.contains(2));
        assert!(b.contains(3));
        assert!(b.contains(4));
    }

    #[test]
    fn oversized_value_does_not_stick() {
        let mut b = buffer_with_bytes(100);
        b.add(1, value(64));
        b.add(2, value(512));
        assert_eq!(b.size_bytes(), 0);
        assert!(!b.contains(2));
    }

    #[test]
    fn replacing_a_key_accounts_bytes_once() {
        let mut b = buffer_with_bytes(1024);
        b.add(1, value(64));
        b.add(1, value(128));
        assert_eq!(b.size_bytes(), 128);
    }

    #[test]
    fn efficiency_counts_contains_calls() {
        let mut b = buffer_with_bytes(1024);
        assert_eq!(b.efficiency(), 0.0);
        assert!(!b.contains(1)); // miss
        b.add(1, value(8));
        assert!(b.contains(1)); // hit
        assert!(b.contains(1)); // hit
        assert!((b.efficiency() - 2.0 / 3.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_budget_invariant(ops in proptest::collection::vec((0u64..16, 8u64..128), 1..200)) {
            let mut b = buffer_with_bytes(256);
            for (key, size) in ops {
                if b.contains(key) {
                    let _ = b.get(key);
                } else {
                    b.add(key, value(size / 8 * 8));
                }
                prop_assert!(b.size_bytes() <= 256);
            }
        }
    }
}
