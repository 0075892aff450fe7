//! Rate limiting for per-cell diagnostics.
//!
//! The resampling engine can hit the same warning condition (an out-of-bounds
//! sample, a degenerate outline, an odd scanline-intersect count) thousands of
//! times within a single run. Logging every occurrence would drown the useful
//! signal, so callers route these through a [`WarnOnce`] registry keyed by a
//! short string: the first occurrence of a key is logged immediately, later
//! occurrences are only counted, and [`WarnOnce::summary`] reports the total
//! per key for the end-of-run log line.

use std::collections::HashMap;

#[derive(Default, Debug)]
pub struct WarnOnce {
    counts: HashMap<&'static str, u64>,
}

impl WarnOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an occurrence of `key`, returning `true` the first time it is
    /// seen so the caller knows to emit the log message.
    pub fn record(&mut self, key: &'static str) -> bool {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        *count == 1
    }

    pub fn count(&self, key: &'static str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn summary(&self) -> Vec<(&'static str, u64)> {
        let mut entries: Vec<_> = self.counts.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_occurrence_reported() {
        let mut w = WarnOnce::new();
        assert!(w.record("odd_intersects"));
        assert!(!w.record("odd_intersects"));
        assert!(!w.record("odd_intersects"));
        assert_eq!(w.count("odd_intersects"), 3);
        assert_eq!(w.count("other"), 0);
    }

    #[test]
    fn independent_keys() {
        let mut w = WarnOnce::new();
        assert!(w.record("a"));
        assert!(w.record("b"));
        assert_eq!(w.summary(), vec![("a", 1), ("b", 1)]);
    }
}
