//! Feature-gated registry activity counters.
//!
//! When the `lock-metrics` feature is enabled, the registry counts
//! acquisitions, contention, failed attempts, and entry lifecycle events
//! with relaxed atomics. When disabled, the counters are zero-sized and
//! every recording call compiles away; `snapshot()` then returns zeros.

/// Snapshot of registry activity counters.
///
/// With the `lock-metrics` feature disabled all fields are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryMetricsSnapshot {
    /// Successful lock acquisitions (any wait mode).
    pub acquisitions: u64,
    /// Attempts that found the key already held, whether or not they
    /// eventually acquired it.
    pub contentions: u64,
    /// Probes and bounded waits that returned without the lock.
    pub failed_attempts: u64,
    /// Entries inserted into the map (first acquire of an absent key).
    pub entries_created: u64,
    /// Entries removed from the map (last reference dropped).
    pub entries_reclaimed: u64,
}

// ── Feature-gated implementation ──────────────────────────────────────────

#[cfg(feature = "lock-metrics")]
mod inner {
    use super::RegistryMetricsSnapshot;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Debug, Default)]
    pub(crate) struct Counters {
        acquisitions: AtomicU64,
        contentions: AtomicU64,
        failed_attempts: AtomicU64,
        entries_created: AtomicU64,
        entries_reclaimed: AtomicU64,
    }

    impl Counters {
        pub(crate) fn record_acquisition(&self) {
            self.acquisitions.fetch_add(1, Ordering::Relaxed);
        }

        pub(crate) fn record_contention(&self) {
            self.contentions.fetch_add(1, Ordering::Relaxed);
        }

        pub(crate) fn record_failed_attempt(&self) {
            self.failed_attempts.fetch_add(1, Ordering::Relaxed);
        }

        pub(crate) fn record_entry_created(&self) {
            self.entries_created.fetch_add(1, Ordering::Relaxed);
        }

        pub(crate) fn record_entry_reclaimed(&self) {
            self.entries_reclaimed.fetch_add(1, Ordering::Relaxed);
        }

        pub(crate) fn snapshot(&self) -> RegistryMetricsSnapshot {
            RegistryMetricsSnapshot {
                acquisitions: self.acquisitions.load(Ordering::Relaxed),
                contentions: self.contentions.load(Ordering::Relaxed),
                failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
                entries_created: self.entries_created.load(Ordering::Relaxed),
                entries_reclaimed: self.entries_reclaimed.load(Ordering::Relaxed),
            }
        }

        pub(crate) fn reset(&self) {
            self.acquisitions.store(0, Ordering::Relaxed);
            self.contentions.store(0, Ordering::Relaxed);
            self.failed_attempts.store(0, Ordering::Relaxed);
            self.entries_created.store(0, Ordering::Relaxed);
            self.entries_reclaimed.store(0, Ordering::Relaxed);
        }
    }
}

// ── No-op implementation (feature disabled) ───────────────────────────────

#[cfg(not(feature = "lock-metrics"))]
mod inner {
    use super::RegistryMetricsSnapshot;

    #[derive(Debug, Default)]
    pub(crate) struct Counters;

    impl Counters {
        #[inline]
        pub(crate) fn record_acquisition(&self) {}

        #[inline]
        pub(crate) fn record_contention(&self) {}

        #[inline]
        pub(crate) fn record_failed_attempt(&self) {}

        #[inline]
        pub(crate) fn record_entry_created(&self) {}

        #[inline]
        pub(crate) fn record_entry_reclaimed(&self) {}

        pub(crate) fn snapshot(&self) -> RegistryMetricsSnapshot {
            RegistryMetricsSnapshot::default()
        }

        pub(crate) fn reset(&self) {}
    }
}

pub(crate) use inner::Counters;
