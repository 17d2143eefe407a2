//! Refcounted per-key mutual exclusion.
//!
//! The registry owns a map from key to entry, where an entry is a per-key
//! mutex plus a count of everyone holding or currently waiting on it. A
//! single guard mutex serializes all map mutation; it is never held while
//! waiting on a per-key mutex, so unrelated keys stay independent.
//!
//! # Entry lifetime
//!
//! An acquire attempt takes a reference on the entry *before* waiting
//! (creating the entry if absent) and gives it back when it stops holding
//! or waiting — on release for successful attempts, immediately for probes
//! and bounded waits that come back empty-handed. Whichever decrement
//! reaches zero removes the entry. The per-key mutex is unlocked only
//! after removal, through a private `Arc` clone, so a new entry for the
//! same key always starts with a fresh, unlocked mutex.
//!
//! # Non-reentrancy
//!
//! The per-key mutex is non-reentrant: a thread that already holds key `K`
//! and acquires `K` again deadlocks. Nest on *different* keys only, and
//! keep a consistent key order if you must nest at all.

#![allow(unsafe_code)]

use parking_lot::lock_api::{RawMutex as _, RawMutexTimed as _};
use parking_lot::{Mutex, RawMutex};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use crate::config::RegistryConfig;
use crate::error::UnmatchedReleaseError;
use crate::registry::metrics::Counters;
use crate::registry::RegistryMetricsSnapshot;

/// How long an acquire attempt is willing to block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Block until the key's lock is available. Cannot fail.
    Forever,
    /// Probe without blocking: succeed iff the lock is free right now.
    NoWait,
    /// Block for at most this long, then give up.
    For(Duration),
}

/// Per-key state. Lives in the map exactly while `refs > 0`.
struct Entry {
    /// The per-key exclusion primitive. `Arc`ed so a releasing caller can
    /// unlock it after the entry has been removed from the map.
    raw: Arc<RawMutex>,
    /// Live holders plus in-flight acquire attempts referencing this entry.
    refs: usize,
    /// Thread that currently owns the mutex through the registry, if any.
    /// Lets `release` reject callers that never acquired instead of
    /// silently unlocking another thread's critical section.
    holder: Option<ThreadId>,
}

/// A process-wide registry handing out one mutual-exclusion lock per
/// logical key.
///
/// Locks are created on first use and reclaimed exactly when no holder or
/// waiter still references them, so the map never accumulates idle keys.
///
/// # Example
///
/// ```
/// use keylock::{NamedLockRegistry, Wait};
/// use std::time::Duration;
///
/// let registry = NamedLockRegistry::new();
///
/// assert!(registry.acquire("cam-1", Wait::NoWait));
/// assert!(!registry.acquire("cam-1", Wait::For(Duration::from_millis(10))));
/// registry.release("cam-1").unwrap();
///
/// assert_eq!(registry.tracked_keys(), 0);
/// ```
pub struct NamedLockRegistry {
    /// The guard: serializes every mutation of the key map. Critical
    /// sections under it are short and never wait on a per-key mutex.
    entries: Mutex<HashMap<String, Entry>>,
    counters: Counters,
}

impl NamedLockRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::with_capacity(config.initial_capacity)),
            counters: Counters::default(),
        }
    }

    // ── Raw acquire / release ─────────────────────────────────────────────

    /// Attempts to acquire the lock for `key`.
    ///
    /// Returns `true` once the calling thread owns the key's lock. Returns
    /// `false` when a [`Wait::NoWait`] probe finds the lock held or a
    /// [`Wait::For`] wait times out — a normal outcome under contention,
    /// not an error. [`Wait::Forever`] always returns `true`.
    ///
    /// A successful acquire must be paired with exactly one [`release`] on
    /// the same thread. Prefer the scoped forms ([`lock`], [`with_lock`])
    /// unless you need the probe or bounded-wait semantics raw.
    ///
    /// [`release`]: Self::release
    /// [`lock`]: Self::lock
    /// [`with_lock`]: Self::with_lock
    pub fn acquire(&self, key: &str, wait: Wait) -> bool {
        // Register interest before waiting so the entry cannot be
        // reclaimed underneath us; drop the guard before blocking.
        let raw = self.join(key);

        let acquired = match wait {
            Wait::Forever => {
                if !raw.try_lock() {
                    self.counters.record_contention();
                    raw.lock();
                }
                true
            }
            Wait::NoWait => {
                let locked = raw.try_lock();
                if !locked {
                    self.counters.record_contention();
                }
                locked
            }
            Wait::For(timeout) => {
                if raw.try_lock() {
                    true
                } else {
                    self.counters.record_contention();
                    raw.try_lock_for(timeout)
                }
            }
        };

        if acquired {
            self.adopt(key);
            self.counters.record_acquisition();
        } else {
            // A failed attempt gives back the reference it took above;
            // without this the entry would outlive its last real holder.
            self.unref(key);
            self.counters.record_failed_attempt();
        }
        acquired
    }

    /// Releases the lock for `key` previously acquired by this thread.
    ///
    /// # Errors
    ///
    /// Returns [`UnmatchedReleaseError`] when the key has no entry, when
    /// its lock is not currently held, or when it is held by a different
    /// thread. Unmatched releases indicate a caller logic bug and are
    /// never silently accepted.
    pub fn release(&self, key: &str) -> Result<(), UnmatchedReleaseError> {
        let raw = {
            let mut entries = self.entries.lock();
            let Some(entry) = entries.get_mut(key) else {
                return Err(UnmatchedReleaseError::new(key));
            };
            if entry.holder != Some(thread::current().id()) {
                return Err(UnmatchedReleaseError::new(key));
            }
            entry.holder = None;
            entry.refs -= 1;
            let raw = Arc::clone(&entry.raw);
            if entry.refs == 0 {
                entries.remove(key);
                self.counters.record_entry_reclaimed();
            }
            raw
        };
        // Unlock after the map mutation: this clone predates any removal,
        // and a new entry for the same key gets a distinct mutex, so late
        // unlocking cannot leak into a successor entry.
        //
        // Safety: the holder check above proved the calling thread owns
        // this mutex.
        unsafe { raw.unlock() };
        Ok(())
    }

    // ── Scoped forms ──────────────────────────────────────────────────────

    /// Acquires the lock for `key`, blocking indefinitely, and returns a
    /// guard that releases it on drop.
    pub fn lock(&self, key: &str) -> KeyGuard<'_> {
        let acquired = self.acquire(key, Wait::Forever);
        debug_assert!(acquired, "indefinite acquire cannot fail");
        KeyGuard::new(self, key)
    }

    /// Probes the lock for `key` without blocking.
    ///
    /// Returns a guard iff the lock was free at call time.
    pub fn try_lock(&self, key: &str) -> Option<KeyGuard<'_>> {
        self.acquire(key, Wait::NoWait)
            .then(|| KeyGuard::new(self, key))
    }

    /// Acquires the lock for `key`, waiting at most `timeout`.
    pub fn try_lock_for(&self, key: &str, timeout: Duration) -> Option<KeyGuard<'_>> {
        self.acquire(key, Wait::For(timeout))
            .then(|| KeyGuard::new(self, key))
    }

    /// Runs `body` while holding the lock for `key`.
    ///
    /// The lock is released on every exit path, including early return
    /// from `body` and panic propagation. This is the form collaborators
    /// should reach for by default.
    pub fn with_lock<R>(&self, key: &str, body: impl FnOnce() -> R) -> R {
        let _guard = self.lock(key);
        body()
    }

    // ── Introspection ─────────────────────────────────────────────────────

    /// Number of keys currently tracked (held or waited on).
    ///
    /// A registry with no live holders and no waiters reports zero; an
    /// idle key that still shows up here would be a refcount leak.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if `key` currently has an entry in the map.
    #[must_use]
    pub fn is_tracked(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Returns true if some thread currently holds the lock for `key`.
    #[must_use]
    pub fn is_held(&self, key: &str) -> bool {
        self.entries
            .lock()
            .get(key)
            .is_some_and(|entry| entry.holder.is_some())
    }

    /// Current reference count for `key`: live holders plus in-flight
    /// acquire attempts. Zero if the key is untracked.
    #[must_use]
    pub fn attempts(&self, key: &str) -> usize {
        self.entries.lock().get(key).map_or(0, |entry| entry.refs)
    }

    /// Returns a snapshot of the activity counters.
    ///
    /// All zeros unless the `lock-metrics` feature is enabled.
    #[must_use]
    pub fn snapshot(&self) -> RegistryMetricsSnapshot {
        self.counters.snapshot()
    }

    /// Resets the activity counters to zero.
    pub fn reset_metrics(&self) {
        self.counters.reset();
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Takes a reference on `key`'s entry, creating it on first use, and
    /// returns a private handle to the per-key mutex. The guard is not
    /// held when this returns.
    fn join(&self, key: &str) -> Arc<RawMutex> {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(key) {
            entry.refs += 1;
            Arc::clone(&entry.raw)
        } else {
            let raw = Arc::new(RawMutex::INIT);
            entries.insert(
                key.to_owned(),
                Entry {
                    raw: Arc::clone(&raw),
                    refs: 1,
                    holder: None,
                },
            );
            self.counters.record_entry_created();
            raw
        }
    }

    /// Records the calling thread as the live holder of `key`.
    fn adopt(&self, key: &str) {
        let mut entries = self.entries.lock();
        // The entry cannot have been reclaimed: our own reference from
        // `join` keeps it alive until release or unref.
        if let Some(entry) = entries.get_mut(key) {
            debug_assert!(entry.holder.is_none(), "lock acquired twice for {key:?}");
            entry.holder = Some(thread::current().id());
        } else {
            debug_assert!(false, "entry for {key:?} vanished while referenced");
        }
    }

    /// Gives back the reference a failed attempt took in `join`,
    /// reclaiming the entry if it was the last one.
    fn unref(&self, key: &str) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(key) {
            entry.refs -= 1;
            if entry.refs == 0 {
                entries.remove(key);
                self.counters.record_entry_reclaimed();
            }
        } else {
            debug_assert!(false, "entry for {key:?} vanished while referenced");
        }
    }
}

impl Default for NamedLockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NamedLockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedLockRegistry")
            .field("tracked_keys", &self.tracked_keys())
            .finish_non_exhaustive()
    }
}

/// A guard holding the lock for one key; releases it on drop.
///
/// Obtained from [`NamedLockRegistry::lock`], [`try_lock`], or
/// [`try_lock_for`]. The guard is `!Send`: releases must happen on the
/// acquiring thread because holdership is tracked per thread.
///
/// [`try_lock`]: NamedLockRegistry::try_lock
/// [`try_lock_for`]: NamedLockRegistry::try_lock_for
#[must_use = "the key is released immediately if the guard is not held"]
pub struct KeyGuard<'a> {
    registry: &'a NamedLockRegistry,
    key: String,
    /// Pins the guard to the acquiring thread.
    _not_send: PhantomData<*const ()>,
}

impl<'a> KeyGuard<'a> {
    fn new(registry: &'a NamedLockRegistry, key: &str) -> Self {
        Self {
            registry,
            key: key.to_owned(),
            _not_send: PhantomData,
        }
    }

    /// The key this guard holds.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // A guard is a matched release by construction; this can only fail
        // if a caller bypassed the guard with a raw `release` on the same
        // key, which is its own bug.
        let released = self.registry.release(&self.key);
        debug_assert!(released.is_ok(), "guard release must match its acquire");
    }
}

impl fmt::Debug for KeyGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGuard").field("key", &self.key).finish()
    }
}
