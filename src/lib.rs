//! Dynamic named-lock registry.
//!
//! Many independently addressable resources (cameras, workflows,
//! configuration records) need their operations serialized per resource
//! while operations on *different* resources proceed in parallel. The key
//! set is not known in advance; it grows and shrinks as requests arrive.
//!
//! [`NamedLockRegistry`] hands out one mutual-exclusion lock per logical
//! key, creates the lock on first use, and reclaims it exactly when no
//! holder or waiter still references it.
//!
//! # Example
//!
//! ```
//! use keylock::NamedLockRegistry;
//!
//! let registry = NamedLockRegistry::new();
//!
//! // Scoped form: released on every exit path, including panics.
//! registry.with_lock("cam-1", || {
//!     // exclusive access to the "cam-1" resource
//! });
//!
//! // Non-blocking probe: succeeds iff the key is free right now.
//! if let Some(guard) = registry.try_lock("cam-2") {
//!     drop(guard);
//! }
//!
//! // Nothing held, nothing waiting: the map is empty again.
//! assert_eq!(registry.tracked_keys(), 0);
//! ```
//!
//! # Guarantees
//!
//! - Operations on distinct keys never block one another beyond a brief
//!   map-mutation window.
//! - For a fixed key, at most one acquirer holds the lock at any instant.
//! - Once the last holder releases and the last waiter gives up, the key
//!   is absent from the registry; failed and timed-out attempts are
//!   accounted for, so abandoned waits never pin an entry.
//!
//! # Caveats
//!
//! The per-key lock is non-reentrant: acquiring a key a thread already
//! holds deadlocks. Releases must happen on the acquiring thread; the
//! scoped forms guarantee this by construction.

pub mod config;
pub mod error;
pub mod registry;

pub use config::RegistryConfig;
pub use error::UnmatchedReleaseError;
pub use registry::{KeyGuard, NamedLockRegistry, RegistryMetricsSnapshot, Wait};

#[cfg(test)]
pub(crate) mod test_utils;
