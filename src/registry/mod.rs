//! Named-lock registry primitives.
//!
//! One lock per logical key, created on first use and reclaimed when the
//! last holder or waiter lets go.
//!
//! # Components
//!
//! - [`NamedLockRegistry`]: the key → lock map with refcounted lifetimes
//! - [`KeyGuard`]: RAII handle that releases its key on drop
//! - [`Wait`]: how long an acquire attempt is willing to block
//!
//! # Lifetime Pattern
//!
//! Every acquire attempt — successful or not — takes a reference on the
//! key's entry before waiting and drops it when it stops holding or
//! waiting. The entry exists in the map exactly while its refcount is
//! nonzero, so an idle key leaves no trace behind.

mod metrics;
mod named;

pub use metrics::RegistryMetricsSnapshot;
pub use named::{KeyGuard, NamedLockRegistry, Wait};
