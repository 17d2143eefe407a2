//! Registry configuration.
//!
//! Follows the builder-with-defaults pattern: construct with
//! [`RegistryConfig::default`], override what you need, then build the
//! registry.
//!
//! # Example
//!
//! ```
//! use keylock::{NamedLockRegistry, RegistryConfig};
//!
//! let registry = NamedLockRegistry::with_config(
//!     RegistryConfig::default().initial_capacity(256),
//! );
//! assert_eq!(registry.tracked_keys(), 0);
//! ```

/// Configuration for a [`NamedLockRegistry`](crate::NamedLockRegistry).
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Initial capacity of the key map. Entries are created and reclaimed
    /// on demand regardless; this only pre-sizes the allocation for
    /// workloads with a known hot-key population.
    pub initial_capacity: usize,
}

impl RegistryConfig {
    /// Sets the initial capacity of the key map.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty_map() {
        let config = RegistryConfig::default();
        assert_eq!(config.initial_capacity, 0);
    }

    #[test]
    fn builder_overrides_capacity() {
        let config = RegistryConfig::default().initial_capacity(128);
        assert_eq!(config.initial_capacity, 128);
    }
}
