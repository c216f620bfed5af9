//! Registry configuration

/// Configuration for the producer registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum records retained per producer in the in-memory history
    pub history_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
        }
    }
}

impl RegistryConfig {
    /// Set the per-producer history capacity
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.history_capacity, 1000);
    }

    #[test]
    fn test_builder() {
        let config = RegistryConfig::default().history_capacity(16);
        assert_eq!(config.history_capacity, 16);
    }
}
