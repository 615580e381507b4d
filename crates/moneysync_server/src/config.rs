//! Server configuration.

/// Configuration for the reference server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// First id handed out to created records.
    pub first_id: u64,
}

impl ServerConfig {
    /// Creates a configuration issuing ids from `first_id` upwards.
    pub fn new(first_id: u64) -> Self {
        Self {
            first_id: first_id.max(1),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        assert_eq!(ServerConfig::default().first_id, 1000);
    }

    #[test]
    fn first_id_is_positive() {
        assert_eq!(ServerConfig::new(0).first_id, 1);
    }
}
