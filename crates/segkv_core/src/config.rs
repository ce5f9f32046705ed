//! Store configuration.

/// Default maximum segment size before rollover (10 MiB).
pub const DEFAULT_MAX_SEGMENT_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum size of the active segment before a new one is allocated.
    ///
    /// The threshold is checked once per put: a single record may push a
    /// segment past it, and rollover happens on the next put.
    pub max_segment_size: u64,

    /// Whether to create the store directory if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
            create_if_missing: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum segment size.
    #[must_use]
    pub const fn max_segment_size(mut self, size: u64) -> Self {
        self.max_segment_size = size;
        self
    }

    /// Sets whether to create the store directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.max_segment_size, DEFAULT_MAX_SEGMENT_SIZE);
        assert!(config.create_if_missing);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new().max_segment_size(1024).create_if_missing(false);

        assert_eq!(config.max_segment_size, 1024);
        assert!(!config.create_if_missing);
    }
}
