//! Default configuration values

/// Network defaults
pub mod network {
    pub const GAS_PRICE: u64 = 2500;
    pub const GAS_LIMIT: u64 = 20_000_000;

    /// Confirmation wait per submitted operation (seconds)
    pub const CONFIRMATION_TIMEOUT_SECS: u64 = 30;
}

/// State mirror defaults
pub mod mirror {
    /// Concurrent gateway reads per refresh
    pub const MAX_CONCURRENT_READS: usize = 16;

    /// Retries per read after the first attempt
    pub const MAX_RETRIES: u32 = 3;

    pub const INITIAL_BACKOFF_MS: u64 = 100;
    pub const MAX_BACKOFF_MS: u64 = 5000;
}

/// Logging defaults
pub mod logging {
    pub const LEVEL: &str = "info";
}

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "MIRROR";
