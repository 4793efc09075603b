use tracing::warn;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: String,
    /// Default TTL applied to every cache entry, in milliseconds.
    pub cache_ttl_ms: u64,
    /// Fixed interval between write-back flush cycles, in milliseconds.
    pub flush_interval_ms: u64,
    /// Per-entry timeout for a single durable write during a flush cycle.
    pub flush_timeout_ms: u64,
    /// Pending-write count that forces an out-of-schedule flush.
    pub backpressure_threshold: usize,
}

impl Config {
    const DEFAULT_DATA_DIR: &str = "./data";
    const DEFAULT_CACHE_TTL_MS: u64 = 3_600_000; // 1 hour
    const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5_000;
    const DEFAULT_FLUSH_TIMEOUT_MS: u64 = 2_000;
    const DEFAULT_BACKPRESSURE_THRESHOLD: usize = 64;

    pub fn from_env() -> Self {
        Self {
            host: std::env::var("STRATA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("STRATA_PORT", 8080),
            data_dir: std::env::var("STRATA_DATA_DIR")
                .unwrap_or_else(|_| Self::DEFAULT_DATA_DIR.to_string()),
            cache_ttl_ms: parse_env("STRATA_CACHE_TTL_MS", Self::DEFAULT_CACHE_TTL_MS),
            flush_interval_ms: parse_env(
                "STRATA_FLUSH_INTERVAL_MS",
                Self::DEFAULT_FLUSH_INTERVAL_MS,
            ),
            flush_timeout_ms: parse_env("STRATA_FLUSH_TIMEOUT_MS", Self::DEFAULT_FLUSH_TIMEOUT_MS),
            backpressure_threshold: parse_env(
                "STRATA_BACKPRESSURE_THRESHOLD",
                Self::DEFAULT_BACKPRESSURE_THRESHOLD,
            ),
        }
    }
}

fn parse_env<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default", name, raw);
            default
        }),
        Err(_) => default,
    }
}
