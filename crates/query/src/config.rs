use std::time::Duration;

/// Default freshness window of a cached query.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Default upper bound on a single fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// An environment variable held a value that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{name} must be a whole number of seconds, got '{value}'")]
pub struct InvalidSeconds {
    pub name: &'static str,
    pub value: String,
}

/// Cache timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// How long a fetched value is served without revalidation.
    pub stale_time: Duration,
    /// Fetches running longer than this fail with a timeout.
    pub fetch_timeout: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl QueryConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `FOLIO_STALE_SECS`         | `300`   |
    /// | `FOLIO_FETCH_TIMEOUT_SECS` | `20`    |
    pub fn from_env() -> Result<Self, InvalidSeconds> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InvalidSeconds>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |name: &'static str, default: Duration| match lookup(name) {
            Some(value) => parse_secs(name, &value),
            None => Ok(default),
        };
        Ok(Self {
            stale_time: secs("FOLIO_STALE_SECS", DEFAULT_STALE_TIME)?,
            fetch_timeout: secs("FOLIO_FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT)?,
        })
    }
}

fn parse_secs(name: &'static str, value: &str) -> Result<Duration, InvalidSeconds> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| InvalidSeconds {
            name,
            value: value.to_string(),
        })
}
