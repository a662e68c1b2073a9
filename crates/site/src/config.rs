use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use folio_query::config::InvalidSeconds;
use folio_query::QueryConfig;

/// Number of projects shown in the collapsed portfolio section.
pub const DEFAULT_PREVIEW_LIMIT: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error(transparent)]
    Timing(#[from] InvalidSeconds),
}

/// Where portfolio content is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSettings {
    /// The hosted REST endpoint.
    Rest { api_url: String, anon_key: String },
    /// A Postgres database carrying the portfolio schema.
    Postgres { database_url: String },
    /// In-process tables, optionally seeded from a JSON file.
    Memory { seed_path: Option<PathBuf> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackendKind {
    Rest,
    Postgres,
    Memory,
}

impl FromStr for BackendKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(BackendKind::Rest),
            "postgres" | "pg" => Ok(BackendKind::Postgres),
            "memory" => Ok(BackendKind::Memory),
            _ => Err(()),
        }
    }
}

/// Owner sign-in credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Site configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub backend: BackendSettings,
    /// Sign in as the owner on startup when set.
    pub owner: Option<Credentials>,
    pub query: QueryConfig,
    pub preview_limit: usize,
}

impl SiteConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default    |
    /// |----------------------------|------------|
    /// | `FOLIO_BACKEND`            | `rest`     |
    /// | `FOLIO_API_URL`            | (required for `rest`) |
    /// | `FOLIO_ANON_KEY`           | (required for `rest`) |
    /// | `DATABASE_URL`             | (required for `postgres`) |
    /// | `FOLIO_SEED_PATH`          | none       |
    /// | `FOLIO_OWNER_EMAIL`        | none       |
    /// | `FOLIO_OWNER_PASSWORD`     | none       |
    /// | `FOLIO_STALE_SECS`         | `300`      |
    /// | `FOLIO_FETCH_TIMEOUT_SECS` | `20`       |
    /// | `FOLIO_PREVIEW_LIMIT`      | `6`        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let kind = match var("FOLIO_BACKEND") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "FOLIO_BACKEND",
                value,
            })?,
            None => BackendKind::Rest,
        };

        let backend = match kind {
            BackendKind::Rest => BackendSettings::Rest {
                api_url: required("FOLIO_API_URL")?,
                anon_key: required("FOLIO_ANON_KEY")?,
            },
            BackendKind::Postgres => BackendSettings::Postgres {
                database_url: required("DATABASE_URL")?,
            },
            BackendKind::Memory => BackendSettings::Memory {
                seed_path: var("FOLIO_SEED_PATH").map(PathBuf::from),
            },
        };

        let owner = match (var("FOLIO_OWNER_EMAIL"), var("FOLIO_OWNER_PASSWORD")) {
            (Some(email), Some(password)) => Some(Credentials { email, password }),
            (Some(_), None) => return Err(ConfigError::Missing("FOLIO_OWNER_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("FOLIO_OWNER_EMAIL")),
            (None, None) => None,
        };

        let preview_limit = match var("FOLIO_PREVIEW_LIMIT") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "FOLIO_PREVIEW_LIMIT",
                        value,
                    })
                }
            },
            None => DEFAULT_PREVIEW_LIMIT,
        };

        Ok(Self {
            backend,
            owner,
            query: QueryConfig::from_lookup(&var)?,
            preview_limit,
        })
    }
}
