//! Cached portfolio queries.
//!
//! [`QueryClient`] owns the caches and the backend handle. The
//! [`CategoryRegistry`], [`ProjectQueries`] and [`Mutations`] views read and
//! write through it.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod key;
pub mod mutations;
pub mod projects;
pub mod registry;

pub use cache::{QueryCache, QueryResult, QueryStatus};
pub use client::QueryClient;
pub use config::QueryConfig;
pub use error::QueryError;
pub use key::{ProjectScope, QueryKey};
pub use mutations::Mutations;
pub use projects::ProjectQueries;
pub use registry::CategoryRegistry;
