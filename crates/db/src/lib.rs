//! Backend access for the portfolio content layer.
//!
//! The hosted relational store is reached through the [`backend::Backend`]
//! trait. Three implementations are provided: [`rest::RestBackend`] for the
//! hosted REST endpoint, [`pg::PgBackend`] for a direct Postgres connection,
//! and [`memory::MemoryBackend`] for tests and offline runs.

pub mod auth;
pub mod backend;
pub mod memory;
pub mod models;
pub mod pg;
pub mod repositories;
pub mod rest;

pub use pg::{create_pool, health_check, run_migrations, DbPool};
