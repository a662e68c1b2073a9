//! Portfolio section runtime: configuration, backend selection, the
//! navigation orchestrator and its event channel.

pub mod config;
pub mod connect;
pub mod events;
pub mod orchestrator;
pub mod snapshot;

pub use orchestrator::Orchestrator;
