//! Pure domain logic for the portfolio content layer.
//!
//! Nothing in this crate performs I/O. Row models and backend access live in
//! `folio-db`; caching lives in `folio-query`.

pub mod category;
pub mod category_kind;
pub mod error;
pub mod media;
pub mod navigation;
pub mod project;
pub mod types;
