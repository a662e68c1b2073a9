//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&dyn Backend` as the first argument.

pub mod category_repo;
pub mod media_repo;
pub mod project_repo;

pub use category_repo::CategoryRepo;
pub use media_repo::MediaRepo;
pub use project_repo::ProjectRepo;
