//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `Deserialize` entity struct matching the backend row
//! - A `Serialize` create DTO for inserts
//! - A `Serialize` update DTO (all `Option` fields, `None` omitted) for patches

pub mod category;
pub mod media;
pub mod project;
