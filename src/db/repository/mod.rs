//! Repository layer: entity-scoped database operations.
//!
//! All public functions are re-exported here so callers can stay on
//! `db::repository::*` without tracking the sub-module split.

mod file;
mod requirement;
mod test_case;

pub use file::*;
pub use requirement::*;
pub use test_case::*;
