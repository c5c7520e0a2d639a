//! Domain records shared across the storage, pipeline and API layers.

pub mod enums;
pub mod file;
pub mod requirement;
pub mod test_case;

pub use enums::{ComplianceTag, FileStatus, RiskLevel};
pub use file::{FileSummary, StoredFile};
pub use requirement::Requirement;
pub use test_case::TestCase;
