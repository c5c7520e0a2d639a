use crate::models::enums::FileStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded batch of documents. One row covers every file submitted in
/// a single upload: `filename` is the comma-joined list of original names,
/// `extracted_data` the concatenated requirement-document text and
/// `input_data` the concatenated input-example text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: Uuid,
    pub filename: String,
    pub extracted_data: String,
    pub input_data: String,
    pub status: FileStatus,
}

impl StoredFile {
    pub fn new(id: Uuid, filename: String, extracted_data: String, input_data: String) -> Self {
        Self {
            id,
            filename,
            extracted_data,
            input_data,
            status: FileStatus::Ingestion,
        }
    }
}

/// Listing view of a stored file without the (potentially large) document text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    pub id: Uuid,
    pub filename: String,
    pub status: FileStatus,
}
