use crate::record::Mode;
use reqwest::StatusCode;

/// Everything that can go wrong while uploading. Only [UploadError::Io] on
/// the input file is fatal to a run; every other variant skips one row.
#[derive(thiserror::Error, Debug)]
pub enum UploadError {
    #[error("Malformed {mode} row: expected at least {expected} fields, found {found}")]
    MalformedRow {
        mode: Mode,
        expected: usize,
        found: usize,
    },
    #[error("Error submitting API call: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Unable to perform API call - error code {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Unable to decode API response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("Unreadable csv row: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unable to write record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
