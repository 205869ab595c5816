// Library root
// -----------
// The binary (`main.rs`) only parses arguments, sets up logging and calls
// `upload::run`; everything else lives here so it can be tested.
//
// Module responsibilities:
// - `record`: turns one csv row into a machine or user asset record.
// - `api`: blocking HTTP client that POSTs records to Graylog Security.
// - `upload`: the run loop, the sink abstraction and the run counters.
// - `cli`: command line flags and their mapping onto run settings.
// - `logging`: weekly rotating log file and the tracing subscriber.
// - `error`: the error type shared by all of the above.
pub mod api;
pub mod cli;
pub mod error;
pub mod logging;
pub mod record;
pub mod upload;

pub use api::{ApiClient, Submission};
pub use error::UploadError;
pub use record::{build_record, split_and_strip, AssetRecord, Mode};
pub use upload::{upload, AssetSink, RunSummary, UploadConfig};
