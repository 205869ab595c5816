// Run driver: reads csv rows one at a time, turns each into an asset record
// and hands it to a sink, keeping count of what happened.

use crate::api::{ApiClient, Submission};
use crate::error::UploadError;
use crate::record::{build_record, AssetRecord, Mode};
use csv::StringRecord;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::{debug, error, info, instrument};

/// Destination for built records.
pub trait AssetSink {
    fn submit(&mut self, record: &AssetRecord) -> Result<Submission, UploadError>;
}

/// Prints each record as one JSON line instead of calling the API.
pub struct DryRun<W: Write> {
    out: W,
}

impl<W: Write> DryRun<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> AssetSink for DryRun<W> {
    fn submit(&mut self, record: &AssetRecord) -> Result<Submission, UploadError> {
        serde_json::to_writer(&mut self.out, record)?;
        writeln!(self.out)?;
        Ok(Submission::Accepted)
    }
}

/// Counters for one run. Only reported, never persisted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Data rows seen, header excluded
    pub records_read: usize,
    /// Rows the API answered with a new asset id
    pub records_created: usize,
    /// Rows skipped because of a malformed row or a failed call
    pub records_failed: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handled {} records, created {}, failed {}",
            self.records_read, self.records_created, self.records_failed
        )
    }
}

/// Everything a run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub mode: Mode,
    pub base_url: String,
    pub api_key: String,
    pub file: PathBuf,
    /// Treat the first row of the file as a header and skip it
    pub skip_header: bool,
    pub dry_run: bool,
    pub quiet: bool,
}

/// Wrap `input` in a csv reader. Headers are handled by [upload] so the
/// reader itself yields every row, and rows of any length get through to
/// the field count check in the record builder.
pub fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input)
}

/// Push every data row of `rdr` through `sink`.
///
/// Row level failures are logged and counted; they never end the run.
#[instrument(name = "upload", skip_all, fields(mode = %mode))]
pub fn upload<R, S>(
    mut rdr: csv::Reader<R>,
    mode: Mode,
    skip_header: bool,
    sink: &mut S,
    progress: &ProgressBar,
) -> RunSummary
where
    R: Read,
    S: AssetSink,
{
    let mut summary = RunSummary::default();
    let mut header_skipped = !skip_header;

    for row in rdr.records() {
        if !header_skipped {
            debug!("Skipping header row");
            header_skipped = true;
            continue;
        }

        summary.records_read += 1;
        match submit_row(row, mode, sink) {
            Ok(Submission::Created { id }) => {
                debug!("Created asset {}", id);
                summary.records_created += 1;
            }
            Ok(Submission::Accepted) => {}
            Err(e) => {
                error!("Skipping row {}: {}", summary.records_read, e);
                summary.records_failed += 1;
            }
        }

        progress.set_message(format!(
            "{} read, {} created",
            summary.records_read, summary.records_created
        ));
        progress.tick();
    }

    summary
}

fn submit_row<S: AssetSink>(
    row: Result<StringRecord, csv::Error>,
    mode: Mode,
    sink: &mut S,
) -> Result<Submission, UploadError> {
    let record = build_record(&row?, mode)?;
    sink.submit(&record)
}

/// Open the input file and upload it to the configured sink.
///
/// Failing to open the file or to build the HTTP client ends the run before
/// any row is read; nothing after that does.
#[instrument(name = "run", skip_all, fields(file = %config.file.display()))]
pub fn run(config: &UploadConfig) -> Result<RunSummary, UploadError> {
    info!("Starting {} asset upload", config.mode);
    debug!("Request URL: {}", config.base_url);
    debug!("Opening input file: {}", config.file.display());
    let rdr = csv_reader(File::open(&config.file)?);

    let progress = if config.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            pb.set_style(style);
        }
        pb
    };

    let summary = if config.dry_run {
        let mut sink = DryRun::new(io::stdout().lock());
        upload(rdr, config.mode, config.skip_header, &mut sink, &progress)
    } else {
        let mut sink = ApiClient::new(config.base_url.clone(), config.api_key.clone())?;
        upload(rdr, config.mode, config.skip_header, &mut sink, &progress)
    };

    progress.finish_with_message(summary.to_string());
    info!("{} -- DONE", summary);
    Ok(summary)
}
