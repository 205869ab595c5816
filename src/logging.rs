// Log setup: every run appends to a log file that is rolled over once a
// week, keeping the last few weeks next to it.

use chrono::{DateTime, Datelike, IsoWeek, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// ISO-8601 with milliseconds and the local UTC offset,
/// e.g. `2026-10-18T09:14:03.512+02:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

pub const DEFAULT_LOG_FILE: &str = "asset-upload.log";

pub const DEFAULT_FILTER: &str = "info,asset_upload=debug";

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub path: PathBuf,
    /// Rotated files kept besides the live one
    pub retained_files: usize,
    /// `EnvFilter` directives, e.g. `RUST_LOG`
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_LOG_FILE),
            retained_files: 4,
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

/// Build the subscriber for a run. The caller decides how long it is in
/// effect, typically with [tracing::subscriber::with_default].
pub fn subscriber(config: &LogConfig) -> io::Result<impl tracing::Subscriber + Send + Sync> {
    let writer = WeeklyFile::open(&config.path, config.retained_files)?;
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(writer))
        .with_ansi(false)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_target(true)
        .finish())
}

/// Append-only log file that moves itself aside when the ISO week changes.
///
/// The live file keeps its name; rotated files get the week they cover
/// appended, `asset-upload.log.2026-W41`, so they sort oldest first.
pub struct WeeklyFile {
    path: PathBuf,
    retained: usize,
    week: IsoWeek,
    file: File,
}

impl WeeklyFile {
    pub fn open(path: impl Into<PathBuf>, retained: usize) -> io::Result<Self> {
        Self::open_at(path.into(), retained, Local::now())
    }

    fn open_at(path: PathBuf, retained: usize, now: DateTime<Local>) -> io::Result<Self> {
        // A file left behind by a run in an earlier week is rolled first
        if let Ok(meta) = fs::metadata(&path) {
            let modified: DateTime<Local> = meta.modified()?.into();
            if modified.iso_week() != now.iso_week() {
                rotate(&path, modified.iso_week(), retained)?;
            }
        }

        let file = open_append(&path)?;
        Ok(Self {
            path,
            retained,
            week: now.iso_week(),
            file,
        })
    }

    fn roll_to(&mut self, now: DateTime<Local>) -> io::Result<()> {
        let week = now.iso_week();
        if week == self.week {
            return Ok(());
        }

        self.file.flush()?;
        rotate(&self.path, self.week, self.retained)?;
        self.file = open_append(&self.path)?;
        self.week = week;
        Ok(())
    }
}

impl Write for WeeklyFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.roll_to(Local::now())?;
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn backup_path(path: &Path, week: IsoWeek) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}-W{:02}", week.year(), week.week()));
    PathBuf::from(name)
}

fn rotate(path: &Path, week: IsoWeek, retained: usize) -> io::Result<()> {
    fs::rename(path, backup_path(path, week))?;
    prune(path, retained)
}

/// Drop the oldest rotated files until at most `retained` are left.
fn prune(path: &Path, retained: usize) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let prefix = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => format!("{}.", n),
        None => return Ok(()),
    };

    let mut backups: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(&prefix))
                .map_or(false, is_week_suffix)
        })
        .collect();
    backups.sort();

    let excess = backups.len().saturating_sub(retained);
    for old in &backups[..excess] {
        fs::remove_file(old)?;
    }
    Ok(())
}

// 2026-W07
fn is_week_suffix(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 8
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5] == b'W'
        && b[6..].iter().all(u8::is_ascii_digit)
}
