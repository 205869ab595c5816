// Command line flags. `Cli` is parsed once in `main` and turned into the
// settings the run and the logger need.

use crate::api::base_url;
use crate::logging::{LogConfig, DEFAULT_LOG_FILE};
use crate::record::Mode;
use crate::upload::UploadConfig;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "asset-upload",
    version,
    about = "Bulk import assets from a .csv file to Graylog Security"
)]
#[command(group(ArgGroup::new("mode").required(true).args(["user", "machine"])))]
pub struct Cli {
    #[arg(long, help = "Rows describe user assets")]
    pub user: bool,
    #[arg(long, help = "Rows describe machine assets")]
    pub machine: bool,
    #[arg(long, help = "Use https (as opposed to http)")]
    pub https: bool,
    #[arg(
        short,
        long,
        default_value = "localhost",
        help = "The host where Graylog is running"
    )]
    pub server: String,
    #[arg(
        short,
        long,
        default_value = "9000",
        help = "The port Graylog is listening on (ignored with --https)"
    )]
    pub port: String,
    #[arg(
        short = 'k',
        long,
        env = "GRAYLOG_API_KEY",
        hide_env_values = true,
        help = "The API key for accessing the Graylog API"
    )]
    pub apikey: String,
    #[arg(short, long, help = "The .csv file to read data from")]
    pub file: PathBuf,
    #[arg(
        long,
        help = "The .csv file has no header row; without this flag the first row is skipped"
    )]
    pub noheader: bool,
    #[arg(long, default_value = DEFAULT_LOG_FILE, help = "File to log to, rotated weekly")]
    pub log_file: PathBuf,
    #[arg(long, help = "Print the records as JSON lines instead of uploading them")]
    pub dry_run: bool,
    #[arg(short, long, help = "Do not show progress on the terminal")]
    pub quiet: bool,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.user {
            Mode::User
        } else {
            Mode::Machine
        }
    }

    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            mode: self.mode(),
            base_url: base_url(self.https, &self.server, &self.port),
            api_key: self.apikey.clone(),
            file: self.file.clone(),
            skip_header: !self.noheader,
            dry_run: self.dry_run,
            quiet: self.quiet,
        }
    }

    /// `filter` is usually the value of `RUST_LOG`
    pub fn log_config(&self, filter: Option<String>) -> LogConfig {
        let mut config = LogConfig {
            path: self.log_file.clone(),
            ..LogConfig::default()
        };
        if let Some(filter) = filter {
            config.filter = filter;
        }
        config
    }
}
