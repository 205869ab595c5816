// Record builder: maps one positional csv row onto the JSON shape the
// Graylog Security asset API expects. Nothing in here touches the network
// or the filesystem.

use crate::error::UploadError;
use csv::StringRecord;
use serde::Serialize;
use std::fmt;
use tracing::{debug, instrument};

/// Which of the two asset shapes a run produces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Machine,
    User,
}

impl Mode {
    /// Number of leading columns a row must carry in this mode
    pub fn field_count(self) -> usize {
        match self {
            Mode::Machine => 15,
            Mode::User => 8,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Machine => f.write_str("machine"),
            Mode::User => f.write_str("user"),
        }
    }
}

/// One asset as submitted to the API.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub name: String,
    pub category: Vec<String>,
    pub priority: String,
    pub details: AssetDetails,
}

/// The `details` object. Serde writes the variant name into its `type`
/// field, so a machine record carries `"type": "machine"`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AssetDetails {
    Machine(MachineDetails),
    User(UserDetails),
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MachineDetails {
    pub description: String,
    pub owner: String,
    pub hostnames: Vec<String>,
    pub mac_addresses: Vec<String>,
    pub ip_addresses: Vec<String>,
    pub geo_info: GeoInfo,
}

/// Location fields are passed through verbatim, including latitude and
/// longitude, which the API accepts as strings.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GeoInfo {
    pub city_name: String,
    pub region: String,
    pub country_name: String,
    pub latitude: String,
    pub longitude: String,
    pub country_iso_code: String,
    pub time_zone: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub usernames: Vec<String>,
    pub user_ids: Vec<String>,
    pub email_addresses: Vec<String>,
    pub first_name: String,
    pub last_name: String,
}

/// Splits a comma joined cell into its trimmed pieces.
///
/// An empty cell yields `[""]` rather than an empty list; the API has always
/// been fed that shape and existing imports depend on it.
pub fn split_and_strip(input: &str) -> Vec<String> {
    input.split(',').map(|s| s.trim().to_string()).collect()
}

/// Builds the asset record for `row` in the given mode.
///
/// Rows shorter than [Mode::field_count] are rejected with
/// [UploadError::MalformedRow]; trailing extra columns are ignored.
#[instrument(skip_all, fields(mode = %mode))]
pub fn build_record(row: &StringRecord, mode: Mode) -> Result<AssetRecord, UploadError> {
    if row.len() < mode.field_count() {
        return Err(UploadError::MalformedRow {
            mode,
            expected: mode.field_count(),
            found: row.len(),
        });
    }

    let record = match mode {
        Mode::Machine => machine_record(row),
        Mode::User => user_record(row),
    };

    if tracing::enabled!(tracing::Level::DEBUG) {
        debug!(
            "Generated record:\n{}",
            serde_json::to_string_pretty(&record).unwrap_or_default()
        );
    }

    Ok(record)
}

fn machine_record(row: &StringRecord) -> AssetRecord {
    debug!(
        "Building record for {} with IPs [{}] owned by {}",
        &row[0], &row[6], &row[2]
    );

    AssetRecord {
        name: row[0].to_string(),
        category: split_and_strip(&row[7]),
        priority: row[3].to_string(),
        details: AssetDetails::Machine(MachineDetails {
            description: row[1].to_string(),
            owner: row[2].to_string(),
            hostnames: split_and_strip(&row[4]),
            mac_addresses: split_and_strip(&row[5]),
            ip_addresses: split_and_strip(&row[6]),
            geo_info: GeoInfo {
                city_name: row[8].to_string(),
                region: row[9].to_string(),
                country_name: row[10].to_string(),
                latitude: row[11].to_string(),
                longitude: row[12].to_string(),
                country_iso_code: row[13].to_string(),
                time_zone: row[14].to_string(),
            },
        }),
    }
}

fn user_record(row: &StringRecord) -> AssetRecord {
    debug!(
        "Building record for {} with usernames [{}]",
        &row[0], &row[4]
    );

    AssetRecord {
        name: row[0].to_string(),
        category: split_and_strip(&row[7]),
        priority: row[3].to_string(),
        details: AssetDetails::User(UserDetails {
            usernames: split_and_strip(&row[4]),
            user_ids: split_and_strip(&row[5]),
            email_addresses: split_and_strip(&row[6]),
            first_name: row[1].to_string(),
            last_name: row[2].to_string(),
        }),
    }
}
