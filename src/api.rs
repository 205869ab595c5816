// API client module: a small blocking HTTP client that submits asset
// records to the Graylog Security asset endpoint, one request per record.

use crate::error::UploadError;
use crate::record::AssetRecord;
use crate::upload::AssetSink;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde_json::{Map, Value};
use tracing::{debug, error, instrument, warn};

/// Path of the asset collection, appended to the base URL.
pub const ASSETS_ENDPOINT: &str = "/api/plugins/org.graylog.plugins.securityapp.asset/assets";

/// Graylog rejects state changing requests that do not name their caller.
pub const REQUESTED_BY: &str = "asset-upload";

/// Password paired with an API key in Graylog's basic auth scheme.
const TOKEN_PASSWORD: &str = "token";

/// Build `scheme://host[:port]`. The port is only kept for plain http.
pub fn base_url(https: bool, server: &str, port: &str) -> String {
    if https {
        format!("https://{}", server)
    } else {
        format!("http://{}:{}", server, port)
    }
}

/// What the API made of a record it answered 200 for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The response carried the `id` of a newly created asset
    Created { id: String },
    /// The call succeeded but no `id` came back
    Accepted,
}

/// Blocking client holding the API key and the base URL of the Graylog
/// server, e.g. `http://localhost:9000`.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, UploadError> {
        // No request timeout; the blocking client would otherwise stop
        // waiting after 30s
        let client = Client::builder()
            .default_headers(default_headers())
            .timeout(None)
            .build()
            .map_err(UploadError::Transport)?;
        Ok(ApiClient {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), ASSETS_ENDPOINT)
    }

    /// POST one record. Non-200 answers and transport errors come back as
    /// errors; nothing is retried.
    #[instrument(name = "submit", skip_all, fields(asset = %record.name))]
    pub fn post(&self, record: &AssetRecord) -> Result<Submission, UploadError> {
        debug!("Invoking the API with API key {}", mask(&self.api_key));
        let res = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.api_key, Some(TOKEN_PASSWORD))
            .json(record)
            .send()
            .map_err(|e| {
                error!("Error {} submitting API call", e);
                UploadError::Transport(e)
            })?;

        let status = res.status();
        if status != StatusCode::OK {
            let body = res.text().unwrap_or_else(|_| "".into());
            error!(
                "Unable to perform API call - error code {}: {}",
                status.as_u16(),
                body
            );
            return Err(UploadError::Status { status, body });
        }

        let body: Map<String, Value> = res.json().map_err(|e| {
            error!("API call returned an unreadable body: {}", e);
            UploadError::Decode(e)
        })?;
        debug!("API call successful");

        match body.get("id") {
            Some(Value::String(id)) => Ok(Submission::Created { id: id.clone() }),
            Some(id) => Ok(Submission::Created { id: id.to_string() }),
            None => {
                warn!("API call succeeded but returned no asset id");
                Ok(Submission::Accepted)
            }
        }
    }
}

impl AssetSink for ApiClient {
    fn submit(&mut self, record: &AssetRecord) -> Result<Submission, UploadError> {
        self.post(record)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static("x-requested-by"),
        HeaderValue::from_static(REQUESTED_BY),
    );
    headers
}

const MASK_PREFIX: usize = 4;

/// Keep API keys out of the log file. Short keys are hidden entirely.
fn mask(key: &str) -> String {
    if key.chars().count() <= MASK_PREFIX {
        return "***".to_string();
    }
    let shown: String = key.chars().take(MASK_PREFIX).collect();
    format!("{}***", shown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn https_drops_the_port() {
        assert_eq!("https://graylog.example.com", base_url(true, "graylog.example.com", "9000"));
        assert_eq!("http://localhost:9000", base_url(false, "localhost", "9000"));
    }

    #[test]
    fn endpoint_is_appended_once() {
        let api = ApiClient::new("http://localhost:9000/", "key").unwrap();
        assert_eq!(
            "http://localhost:9000/api/plugins/org.graylog.plugins.securityapp.asset/assets",
            api.endpoint()
        );
    }

    #[test]
    fn mask_hides_most_of_the_key() {
        assert_eq!("abcd***", mask("abcdefghijkl"));
        assert_eq!("abcd***", mask("abcde"));
        assert_eq!("***", mask("abcd"));
        assert_eq!("***", mask("ab"));
        assert_eq!("***", mask(""));
    }
}
