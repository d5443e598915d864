//! HTTP session bridge source.
//!
//! A small service that holds the messaging session and exposes:
//!
//! - `GET {endpoint}/groups` returning an array of group objects
//! - `GET {endpoint}/groups/{id}/participants` returning an array of raw
//!   participant records
//!
//! One request per call. Retrying is the orchestrator's job, so this module
//! only classifies failures:
//!
//! | Outcome                          | AdapterError |
//! |----------------------------------|--------------|
//! | network error / timeout          | Transient    |
//! | 429, 5xx                         | Transient    |
//! | 401, 403, other 4xx              | Permanent    |
//! | 2xx with non-JSON or wrong shape | Malformed    |

use std::time::Duration;

use rostermerge_core::{AdapterError, Group, RawParticipant, SourceAdapter};
use url::Url;

use super::common::{parse_groups, participants_of};

const USER_AGENT: &str = concat!("rmerge/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpSource {
    name: String,
    base_url: Url,
    token: Option<String>,
    http: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(name: &str, endpoint: &str, token: Option<String>) -> Result<Self, String> {
        let base_url =
            Url::parse(endpoint).map_err(|e| format!("invalid endpoint '{endpoint}': {e}"))?;
        if base_url.cannot_be_a_base() {
            return Err(format!("invalid endpoint '{endpoint}': not a base URL"));
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| format!("cannot build HTTP client: {e}"))?;

        Ok(Self {
            name: name.to_string(),
            base_url,
            token,
            http,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // checked in new(): base URLs always have path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get_json(&self, url: Url) -> Result<serde_json::Value, AdapterError> {
        let mut req = self.http.get(url.clone());
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .map_err(|e| AdapterError::Transient(format!("{} request to {url} failed: {e}", self.name)))?;

        let status = resp.status().as_u16();
        if status == 429 || status >= 500 {
            return Err(AdapterError::Transient(format!(
                "{} upstream error ({status})",
                self.name
            )));
        }
        if status >= 400 {
            let body: serde_json::Value = resp.json().unwrap_or(serde_json::Value::Null);
            let what = if status == 401 || status == 403 {
                "auth failed"
            } else {
                "request rejected"
            };
            return Err(AdapterError::Permanent(format!(
                "{} {what} ({status}): {}",
                self.name,
                error_message(&body, status)
            )));
        }

        let text = resp
            .text()
            .map_err(|e| AdapterError::Transient(format!("{} response body: {e}", self.name)))?;
        serde_json::from_str(text.trim_start_matches('\u{feff}')).map_err(|e| {
            AdapterError::Malformed(format!(
                "{} returned invalid JSON: {e} (body: {})",
                self.name,
                text.chars().take(200).collect::<String>()
            ))
        })
    }
}

/// Pull a human-readable message from an error body.
fn error_message(body: &serde_json::Value, status: u16) -> String {
    body["error"]
        .as_str()
        .or_else(|| body["message"].as_str())
        .or_else(|| body["error"]["message"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

impl SourceAdapter for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_groups(&self) -> Result<Vec<Group>, AdapterError> {
        let body = self.get_json(self.url(&["groups"]))?;
        parse_groups(&body)
    }

    fn list_participants(&self, group_id: &str) -> Result<Vec<RawParticipant>, AdapterError> {
        let body = self.get_json(self.url(&["groups", group_id, "participants"]))?;
        participants_of(&body)
    }
}
