//! Purpose: Load the dataset by fetching a remote URL.
//! Exports: `RemoteSource`, `DEFAULT_TIMEOUT_MS`.
//! Role: Remote implementation of the data-provider contract, also used by `init`.
//! Invariants: One GET per call under a fixed timeout; no retry, no fallback.
//! Invariants: Transport, status, parse, and shape failures all surface as `DataUnavailable`.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::core::error::{Error, ErrorKind};
use crate::core::source::records_from_value;

pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

#[derive(Clone, Debug)]
pub struct RemoteSource {
    url: Url,
    timeout: Duration,
}

impl RemoteSource {
    pub fn new(url: impl AsRef<str>) -> Result<Self, Error> {
        let raw = url.as_ref();
        let url = Url::parse(raw).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("invalid fetch URL")
                .with_url(raw)
                .with_source(err)
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("fetch URL must use http or https")
                .with_url(raw));
        }
        Ok(Self {
            url,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn load(&self) -> Result<Vec<Value>, Error> {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let response = agent
            .request("GET", self.url.as_str())
            .set("Accept", "application/json")
            .call();
        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(Error::new(ErrorKind::DataUnavailable)
                    .with_message(format!("fetch failed with HTTP status {code}"))
                    .with_url(self.url.as_str()));
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(Error::new(ErrorKind::DataUnavailable)
                    .with_message("fetch failed")
                    .with_url(self.url.as_str())
                    .with_source(err));
            }
        };

        let body = response.into_string().map_err(|err| {
            Error::new(ErrorKind::DataUnavailable)
                .with_message("failed to read fetch response")
                .with_url(self.url.as_str())
                .with_source(err)
        })?;
        let parsed: Value = serde_json::from_str(&body).map_err(|err| {
            Error::new(ErrorKind::DataUnavailable)
                .with_message("fetched payload is not valid JSON")
                .with_url(self.url.as_str())
                .with_source(err)
        })?;
        records_from_value(parsed).map_err(|err| err.with_url(self.url.as_str()))
    }
}
