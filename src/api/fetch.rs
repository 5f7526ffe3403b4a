use serde_json::Value;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::TransportError;

/// One GET returning a JSON document.
///
/// The orchestrator and geocoder only see this trait, so tests can hand
/// them canned payloads.
pub trait Fetcher: Send + Sync {
    fn fetch_json(&self, url: &str) -> Result<Value, TransportError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        (**self).fetch_json(url)
    }
}

/// Fetches `url` and unwraps the top-level record array.
pub fn fetch_records<F: Fetcher + ?Sized>(
    fetcher: &F,
    url: &str,
) -> Result<Vec<Value>, TransportError> {
    match fetcher.fetch_json(url)? {
        Value::Array(records) => Ok(records),
        other => Err(TransportError::NotAnArray(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Blocking HTTP transport. No retries: a failed request is reported once.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        log::debug!("GET {url}");
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}
