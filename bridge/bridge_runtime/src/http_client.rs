//! HTTP shim: the UI library fetches through the host.
//!
//! A fetch becomes an `httpClient.request` message and a pending promise. The
//! host performs the request and answers with `httpClient.respond`.

use crate::error::{BridgeError, Result};
use crate::outbound::{HTTP_REQUEST_CHANNEL, Outbound};
use crate::promise::PromiseRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpRequest {
    pub id: String,
    pub url: String,
    #[serde(flatten)]
    pub options: FetchOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        (200..400).contains(&self.status)
    }

    pub fn is_redirected(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    /// Parses the body. A missing or empty body is `None`.
    pub fn json(&self) -> Result<Option<Value>> {
        let Some(body) = self.body.as_deref().filter(|body| !body.is_empty()) else {
            return Ok(None);
        };

        serde_json::from_str(body).map(Some).map_err(|err| {
            error!("Unable to parse json response:\n{body}\n");
            BridgeError::InvalidResponseJson(err)
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some_and(|value| !value.is_empty())
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Same as [`HttpResponse::set_header`]: headers hold a single value.
    pub fn append_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set_header(name, value);
    }

    pub fn delete_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(name)
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    pending: Arc<PromiseRegistry<HttpResponse>>,
    outbound: Outbound,
}

impl HttpClient {
    pub fn new(outbound: Outbound) -> Self {
        Self {
            pending: Arc::new(PromiseRegistry::new()),
            outbound,
        }
    }

    /// Asks the host to perform a request. `on_response` runs when the host
    /// answers. Returns the request id.
    pub fn fetch<F>(&self, url: &str, options: FetchOptions, on_response: F) -> Result<String>
    where
        F: FnOnce(std::result::Result<HttpResponse, Value>) + Send + 'static,
    {
        debug!("fetching {url}");
        let id = self.pending.register(on_response);
        let request = HttpRequest {
            id: id.clone(),
            url: url.to_string(),
            options,
        };

        if let Err(err) = self.outbound.send_message(HTTP_REQUEST_CHANNEL, &request) {
            let _ = self.pending.reject(&id, Value::String(err.to_string()));
            return Err(err);
        }

        Ok(id)
    }

    pub fn respond(&self, id: &str, response: HttpResponse) -> Result<()> {
        debug!("received response with status {}", response.status);
        self.pending.resolve(id, response)
    }

    pub fn pending(&self) -> usize {
        self.pending.pending()
    }
}
