//! Blocking HTTP(S) GET client backed by `ureq`.
//!
//! TLS comes from rustls with the bundled web-pki roots, so both `http://`
//! and `https://` endpoints work. Non-2xx statuses are returned to the
//! caller rather than raised; the sink decides what they mean.

use std::time::Duration;

use log::debug;
use ureq::Agent;

use crate::app::ports::{HttpClient, HttpResponse};
use crate::error::SinkError;

pub struct UreqClient {
    agent: Agent,
}

impl UreqClient {
    /// `timeout` bounds the whole exchange: resolve, connect, TLS, response.
    pub fn new(timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .proxy(None)
            .build()
            .into();
        Self { agent }
    }
}

fn sink_error(e: &ureq::Error) -> SinkError {
    match e {
        ureq::Error::BadUri(_) => SinkError::NotConfigured,
        _ => SinkError::Network,
    }
}

impl HttpClient for UreqClient {
    fn get(&mut self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, SinkError> {
        let mut request = self.agent.get(url);
        for (key, value) in query {
            request = request.query(*key, value.as_str());
        }
        let mut response = request.call().map_err(|e| {
            debug!("HTTP: GET {} failed: {}", url, e);
            sink_error(&e)
        })?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| {
                debug!("HTTP: reading body failed: {}", e);
                SinkError::InvalidResponse
            })?;
        debug!("HTTP: {} with {} bytes", status, body.len());
        Ok(HttpResponse { status, body })
    }
}
