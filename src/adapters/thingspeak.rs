//! ThingSpeak channel update sink.
//!
//! `GET /update?api_key=…&field1=…` answers with the new entry id as the
//! whole body, or `0` when the update was refused (rate limit, bad key).

use log::debug;

use crate::app::ports::{EntryId, HttpClient, Payload, RemoteSink};
use crate::error::SinkError;

pub struct ThingSpeakSink<C> {
    client: C,
    endpoint: String,
    api_key: String,
}

impl<C: HttpClient> ThingSpeakSink<C> {
    pub fn new(client: C, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

/// Interpret an update response body.
pub fn parse_entry_id(body: &str) -> Result<EntryId, SinkError> {
    match body.trim().parse::<u64>() {
        Ok(0) => Err(SinkError::Rejected),
        Ok(id) => Ok(EntryId(id)),
        Err(_) => Err(SinkError::InvalidResponse),
    }
}

impl<C: HttpClient> RemoteSink for ThingSpeakSink<C> {
    fn name(&self) -> &'static str {
        "thingspeak"
    }

    fn publish(&mut self, payload: &Payload) -> Result<EntryId, SinkError> {
        if self.api_key.is_empty() {
            return Err(SinkError::NotConfigured);
        }
        let mut query: Vec<(&str, String)> = Vec::with_capacity(payload.len() + 1);
        query.push(("api_key", self.api_key.clone()));
        for (field, value) in payload.iter() {
            query.push((field, value.to_string()));
        }

        let response = self.client.get(&self.endpoint, &query)?;
        debug!(
            "ThingSpeak: HTTP {} body {:?}",
            response.status, response.body
        );
        if !(200..300).contains(&response.status) {
            return Err(SinkError::HttpStatus(response.status));
        }
        parse_entry_id(&response.body)
    }
}
