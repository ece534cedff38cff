//! Record stream retrieval.
//!
//! Each stream lives at its own URL as a JSON array of records. Failures are
//! reported per stream and split into bad status, invalid JSON and network
//! failure.

use reqwest::blocking::Client;
use tracing::{debug, info};
use validator_core::config::RemoteConfig;
use validator_core::{Error, FetchFailure, RawRecord, Result, Stream, Streams};

use crate::client::build_client;

/// Source of raw records for one stream.
pub trait RecordSource {
    fn fetch(&self, stream: Stream, url: &str) -> Result<Vec<RawRecord>>;
}

/// Fetches records over HTTP.
pub struct HttpRecordSource {
    client: Client,
}

impl HttpRecordSource {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        Ok(Self::from_client(build_client(config)?))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl RecordSource for HttpRecordSource {
    fn fetch(&self, stream: Stream, url: &str) -> Result<Vec<RawRecord>> {
        debug!(%stream, url, "fetching stream");

        let network = |e: reqwest::Error| Error::fetch(stream, FetchFailure::Network(e.to_string()));
        let response = self.client.get(url).send().map_err(network)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(network)?;

        let records = decode_records(stream, status, &body)?;
        info!(%stream, records = records.len(), "fetched stream");
        Ok(records)
    }
}

/// Turn a response into records: any status but 200 fails, and so does a
/// body that is not a JSON array of records.
pub fn decode_records(stream: Stream, status: u16, body: &str) -> Result<Vec<RawRecord>> {
    if status != 200 {
        return Err(Error::fetch(stream, FetchFailure::Status(status)));
    }
    serde_json::from_str(body).map_err(|_| Error::fetch(stream, FetchFailure::InvalidJson))
}

/// Fetch all three streams, stopping at the first failure.
pub fn fetch_streams<S: RecordSource + ?Sized>(
    source: &S,
    ce_url: &str,
    pe_url: &str,
    index_url: &str,
) -> Result<Streams<Vec<RawRecord>>> {
    Ok(Streams::new(
        source.fetch(Stream::Ce, ce_url)?,
        source.fetch(Stream::Pe, pe_url)?,
        source.fetch(Stream::Index, index_url)?,
    ))
}
