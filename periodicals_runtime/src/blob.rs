//! Opaque blob form of persisted entities.
//!
//! Contracts, seasons and custom eggs are stored as base64 protobuf inside the
//! JSON catalog so that the stored shape follows the wire schema. Records are
//! decoded again on every run.

use base64::{engine::general_purpose::STANDARD, Engine};
use prost::Message;
use thiserror::Error;

use crate::proto::{Contract, ContractSeasonInfo, CustomEgg};
use crate::BlobRecord;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("protobuf decode failed: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// A blob that failed to decode, tagged with the record it came from.
#[derive(Debug, Error)]
#[error("failed to decode record {id}: {source}")]
pub struct RecordDecodeError {
    pub id: String,
    #[source]
    pub source: BlobError,
}

/// An entity deduplicated by a string identity key.
pub trait CatalogEntry: Message + Default {
    fn identity(&self) -> &str;

    fn to_record(&self) -> BlobRecord {
        BlobRecord::new(self.identity(), encode_blob(self))
    }
}

/// An entity ordered chronologically by its start time.
pub trait Scheduled: CatalogEntry {
    fn start_time(&self) -> f64;
}

impl CatalogEntry for Contract {
    fn identity(&self) -> &str {
        self.identifier()
    }
}

impl Scheduled for Contract {
    fn start_time(&self) -> f64 {
        Contract::start_time(self)
    }
}

impl CatalogEntry for ContractSeasonInfo {
    fn identity(&self) -> &str {
        self.id()
    }
}

impl Scheduled for ContractSeasonInfo {
    fn start_time(&self) -> f64 {
        ContractSeasonInfo::start_time(self)
    }
}

impl CatalogEntry for CustomEgg {
    fn identity(&self) -> &str {
        self.name()
    }
}

pub fn encode_blob<M: Message>(message: &M) -> String {
    STANDARD.encode(message.encode_to_vec())
}

pub fn decode_blob<M: Message + Default>(encoded: &str) -> Result<M, BlobError> {
    let bytes = STANDARD.decode(encoded)?;
    Ok(M::decode(bytes.as_slice())?)
}

pub fn decode_record<M: Message + Default>(record: &BlobRecord) -> Result<M, RecordDecodeError> {
    decode_blob(&record.proto).map_err(|source| RecordDecodeError {
        id: record.id.clone(),
        source,
    })
}
