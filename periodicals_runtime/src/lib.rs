//! Wire protocol for the periodicals service.
//!
//! Owns the protobuf schema, the authenticated envelope codec used on the
//! transport, and the opaque blob form entities take once persisted. Re-exports
//! the JSON data contracts from `periodicals_schema` so downstream crates only
//! depend on this one.

pub mod blob;
pub mod envelope;

pub mod proto {
    include!(concat!(env!("OUT_DIR"), "/ei.rs"));
}

pub use blob::{
    decode_blob, decode_record, encode_blob, BlobError, CatalogEntry, RecordDecodeError,
    Scheduled,
};
pub use envelope::{decode_response, decode_transport_body, encode_request, inflate, DecodeError};
pub use periodicals_schema::*;
