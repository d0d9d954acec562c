use std::io::Read;

use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use prost::Message;
use thiserror::Error;

use crate::proto::AuthenticatedMessage;

/// Error returned when a response body cannot be turned into a message.
///
/// Every stage of the envelope pipeline reports its own variant so callers can
/// tell a truncated envelope from a corrupt compressed payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("authenticated envelope decode failed: {0}")]
    Envelope(#[source] prost::DecodeError),
    #[error("payload decompression failed: {0}")]
    Decompress(#[source] std::io::Error),
    #[error("payload decode failed: {0}")]
    Payload(#[source] prost::DecodeError),
}

/// Encode a request message into the base64 text submitted as form data.
pub fn encode_request<M: Message>(message: &M) -> String {
    STANDARD.encode(message.encode_to_vec())
}

/// Undo the transport's text encoding when present.
///
/// The service usually answers with base64 text but occasionally sends the raw
/// envelope; anything that is not valid base64 is passed through untouched.
pub fn decode_transport_body(body: &[u8]) -> Vec<u8> {
    std::str::from_utf8(body)
        .ok()
        .and_then(|text| STANDARD.decode(text.trim()).ok())
        .unwrap_or_else(|| body.to_vec())
}

/// Decode a message from the service.
///
/// Unauthenticated data is base64 text holding the message itself.
/// Authenticated data is a binary [`AuthenticatedMessage`] whose payload may be
/// zlib-compressed.
pub fn decode_response<M>(data: &[u8], authenticated: bool) -> Result<M, DecodeError>
where
    M: Message + Default,
{
    if !authenticated {
        let decoded = STANDARD.decode(data)?;
        return M::decode(decoded.as_slice()).map_err(DecodeError::Payload);
    }

    let envelope = AuthenticatedMessage::decode(data).map_err(DecodeError::Envelope)?;
    let compressed = envelope.compressed();
    let payload = envelope.message.unwrap_or_default();
    let payload = if compressed {
        inflate(&payload)?
    } else {
        payload
    };

    M::decode(payload.as_slice()).map_err(DecodeError::Payload)
}

/// Inflate a zlib stream, falling back to a headerless deflate stream.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut inflated = Vec::new();
    match ZlibDecoder::new(data).read_to_end(&mut inflated) {
        Ok(_) => Ok(inflated),
        Err(zlib_err) => {
            inflated.clear();
            DeflateDecoder::new(data)
                .read_to_end(&mut inflated)
                .map(|_| inflated)
                .map_err(|_| DecodeError::Decompress(zlib_err))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::{DeflateEncoder, ZlibEncoder};
    use flate2::Compression;

    use super::*;
    use crate::proto::{EggIncCurrentEvents, EggIncEvent, GetPeriodicalsRequest};

    fn sample_events() -> EggIncCurrentEvents {
        EggIncCurrentEvents {
            events: vec![EggIncEvent {
                identifier: Some("ev-1".into()),
                r#type: Some("epic-research-sale".into()),
                multiplier: Some(0.3),
                start_time: Some(1_700_000_000.0),
                duration: Some(86_400.0),
                ..Default::default()
            }],
        }
    }

    fn zlib(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).expect("compress");
        encoder.finish().expect("finish")
    }

    fn envelope(payload: Vec<u8>, compressed: bool) -> Vec<u8> {
        AuthenticatedMessage {
            message: Some(payload),
            compressed: Some(compressed),
            ..Default::default()
        }
        .encode_to_vec()
    }

    #[test]
    fn unauthenticated_request_round_trips() {
        let request = GetPeriodicalsRequest {
            user_id: Some("EI1234".into()),
            current_client_version: Some(999),
            ..Default::default()
        };
        let encoded = encode_request(&request);
        let decoded: GetPeriodicalsRequest =
            decode_response(encoded.as_bytes(), false).expect("decode");
        assert_eq!(decoded, request);
    }

    #[test]
    fn unauthenticated_rejects_invalid_base64() {
        let err = decode_response::<GetPeriodicalsRequest>(b"%%not base64%%", false)
            .expect_err("invalid base64 should fail");
        assert!(matches!(err, DecodeError::Base64(_)));
    }

    #[test]
    fn authenticated_plain_payload_decodes() {
        let data = envelope(sample_events().encode_to_vec(), false);
        let decoded: EggIncCurrentEvents = decode_response(&data, true).expect("decode");
        assert_eq!(decoded, sample_events());
    }

    #[test]
    fn authenticated_compressed_payload_decodes() {
        let data = envelope(zlib(&sample_events().encode_to_vec()), true);
        let decoded: EggIncCurrentEvents = decode_response(&data, true).expect("decode");
        assert_eq!(decoded, sample_events());
    }

    #[test]
    fn raw_deflate_payload_is_accepted() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&sample_events().encode_to_vec())
            .expect("compress");
        let data = envelope(encoder.finish().expect("finish"), true);
        let decoded: EggIncCurrentEvents = decode_response(&data, true).expect("decode");
        assert_eq!(decoded, sample_events());
    }

    #[test]
    fn truncated_envelope_is_reported() {
        let err = decode_response::<EggIncCurrentEvents>(&[0x0a, 0xff], true)
            .expect_err("truncated envelope should fail");
        assert!(matches!(err, DecodeError::Envelope(_)));
    }

    #[test]
    fn corrupt_compression_is_reported() {
        let data = envelope(b"not zlib data".to_vec(), true);
        let err = decode_response::<EggIncCurrentEvents>(&data, true)
            .expect_err("corrupt payload should fail");
        assert!(matches!(err, DecodeError::Decompress(_)));
    }

    #[test]
    fn malformed_inner_payload_is_reported() {
        let data = envelope(vec![0x0a, 0x05, 0x01], false);
        let err = decode_response::<EggIncCurrentEvents>(&data, true)
            .expect_err("malformed payload should fail");
        assert!(matches!(err, DecodeError::Payload(_)));
    }

    #[test]
    fn transport_body_accepts_base64_text_and_raw_bytes() {
        let raw = envelope(sample_events().encode_to_vec(), false);
        let text = format!("{}\n", STANDARD.encode(&raw));
        assert_eq!(decode_transport_body(text.as_bytes()), raw);
        assert_eq!(decode_transport_body(&raw), raw);
    }
}
