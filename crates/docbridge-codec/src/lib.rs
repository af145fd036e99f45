//! Transfer codec for moving file bytes in and out of the remote workspace.
//!
//! The workspace export API is inconsistent about what it hands back: the
//! same file may arrive as raw binary, as a base64 string, or as base64
//! text rendered into a byte buffer. [`decode`] normalizes every shape to
//! raw bytes and tags the result with the [`Encoding`] it detected.
//! [`encode`] produces the base64 transport form the import API expects.
//!
//! Decoding never fails: it degrades through a fallback chain and returns
//! the best-effort byte sequence. Empty output is a legitimate outcome
//! meaning "no content"; the store gateway decides what to do with it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Base64 rendering of the PDF magic number `%PDF`. A byte-typed payload
/// starting with this prefix is a base64 string the remote rendered as
/// bytes, not a real PDF.
const BASE64_PDF_PREFIX: &[u8] = b"JVBERi";

/// A payload as handed back by the workspace export API, before
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportPayload {
    /// A byte buffer. May be raw file content or base64 text in disguise.
    Binary(Vec<u8>),
    /// A string. Usually base64, occasionally plain text.
    Text(String),
}

impl TransportPayload {
    /// True when the payload carries no content at all.
    pub fn is_empty(&self) -> bool {
        match self {
            TransportPayload::Binary(bytes) => bytes.is_empty(),
            TransportPayload::Text(text) => text.is_empty(),
        }
    }
}

/// The encoding [`decode`] detected for a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// The payload was already raw bytes.
    Binary,
    /// The payload was base64 and has been decoded.
    Base64,
    /// The payload was plain text; its UTF-8 bytes were taken as-is.
    Text,
}

/// A normalized payload: raw bytes plus the encoding they arrived in.
///
/// Only the `bytes` field is meaningful to callers; `encoding` exists for
/// diagnostics (it feeds the export attempt log).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The normalized raw bytes.
    pub bytes: Vec<u8>,
    /// The encoding the payload was detected to be in.
    pub encoding: Encoding,
}

/// Encodes raw file bytes into the transport form used for upload.
pub fn encode(raw: &[u8]) -> String {
    STANDARD.encode(raw)
}

/// Normalizes an export payload to raw bytes.
///
/// The cascade, in order:
///
/// 1. A byte buffer starting with `JVBERi` (the base64 rendering of
///    `%PDF`) is base64 text in a byte costume: decode it. If that decode
///    fails the buffer is returned unchanged.
/// 2. Any other byte buffer is already raw content and passes through.
/// 3. A string is tried as base64 (whitespace-trimmed); on failure its
///    UTF-8 bytes are returned as plain text content.
pub fn decode(payload: TransportPayload) -> Decoded {
    match payload {
        TransportPayload::Binary(bytes) => {
            if bytes.starts_with(BASE64_PDF_PREFIX) {
                match STANDARD.decode(&bytes) {
                    Ok(decoded) => Decoded {
                        bytes: decoded,
                        encoding: Encoding::Base64,
                    },
                    Err(_) => Decoded {
                        bytes,
                        encoding: Encoding::Binary,
                    },
                }
            } else {
                Decoded {
                    bytes,
                    encoding: Encoding::Binary,
                }
            }
        }
        TransportPayload::Text(text) => match STANDARD.decode(text.trim()) {
            Ok(decoded) => Decoded {
                bytes: decoded,
                encoding: Encoding::Base64,
            },
            Err(_) => Decoded {
                bytes: text.into_bytes(),
                encoding: Encoding::Text,
            },
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn pdf_bytes(len: usize) -> Vec<u8> {
        let mut bytes = b"%PDF-1.7\n".to_vec();
        while bytes.len() < len {
            bytes.push((bytes.len() % 251) as u8);
        }
        bytes.truncate(len);
        bytes
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let original = pdf_bytes(1000);
        let transport = encode(&original);
        let decoded = decode(TransportPayload::Text(transport));
        assert_eq!(decoded.bytes, original);
        assert_eq!(decoded.encoding, Encoding::Base64);
    }

    #[test]
    fn test_binary_base64_in_disguise_is_decoded() {
        // Base64 text of a real PDF buffer, handed back as bytes.
        let original = pdf_bytes(64);
        let disguised = encode(&original).into_bytes();
        assert!(disguised.starts_with(b"JVBERi"));

        let decoded = decode(TransportPayload::Binary(disguised));
        assert_eq!(decoded.bytes, original);
        assert_eq!(decoded.encoding, Encoding::Base64);
    }

    #[test]
    fn test_raw_binary_passes_through() {
        let original = pdf_bytes(128);
        let decoded = decode(TransportPayload::Binary(original.clone()));
        assert_eq!(decoded.bytes, original);
        assert_eq!(decoded.encoding, Encoding::Binary);
    }

    #[test]
    fn test_non_base64_string_falls_back_to_text() {
        let decoded = decode(TransportPayload::Text("not base64!!".to_string()));
        assert_eq!(decoded.bytes, b"not base64!!");
        assert_eq!(decoded.encoding, Encoding::Text);
    }

    #[test]
    fn test_base64_string_with_surrounding_whitespace() {
        let original = b"hello world".to_vec();
        let transport = format!("  {}\n", encode(&original));
        let decoded = decode(TransportPayload::Text(transport));
        assert_eq!(decoded.bytes, original);
        assert_eq!(decoded.encoding, Encoding::Base64);
    }

    #[test]
    fn test_jvberi_prefix_with_malformed_tail_passes_through() {
        // Starts like base64-of-PDF but is not valid base64 overall.
        let mangled = b"JVBERi0!!!not-base64".to_vec();
        let decoded = decode(TransportPayload::Binary(mangled.clone()));
        assert_eq!(decoded.bytes, mangled);
        assert_eq!(decoded.encoding, Encoding::Binary);
    }

    #[test]
    fn test_empty_payloads_decode_to_empty_bytes() {
        let empty_text = decode(TransportPayload::Text(String::new()));
        assert!(empty_text.bytes.is_empty());

        let empty_binary = decode(TransportPayload::Binary(Vec::new()));
        assert!(empty_binary.bytes.is_empty());
        assert_eq!(empty_binary.encoding, Encoding::Binary);
    }
}
