//! Integrity tokens for uploaded files.
//!
//! A token is the standard-alphabet base64 encoding of the SHA-256 digest of the file
//! bytes. That is the exact form S3 verifies in `x-amz-checksum-sha256`, so the same
//! value serves the client assertion and the provider-side check.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use utoipa::ToSchema;

const DIGEST_LEN: usize = 32;
const READ_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid integrity token: {0}")]
pub struct InvalidIntegrityToken(String);

/// Base64 SHA-256 digest of an object's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=")]
pub struct IntegrityToken(String);

impl IntegrityToken {
    /// Parse a token received over the wire. It must decode to exactly 32 bytes.
    pub fn parse(value: &str) -> Result<Self, InvalidIntegrityToken> {
        let decoded = STANDARD
            .decode(value.trim())
            .map_err(|_| InvalidIntegrityToken("not valid base64".to_string()))?;
        if decoded.len() != DIGEST_LEN {
            return Err(InvalidIntegrityToken(format!(
                "expected {} digest bytes, got {}",
                DIGEST_LEN,
                decoded.len()
            )));
        }
        Ok(Self(STANDARD.encode(decoded)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntegrityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for IntegrityToken {
    type Error = InvalidIntegrityToken;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IntegrityToken> for String {
    fn from(token: IntegrityToken) -> Self {
        token.0
    }
}

/// Hash an in-memory buffer.
pub fn compute(bytes: &[u8]) -> IntegrityToken {
    let digest = Sha256::digest(bytes);
    IntegrityToken(STANDARD.encode(digest))
}

/// Hash everything a reader yields. Returns the token and the number of bytes read.
///
/// Fails with the reader's error as soon as a read fails.
pub fn compute_reader<R: Read>(mut reader: R) -> std::io::Result<(IntegrityToken, u64)> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        total += read as u64;
    }
    Ok((IntegrityToken(STANDARD.encode(hasher.finalize())), total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_compute_is_deterministic() {
        let a = compute(b"school certificate");
        let b = compute(b"school certificate");
        assert_eq!(a, b);
        assert_ne!(a, compute(b"school certificate!"));
    }

    #[test]
    fn test_compute_known_digest() {
        // SHA-256 of the empty string
        assert_eq!(
            compute(b"").as_str(),
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
    }

    #[test]
    fn test_compute_reader_matches_compute() {
        let data = vec![7u8; 200_000];
        let (token, len) = compute_reader(&data[..]).unwrap();
        assert_eq!(len, 200_000);
        assert_eq!(token, compute(&data));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn test_compute_reader_fails_fast() {
        let err = compute_reader(FailingReader).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_parse_rejects_wrong_length_and_garbage() {
        assert!(IntegrityToken::parse("not base64 !!").is_err());
        assert!(IntegrityToken::parse("AAAA").is_err());
        let token = compute(b"x");
        assert_eq!(IntegrityToken::parse(token.as_str()).unwrap(), token);
    }

    #[test]
    fn test_serde_validates_token() {
        let json = serde_json::to_string(&compute(b"abc")).unwrap();
        let parsed: IntegrityToken = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, compute(b"abc"));
        assert!(serde_json::from_str::<IntegrityToken>("\"AAAA\"").is_err());
    }
}
