//! Artifact ciphers.
//!
//! The workflow hands a serialized envelope to an [`ArtifactCipher`] and gets
//! an opaque transport string back. None of the ciphers here are
//! confidential; they are reversible encodings, one of them with an
//! integrity tag. A real authenticated-encryption scheme slots in behind the
//! same trait.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Prefix used by the onchain placeholder encoding.
pub const LIT_PREFIX: &str = "lit_encrypted_";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CipherError {
    #[error("missing '{0}' prefix")]
    MissingPrefix(String),

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("missing integrity tag")]
    MissingTag,

    #[error("integrity tag mismatch")]
    TagMismatch,

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Reversible transform between envelope bytes and the artifact string.
pub trait ArtifactCipher: Send + Sync {
    /// Short identifier (e.g. "base64", "hmac-sha256").
    fn name(&self) -> &str;

    fn encode(&self, payload: &[u8]) -> Result<String, CipherError>;

    fn decode(&self, artifact: &str) -> Result<Vec<u8>, CipherError>;
}

fn decode_base64(text: &str) -> Result<Vec<u8>, CipherError> {
    STANDARD
        .decode(text)
        .map_err(|e| CipherError::InvalidEncoding(e.to_string()))
}

/// Plain standard base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Cipher;

impl ArtifactCipher for Base64Cipher {
    fn name(&self) -> &str {
        "base64"
    }

    fn encode(&self, payload: &[u8]) -> Result<String, CipherError> {
        Ok(STANDARD.encode(payload))
    }

    fn decode(&self, artifact: &str) -> Result<Vec<u8>, CipherError> {
        decode_base64(artifact.trim())
    }
}

/// Base64 behind a fixed textual prefix.
#[derive(Debug, Clone)]
pub struct TaggedCipher {
    prefix: String,
}

impl TaggedCipher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Placeholder format for notes locked in onchain mode.
    pub fn lit() -> Self {
        Self::new(LIT_PREFIX)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl ArtifactCipher for TaggedCipher {
    fn name(&self) -> &str {
        "tagged-base64"
    }

    fn encode(&self, payload: &[u8]) -> Result<String, CipherError> {
        Ok(format!("{}{}", self.prefix, STANDARD.encode(payload)))
    }

    fn decode(&self, artifact: &str) -> Result<Vec<u8>, CipherError> {
        let body = artifact
            .trim()
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| CipherError::MissingPrefix(self.prefix.clone()))?;
        decode_base64(body)
    }
}

/// Base64 payload followed by `.` and a hex HMAC-SHA256 tag over it.
///
/// Tampering with either half, or opening with a different key, fails
/// decoding instead of yielding altered bytes.
#[derive(Clone)]
pub struct HmacCipher {
    key: Vec<u8>,
}

impl HmacCipher {
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, CipherError> {
        let key = key.into();
        if key.is_empty() {
            return Err(CipherError::InvalidKey("key must not be empty".into()));
        }
        Ok(Self { key })
    }

    fn mac(&self, body: &str) -> Result<HmacSha256, CipherError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;
        mac.update(body.as_bytes());
        Ok(mac)
    }
}

impl std::fmt::Debug for HmacCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacCipher").finish_non_exhaustive()
    }
}

impl ArtifactCipher for HmacCipher {
    fn name(&self) -> &str {
        "hmac-sha256"
    }

    fn encode(&self, payload: &[u8]) -> Result<String, CipherError> {
        let body = STANDARD.encode(payload);
        let tag = hex::encode(self.mac(&body)?.finalize().into_bytes());
        Ok(format!("{body}.{tag}"))
    }

    fn decode(&self, artifact: &str) -> Result<Vec<u8>, CipherError> {
        let (body, tag) = artifact
            .trim()
            .rsplit_once('.')
            .ok_or(CipherError::MissingTag)?;
        let tag = hex::decode(tag).map_err(|e| CipherError::InvalidEncoding(e.to_string()))?;
        self.mac(body)?
            .verify_slice(&tag)
            .map_err(|_| CipherError::TagMismatch)?;
        decode_base64(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = br#"{"note":"hello"}"#;

    #[test]
    fn base64_round_trips_and_tolerates_whitespace() {
        let encoded = Base64Cipher.encode(PAYLOAD).unwrap();
        let padded = format!("  {encoded}\n");
        assert_eq!(Base64Cipher.decode(&padded).unwrap(), PAYLOAD);
    }

    #[test]
    fn base64_rejects_garbage() {
        assert!(matches!(
            Base64Cipher.decode("not-a-valid-envelope"),
            Err(CipherError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn tagged_requires_prefix() {
        let cipher = TaggedCipher::lit();
        let encoded = cipher.encode(PAYLOAD).unwrap();
        assert!(encoded.starts_with(LIT_PREFIX));
        assert_eq!(cipher.decode(&encoded).unwrap(), PAYLOAD);

        let bare = Base64Cipher.encode(PAYLOAD).unwrap();
        assert_eq!(
            cipher.decode(&bare),
            Err(CipherError::MissingPrefix(LIT_PREFIX.into()))
        );
    }

    #[test]
    fn hmac_detects_tampering() {
        let cipher = HmacCipher::new("secret").unwrap();
        let encoded = cipher.encode(PAYLOAD).unwrap();
        assert_eq!(cipher.decode(&encoded).unwrap(), PAYLOAD);

        let (body, tag) = encoded.rsplit_once('.').unwrap();
        let forged_body = Base64Cipher.encode(br#"{"note":"HELLO"}"#).unwrap();
        assert_eq!(
            cipher.decode(&format!("{forged_body}.{tag}")),
            Err(CipherError::TagMismatch)
        );
        assert_eq!(cipher.decode(body), Err(CipherError::MissingTag));
    }

    #[test]
    fn hmac_rejects_wrong_key() {
        let encoded = HmacCipher::new("secret").unwrap().encode(PAYLOAD).unwrap();
        let other = HmacCipher::new("other").unwrap();
        assert_eq!(other.decode(&encoded), Err(CipherError::TagMismatch));
    }

    #[test]
    fn hmac_rejects_empty_key() {
        assert!(matches!(HmacCipher::new(""), Err(CipherError::InvalidKey(_))));
    }
}
