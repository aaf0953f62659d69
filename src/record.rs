//! Records, their stored encoding, and body fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, SluiceError};

/// Length of a hex-encoded SHA-256 fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Compute the fingerprint of a record body.
///
/// The fingerprint is the lowercase hex SHA-256 digest of the body's UTF-8
/// bytes. Any string is accepted, including the empty one.
pub fn fingerprint(body: &str) -> String {
    hex::encode(Sha256::digest(body.as_bytes()))
}

/// The unit of ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identity drawn from the identity pool.
    pub identity: String,

    /// One non-blank unit of input text.
    pub body: String,

    /// SHA-256 of `body`, present when fingerprinting is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl Record {
    /// Build a record without a fingerprint.
    ///
    /// Fails if `body` is empty or whitespace-only.
    pub fn new<I, B>(identity: I, body: B) -> Result<Self>
    where
        I: Into<String>,
        B: Into<String>,
    {
        let body = body.into();
        if is_blank(&body) {
            return Err(SluiceError::input("record body must not be blank"));
        }

        Ok(Self {
            identity: identity.into(),
            body,
            fingerprint: None,
        })
    }

    /// Attach the fingerprint of the current body.
    pub fn with_fingerprint(mut self) -> Self {
        self.fingerprint = Some(fingerprint(&self.body));
        self
    }

    /// Encode the record for storage.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| SluiceError::serialization(e.to_string()))
    }

    /// Decode a stored record.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Check that the stored fingerprint, if any, matches the body.
    pub fn verify_fingerprint(&self) -> bool {
        match &self.fingerprint {
            Some(digest) => *digest == fingerprint(&self.body),
            None => true,
        }
    }
}

/// Whether a unit of input is empty or whitespace-only.
pub fn is_blank(unit: &str) -> bool {
    unit.trim().is_empty()
}
