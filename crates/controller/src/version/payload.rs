//! # Secret Payload
//!
//! The immutable value of a secret version: either a string or binary data.
//! Binary data crosses the crate boundary as standard base64 text.

use crate::version::VersionError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::Zeroize;

/// Payload of a secret version
///
/// The buffer is zeroized on drop and `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretPayload {
    /// `SecretString`
    String(String),
    /// `SecretBinary`, raw bytes
    Binary(Vec<u8>),
}

impl SecretPayload {
    /// Build a payload from the two mutually exclusive input fields
    ///
    /// `secret_binary` must be base64; it is decoded before any remote call is made.
    ///
    /// # Errors
    ///
    /// - [`VersionError::ConflictingPayload`] when both fields are set
    /// - [`VersionError::MissingPayload`] when neither is set
    /// - [`VersionError::InvalidBase64`] when `secret_binary` does not decode
    pub fn from_fields(
        secret_string: Option<&str>,
        secret_binary: Option<&str>,
    ) -> Result<Self, VersionError> {
        match (secret_string, secret_binary) {
            (Some(_), Some(_)) => Err(VersionError::ConflictingPayload),
            (Some(value), None) => Ok(Self::String(value.to_string())),
            (None, Some(encoded)) => Self::from_base64(encoded),
            (None, None) => Err(VersionError::MissingPayload),
        }
    }

    /// Decode a base64 binary payload
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::InvalidBase64`] if the input is not valid standard base64.
    pub fn from_base64(encoded: &str) -> Result<Self, VersionError> {
        STANDARD
            .decode(encoded)
            .map(Self::Binary)
            .map_err(|e| VersionError::InvalidBase64(e.to_string()))
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            Self::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::String(_) => None,
            Self::Binary(bytes) => Some(bytes),
        }
    }

    /// Base64 form of a binary payload, `None` for string payloads
    pub fn binary_base64(&self) -> Option<String> {
        self.as_bytes().map(|bytes| STANDARD.encode(bytes))
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }
}

impl std::fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(_) => f.write_str("SecretPayload::String(<redacted>)"),
            Self::Binary(bytes) => write!(f, "SecretPayload::Binary(<{} bytes redacted>)", bytes.len()),
        }
    }
}

impl Drop for SecretPayload {
    fn drop(&mut self) {
        match self {
            Self::String(value) => value.zeroize(),
            Self::Binary(bytes) => bytes.zeroize(),
        }
    }
}
