//! # Resource Identifier
//!
//! Addresses one secret version as `<secret_id>|<version_id>`.

use crate::constants::RESOURCE_ID_DELIMITER;
use crate::version::VersionError;
use std::fmt;
use std::str::FromStr;

/// Composite key of a secret version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    pub secret_id: String,
    pub version_id: String,
}

impl ResourceId {
    pub fn new(secret_id: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            version_id: version_id.into(),
        }
    }

    /// Parse `<secret_id>|<version_id>`
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::InvalidResourceId`] unless the input splits into
    /// exactly two non-empty parts.
    pub fn decode(id: &str) -> Result<Self, VersionError> {
        let parts: Vec<&str> = id.split(RESOURCE_ID_DELIMITER).collect();
        match parts.as_slice() {
            [secret_id, version_id] if !secret_id.is_empty() && !version_id.is_empty() => {
                Ok(Self::new(*secret_id, *version_id))
            }
            _ => Err(VersionError::InvalidResourceId(id.to_string())),
        }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.secret_id, RESOURCE_ID_DELIMITER, self.version_id
        )
    }
}

impl FromStr for ResourceId {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
