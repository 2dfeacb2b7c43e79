//! Strongly-typed identifiers used across the domain.
//!
//! Drums and grids are identified by short human-entered labels (`D001`,
//! `A1`). Labels are normalised on construction: surrounding whitespace is
//! trimmed and letters are upper-cased, so `" d001 "` and `"D001"` name the
//! same drum. Any other non-empty text is a legal label; whether it names a
//! known drum or grid is decided by the store.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Longest label accepted for any identifier.
pub const MAX_LABEL_LEN: usize = 64;

/// Identifier of a physical drum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DrumId(String);

/// Identifier of a fixed grid slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GridId(String);

fn normalize_label(kind: &str, raw: &str) -> Result<String, DomainError> {
    let label = raw.trim();
    if label.is_empty() {
        return Err(DomainError::invalid_id(format!("{kind}: cannot be empty")));
    }
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(DomainError::invalid_id(format!(
            "{kind}: longer than {MAX_LABEL_LEN} characters"
        )));
    }
    Ok(label.to_uppercase())
}

macro_rules! impl_label_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Parse and normalise a label.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
                normalize_label($name, raw.as_ref()).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_label_newtype!(DrumId, "DrumId");
impl_label_newtype!(GridId, "GridId");
