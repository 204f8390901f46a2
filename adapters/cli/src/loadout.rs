//! Single-line transfer format for saved defense layouts.
//!
//! A loadout captures which slots are occupied, by which tower types, at
//! which levels, bound to a map id. The encoding is a short prefix plus a
//! base64 JSON payload so layouts survive clipboards and shell arguments.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use riverguard_core::TowerSnapshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LOADOUT_DOMAIN: &str = "rgd";
const LOADOUT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded payload.
pub(crate) const LOADOUT_HEADER: &str = "rgd:v1";

/// Delimiter separating the prefix, map id, and payload.
const FIELD_DELIMITER: char = ':';

/// One saved defense layout bound to a map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LoadoutSnapshot {
    /// Map the layout was captured on.
    pub(crate) map: String,
    /// Occupied slots in capture order.
    pub(crate) towers: Vec<LoadoutTower>,
}

/// One occupied slot within a loadout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LoadoutTower {
    /// Slot identifier.
    pub(crate) slot: String,
    /// Tower type identifier.
    pub(crate) tower: String,
    /// Tower level, starting at 1.
    pub(crate) level: u32,
}

/// Failures decoding a transfer string.
#[derive(Debug, Error)]
pub(crate) enum LoadoutError {
    /// The input was empty or whitespace.
    #[error("loadout string is empty")]
    EmptyPayload,
    /// The input did not contain prefix, map, and payload fields.
    #[error("loadout string is missing its `{0}` field")]
    MissingField(&'static str),
    /// The prefix named a different domain.
    #[error("unrecognized loadout prefix `{0}`")]
    InvalidPrefix(String),
    /// The version is not supported by this build.
    #[error("unsupported loadout version `{0}`")]
    UnsupportedVersion(String),
    /// The payload was not valid base64.
    #[error("loadout payload is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The decoded payload was not a valid layout document.
    #[error("loadout payload is not a valid layout: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl LoadoutSnapshot {
    /// Captures the current standing towers into a transferable snapshot.
    #[must_use]
    pub(crate) fn capture(map: &str, towers: &[TowerSnapshot]) -> Self {
        Self {
            map: map.to_owned(),
            towers: towers
                .iter()
                .map(|tower| LoadoutTower {
                    slot: tower.slot_id.clone(),
                    tower: tower.tower_id.clone(),
                    level: tower.level,
                })
                .collect(),
        }
    }

    /// Encodes the snapshot into a single-line transfer string.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let json = serde_json::to_vec(&self.towers).expect("loadout serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{LOADOUT_HEADER}:{}:{encoded}", self.map)
    }

    /// Decodes a snapshot from its transfer string.
    pub(crate) fn decode(value: &str) -> Result<Self, LoadoutError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LoadoutError::EmptyPayload);
        }

        let mut parts = trimmed.splitn(4, FIELD_DELIMITER);
        let domain = parts.next().ok_or(LoadoutError::MissingField("prefix"))?;
        let version = parts.next().ok_or(LoadoutError::MissingField("version"))?;
        let map = parts.next().ok_or(LoadoutError::MissingField("map"))?;
        let payload = parts.next().ok_or(LoadoutError::MissingField("payload"))?;

        if domain != LOADOUT_DOMAIN {
            return Err(LoadoutError::InvalidPrefix(domain.to_owned()));
        }
        if version != LOADOUT_VERSION {
            return Err(LoadoutError::UnsupportedVersion(version.to_owned()));
        }

        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        let towers: Vec<LoadoutTower> = serde_json::from_slice(&bytes)?;
        Ok(Self {
            map: map.to_owned(),
            towers,
        })
    }
}
