//! Payloads exchanged with the posture messaging layer.
//!
//! Self-contained apart from the classification types: transport is handled by
//! the publisher, this module only defines what gets published and how the
//! receiving side reads it.

use serde::{Deserialize, Serialize};

use crate::posture::{LeanClassification, PostureResult};

/// Topic the analysis node publishes lean codes on.
pub const POSTURE_TOPIC: &str = "jetson_posture_info";

/// Text payload for the lean code ("1", "0" or "-1").
///
/// Undetermined frames publish nothing.
pub fn lean_payload(result: &PostureResult) -> Option<String> {
    result.lean.code().map(|code| code.to_string())
}

/// Full per-frame report (JSON).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostureReport {
    /// 1 hunchback, 0 straight, -1 reclined, null undetermined.
    pub lean: Option<i8>,
    pub kneeling: Option<bool>,
    pub hand_fold: Option<bool>,
}

impl From<&PostureResult> for PostureReport {
    fn from(result: &PostureResult) -> Self {
        Self {
            lean: result.lean.code(),
            kneeling: result.kneeling.as_bool(),
            hand_fold: result.hand_fold.as_bool(),
        }
    }
}

impl PostureReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Status light driven by the lean payload on the receiving device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// Hunchback.
    Red,
    /// Reclined.
    Orange,
    /// Straight.
    Green,
}

/// Unrecognised lean payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown posture payload: {0:?}")]
pub struct UnknownPayload(pub String);

impl Indicator {
    pub fn from_payload(payload: &str) -> Result<Self, UnknownPayload> {
        let lean = payload
            .trim()
            .parse::<i8>()
            .ok()
            .and_then(LeanClassification::from_code);
        match lean {
            Some(LeanClassification::Hunchback) => Ok(Self::Red),
            Some(LeanClassification::Reclined) => Ok(Self::Orange),
            Some(LeanClassification::Straight) => Ok(Self::Green),
            _ => Err(UnknownPayload(payload.to_string())),
        }
    }
}
