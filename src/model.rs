//! Talk and speaker records as exported by Conference Hall
//!
//! Records arrive as generic JSON and are validated into typed structs in one
//! pass. Every malformed record is reported, not just the first one, and any
//! failure rejects the whole export.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Review state of a talk submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TalkState {
    Rejected,
    Accepted,
    Confirmed,
    Declined,
}

/// Firestore-style timestamp carried by each talk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestamp {
    #[serde(rename = "_seconds")]
    pub seconds: f64,
    #[serde(rename = "_nanoseconds")]
    pub nanoseconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Talk {
    pub id: String,
    pub title: String,
    pub state: TalkState,
    #[serde(rename = "abstract")]
    pub summary: String,
    pub speakers: Vec<String>,
    pub create_timestamp: Timestamp,
}

impl Talk {
    pub fn is_confirmed(&self) -> bool {
        self.state == TalkState::Confirmed
    }

    pub fn has_speaker(&self, uid: &str) -> bool {
        self.speakers.iter().any(|s| s == uid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    pub uid: String,
    pub display_name: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub speaker_references: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
}

impl Speaker {
    /// Photo URL worth downloading; empty strings count as absent.
    pub fn photo(&self) -> Option<&str> {
        self.photo_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Validated contents of an export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConferenceData {
    pub talks: Vec<Talk>,
    pub speakers: Vec<Speaker>,
}

/// Validate the raw export against the talk and speaker schemas.
///
/// Extra keys are ignored. Errors from both arrays are accumulated and
/// returned together as [`Error::Validation`].
pub fn validate(value: &Value) -> Result<ConferenceData> {
    let mut errors = Vec::new();

    let talks = validate_array::<Talk>(value, "talks", &mut errors);
    let speakers = validate_array::<Speaker>(value, "speakers", &mut errors);

    if !errors.is_empty() {
        return Err(Error::Validation(errors));
    }

    debug!(
        "Validated {} talks and {} speakers",
        talks.len(),
        speakers.len()
    );
    Ok(ConferenceData { talks, speakers })
}

fn validate_array<T: DeserializeOwned>(
    value: &Value,
    key: &str,
    errors: &mut Vec<String>,
) -> Vec<T> {
    let items = match value.get(key) {
        Some(Value::Array(items)) => items,
        Some(other) => {
            errors.push(format!("{key}: expected an array, found {}", kind_of(other)));
            return Vec::new();
        }
        None => {
            errors.push(format!("{key}: missing"));
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(record) => Some(record),
            Err(e) => {
                errors.push(format!("{key}[{index}]: {e}"));
                None
            }
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
