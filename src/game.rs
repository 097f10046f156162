//! Game records as reported by the host process.
//!
//! Records are mostly opaque: the library view only needs an identifier and
//! the download sub-record. Every other field, the identifying keys
//! included, is carried through untouched for the render layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from validating a games payload
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Expected a sequence of game records, got {0}")]
    NotASequence(&'static str),

    #[error("Game record {index} is invalid: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Identifier of a game record.
///
/// The host keys downloaded games by name and imported games by number, so
/// both forms are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Name(String),
}

impl RecordId {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(RecordId::Number),
            Value::String(s) if !s.is_empty() => Some(RecordId::Name(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => f.pad(&n.to_string()),
            RecordId::Name(name) => f.pad(name),
        }
    }
}

/// Download progress attached to a managed game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadingData {
    /// True while the download is active
    #[serde(default)]
    pub downloading: bool,
    /// Progress fields (percent, speed, ETA...) passed through as-is
    #[serde(flatten)]
    pub progress: Map<String, Value>,
}

/// Keys the identifier is read from, in order of preference
const ID_KEYS: [&str; 2] = ["id", "game"];

/// A single game record.
///
/// Serializes back to the shape the host sent: `id` is derived from the
/// passthrough fields and never written on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireRecord", into = "WireRecord")]
pub struct GameRecord {
    pub id: RecordId,
    pub downloading_data: Option<DownloadingData>,
    /// Every other field, `id` and `game` included
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    downloading_data: Option<DownloadingData>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl TryFrom<WireRecord> for GameRecord {
    type Error = String;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        let id = ID_KEYS
            .iter()
            .find_map(|key| wire.fields.get(*key).and_then(RecordId::from_value))
            .ok_or_else(|| "record has no usable `id` or `game` field".to_string())?;

        Ok(Self {
            id,
            downloading_data: wire.downloading_data,
            metadata: wire.fields,
        })
    }
}

impl From<GameRecord> for WireRecord {
    fn from(record: GameRecord) -> Self {
        Self {
            downloading_data: record.downloading_data,
            fields: record.metadata,
        }
    }
}

impl GameRecord {
    /// Whether the host attached download data to this game.
    ///
    /// Any download data counts, not just an active transfer: a game that is
    /// still extracting or verifying is not ready to play.
    pub fn is_downloading(&self) -> bool {
        self.downloading_data.is_some()
    }

    /// Name to show, falling back to the identifier
    pub fn display_name(&self) -> String {
        ["name", "title"]
            .iter()
            .find_map(|key| self.metadata.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Download completion in percent, if the host reports it.
    ///
    /// The host sends this either as a number or as a numeric string.
    pub fn progress_percent(&self) -> Option<f64> {
        let value = self
            .downloading_data
            .as_ref()?
            .progress
            .get("progressCompleted")?;
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Validate a raw games payload.
///
/// The payload must be a JSON array and every element must decode as a
/// [`GameRecord`]; a single bad element rejects the whole payload.
pub fn parse_payload(payload: Value) -> Result<Vec<GameRecord>, PayloadError> {
    let Value::Array(items) = payload else {
        return Err(PayloadError::NotASequence(json_kind(&payload)));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item)
                .map_err(|source| PayloadError::InvalidRecord { index, source })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
