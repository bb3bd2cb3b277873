use chainmirror_core::{
    normalize::{normalize, normalize_record},
    round_timer::{RoundTiming, DEFAULT_VOTING_WINDOW_SECONDS},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One round of a story: a single contribution and its tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRound {
    pub round: u64,
    pub author: String,
    pub content: String,
    pub votes: u64,
    pub finalized: bool,
}

impl StoryRound {
    pub fn from_record(round: u64, record: &Map<String, Value>) -> Self {
        Self {
            round: field_u64(record, "round").unwrap_or(round),
            author: field_string(record, "author").unwrap_or_default(),
            content: field_string(record, "content").unwrap_or_default(),
            votes: field_u64(record, "votes").unwrap_or_default(),
            finalized: field_bool(record, "finalized").unwrap_or_default(),
        }
    }
}

/// A story as the application binds it, assembled from the primary record
/// and its rounds in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub current_round: u64,
    pub max_rounds: u64,
    pub round_start_time: Option<i64>,
    pub round_end_time: Option<i64>,
    pub total_blocks: u64,
    pub is_sealed: bool,
    pub rounds: Vec<StoryRound>,
}

impl Story {
    /// Builds the story without rounds. Missing fields take their defaults.
    pub fn from_record(id: u64, record: &Map<String, Value>) -> Self {
        Self {
            id,
            title: field_string(record, "title").unwrap_or_default(),
            author: field_string(record, "author")
                .or_else(|| field_string(record, "creator"))
                .unwrap_or_default(),
            current_round: field_u64(record, "current-round")
                .unwrap_or_default(),
            max_rounds: field_u64(record, "max-rounds").unwrap_or_default(),
            round_start_time: field_i64(record, "round-start-time"),
            round_end_time: field_i64(record, "round-end-time"),
            total_blocks: field_u64(record, "total-blocks").unwrap_or_default(),
            is_sealed: field_bool(record, "is-sealed")
                .or_else(|| field_bool(record, "sealed"))
                .unwrap_or_default(),
            rounds: vec![],
        }
    }

    pub fn round_timing(&self) -> RoundTiming {
        RoundTiming {
            round_start_time: self.round_start_time,
            round_end_time: self.round_end_time,
            current_round: self.current_round.max(1),
            total_blocks: self.total_blocks,
            voting_window_seconds: DEFAULT_VOTING_WINDOW_SECONDS,
        }
    }
}

/// Extracts the flat record from a read-call response for an optional
/// tuple. Returns `None` when the remote reports no such record.
///
/// After the regular one-level normalization an optional still wraps its
/// tuple in `{type, value}`, so that inner `value` is normalized once more.
pub fn record_from_response(response: &Value) -> Option<Map<String, Value>> {
    match normalize(response) {
        Value::Object(record) => match record.get("value") {
            Some(Value::Null) => None,
            Some(inner @ Value::Object(_)) => Some(normalize_record(inner)),
            _ if record.is_empty() => None,
            _ => Some(record),
        },
        _ => None,
    }
}

// -----------------
// Lenient field access
// -----------------
/// Looks a field up by its kebab-case name, falling back to the snake and
/// camel case spellings.
fn field<'a>(record: &'a Map<String, Value>, kebab: &str) -> Option<&'a Value> {
    if let Some(value) = record.get(kebab) {
        return Some(value);
    }
    let snake = kebab.replace('-', "_");
    if let Some(value) = record.get(&snake) {
        return Some(value);
    }
    let mut camel = String::with_capacity(kebab.len());
    let mut upper = false;
    for c in kebab.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            camel.extend(c.to_uppercase());
            upper = false;
        } else {
            camel.push(c);
        }
    }
    record.get(&camel)
}

/// Strips any remaining `{value: ...}` wrappers, e.g. of optional fields.
fn scalar(value: &Value) -> &Value {
    let mut current = value;
    while let Value::Object(map) = current {
        match map.get("value") {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
}

fn parse_integer_str(s: &str) -> Option<i128> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix('u')
        .unwrap_or(trimmed);
    digits.parse::<i128>().ok()
}

fn value_i128(value: &Value) -> Option<i128> {
    match scalar(value) {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .or_else(|| n.as_f64().map(|f| f as i128)),
        Value::String(s) => parse_integer_str(s),
        _ => None,
    }
}

pub(crate) fn value_u64(value: &Value) -> Option<u64> {
    value_i128(value).and_then(|n| u64::try_from(n).ok())
}

fn field_u64(record: &Map<String, Value>, name: &str) -> Option<u64> {
    field(record, name).and_then(value_u64)
}

fn field_i64(record: &Map<String, Value>, name: &str) -> Option<i64> {
    field(record, name)
        .and_then(value_i128)
        .and_then(|n| i64::try_from(n).ok())
}

fn field_string(record: &Map<String, Value>, name: &str) -> Option<String> {
    match scalar(field(record, name)?) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn field_bool(record: &Map<String, Value>, name: &str) -> Option<bool> {
    match scalar(field(record, name)?) {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
