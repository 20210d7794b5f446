//! Maps a decoded [`Snapshot`] onto the persisted per-date document.
//!
//! This is the only place defaults are filled in. The output shape
//! ([`SyncedDocument`] / [`ShowRecord`]) is queried by other systems, so
//! field names and the `nepal_<YYYYMMDD>` id scheme must stay stable.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::HashSet;
use thiserror::Error;

use crate::snapshot::{Show, Snapshot};

/// Prefix of every document id.
pub const DOCUMENT_ID_PREFIX: &str = "nepal_";

/// The single stored record for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedDocument {
    #[serde(rename = "_id")]
    pub id: String,
    /// `YYYYMMDD`.
    pub date: String,
    pub last_updated: String,
    pub synced_at: DateTime<FixedOffset>,
    pub total_shows: i64,
    pub total_movies: i64,
    pub shows: Vec<ShowRecord>,
}

/// One show as persisted. Descriptive fields and ids keep the JSON type the
/// scraper used; counts and money are always numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowRecord {
    pub show_id: Option<Value>,
    pub movie_id: Option<Value>,
    pub movie_name: Option<Value>,
    pub venue: Option<Value>,
    pub theatre: Option<Value>,
    pub show_date: Option<Value>,
    pub show_time: Option<Value>,
    pub seats: Number,
    pub sold: Number,
    pub reserved: Number,
    pub available: Number,
    pub gross: Number,
    pub occupancy_percent: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("no valid date in snapshot (got {0:?})")]
    InvalidDate(String),
}

impl ShowRecord {
    pub fn from_show(show: &Show) -> Self {
        Self {
            show_id: show.show_id.clone(),
            movie_id: show.movie_id.clone(),
            movie_name: show.movie_name.clone(),
            venue: show.venue.clone(),
            theatre: show.theatre.clone(),
            show_date: show.date.clone(),
            show_time: show.time.clone(),
            seats: count(&show.seats),
            sold: count(&show.sold),
            reserved: count(&show.reserved),
            available: count(&show.available),
            gross: amount(&show.gross),
            occupancy_percent: amount(&show.occupancy_percent),
            error: show.error.clone().filter(is_truthy),
            skipped: show.skipped.as_ref().filter(|v| is_truthy(v)).map(|_| true),
        }
    }
}

/// The number as given, or integer `0` when missing or not a number.
fn count(value: &Option<Value>) -> Number {
    match value {
        Some(Value::Number(n)) => n.clone(),
        _ => Number::from(0),
    }
}

/// The number as given, or `0.0` when missing or not a number.
fn amount(value: &Option<Value>) -> Number {
    match value {
        Some(Value::Number(n)) => n.clone(),
        _ => Number::from_f64(0.0).unwrap_or_else(|| Number::from(0)),
    }
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// `2026-01-13` becomes `20260113`.
pub fn date_code(date: &str) -> Result<String, TransformError> {
    let code = date.replace('-', "");
    if code.is_empty() {
        return Err(TransformError::InvalidDate(date.to_string()));
    }
    Ok(code)
}

pub fn document_id(date_code: &str) -> String {
    format!("{DOCUMENT_ID_PREFIX}{date_code}")
}

/// Number of distinct, truthy movie ids. `42` and `"42"` are different ids.
pub fn count_unique_movies(shows: &[Show]) -> usize {
    shows
        .iter()
        .filter_map(|show| show.movie_id.as_ref())
        .filter(|id| is_truthy(id))
        .map(Value::to_string)
        .collect::<HashSet<_>>()
        .len()
}

/// Builds the document for `snapshot`, stamped with `synced_at`.
///
/// Pure: the same snapshot and timestamp always produce the same document.
pub fn build_document(
    snapshot: &Snapshot,
    synced_at: DateTime<FixedOffset>,
) -> Result<SyncedDocument, TransformError> {
    let date = date_code(&snapshot.date)?;
    let shows: Vec<ShowRecord> = snapshot.shows.iter().map(ShowRecord::from_show).collect();

    Ok(SyncedDocument {
        id: document_id(&date),
        date,
        last_updated: snapshot.last_updated.clone(),
        synced_at,
        total_shows: shows.len() as i64,
        total_movies: count_unique_movies(&snapshot.shows) as i64,
        shows,
    })
}
