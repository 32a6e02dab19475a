//! Result projection
//!
//! Copies a fixed allow-list of fields from each raw match into the result
//! shape. Cast lists are truncated to a small prefix for display economy;
//! that is a presentation decision and never affects ranking. Scores are
//! attached unmodified: no local re-normalization or re-ranking.

use crate::pipeline::SCORE_FIELD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of cast members kept per hit
pub const CAST_PREFIX: usize = 3;

/// One projected search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieHit {
    /// Backend document identity, when present
    pub id: Option<String>,

    pub title: String,

    pub plot: String,

    pub year: Option<i64>,

    pub genres: Vec<String>,

    /// First `CAST_PREFIX` cast members
    pub cast: Vec<String>,

    pub poster: Option<String>,

    /// Rating, when the document carries one
    pub rating: Option<f64>,

    /// Backend-reported cosine similarity in [0, 1]
    pub score: f64,
}

/// Project raw backend documents into the result shape, preserving order.
///
/// Missing fields degrade to empty/None values rather than errors; the input
/// is not mutated, so projecting twice yields identical output.
pub fn project(raw: &[Value]) -> Vec<MovieHit> {
    raw.iter().map(project_one).collect()
}

fn project_one(doc: &Value) -> MovieHit {
    MovieHit {
        id: extract_id(doc),
        title: string_field(doc, "title"),
        plot: string_field(doc, "plot"),
        year: doc.get("year").and_then(Value::as_i64),
        genres: string_list(doc.get("genres"), usize::MAX),
        cast: string_list(doc.get("cast"), CAST_PREFIX),
        poster: doc
            .get("poster")
            .and_then(Value::as_str)
            .map(String::from),
        rating: extract_rating(doc),
        score: doc
            .get(SCORE_FIELD)
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
    }
}

/// Document ids arrive either as plain strings or extended-JSON `{"$oid": ...}`
fn extract_id(doc: &Value) -> Option<String> {
    match doc.get("_id")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("$oid")
            .and_then(Value::as_str)
            .map(String::from),
        _ => None,
    }
}

/// Ratings live nested under `imdb.rating` or flattened under the dotted key
fn extract_rating(doc: &Value) -> Option<f64> {
    if let Some(rating) = doc
        .get("imdb")
        .and_then(|imdb| imdb.get("rating"))
        .and_then(Value::as_f64)
    {
        return Some(rating);
    }
    doc.get("imdb.rating").and_then(Value::as_f64)
}

fn string_field(doc: &Value, field: &str) -> String {
    doc.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn string_list(value: Option<&Value>, max: usize) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .take(max)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
