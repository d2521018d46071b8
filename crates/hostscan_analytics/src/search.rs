//! Search hit records handed over by the external searcher.
//!
//! The searcher scans files and command output for tagged regex patterns
//! and records one `SearchHit` per match. This crate only consumes those
//! hits; `FieldIndices` says which capture group holds which field.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Timestamp layout of the combined day + time-of-day fields.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One pattern match produced by the searcher.
///
/// Capture groups are numbered the way the search patterns number them:
/// group 0 is the whole match, captured fields start at 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    source: String,
    groups: Vec<Option<String>>,
}

impl SearchHit {
    pub fn new(source: impl Into<String>, groups: Vec<Option<String>>) -> Self {
        Self {
            source: source.into(),
            groups,
        }
    }

    /// Path of the file or command stream the match came from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Captured text of group `idx`, if that group participated.
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.groups.get(idx).and_then(|g| g.as_deref())
    }
}

/// Producer of search hits, implemented by the external searcher.
pub trait HitSource {
    /// All recorded matches for `tag`, in file-traversal order.
    fn find_by_tag(&self, tag: &str) -> Vec<SearchHit>;
}

/// Where to find the required fields within a hit's capture groups.
///
/// Day, time-of-day and event id are mandatory. A pattern that also
/// captures a ready-made duration for the whole operation can say so
/// with `duration`; that value then takes precedence over the computed
/// end minus start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldIndices {
    pub day: usize,
    pub time: usize,
    pub event_id: usize,
    pub duration: Option<usize>,
}

impl Default for FieldIndices {
    fn default() -> Self {
        Self {
            day: 1,
            time: 2,
            event_id: 3,
            duration: None,
        }
    }
}

/// Parse a hit's day and time-of-day fields into one instant.
pub fn parse_timestamp(day: &str, time: &str) -> Result<NaiveDateTime, AnalyticsError> {
    let combined = format!("{} {}", day, time);
    Ok(NaiveDateTime::parse_from_str(&combined, TIMESTAMP_FORMAT)?)
}
