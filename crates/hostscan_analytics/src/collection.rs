//! Correlated start/end sequences collected from scanned logs.
//!
//! A sequence is seeded by its end marker and identified by
//! `<occurrence>_<source_basename>_<event_id>`. Event ids repeat over
//! time within one source, so each side keeps a per-key occurrence
//! counter and the Nth start pairs with the Nth end for that key.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AnalyticsError;

/// One start/end pair, possibly still missing its start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    pub end: NaiveDateTime,
    pub start: Option<NaiveDateTime>,
    /// Elapsed seconds, either captured from the log line itself or
    /// computed as end minus start.
    pub duration: Option<f64>,
    #[serde(skip)]
    ordinal: usize,
}

impl Sequence {
    /// A sequence is complete once a start has been paired with its end.
    pub fn is_complete(&self) -> bool {
        self.start.is_some()
    }
}

/// All sequences collected during one correlation pass.
///
/// One instance per tag prefix: occurrence counters and the sequence
/// table must not be shared across unrelated correlation domains.
#[derive(Debug, Default)]
pub struct SequenceCollection {
    sequences: HashMap<String, Sequence>,
    end_ids: HashMap<String, u64>,
    start_ids: HashMap<String, u64>,
}

impl SequenceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an end marker for `key`, seeding a new sequence. Returns
    /// the new sequence's unique id.
    pub fn record_end(
        &mut self,
        key: &str,
        end: NaiveDateTime,
        duration: Option<f64>,
    ) -> String {
        let occurrence = self.end_ids.get(key).map(|n| n + 1).unwrap_or(0);
        self.end_ids.insert(key.to_string(), occurrence);

        let unique_id = format!("{}_{}", occurrence, key);
        let sequence = Sequence {
            end,
            start: None,
            // a zero duration field means the line did not really carry one
            duration: duration.filter(|d| *d != 0.0),
            ordinal: self.sequences.len(),
        };
        self.sequences.insert(unique_id.clone(), sequence);
        unique_id
    }

    /// Record a start marker for `key`, pairing it with the end recorded
    /// at the same occurrence position.
    ///
    /// Returns the paired sequence's unique id, or `None` when the start
    /// has no usable counterpart: either no end was ever recorded for
    /// `key`, or more starts than ends have been seen (an interrupted or
    /// wrapped-around sequence). A dropped start does not advance the
    /// occurrence counter.
    pub fn record_start(&mut self, key: &str, start: NaiveDateTime) -> Option<String> {
        // starts only attach to sequences already seeded by an end
        if !self.end_ids.contains_key(key) {
            return None;
        }

        let occurrence = self.start_ids.get(key).map(|n| n + 1).unwrap_or(0);
        let unique_id = format!("{}_{}", occurrence, key);

        let Some(sequence) = self.sequences.get_mut(&unique_id) else {
            return None;
        };

        self.start_ids.insert(key.to_string(), occurrence);
        sequence.start = Some(start);

        if sequence.duration.is_none() {
            let delta = sequence.end.signed_duration_since(start);
            let secs = delta
                .num_microseconds()
                .map(|us| us as f64 / 1_000_000.0)
                .unwrap_or_else(|| delta.num_milliseconds() as f64 / 1000.0);
            if secs < 0.0 {
                warn!(
                    "sequence {} starts after it ends, leaving duration unset",
                    unique_id
                );
            } else {
                sequence.duration = Some(secs);
            }
        }

        Some(unique_id)
    }

    /// True once at least one sequence has both its end and its start.
    pub fn has_complete_sequences(&self) -> bool {
        self.sequences.values().any(Sequence::is_complete)
    }

    /// All complete sequences, in the order their ends were recorded.
    pub fn complete_sequences(&self) -> Vec<(&str, &Sequence)> {
        let mut complete: Vec<_> = self
            .sequences
            .iter()
            .filter(|(_, s)| s.is_complete())
            .map(|(id, s)| (id.as_str(), s))
            .collect();
        complete.sort_by_key(|(_, s)| s.ordinal);
        complete
    }

    /// Look up one sequence by its unique id.
    pub fn get(&self, unique_id: &str) -> Result<&Sequence, AnalyticsError> {
        self.sequences
            .get(unique_id)
            .ok_or_else(|| AnalyticsError::SequenceNotFound(unique_id.to_string()))
    }

    /// Number of sequences seeded so far, complete or not.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}
