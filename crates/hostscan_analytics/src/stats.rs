//! Descriptive statistics and rankings over completed sequences.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::collection::{Sequence, SequenceCollection};
use crate::error::AnalyticsError;

/// Field of a sequence usable for ranking and aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceField {
    Start,
    End,
    Duration,
}

impl SequenceField {
    pub fn name(self) -> &'static str {
        match self {
            SequenceField::Start => "start",
            SequenceField::End => "end",
            SequenceField::Duration => "duration",
        }
    }

    /// Numeric value of this field on `sequence`, if set. Timestamps
    /// aggregate as epoch seconds.
    fn value(self, sequence: &Sequence) -> Option<f64> {
        match self {
            SequenceField::Start => sequence.start.map(epoch_seconds),
            SequenceField::End => Some(epoch_seconds(sequence.end)),
            SequenceField::Duration => sequence.duration,
        }
    }
}

fn epoch_seconds(ts: NaiveDateTime) -> f64 {
    ts.and_utc().timestamp_micros() as f64 / 1_000_000.0
}

/// One entry of a top-N ranking, keyed by the bare event id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSequence {
    pub event_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Summary statistics over one numeric field of the completed sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub min: f64,
    pub max: f64,
    pub stdev: f64,
    pub avg: f64,
    pub samples: usize,
}

/// Read-only statistics view over a [`SequenceCollection`].
pub struct SequenceStats<'a> {
    data: &'a SequenceCollection,
}

impl<'a> SequenceStats<'a> {
    pub fn new(data: &'a SequenceCollection) -> Self {
        Self { data }
    }

    /// The `n` sequences ranking highest (lowest with `descending`
    /// false) on `field`, re-sorted by start time for presentation.
    ///
    /// Sequences with an unset or zero-valued field do not rank at all;
    /// in particular a sequence whose duration was dropped for running
    /// backwards never shows up here.
    ///
    /// Entries are keyed by the bare event id, the unique sequence id
    /// with its occurrence and source prefixes stripped. When the same
    /// bare id recurs within the selected window, the later entry
    /// replaces the earlier one's values while keeping its position, so
    /// a ranking can come back with fewer than `n` entries. Known sharp
    /// edge: an event id recurring across distinct sources collapses the
    /// same way.
    pub fn top_n(&self, n: usize, field: SequenceField, descending: bool) -> Vec<RankedSequence> {
        let mut ranked: Vec<(&str, &Sequence, f64)> = self
            .data
            .complete_sequences()
            .into_iter()
            .filter_map(|(id, s)| {
                field
                    .value(s)
                    .filter(|v| *v != 0.0)
                    .map(|v| (id, s, v))
            })
            .collect();

        ranked.sort_by(|a, b| {
            let ord = a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
        ranked.truncate(n);

        ranked.sort_by(|a, b| {
            let ord = a.1.start.cmp(&b.1.start);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });

        let mut top: Vec<RankedSequence> = Vec::with_capacity(ranked.len());
        for (id, sequence, _) in ranked {
            let Some(start) = sequence.start else {
                continue;
            };
            let entry = RankedSequence {
                event_id: bare_event_id(id).to_string(),
                start,
                end: sequence.end,
                duration: sequence.duration.filter(|d| *d != 0.0),
            };
            if let Some(existing) = top.iter_mut().find(|e| e.event_id == entry.event_id) {
                *existing = entry;
            } else {
                top.push(entry);
            }
        }

        top
    }

    /// The `n` slowest operations, slowest first.
    pub fn top_n_by_duration(&self, n: usize) -> Vec<RankedSequence> {
        self.top_n(n, SequenceField::Duration, true)
    }

    /// Min/max/population stdev/mean of `field` over the completed
    /// sequences carrying it, rounded to two decimal places, plus the
    /// sample count.
    ///
    /// Errors with [`AnalyticsError::NoSamples`] when no completed
    /// sequence carries the field, rather than fabricating zeros.
    pub fn stats(&self, field: SequenceField) -> Result<FieldStats, AnalyticsError> {
        let samples: Vec<f64> = self
            .data
            .complete_sequences()
            .into_iter()
            .filter_map(|(_, s)| field.value(s))
            .collect();

        if samples.is_empty() {
            return Err(AnalyticsError::NoSamples { field: field.name() });
        }

        let count = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / count;
        let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
        let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        Ok(FieldStats {
            min: round2(min),
            max: round2(max),
            stdev: round2(variance.sqrt()),
            avg: round2(mean),
            samples: samples.len(),
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Strip the occurrence and source prefixes from a unique sequence id,
/// leaving the final underscore-separated segment.
fn bare_event_id(unique_id: &str) -> &str {
    unique_id.rsplit('_').next().unwrap_or(unique_id)
}
