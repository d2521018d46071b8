//! Two-phase ingestion of tagged search hits.

use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::collection::SequenceCollection;
use crate::error::AnalyticsError;
use crate::search::{parse_timestamp, FieldIndices, HitSource, SearchHit};
use crate::stats::SequenceStats;

/// Correlates the hits recorded under `<prefix>-end` / `<prefix>-start`
/// into a [`SequenceCollection`].
///
/// All end hits are ingested before any start hit: ends seed the
/// sequences and the Nth start for a key pairs with the Nth end, so the
/// two passes must not interleave.
pub struct SequenceScan<'a> {
    source: &'a dyn HitSource,
    tag_prefix: String,
    indices: FieldIndices,
    collection: SequenceCollection,
}

impl<'a> SequenceScan<'a> {
    pub fn new(
        source: &'a dyn HitSource,
        tag_prefix: impl Into<String>,
        indices: FieldIndices,
    ) -> Self {
        Self {
            source,
            tag_prefix: tag_prefix.into(),
            indices,
            collection: SequenceCollection::new(),
        }
    }

    /// Run both ingestion passes over the search results.
    ///
    /// Malformed day/time or duration fields abort the scan; hits
    /// missing a required capture group altogether are skipped.
    pub fn run(&mut self) -> Result<(), AnalyticsError> {
        let end_tag = format!("{}-end", self.tag_prefix);
        let end_hits = self.source.find_by_tag(&end_tag);
        for hit in &end_hits {
            let Some((key, timestamp)) = self.extract(hit, &end_tag)? else {
                continue;
            };
            let duration = match self.indices.duration {
                Some(idx) => match hit.get(idx) {
                    Some(raw) => Some(raw.parse::<f64>()?),
                    None => None,
                },
                None => None,
            };
            self.collection.record_end(&key, timestamp, duration);
        }

        let start_tag = format!("{}-start", self.tag_prefix);
        let start_hits = self.source.find_by_tag(&start_tag);
        for hit in &start_hits {
            let Some((key, timestamp)) = self.extract(hit, &start_tag)? else {
                continue;
            };
            self.collection.record_start(&key, timestamp);
        }

        debug!(
            "correlated {} end and {} start hits for '{}': {} sequences ({} complete)",
            end_hits.len(),
            start_hits.len(),
            self.tag_prefix,
            self.collection.len(),
            self.collection.complete_sequences().len()
        );
        Ok(())
    }

    /// Pull the correlation key and timestamp out of one hit. Returns
    /// `None` (after a warning) when a required capture group is absent.
    fn extract(
        &self,
        hit: &SearchHit,
        tag: &str,
    ) -> Result<Option<(String, NaiveDateTime)>, AnalyticsError> {
        let (Some(day), Some(time), Some(event_id)) = (
            hit.get(self.indices.day),
            hit.get(self.indices.time),
            hit.get(self.indices.event_id),
        ) else {
            warn!("hit from {} for tag {} is missing required fields", hit.source(), tag);
            return Ok(None);
        };

        let timestamp = parse_timestamp(day, time)?;
        let key = format!("{}_{}", source_basename(hit.source()), event_id);
        Ok(Some((key, timestamp)))
    }

    /// Sequences collected so far.
    pub fn collection(&self) -> &SequenceCollection {
        &self.collection
    }

    /// Statistics view over the collected sequences.
    pub fn stats(&self) -> SequenceStats<'_> {
        SequenceStats::new(&self.collection)
    }

    pub fn into_collection(self) -> SequenceCollection {
        self.collection
    }
}

/// Reduce a hit's source path to its base filename for use in the
/// correlation key.
fn source_basename(source: &str) -> &str {
    Path::new(source)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(source)
}
