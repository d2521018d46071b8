//! Hostscan analytics - log sequence correlation and statistics.
//!
//! The searcher side of hostscan scans files and command output for
//! tagged start/end markers and yields one hit per match. This crate
//! pairs those hits into uniquely-identified sequences (an operation's
//! start and end, possibly logged far apart or across rotated files) and
//! derives duration statistics and top-N rankings over the completed
//! pairs.

pub mod collection;
pub mod error;
pub mod scan;
pub mod search;
pub mod stats;

pub use collection::{Sequence, SequenceCollection};
pub use error::AnalyticsError;
pub use scan::SequenceScan;
pub use search::{FieldIndices, HitSource, SearchHit};
pub use stats::{FieldStats, RankedSequence, SequenceField, SequenceStats};
