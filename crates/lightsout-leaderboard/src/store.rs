//! The persistence contract behind the leaderboard.
//!
//! A [`ScoreStore`] holds an ordered list of [`ScoreRecord`]s. The
//! leaderboard never depends on a specific storage technology; it only
//! loads the whole list and saves the whole list back.
//!
//! Loading is lenient: a missing or empty store is an empty list, and rows
//! that cannot be understood are skipped and reported as
//! [`LeaderboardWarning::MalformedRow`] instead of failing the load.

use core::future::Future;

use lightsout_types::ScoreRecord;
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;

use crate::error::StoreError;

/// A recoverable problem encountered while reading or writing scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LeaderboardWarning {
    /// A stored row was skipped because it could not be parsed.
    MalformedRow {
        /// One-based line number in the backing store (0 if unknown).
        line: u64,
        /// Why the row was rejected.
        reason: String,
    },
    /// The updated leaderboard could not be persisted.
    ///
    /// The returned standings reflect the submission, but the next load may
    /// return the previous contents.
    SaveFailed {
        /// Description of the failure.
        message: String,
    },
}

impl core::fmt::Display for LeaderboardWarning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MalformedRow { line, reason } => {
                write!(f, "skipped malformed row on line {line}: {reason}")
            }
            Self::SaveFailed { message } => write!(f, "leaderboard not saved: {message}"),
        }
    }
}

/// The records found in a store plus any rows that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    /// Valid records in stored order.
    pub records: Vec<ScoreRecord>,
    /// Rows that were skipped.
    pub warnings: Vec<LeaderboardWarning>,
}

impl LoadOutcome {
    /// An outcome with the given records and no warnings.
    pub const fn clean(records: Vec<ScoreRecord>) -> Self {
        Self {
            records,
            warnings: Vec::new(),
        }
    }
}

/// Durable storage for leaderboard records.
///
/// Implementations must be safe to share between sessions. The
/// [`Leaderboard`](crate::Leaderboard) holds [`exclusive`](Self::exclusive)
/// for the whole of each load-modify-save cycle, so a store does not need
/// to provide compare-and-swap semantics.
pub trait ScoreStore: Send + Sync {
    /// Load every record in stored order.
    ///
    /// A missing or empty store yields an empty [`LoadOutcome`]. Malformed
    /// rows are skipped and listed in [`LoadOutcome::warnings`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only when the store exists but cannot be read
    /// at all.
    fn load(&self) -> impl Future<Output = Result<LoadOutcome, StoreError>> + Send;

    /// Replace the stored contents with exactly `records`, in order.
    ///
    /// Readers must observe either the old contents or the new contents,
    /// never a partial write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the records could not be persisted.
    fn save(&self, records: &[ScoreRecord]) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Exclusive write access to the underlying storage, held across a
    /// load-modify-save cycle.
    ///
    /// Stores whose data can be reached through more than one value (for
    /// example, two handles on the same file) return a guard shared by all
    /// of them. The default returns `None`, for stores that are only
    /// reachable through a single leaderboard.
    fn exclusive(&self) -> impl Future<Output = Option<OwnedMutexGuard<()>>> + Send {
        core::future::ready(None)
    }
}
