//! The ranked top-ten leaderboard.
//!
//! [`Leaderboard`] owns a [`ScoreStore`] and is the only way scores are
//! added. Every submission is a single load-sort-truncate-save transaction
//! executed under an async mutex and under the store's own exclusive
//! guard, so sessions can submit concurrently without losing updates,
//! whether they share one `Arc<Leaderboard<_>>` or open separate
//! leaderboards on the same file.
//!
//! # Ranking
//!
//! Entries are ordered ascending by reaction time. Equal times keep their
//! insertion order (the sort is stable), so a new score that ties existing
//! ones is placed after all of them. [`rank_for`] encodes the same rule,
//! which keeps [`Leaderboard::preview_rank`] consistent with
//! [`Leaderboard::submit`].

use lightsout_types::ScoreRecord;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::LeaderboardError;
use crate::store::{LeaderboardWarning, LoadOutcome, ScoreStore};

/// Maximum number of entries retained.
pub const LEADERBOARD_CAPACITY: usize = 10;

/// The standings as currently stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Standings {
    /// Entries, best first, at most [`LEADERBOARD_CAPACITY`].
    pub entries: Vec<ScoreRecord>,
    /// Rows skipped while loading.
    pub warnings: Vec<LeaderboardWarning>,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitOutcome {
    /// The leaderboard after the submission, best first.
    pub entries: Vec<ScoreRecord>,
    /// One-based position of the new entry, `None` if it did not make the
    /// top ten.
    pub rank: Option<usize>,
    /// Malformed rows skipped on load and any save failure.
    pub warnings: Vec<LeaderboardWarning>,
}

impl SubmitOutcome {
    /// Whether the new standings were written to the store.
    pub fn persisted(&self) -> bool {
        !self
            .warnings
            .iter()
            .any(|w| matches!(w, LeaderboardWarning::SaveFailed { .. }))
    }
}

/// Where a time would place if it were submitted now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankPreview {
    /// One-based rank among the current entries plus the candidate.
    pub rank: usize,
    /// Number of entries considered, including the candidate.
    pub total: usize,
}

impl RankPreview {
    /// Whether the candidate would be kept in the top ten.
    pub const fn qualifies(&self) -> bool {
        self.rank <= LEADERBOARD_CAPACITY
    }
}

/// Top-ten reaction time leaderboard backed by a [`ScoreStore`].
#[derive(Debug)]
pub struct Leaderboard<S> {
    store: S,
    /// Held for the whole load-modify-save cycle of a submission.
    write_lock: Mutex<()>,
}

impl<S: ScoreStore> Leaderboard<S> {
    /// Create a leaderboard over `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// The backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Add a score, keep the best ten, and persist the result.
    ///
    /// The name is trimmed before it is stored. A failed save does not fail
    /// the submission; it is reported as
    /// [`LeaderboardWarning::SaveFailed`] on the outcome.
    ///
    /// # Errors
    ///
    /// - [`LeaderboardError::InvalidName`] if the trimmed name is empty.
    /// - [`LeaderboardError::InvalidElapsed`] if the time is negative or not
    ///   finite.
    /// - [`LeaderboardError::Store`] if the current standings cannot be read.
    pub async fn submit(
        &self,
        name: &str,
        elapsed_seconds: f64,
    ) -> Result<SubmitOutcome, LeaderboardError> {
        let name = validate_name(name)?;
        validate_elapsed(elapsed_seconds)?;

        let _guard = self.write_lock.lock().await;
        let _store_guard = self.store.exclusive().await;

        let LoadOutcome {
            records,
            mut warnings,
        } = self.store.load().await?;

        let candidate = ScoreRecord::new(name, elapsed_seconds);
        let (entries, rank) = insert_ranked(records, candidate);
        debug_assert!(
            entries.len() <= LEADERBOARD_CAPACITY,
            "leaderboard holds {} entries after truncation",
            entries.len()
        );

        if let Err(err) = self.store.save(&entries).await {
            warn!(error = %err, "Leaderboard save failed; standings not persisted");
            warnings.push(LeaderboardWarning::SaveFailed {
                message: err.to_string(),
            });
        }

        info!(
            name,
            elapsed_seconds,
            rank = ?rank,
            entries = entries.len(),
            "Score submitted"
        );

        Ok(SubmitOutcome {
            entries,
            rank,
            warnings,
        })
    }

    /// Rank a time would take if submitted now, without changing anything.
    ///
    /// The rank may exceed [`LEADERBOARD_CAPACITY`], which lets callers say
    /// "you placed 14th of 14" for a time that will not be kept.
    ///
    /// # Errors
    ///
    /// - [`LeaderboardError::InvalidElapsed`] if the time is negative or not
    ///   finite.
    /// - [`LeaderboardError::Store`] if the standings cannot be read.
    pub async fn preview_rank(&self, elapsed_seconds: f64) -> Result<RankPreview, LeaderboardError> {
        validate_elapsed(elapsed_seconds)?;
        let standings = self.list().await?;
        let preview = RankPreview {
            rank: rank_for(&standings.entries, elapsed_seconds),
            total: standings.entries.len().saturating_add(1),
        };
        debug!(
            elapsed_seconds,
            rank = preview.rank,
            total = preview.total,
            "Rank previewed"
        );
        Ok(preview)
    }

    /// The current top ten, best first.
    ///
    /// Stored rows are re-sorted and capped on the way out, so a store that
    /// was edited by hand still yields a valid leaderboard.
    ///
    /// # Errors
    ///
    /// Returns [`LeaderboardError::Store`] if the standings cannot be read.
    pub async fn list(&self) -> Result<Standings, LeaderboardError> {
        let LoadOutcome { records, warnings } = self.store.load().await?;
        Ok(Standings {
            entries: normalize(records),
            warnings,
        })
    }
}

/// One-based rank of `elapsed_seconds` among `entries`.
///
/// Entries with an equal or lower time rank ahead of the candidate.
pub fn rank_for(entries: &[ScoreRecord], elapsed_seconds: f64) -> usize {
    entries
        .iter()
        .filter(|entry| entry.elapsed_seconds <= elapsed_seconds)
        .count()
        .saturating_add(1)
}

/// Append `candidate`, stable-sort ascending, and keep the best ten.
///
/// Returns the new entries and the candidate's rank if it was kept.
fn insert_ranked(
    mut entries: Vec<ScoreRecord>,
    candidate: ScoreRecord,
) -> (Vec<ScoreRecord>, Option<usize>) {
    let rank = rank_for(&entries, candidate.elapsed_seconds);
    entries.push(candidate);
    let entries = normalize(entries);
    let rank = (rank <= entries.len()).then_some(rank);
    (entries, rank)
}

fn normalize(mut entries: Vec<ScoreRecord>) -> Vec<ScoreRecord> {
    entries.sort_by(|a, b| a.elapsed_seconds.total_cmp(&b.elapsed_seconds));
    entries.truncate(LEADERBOARD_CAPACITY);
    entries
}

fn validate_name(name: &str) -> Result<&str, LeaderboardError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LeaderboardError::InvalidName);
    }
    Ok(trimmed)
}

fn validate_elapsed(elapsed_seconds: f64) -> Result<(), LeaderboardError> {
    if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
        return Err(LeaderboardError::InvalidElapsed {
            value: elapsed_seconds,
        });
    }
    Ok(())
}
