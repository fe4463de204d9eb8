//! Error types for the leaderboard and its stores.
//!
//! Store failures wrap the underlying I/O or CSV error together with the
//! path involved. Usage errors (bad name, bad time) are reported by
//! [`LeaderboardError`] and never touch the store.

use std::path::PathBuf;

/// Errors raised by a [`ScoreStore`](crate::ScoreStore) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Encoding records as CSV failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors returned by [`Leaderboard`](crate::Leaderboard) operations.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    /// The submitted name was empty (or only whitespace).
    #[error("a name is required to enter the leaderboard")]
    InvalidName,

    /// The submitted time was negative, NaN or infinite.
    #[error("invalid reaction time: {value}")]
    InvalidElapsed {
        /// The rejected value.
        value: f64,
    },

    /// The store could not be read.
    #[error("score store error: {0}")]
    Store(#[from] StoreError),
}
