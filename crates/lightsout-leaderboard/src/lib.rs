//! Ranked, persisted top-ten leaderboard for the Lights Out reaction timer.
//!
//! # Architecture
//!
//! ```text
//! SessionController
//!     |
//!     +-- submit / preview_rank / list --> Leaderboard (async mutex)
//!                                              |
//!                                              +-- load / save --> ScoreStore
//!                                                                   |-- CsvFileStore
//!                                                                   +-- MemoryStore
//! ```
//!
//! # Modules
//!
//! - [`leaderboard`] -- Ranking, truncation and the submit transaction
//! - [`store`] -- The [`ScoreStore`] contract and load/save warnings
//! - [`csv_store`] -- Two-column CSV file store
//! - [`memory`] -- In-memory store
//! - [`error`] -- Shared error types

pub mod csv_store;
pub mod error;
pub mod leaderboard;
pub mod memory;
pub mod store;

// Re-export primary types for convenience.
pub use csv_store::CsvFileStore;
pub use error::{LeaderboardError, StoreError};
pub use leaderboard::{
    LEADERBOARD_CAPACITY, Leaderboard, RankPreview, Standings, SubmitOutcome, rank_for,
};
pub use memory::MemoryStore;
pub use store::{LeaderboardWarning, LoadOutcome, ScoreStore};
