//! Shared type definitions for the Lights Out reaction timer.
//!
//! This crate is the single source of truth for the values that cross
//! crate boundaries: race identifiers, race and light state, reaction
//! outcomes, leaderboard rows and the events published while a race runs.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for race and session identifiers
//! - [`enums`] -- [`RaceState`] and [`LightState`]
//! - [`lights`] -- The ordered five-light gantry
//! - [`structs`] -- Records, outcomes, events and snapshots

pub mod enums;
pub mod ids;
pub mod lights;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{LightState, RaceState};
pub use ids::{RaceId, SessionId};
pub use lights::{LIGHT_COUNT, LightSequence, LightSequenceError};
pub use structs::{RaceEvent, RaceSnapshot, ReactionOutcome, ReactionResult, ScoreRecord};
