//! Start-light sequence, reaction timing, and session coordination for the
//! Lights Out reaction timer.
//!
//! A session starts a race, the five start lights come on one at a time,
//! they all go out after a random hold, and the participant reacts. A
//! reaction before lights out is a false start; a reaction after is timed
//! and can be submitted to the shared top-ten leaderboard.
//!
//! # Modules
//!
//! - [`clock`] -- [`Clock`] trait with [`TokioClock`] and [`ManualClock`].
//! - [`random`] -- [`RandomSource`] trait with [`SeededRandom`] and
//!   [`FixedRandom`].
//! - [`config`] -- Configuration loading from YAML into strongly-typed
//!   structs.
//! - [`race`] -- The race state machine and its sequence driver.
//! - [`session`] -- [`SessionController`], the command surface for one
//!   participant.
//!
//! [`Clock`]: clock::Clock
//! [`TokioClock`]: clock::TokioClock
//! [`ManualClock`]: clock::ManualClock
//! [`RandomSource`]: random::RandomSource
//! [`SeededRandom`]: random::SeededRandom
//! [`FixedRandom`]: random::FixedRandom
//! [`SessionController`]: session::SessionController

pub mod clock;
pub mod config;
pub mod race;
pub mod random;
pub mod session;

pub use clock::{Clock, ManualClock, TokioClock};
pub use config::{ConfigError, DelayRange, LeaderboardConfig, LightsOutConfig, RaceConfig};
pub use race::{RaceError, RaceStateMachine, SequenceOutcome};
pub use random::{FixedRandom, RandomSource, SeededRandom};
pub use session::{SessionController, SessionError, SessionSnapshot};
