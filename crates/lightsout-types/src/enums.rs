//! Enumeration types for race and light state.

use serde::{Deserialize, Serialize};

/// Lifecycle state of one race attempt.
///
/// ```text
/// Idle ──start──> Sequencing ──lights out──> Armed ──react──> Completed
///                      │
///                      └──react──> FalseStarted
/// ```
///
/// `Completed` and `FalseStarted` are terminal for the attempt; a new
/// `start_race` moves any of `Idle`, `Completed` or `FalseStarted` back to
/// `Sequencing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceState {
    /// No race has been started in this session yet.
    #[default]
    Idle,
    /// Lights are coming on one by one; reacting now is a false start.
    Sequencing,
    /// All lights are out and the reaction timer is running.
    Armed,
    /// A valid reaction was captured.
    Completed,
    /// The participant reacted before the lights went out.
    FalseStarted,
}

impl RaceState {
    /// Whether a timed context is live (`Sequencing` or `Armed`).
    ///
    /// A new race may only begin when this is `false`.
    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::Sequencing | Self::Armed)
    }

    /// Whether the attempt has resolved (`Completed` or `FalseStarted`).
    pub const fn is_resolved(self) -> bool {
        matches!(self, Self::Completed | Self::FalseStarted)
    }
}

impl core::fmt::Display for RaceState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Sequencing => "sequencing",
            Self::Armed => "armed",
            Self::Completed => "completed",
            Self::FalseStarted => "false_started",
        };
        f.write_str(name)
    }
}

/// State of a single start light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightState {
    /// Dark.
    #[default]
    Unlit,
    /// Red.
    Lit,
}
