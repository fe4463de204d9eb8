//! Value types exchanged between the race core, the leaderboard and the
//! presentation layer.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::enums::RaceState;
use crate::ids::RaceId;
use crate::lights::LightSequence;

/// One leaderboard row.
///
/// Records have no key: two entries with the same name are distinct rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Display name entered by the participant.
    pub name: String,
    /// Reaction time in seconds.
    pub elapsed_seconds: f64,
}

impl ScoreRecord {
    /// Build a record.
    pub fn new(name: impl Into<String>, elapsed_seconds: f64) -> Self {
        Self {
            name: name.into(),
            elapsed_seconds,
        }
    }
}

/// A captured reaction, produced on the transition into
/// [`RaceState::Completed`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactionResult {
    /// The race the reaction belongs to.
    pub race_id: RaceId,
    /// Seconds between lights out and the reaction.
    pub elapsed_seconds: f64,
}

/// What a call to `react` produced.
///
/// A false start is a normal gameplay outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ReactionOutcome {
    /// Reacted after lights out.
    Completed(ReactionResult),
    /// Reacted while the lights were still coming on.
    FalseStart {
        /// The race that was false-started.
        race_id: RaceId,
    },
}

impl ReactionOutcome {
    /// The reaction time, if the outcome was a valid reaction.
    pub const fn elapsed_seconds(&self) -> Option<f64> {
        match self {
            Self::Completed(result) => Some(result.elapsed_seconds),
            Self::FalseStart { .. } => None,
        }
    }

    /// Whether the outcome is a false start.
    pub const fn is_false_start(&self) -> bool {
        matches!(self, Self::FalseStart { .. })
    }
}

/// A state transition published by the race state machine.
///
/// Presentation layers subscribe to these to render the gantry without
/// polling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RaceEvent {
    /// A new race entered `Sequencing` with all lights unlit.
    Started {
        /// The new race.
        race_id: RaceId,
    },
    /// The light at `index` came on.
    LightOn {
        /// The race being sequenced.
        race_id: RaceId,
        /// Zero-based light index.
        index: usize,
    },
    /// All lights went out; the reaction timer is running.
    LightsOut {
        /// The armed race.
        race_id: RaceId,
    },
    /// A valid reaction was captured.
    Reacted {
        /// The completed race.
        race_id: RaceId,
        /// Reaction time in seconds.
        elapsed_seconds: f64,
    },
    /// The participant jumped the start.
    FalseStart {
        /// The false-started race.
        race_id: RaceId,
    },
}

impl RaceEvent {
    /// The race this event belongs to.
    pub const fn race_id(&self) -> RaceId {
        match self {
            Self::Started { race_id }
            | Self::LightOn { race_id, .. }
            | Self::LightsOut { race_id }
            | Self::Reacted { race_id, .. }
            | Self::FalseStart { race_id } => *race_id,
        }
    }
}

/// Point-in-time view of a session's race, returned by `get_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RaceSnapshot {
    /// The current (or most recent) race, `None` before the first start.
    pub race_id: Option<RaceId>,
    /// Current state.
    pub state: RaceState,
    /// Current gantry.
    pub lights: LightSequence,
    /// Clock reading when the lights went out, once armed.
    pub armed_at: Option<Duration>,
}
