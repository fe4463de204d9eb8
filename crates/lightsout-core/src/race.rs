//! The start-light state machine and reaction capture.
//!
//! A [`RaceStateMachine`] holds one session's race. [`start_race`] moves it
//! into `Sequencing` and returns a fresh [`RaceId`]; [`run_sequence`] then
//! drives the five lights and the lights-out hold by sleeping on the
//! injected [`Clock`]. [`react`] may be called at any time and is resolved
//! against whatever state is observed under the lock.
//!
//! The driver never holds the state lock across a sleep. After every wake-up
//! it re-checks that its race is still current and still `Sequencing`; if
//! not (a false start, or a newer race), it exits as
//! [`SequenceOutcome::Abandoned`] without touching the lights.
//!
//! [`start_race`]: RaceStateMachine::start_race
//! [`run_sequence`]: RaceStateMachine::run_sequence
//! [`react`]: RaceStateMachine::react

use core::time::Duration;

use lightsout_types::{
    LIGHT_COUNT, LightSequence, RaceEvent, RaceId, RaceSnapshot, RaceState, ReactionOutcome,
    ReactionResult,
};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::{DelayRange, RaceConfig};
use crate::random::RandomSource;

/// Usage errors returned by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RaceError {
    /// `start_race` was called while a race is sequencing or armed.
    #[error("a race is already in progress (state: {state})")]
    RaceInProgress {
        /// The state at the time of the call.
        state: RaceState,
    },

    /// `react` was called with no race sequencing or armed.
    #[error("no race is armed (state: {state})")]
    NotArmed {
        /// The state at the time of the call.
        state: RaceState,
    },
}

/// How a sequence driver finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// All lights went out and the race is armed.
    Armed,
    /// The race was false-started or superseded before it could be armed.
    Abandoned,
}

/// One session's race: lights, state and reaction timing.
#[derive(Debug)]
pub struct RaceStateMachine<C, R> {
    clock: C,
    random: Mutex<R>,
    timing: RaceConfig,
    state: Mutex<RaceSnapshot>,
    events: broadcast::Sender<RaceEvent>,
}

impl<C: Clock, R: RandomSource> RaceStateMachine<C, R> {
    /// Create an idle state machine.
    ///
    /// `timing` is expected to have passed
    /// [`LightsOutConfig::validate`](crate::config::LightsOutConfig::validate).
    pub fn new(clock: C, random: R, timing: &RaceConfig) -> Self {
        let (events, _) = broadcast::channel(timing.event_capacity.max(1));
        Self {
            clock,
            random: Mutex::new(random),
            timing: timing.clone(),
            state: Mutex::new(RaceSnapshot::default()),
            events,
        }
    }

    /// The injected clock.
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RaceEvent> {
        self.events.subscribe()
    }

    /// Current race state.
    pub async fn snapshot(&self) -> RaceSnapshot {
        *self.state.lock().await
    }

    /// Begin a new race.
    ///
    /// Resets the lights, clears the previous start time, and moves to
    /// `Sequencing`. The caller must then run [`run_sequence`] with the
    /// returned id.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError::RaceInProgress`] while a race is sequencing or
    /// armed.
    ///
    /// [`run_sequence`]: Self::run_sequence
    pub async fn start_race(&self) -> Result<RaceId, RaceError> {
        let mut state = self.state.lock().await;
        if state.state.is_in_progress() {
            return Err(RaceError::RaceInProgress { state: state.state });
        }

        let race_id = RaceId::new();
        *state = RaceSnapshot {
            race_id: Some(race_id),
            state: RaceState::Sequencing,
            lights: LightSequence::new(),
            armed_at: None,
        };
        self.publish(RaceEvent::Started { race_id });
        info!(race_id = %race_id, "Race started");
        Ok(race_id)
    }

    /// Drive the lights for `race_id` until it is armed or abandoned.
    ///
    /// Each light comes on after a delay from `light_delay`, then the full
    /// gantry holds for a delay from `lights_out_delay` before every light
    /// goes out at once and the reaction timer starts.
    pub async fn run_sequence(&self, race_id: RaceId) -> SequenceOutcome {
        for index in 0..LIGHT_COUNT {
            let delay = self.draw(self.timing.light_delay).await;
            self.clock.sleep(delay).await;

            let mut state = self.state.lock().await;
            if !is_sequencing(&state, race_id) {
                debug!(race_id = %race_id, state = %state.state, "Sequence abandoned");
                return SequenceOutcome::Abandoned;
            }
            let lit = state.lights.light(index);
            debug_assert!(lit.is_ok(), "light order violated: {lit:?}");
            if let Err(err) = lit {
                error!(race_id = %race_id, error = %err, "Light order violated");
                return SequenceOutcome::Abandoned;
            }
            self.publish(RaceEvent::LightOn { race_id, index });
            debug!(race_id = %race_id, index, delay = ?delay, "Light on");
        }

        let hold = self.draw(self.timing.lights_out_delay).await;
        self.clock.sleep(hold).await;

        let mut state = self.state.lock().await;
        if !is_sequencing(&state, race_id) {
            debug!(race_id = %race_id, state = %state.state, "Sequence abandoned");
            return SequenceOutcome::Abandoned;
        }
        debug_assert!(state.lights.is_fully_lit(), "arming with unlit lights");
        state.lights.extinguish_all();
        state.armed_at = Some(self.clock.now());
        state.state = RaceState::Armed;
        self.publish(RaceEvent::LightsOut { race_id });
        info!(race_id = %race_id, hold = ?hold, "Lights out");
        SequenceOutcome::Armed
    }

    /// Register the participant's reaction.
    ///
    /// While armed this completes the race with the time since lights out.
    /// While sequencing it is a false start: the attempt ends and the
    /// pending driver will abandon on its next wake-up.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError::NotArmed`] if no race is sequencing or armed.
    pub async fn react(&self) -> Result<ReactionOutcome, RaceError> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        match (state.state, state.race_id, state.armed_at) {
            (RaceState::Armed, Some(race_id), Some(armed_at)) => {
                let elapsed_seconds = now.saturating_sub(armed_at).as_secs_f64();
                state.state = RaceState::Completed;
                self.publish(RaceEvent::Reacted {
                    race_id,
                    elapsed_seconds,
                });
                info!(race_id = %race_id, elapsed_seconds, "Reaction captured");
                Ok(ReactionOutcome::Completed(ReactionResult {
                    race_id,
                    elapsed_seconds,
                }))
            }
            (RaceState::Sequencing, Some(race_id), _) => {
                state.state = RaceState::FalseStarted;
                self.publish(RaceEvent::FalseStart { race_id });
                warn!(
                    race_id = %race_id,
                    lights_lit = state.lights.lit_count(),
                    "False start"
                );
                Ok(ReactionOutcome::FalseStart { race_id })
            }
            (other, _, _) => Err(RaceError::NotArmed { state: other }),
        }
    }

    async fn draw(&self, range: DelayRange) -> Duration {
        let mut random = self.random.lock().await;
        range.sample(&mut *random)
    }

    fn publish(&self, event: RaceEvent) {
        // An error only means nobody is subscribed.
        let _ = self.events.send(event);
    }
}

fn is_sequencing(state: &RaceSnapshot, race_id: RaceId) -> bool {
    state.race_id == Some(race_id) && state.state == RaceState::Sequencing
}
