//! Per-session coordination between the race and the shared leaderboard.
//!
//! A [`SessionController`] is what a presentation layer talks to. It owns
//! one [`RaceStateMachine`], spawns its sequence driver on the tokio
//! runtime, remembers the last completed reaction until it is submitted,
//! and forwards submissions to a [`Leaderboard`] shared with every other
//! session.

use std::sync::Arc;

use lightsout_leaderboard::{
    Leaderboard, LeaderboardError, RankPreview, ScoreStore, Standings, SubmitOutcome,
};
use lightsout_types::{RaceEvent, RaceSnapshot, ReactionOutcome, ReactionResult, SessionId};
use serde::Serialize;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::race::{RaceError, RaceStateMachine, SequenceOutcome};
use crate::random::RandomSource;

/// Errors returned by session commands.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The race rejected the command.
    #[error(transparent)]
    Race(#[from] RaceError),

    /// The leaderboard rejected the submission or could not be read.
    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),

    /// `submit_score` was called without an unsubmitted completed reaction.
    #[error("no completed reaction is waiting to be submitted")]
    NoPendingResult,
}

/// Everything a presentation layer needs to render a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// The session.
    pub session_id: SessionId,
    /// Current race state and lights.
    pub race: RaceSnapshot,
    /// Completed reaction not yet submitted.
    pub pending: Option<ReactionResult>,
}

/// One participant's session.
#[derive(Debug)]
pub struct SessionController<C, R, S> {
    id: SessionId,
    race: Arc<RaceStateMachine<C, R>>,
    leaderboard: Arc<Leaderboard<S>>,
    pending: Mutex<Option<ReactionResult>>,
}

impl<C, R, S> SessionController<C, R, S>
where
    C: Clock + 'static,
    R: RandomSource + 'static,
    S: ScoreStore,
{
    /// Create a session around `race`, submitting to `leaderboard`.
    pub fn new(race: RaceStateMachine<C, R>, leaderboard: Arc<Leaderboard<S>>) -> Self {
        let id = SessionId::new();
        debug!(session_id = %id, "Session created");
        Self {
            id,
            race: Arc::new(race),
            leaderboard,
            pending: Mutex::new(None),
        }
    }

    /// This session's id.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// The session's race.
    pub const fn race(&self) -> &Arc<RaceStateMachine<C, R>> {
        &self.race
    }

    /// Receive race events for this session.
    pub fn subscribe(&self) -> broadcast::Receiver<RaceEvent> {
        self.race.subscribe()
    }

    /// Start a race and spawn its light sequence.
    ///
    /// Any completed reaction that was not submitted is discarded. The
    /// returned handle resolves when the sequence arms or is abandoned;
    /// dropping it does not stop the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Race`] with [`RaceError::RaceInProgress`] if
    /// a race is already sequencing or armed.
    pub async fn start_race(&self) -> Result<JoinHandle<SequenceOutcome>, SessionError> {
        let race_id = self.race.start_race().await?;

        if let Some(discarded) = self.pending.lock().await.take() {
            debug!(
                session_id = %self.id,
                race_id = %discarded.race_id,
                "Unsubmitted reaction discarded"
            );
        }

        let race = Arc::clone(&self.race);
        Ok(tokio::spawn(async move { race.run_sequence(race_id).await }))
    }

    /// Register the participant's reaction.
    ///
    /// A completed reaction becomes the pending result for
    /// [`submit_score`](Self::submit_score).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Race`] with [`RaceError::NotArmed`] if no race
    /// is sequencing or armed.
    pub async fn react(&self) -> Result<ReactionOutcome, SessionError> {
        // Held across the reaction: `start_race` must not clear `pending`
        // between the race completing and the result being stored.
        let mut pending = self.pending.lock().await;
        let outcome = self.race.react().await?;
        if let ReactionOutcome::Completed(result) = outcome {
            *pending = Some(result);
        }
        Ok(outcome)
    }

    /// Submit the pending reaction under `name`.
    ///
    /// The pending result is cleared only when the leaderboard accepts the
    /// submission, so an invalid name can be corrected and retried.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NoPendingResult`] if there is nothing to submit.
    /// - [`SessionError::Leaderboard`] if the name is invalid or the
    ///   standings cannot be read.
    pub async fn submit_score(&self, name: &str) -> Result<SubmitOutcome, SessionError> {
        let mut pending = self.pending.lock().await;
        let result = (*pending).ok_or(SessionError::NoPendingResult)?;

        let outcome = self
            .leaderboard
            .submit(name, result.elapsed_seconds)
            .await?;
        *pending = None;

        info!(
            session_id = %self.id,
            race_id = %result.race_id,
            rank = ?outcome.rank,
            "Pending reaction submitted"
        );
        Ok(outcome)
    }

    /// Where the pending reaction would place, if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Leaderboard`] if the standings cannot be
    /// read.
    pub async fn preview_pending_rank(&self) -> Result<Option<RankPreview>, SessionError> {
        let Some(result) = *self.pending.lock().await else {
            return Ok(None);
        };
        let preview = self.leaderboard.preview_rank(result.elapsed_seconds).await?;
        Ok(Some(preview))
    }

    /// Current race state and pending reaction.
    pub async fn get_state(&self) -> SessionSnapshot {
        let race = self.race.snapshot().await;
        let pending = *self.pending.lock().await;
        SessionSnapshot {
            session_id: self.id,
            race,
            pending,
        }
    }

    /// The shared top ten.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Leaderboard`] if the standings cannot be
    /// read.
    pub async fn get_leaderboard(&self) -> Result<Standings, SessionError> {
        Ok(self.leaderboard.list().await?)
    }
}
