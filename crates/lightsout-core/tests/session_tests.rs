//! Integration tests for the session command surface.
//!
//! Deterministic races use [`ManualClock`], whose sleeps return at once, so
//! a spawned sequence arms as soon as it is polled. Tests that need the
//! lights to still be coming on use [`TokioClock`] on a paused runtime,
//! where time only moves when every task is idle.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

use std::sync::Arc;
use std::time::Duration;

use lightsout_core::{
    FixedRandom, LightsOutConfig, ManualClock, RaceConfig, RaceError, RaceStateMachine,
    SequenceOutcome, SessionController, SessionError, TokioClock,
};
use lightsout_leaderboard::{Leaderboard, LeaderboardError, MemoryStore, RankPreview};
use lightsout_types::{LIGHT_COUNT, RaceEvent, RaceState, ReactionOutcome, ScoreRecord};

type ManualSession = SessionController<ManualClock, FixedRandom, MemoryStore>;
type PausedSession = SessionController<TokioClock, FixedRandom, MemoryStore>;

fn manual_session(board: &Arc<Leaderboard<MemoryStore>>) -> (ManualSession, ManualClock) {
    let clock = ManualClock::new();
    let race = RaceStateMachine::new(
        clock.clone(),
        FixedRandom::minimum(),
        &RaceConfig::default(),
    );
    (SessionController::new(race, Arc::clone(board)), clock)
}

fn paused_session() -> PausedSession {
    let race = RaceStateMachine::new(
        TokioClock::new(),
        FixedRandom::minimum(),
        &RaceConfig::default(),
    );
    SessionController::new(race, Arc::new(Leaderboard::new(MemoryStore::new())))
}

/// Run a race to completion with a reaction of exactly `reaction`.
async fn complete_race(session: &ManualSession, clock: &ManualClock, reaction: Duration) -> f64 {
    let driver = session.start_race().await.unwrap();
    assert_eq!(driver.await.unwrap(), SequenceOutcome::Armed);
    clock.advance(reaction);
    session.react().await.unwrap().elapsed_seconds().unwrap()
}

// =============================================================================
// Reactions
// =============================================================================

#[tokio::test]
async fn react_without_start_is_not_armed() {
    let board = Arc::new(Leaderboard::new(MemoryStore::new()));
    let (session, _) = manual_session(&board);

    let err = session.react().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Race(RaceError::NotArmed {
            state: RaceState::Idle
        })
    ));
}

#[tokio::test]
async fn armed_reaction_measures_time_since_lights_out() {
    let board = Arc::new(Leaderboard::new(MemoryStore::new()));
    let (session, clock) = manual_session(&board);

    let elapsed = complete_race(&session, &clock, Duration::from_millis(312)).await;
    assert_eq!(elapsed, 0.312);

    let state = session.get_state().await;
    assert_eq!(state.race.state, RaceState::Completed);
    assert_eq!(state.pending.unwrap().elapsed_seconds, 0.312);
}

#[tokio::test(start_paused = true)]
async fn immediate_reaction_is_false_start() {
    let session = paused_session();

    let driver = session.start_race().await.unwrap();
    let outcome = session.react().await.unwrap();
    assert!(outcome.is_false_start());
    assert_eq!(outcome.elapsed_seconds(), None);

    // The driver wakes after the first light delay and gives up.
    assert_eq!(driver.await.unwrap(), SequenceOutcome::Abandoned);
    let state = session.get_state().await;
    assert_eq!(state.race.state, RaceState::FalseStarted);
    assert_eq!(state.race.armed_at, None);
    assert_eq!(state.pending, None);
}

#[tokio::test(start_paused = true)]
async fn reaction_with_some_lights_lit_is_false_start() {
    let session = paused_session();
    let _driver = session.start_race().await.unwrap();

    tokio::time::sleep(Duration::from_millis(1_700)).await;
    let state = session.get_state().await;
    assert_eq!(state.race.state, RaceState::Sequencing);
    assert_eq!(state.race.lights.lit_count(), 2);

    assert!(session.react().await.unwrap().is_false_start());
}

#[tokio::test(start_paused = true)]
async fn reaction_during_final_hold_is_false_start() {
    let session = paused_session();
    let driver = session.start_race().await.unwrap();

    // All five lights are on at 4.0 s; they go out at 4.8 s.
    tokio::time::sleep(Duration::from_millis(4_400)).await;
    let state = session.get_state().await;
    assert_eq!(state.race.state, RaceState::Sequencing);
    assert!(state.race.lights.is_fully_lit());

    assert!(session.react().await.unwrap().is_false_start());
    assert_eq!(driver.await.unwrap(), SequenceOutcome::Abandoned);

    let state = session.get_state().await;
    assert_eq!(state.race.state, RaceState::FalseStarted);
    assert_eq!(state.race.armed_at, None);
    assert!(state.race.lights.is_fully_lit());
    assert_eq!(state.pending, None);
}

#[tokio::test(start_paused = true)]
async fn full_sequence_on_runtime_time() {
    let session = paused_session();
    let mut events = session.subscribe();

    let driver = session.start_race().await.unwrap();
    assert_eq!(driver.await.unwrap(), SequenceOutcome::Armed);
    let state = session.get_state().await;
    assert_eq!(state.race.state, RaceState::Armed);
    assert!(state.race.lights.is_dark());

    tokio::time::advance(Duration::from_millis(200)).await;
    let elapsed = session.react().await.unwrap().elapsed_seconds().unwrap();
    assert!((0.2..0.21).contains(&elapsed), "elapsed {elapsed}");

    let race_id = state.race.race_id.unwrap();
    assert_eq!(events.try_recv().unwrap(), RaceEvent::Started { race_id });
    for index in 0..LIGHT_COUNT {
        assert_eq!(
            events.try_recv().unwrap(),
            RaceEvent::LightOn { race_id, index }
        );
    }
    assert_eq!(events.try_recv().unwrap(), RaceEvent::LightsOut { race_id });
    assert!(matches!(
        events.try_recv().unwrap(),
        RaceEvent::Reacted { .. }
    ));
}

// =============================================================================
// Starting races
// =============================================================================

#[tokio::test(start_paused = true)]
async fn start_while_sequencing_is_race_in_progress() {
    let session = paused_session();
    let _driver = session.start_race().await.unwrap();

    let err = session.start_race().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Race(RaceError::RaceInProgress {
            state: RaceState::Sequencing
        })
    ));
}

#[tokio::test]
async fn start_while_armed_is_race_in_progress() {
    let board = Arc::new(Leaderboard::new(MemoryStore::new()));
    let (session, _) = manual_session(&board);
    session.start_race().await.unwrap().await.unwrap();

    let err = session.start_race().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Race(RaceError::RaceInProgress {
            state: RaceState::Armed
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn restart_after_false_start_ignores_stale_driver() {
    let session = paused_session();

    let stale = session.start_race().await.unwrap();
    assert!(session.react().await.unwrap().is_false_start());
    let fresh = session.start_race().await.unwrap();

    assert_eq!(stale.await.unwrap(), SequenceOutcome::Abandoned);
    assert_eq!(fresh.await.unwrap(), SequenceOutcome::Armed);
    assert_eq!(session.get_state().await.race.state, RaceState::Armed);
}

#[tokio::test]
async fn new_race_discards_unsubmitted_result() {
    let board = Arc::new(Leaderboard::new(MemoryStore::new()));
    let (session, clock) = manual_session(&board);
    complete_race(&session, &clock, Duration::from_millis(250)).await;
    assert!(session.get_state().await.pending.is_some());

    let _driver = session.start_race().await.unwrap();
    assert_eq!(session.get_state().await.pending, None);
    assert!(matches!(
        session.submit_score("Late").await,
        Err(SessionError::NoPendingResult)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn restart_racing_a_reaction_never_keeps_the_old_result() {
    let board = Arc::new(Leaderboard::new(MemoryStore::new()));

    for round in 0..50 {
        let (session, clock) = manual_session(&board);
        let session = Arc::new(session);
        session.start_race().await.unwrap().await.unwrap();
        clock.advance(Duration::from_millis(200));

        let reacting = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.react().await })
        };
        let restarting = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                loop {
                    match session.start_race().await {
                        Ok(driver) => return driver,
                        Err(_) => tokio::task::yield_now().await,
                    }
                }
            })
        };

        reacting.await.unwrap().unwrap();
        let _driver = restarting.await.unwrap();

        // The restart came after the reaction, so it must have discarded it.
        assert_eq!(session.get_state().await.pending, None, "round {round}");
    }
}

// =============================================================================
// Submitting scores
// =============================================================================

#[tokio::test]
async fn submit_without_result_is_no_pending_result() {
    let board = Arc::new(Leaderboard::new(MemoryStore::new()));
    let (session, _) = manual_session(&board);

    let err = session.submit_score("Max").await.unwrap_err();
    assert!(matches!(err, SessionError::NoPendingResult));
}

#[tokio::test]
async fn empty_name_is_rejected_and_can_be_retried() {
    let board = Arc::new(Leaderboard::new(MemoryStore::new()));
    let (session, clock) = manual_session(&board);
    complete_race(&session, &clock, Duration::from_millis(280)).await;

    let err = session.submit_score("").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Leaderboard(LeaderboardError::InvalidName)
    ));
    assert!(session.get_leaderboard().await.unwrap().entries.is_empty());
    assert!(session.get_state().await.pending.is_some());

    let outcome = session.submit_score("Max").await.unwrap();
    assert_eq!(outcome.rank, Some(1));
    assert_eq!(session.get_state().await.pending, None);

    // A result can only be submitted once.
    assert!(matches!(
        session.submit_score("Max").await,
        Err(SessionError::NoPendingResult)
    ));
}

#[tokio::test(start_paused = true)]
async fn false_start_leaves_nothing_to_submit() {
    let session = paused_session();

    let _driver = session.start_race().await.unwrap();
    let outcome = session.react().await.unwrap();
    assert!(matches!(outcome, ReactionOutcome::FalseStart { .. }));
    assert!(matches!(
        session.submit_score("Jumper").await,
        Err(SessionError::NoPendingResult)
    ));
}

#[tokio::test]
async fn preview_pending_rank_matches_submission() {
    let board = Arc::new(Leaderboard::new(MemoryStore::with_records(vec![
        ScoreRecord::new("Fast", 0.2),
        ScoreRecord::new("Slow", 0.4),
    ])));
    let (session, clock) = manual_session(&board);
    assert_eq!(session.preview_pending_rank().await.unwrap(), None);

    complete_race(&session, &clock, Duration::from_millis(300)).await;
    let preview = session.preview_pending_rank().await.unwrap();
    assert_eq!(preview, Some(RankPreview { rank: 2, total: 3 }));

    let outcome = session.submit_score("Middle").await.unwrap();
    assert_eq!(outcome.rank, Some(2));
}

#[tokio::test]
async fn sessions_sharing_a_leaderboard_both_persist() {
    let board = Arc::new(Leaderboard::new(MemoryStore::new()));
    let (first, first_clock) = manual_session(&board);
    let (second, second_clock) = manual_session(&board);
    assert_ne!(first.id(), second.id());

    complete_race(&first, &first_clock, Duration::from_millis(310)).await;
    complete_race(&second, &second_clock, Duration::from_millis(290)).await;

    let (a, b) = tokio::join!(first.submit_score("First"), second.submit_score("Second"));
    a.unwrap();
    b.unwrap();

    let standings = second.get_leaderboard().await.unwrap();
    assert_eq!(
        standings.entries,
        vec![
            ScoreRecord::new("Second", 0.29),
            ScoreRecord::new("First", 0.31)
        ]
    );
}

#[tokio::test]
async fn configured_session_persists_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.csv");
    let mut config = LightsOutConfig::default();
    config.apply_overrides(|_| Some(path.display().to_string()));
    config.validate().unwrap();

    let clock = ManualClock::new();
    let race = RaceStateMachine::new(clock.clone(), FixedRandom::minimum(), &config.race);
    let session = SessionController::new(race, Arc::new(config.leaderboard.open()));

    session.start_race().await.unwrap().await.unwrap();
    assert_eq!(
        session.get_state().await.race.armed_at,
        Some(Duration::from_millis(4_800))
    );
    clock.advance(Duration::from_millis(187));
    session.react().await.unwrap();
    let outcome = session.submit_score("Charles").await.unwrap();
    assert!(outcome.persisted());

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Charles,0.187\n");
}

#[tokio::test]
async fn snapshot_serializes_for_presentation() {
    let board = Arc::new(Leaderboard::new(MemoryStore::new()));
    let (session, clock) = manual_session(&board);
    complete_race(&session, &clock, Duration::from_millis(250)).await;

    let json = serde_json::to_value(session.get_state().await).unwrap();
    assert_eq!(json["race"]["state"], "completed");
    assert_eq!(json["pending"]["elapsed_seconds"], 0.25);
}
