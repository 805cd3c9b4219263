//! End-to-end scoring scenarios
//!
//! Each test drives the public API the way a caller would and checks the log
//! and the derived state together.

use std::sync::Arc;

use chrono::Utc;
use rally_core::export::export_all;
use rally_core::{
    compute_stats, import_bundle, record_point, undo_last_point, ExportBundle, FileStore,
    GameScore, InMemoryStore, MatchSession, MatchSettings, MatchState, MatchStore, OutcomeKind,
    Player, Players, PointInput, ScoreLine, ShotKind, Tally, TieBreakKind,
};
use rally_core::settings::FinalSetType;

fn play(state: MatchState, inputs: &[PointInput]) -> MatchState {
    inputs.iter().fold(state, |s, input| {
        record_point(&s, input, Utc::now()).expect("point should be accepted")
    })
}

fn points(winners: &[Player]) -> Vec<PointInput> {
    winners.iter().map(|p| PointInput::winner(*p)).collect()
}

fn hold_serve_to(state: MatchState, games: usize) -> MatchState {
    (0..games).fold(state, |s, _| {
        let server = s.current_server;
        play(s, &points(&[server; 4]))
    })
}

fn regular(a: GameScore, b: GameScore) -> ScoreLine {
    ScoreLine::Regular { a, b }
}

#[test]
fn scenario_no_ad_game() {
    let settings = MatchSettings::builder().ad_scoring(false).build().unwrap();
    let state = play(MatchState::new(settings), &points(&[Player::A; 4]));

    assert_eq!(state.sets[0].games[0].winner, Some(Player::A));
    assert!(state.log.iter().all(|e| !matches!(
        e.game_score_after,
        ScoreLine::Regular { a: GameScore::Advantage, .. } | ScoreLine::Regular { b: GameScore::Advantage, .. }
    )));
    assert_eq!(state.log.last().unwrap().game_score_after, regular(GameScore::Forty, GameScore::Love));
}

#[test]
fn scenario_no_ad_deciding_point() {
    let settings = MatchSettings::builder().ad_scoring(false).build().unwrap();
    let deuce = points(&[Player::A, Player::B, Player::A, Player::B, Player::A, Player::B]);
    let state = play(MatchState::new(settings), &deuce);
    assert_eq!(state.log.last().unwrap().game_score_after, regular(GameScore::Forty, GameScore::Forty));

    let state = play(state, &points(&[Player::B]));
    assert_eq!(state.sets[0].games[0].winner, Some(Player::B));
    assert_eq!(state.sets[0].games(), Tally::new(0, 1));
}

#[test]
fn scenario_advantage_path() {
    let deuce = points(&[Player::A, Player::B, Player::A, Player::B, Player::A, Player::B]);
    let state = play(MatchState::new(MatchSettings::default()), &deuce);
    assert_eq!(state.log.last().unwrap().game_score_after, regular(GameScore::Forty, GameScore::Forty));

    let state = play(state, &points(&[Player::A, Player::B, Player::A, Player::A]));
    let path: Vec<ScoreLine> = state.log.iter().skip(6).map(|e| e.game_score_after).collect();
    assert_eq!(
        path,
        vec![
            regular(GameScore::Advantage, GameScore::Forty),
            regular(GameScore::Forty, GameScore::Forty),
            regular(GameScore::Advantage, GameScore::Forty),
            // The winning point leaves the game at the score it was won from
            regular(GameScore::Advantage, GameScore::Forty),
        ]
    );
    assert_eq!(state.sets[0].games[0].winner, Some(Player::A));
    assert_eq!(state.sets[0].games(), Tally::new(1, 0));
}

#[test]
fn scenario_tie_break_eight_six() {
    let state = hold_serve_to(MatchState::new(MatchSettings::default()), 12);
    assert_eq!(state.sets[0].games(), Tally::new(6, 6));
    assert!(state.sets[0].active_tie_break().is_some());

    // 6-6 in the tie-break, then A edges ahead
    let level = points(&[
        Player::A, Player::B, Player::A, Player::B, Player::A, Player::B,
        Player::A, Player::B, Player::A, Player::B, Player::A, Player::B,
    ]);
    let state = play(state, &level);
    let state = play(state, &points(&[Player::A]));
    assert_eq!(state.log.last().unwrap().game_score_after, ScoreLine::TieBreak { a: 7, b: 6 });
    assert!(state.sets[0].winner.is_none(), "7-6 is not a two-point lead");

    let state = play(state, &points(&[Player::A]));
    let tb = state.sets[0].tie_break.as_ref().unwrap();
    assert_eq!((tb.points_a, tb.points_b), (8, 6));
    assert_eq!(tb.winner, Some(Player::A));
    assert_eq!(state.sets[0].games(), Tally::new(7, 6));
    assert_eq!(state.sets[0].winner, Some(Player::A));
    assert_eq!(state.sets.len(), 2);
}

#[test]
fn scenario_no_tie_break_at_seven_five() {
    let state = hold_serve_to(MatchState::new(MatchSettings::default()), 10);
    assert_eq!(state.sets[0].games(), Tally::new(5, 5));

    let state = play(state, &points(&[Player::B; 8]));
    assert_eq!(state.sets[0].games(), Tally::new(5, 7));
    assert!(state.sets[0].tie_break.is_none());
    assert_eq!(state.sets[0].winner, Some(Player::B));
}

#[test]
fn scenario_double_fault() {
    let state = play(
        MatchState::new(MatchSettings::default()),
        &[PointInput::serve_fault(), PointInput::serve_fault()],
    );

    assert_eq!(state.log.len(), 2);
    let scoring: Vec<_> = state.log.iter().filter(|e| !e.is_score_neutral()).collect();
    assert_eq!(scoring.len(), 1);

    let entry = scoring[0];
    assert_eq!(entry.outcome(), OutcomeKind::DoubleFault);
    assert_eq!(entry.winner(), Some(Player::B));
    assert_eq!(entry.acting_player, Player::A);
    assert_eq!(entry.game_score_after, regular(GameScore::Love, GameScore::Fifteen));

    let stats = compute_stats(state.log.entries());
    assert_eq!(stats.a.double_faults, 1);
    assert_eq!(stats.b.points_won, 1);
}

#[test]
fn scenario_super_tie_break_decides_match() {
    let settings = MatchSettings::builder()
        .games_per_set(2)
        .final_set_type(FinalSetType::SuperTieBreak)
        .build()
        .unwrap();
    let mut state = MatchState::new(settings);

    // Split the first two sets 2-0 and 0-2
    state = play(state, &points(&[Player::A; 8]));
    state = play(state, &points(&[Player::B; 8]));
    assert_eq!(state.sets_won(), Tally::new(1, 1));

    state = hold_serve_to(state, 4);
    let tb = state.sets[2].active_tie_break().expect("super tie-break at 2-2");
    assert_eq!(tb.kind, TieBreakKind::Super);
    assert_eq!(tb.target, 10);

    state = play(state, &points(&[Player::B; 9]));
    assert!(!state.is_completed());
    state = play(state, &points(&[Player::B]));
    assert!(state.is_completed());
    assert_eq!(state.winner, Some(Player::B));
}

#[test]
fn scenario_undo_first_serve_fault() {
    let state = play(
        MatchState::new(MatchSettings::default()),
        &[PointInput::winner(Player::A), PointInput::serve_fault()],
    );
    let undone = undo_last_point(&state).unwrap();

    assert_eq!(undone.log.len(), 1);
    assert_eq!(undone.current_serve_attempt, rally_core::ServeAttempt::First);
    assert_eq!(undone.scoreboard().current, regular(GameScore::Fifteen, GameScore::Love));
}

fn completed_three_set_match(store: Arc<dyn MatchStore>) -> MatchSession {
    let (mut session, _) =
        MatchSession::start(MatchSettings::default(), Players::new("Ana", "Bea"), store).unwrap();

    let record = |session: &mut MatchSession, input: PointInput| {
        session.record_point(&input).expect("point should be accepted");
    };

    // Set 1: everyone holds except B in the fourth game, so A wins 6-3
    let mut game = 0;
    while session.state().sets.len() == 1 {
        let server = session.state().current_server;
        let winner = if game == 3 { Player::A } else { server };
        record(&mut session, PointInput::serve_fault());
        record(&mut session, PointInput::winner(winner).with_shot(ShotKind::Forehand));
        for _ in 0..3 {
            record(&mut session, PointInput::ace().with_shot(ShotKind::Serve));
        }
        if winner != server {
            // 15-40 down after the aces; four straight points take the game
            for _ in 0..4 {
                record(&mut session, PointInput::unforced_error(winner).with_shot(ShotKind::Backhand));
            }
        }
        game += 1;
    }
    assert_eq!(session.state().sets[0].games(), Tally::new(6, 3));
    assert_eq!(session.state().sets_won(), Tally::new(1, 0));

    // Set 2: B wins every point
    while session.state().sets_won().b < 1 {
        record(&mut session, PointInput::winner(Player::B).with_shot(ShotKind::Volley));
    }

    // Set 3: A wins every point
    while !session.state().is_completed() {
        let server = session.state().current_server;
        if server == Player::A {
            record(&mut session, PointInput::ace());
        } else {
            record(&mut session, PointInput::return_error().with_shot(ShotKind::Backhand));
            session.undo_last_point().unwrap();
            record(&mut session, PointInput::forced_error(Player::A).with_shot(ShotKind::Lob));
        }
    }
    session
}

#[test]
fn scenario_export_import_preserves_stats() {
    let dir = tempfile::tempdir().unwrap();
    let source: Arc<dyn MatchStore> = Arc::new(FileStore::new(dir.path().join("source")).unwrap());
    let session = completed_three_set_match(source.clone());

    let state = session.state();
    assert!(state.is_completed());
    assert_eq!(state.winner, Some(Player::A));
    assert_eq!(state.sets_won(), Tally::new(2, 1));
    let before = serde_json::to_string(&session.stats()).unwrap();

    let bundle = export_all(source.as_ref()).unwrap();
    let json = bundle.to_json().unwrap();

    let target = InMemoryStore::new();
    let report = import_bundle(&target, &ExportBundle::from_json(&json).unwrap()).unwrap();
    assert_eq!(report.inserted, 1);

    let imported = target.load(session.id()).unwrap();
    let after = serde_json::to_string(&compute_stats(imported.state.log.entries())).unwrap();
    assert_eq!(before, after);
    assert_eq!(imported.state, *state);
}
