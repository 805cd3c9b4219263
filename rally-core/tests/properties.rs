//! Property tests for replay, undo and statistics invariants
//!
//! Point sequences are generated from legal inputs only; the serve attempt is
//! handled by the engine (a fault on second serve becomes a double fault).

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use rally_core::replay::{rebuild, undo_last_point, verify_log};
use rally_core::validation::ReferenceScorer;
use rally_core::{
    compute_stats, record_point, MatchSettings, MatchState, OutcomeKind, Player, PointInput,
    ShotKind,
};

// ─────────────────────────────────────────────────────────────────────────────
// Generators
// ─────────────────────────────────────────────────────────────────────────────

fn arb_player() -> impl Strategy<Value = Player> {
    prop_oneof![Just(Player::A), Just(Player::B)]
}

fn arb_rally_shot() -> impl Strategy<Value = Option<ShotKind>> {
    prop::option::of(prop::sample::select(ShotKind::ALL[..7].to_vec()))
}

fn arb_input() -> impl Strategy<Value = PointInput> {
    prop_oneof![
        3 => Just(PointInput::serve_fault()),
        1 => Just(PointInput::ace()),
        1 => Just(PointInput::return_error()),
        5 => (arb_player(), arb_rally_shot(), 0u8..3).prop_map(|(winner, shot, kind)| {
            let outcome = match kind {
                0 => OutcomeKind::Winner,
                1 => OutcomeKind::UnforcedError,
                _ => OutcomeKind::ForcedError,
            };
            PointInput { outcome, winner: Some(winner), shot }
        }),
    ]
}

fn arb_settings() -> impl Strategy<Value = MatchSettings> {
    (
        prop::sample::select(vec![1u8, 3]),
        1u8..=4,
        any::<bool>(),
        arb_player(),
        prop::sample::select(vec![5u32, 7]),
    )
        .prop_map(|(sets, games, ad, first_server, target)| {
            MatchSettings::builder()
                .number_of_sets(sets)
                .games_per_set(games)
                .ad_scoring(ad)
                .first_server(first_server)
                .tie_break(target, true)
                .build()
                .expect("generated settings are valid")
        })
}

/// Feed inputs until the match ends, returning every intermediate state
fn play(settings: &MatchSettings, inputs: &[PointInput]) -> Vec<MatchState> {
    let base = Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp");
    let mut states = vec![MatchState::new(settings.clone())];
    for (i, input) in inputs.iter().enumerate() {
        let current = states.last().expect("at least the initial state");
        if current.is_completed() {
            break;
        }
        let next = record_point(current, input, base + Duration::seconds(i as i64))
            .expect("generated inputs are legal");
        states.push(next);
    }
    states
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Replaying a log twice gives the same state both times
    #[test]
    fn prop_replay_idempotent(
        settings in arb_settings(),
        inputs in prop::collection::vec(arb_input(), 0..250),
    ) {
        let states = play(&settings, &inputs);
        let last = states.last().expect("initial state");

        let once = rebuild(last).expect("replay succeeds");
        let twice = rebuild(&once).expect("replay succeeds");
        prop_assert_eq!(&once, last);
        prop_assert_eq!(&twice, &once);
        prop_assert!(verify_log(last).is_ok());
    }

    /// Undo after any record returns exactly the previous state
    #[test]
    fn prop_undo_inverts_record(
        settings in arb_settings(),
        inputs in prop::collection::vec(arb_input(), 1..120),
    ) {
        let states = play(&settings, &inputs);
        for pair in states.windows(2) {
            let undone = undo_last_point(&pair[1]).expect("undo succeeds");
            prop_assert_eq!(&undone, &pair[0]);
        }
    }

    /// Serve plus return points equal points won; shots never exceed points
    #[test]
    fn prop_stats_conservation(
        settings in arb_settings(),
        inputs in prop::collection::vec(arb_input(), 0..250),
    ) {
        let states = play(&settings, &inputs);
        let state = states.last().expect("initial state");
        let stats = compute_stats(state.log.entries());

        for player in [Player::A, Player::B] {
            let p = stats.player(player);
            prop_assert_eq!(p.points_won_on_serve + p.points_won_on_return, p.points_won);
            prop_assert!(p.first_serves_in + p.first_serve_faults == p.first_serves);
            prop_assert!(p.break_points_converted <= p.break_point_opportunities);
        }
        prop_assert_eq!(stats.a.points_won + stats.b.points_won, stats.total_points);
        prop_assert!(stats.a.total_shots() + stats.b.total_shots() <= stats.total_points);
        prop_assert_eq!(stats.a.break_point_opportunities, stats.b.break_points_faced);
    }

    /// The engine and the integer-count reference agree on every entry
    #[test]
    fn prop_engine_matches_reference(
        settings in arb_settings(),
        inputs in prop::collection::vec(arb_input(), 0..300),
    ) {
        let states = play(&settings, &inputs);
        let state = states.last().expect("initial state");
        let mut reference = ReferenceScorer::new(&settings);

        for (entry, input) in state.log.iter().zip(&inputs) {
            let expected = reference.expect(input).expect("reference still in play");
            prop_assert_eq!(entry.server_at_time(), expected.server);
            prop_assert_eq!(entry.winner(), expected.winner);
            prop_assert_eq!(entry.game_score_after, expected.score);
            prop_assert_eq!(entry.games_score_after, expected.games);
            prop_assert_eq!(entry.sets_score_after, expected.sets);
            prop_assert_eq!(entry.is_break_point, expected.break_point);
        }
        prop_assert_eq!(state.winner, reference.winner());
    }
}
