//! Scoring rules for games, tie-breaks and sets
//!
//! Everything here is a pure function of the scores involved and the settings
//! passed in; no match state is read.

use crate::point::Player;
use crate::score::{Game, GameScore, TieBreak};
use crate::settings::MatchSettings;

/// Effect of one point on a regular game, seen from the player who won it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePointEffect {
    /// The scorer wins the game; scores stay as they were
    GameWon,
    /// New scores for (scorer, opponent)
    Scores(GameScore, GameScore),
}

/// Apply a point won by a player holding `scorer` against `opponent`
pub fn game_point_effect(scorer: GameScore, opponent: GameScore, ad_scoring: bool) -> GamePointEffect {
    use GameScore::*;

    if !ad_scoring {
        return match scorer.next() {
            Some(next) => GamePointEffect::Scores(next, opponent),
            None => GamePointEffect::GameWon,
        };
    }

    match (scorer, opponent) {
        (Advantage, _) => GamePointEffect::GameWon,
        (Forty, Advantage) => GamePointEffect::Scores(Forty, Forty),
        (Forty, Forty) => GamePointEffect::Scores(Advantage, Forty),
        (Forty, _) => GamePointEffect::GameWon,
        (score, other) => match score.next() {
            Some(next) => GamePointEffect::Scores(next, other),
            None => GamePointEffect::GameWon,
        },
    }
}

/// Score a point in `game` for `winner`; returns true when it wins the game
pub fn score_game_point(game: &mut Game, winner: Player, ad_scoring: bool) -> bool {
    let loser = winner.opponent();
    match game_point_effect(game.score(winner), game.score(loser), ad_scoring) {
        GamePointEffect::GameWon => {
            game.winner = Some(winner);
            true
        }
        GamePointEffect::Scores(scorer, opponent) => {
            game.set_score(winner, scorer);
            game.set_score(loser, opponent);
            false
        }
    }
}

/// Whether the receiver wins `game` by winning the next point
pub fn is_break_point(game: &Game, ad_scoring: bool) -> bool {
    if game.is_won() {
        return false;
    }
    let receiver = game.server.opponent();
    matches!(
        game_point_effect(game.score(receiver), game.score(game.server), ad_scoring),
        GamePointEffect::GameWon
    )
}

/// Score a tie-break point for `winner`; returns true when it wins the tie-break
pub fn score_tie_break_point(tie_break: &mut TieBreak, winner: Player) -> bool {
    match winner {
        Player::A => tie_break.points_a += 1,
        Player::B => tie_break.points_b += 1,
    }

    let own = tie_break.points_for(winner);
    let other = tie_break.points_for(winner.opponent());
    let margin = if tie_break.win_by_two { 2 } else { 1 };

    if own >= tie_break.target && own >= other + margin {
        tie_break.winner = Some(winner);
        true
    } else {
        false
    }
}

/// Whether the serve changes hands after `total_points` tie-break points
///
/// The first server serves one point, then each player serves two in turn,
/// so the serve changes after points 1, 3, 5, ...
pub fn tie_break_server_changes(total_points: u32) -> bool {
    total_points % 2 == 1
}

/// Winner of a set given its games, or `None` while it continues
pub fn set_winner(games_a: u32, games_b: u32, settings: &MatchSettings) -> Option<Player> {
    let target = u32::from(settings.games_per_set);
    if games_a >= target && games_a >= games_b + 2 {
        Some(Player::A)
    } else if games_b >= target && games_b >= games_a + 2 {
        Some(Player::B)
    } else {
        None
    }
}

/// Whether the set has reached games-all and needs a tie-break
pub fn needs_tie_break(games_a: u32, games_b: u32, settings: &MatchSettings) -> bool {
    let target = u32::from(settings.games_per_set);
    games_a == target && games_b == target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::TieBreakKind;
    use GameScore::*;

    #[test]
    fn test_no_ad_forty_wins() {
        assert_eq!(game_point_effect(Forty, Forty, false), GamePointEffect::GameWon);
        assert_eq!(game_point_effect(Thirty, Forty, false), GamePointEffect::Scores(Forty, Forty));
    }

    #[test]
    fn test_ad_transitions() {
        assert_eq!(game_point_effect(Forty, Forty, true), GamePointEffect::Scores(Advantage, Forty));
        assert_eq!(game_point_effect(Advantage, Forty, true), GamePointEffect::GameWon);
        assert_eq!(game_point_effect(Forty, Advantage, true), GamePointEffect::Scores(Forty, Forty));
        assert_eq!(game_point_effect(Forty, Thirty, true), GamePointEffect::GameWon);
        assert_eq!(game_point_effect(Love, Advantage, true), GamePointEffect::Scores(Fifteen, Advantage));
    }

    #[test]
    fn test_break_point_detection() {
        let mut game = Game::new(1, Player::A);
        assert!(!is_break_point(&game, true));

        game.score_a = Thirty;
        game.score_b = Forty;
        assert!(is_break_point(&game, true));

        game.score_a = Forty;
        assert!(!is_break_point(&game, true));
        assert!(is_break_point(&game, false));

        game.score_a = Advantage;
        assert!(!is_break_point(&game, true));
    }

    #[test]
    fn test_tie_break_win_by_two() {
        let mut tb = TieBreak::new(TieBreakKind::Regular, Player::A, 7, true);
        tb.points_a = 6;
        tb.points_b = 6;
        assert!(!score_tie_break_point(&mut tb, Player::A));
        assert!(!score_tie_break_point(&mut tb, Player::B));
        assert!(!score_tie_break_point(&mut tb, Player::A));
        assert!(score_tie_break_point(&mut tb, Player::A));
        assert_eq!((tb.points_a, tb.points_b), (9, 7));
        assert_eq!(tb.winner, Some(Player::A));
    }

    #[test]
    fn test_tie_break_sudden_death() {
        let mut tb = TieBreak::new(TieBreakKind::Regular, Player::A, 7, false);
        tb.points_a = 6;
        tb.points_b = 6;
        assert!(score_tie_break_point(&mut tb, Player::B));
    }

    #[test]
    fn test_tie_break_rotation() {
        let changes: Vec<u32> = (1..=8).filter(|n| tie_break_server_changes(*n)).collect();
        assert_eq!(changes, vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_set_completion() {
        let settings = MatchSettings::default();
        assert_eq!(set_winner(6, 4, &settings), Some(Player::A));
        assert_eq!(set_winner(6, 5, &settings), None);
        assert_eq!(set_winner(5, 7, &settings), Some(Player::B));
        assert!(needs_tie_break(6, 6, &settings));
        assert!(!needs_tie_break(7, 5, &settings));
    }
}
