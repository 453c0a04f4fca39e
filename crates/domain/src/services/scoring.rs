//! Prediction scoring rules.
//!
//! This is the single place where points are computed. Every trigger (HTTP,
//! poller, simulation) reaches it through [`ScoringEngine`](super::ScoringEngine).

use serde::Deserialize;

use crate::models::{MatchResult, Prediction, PredictionOutcome, TeamSide};

/// Points awarded for a correct winner.
pub const DEFAULT_WINNER_POINTS: i32 = 3;

/// Extra points when the exact score was also guessed.
pub const DEFAULT_EXACT_SCORE_BONUS: i32 = 2;

/// Point values used when scoring predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ScoringConfig {
    pub winner_points: i32,
    pub exact_score_bonus: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            winner_points: DEFAULT_WINNER_POINTS,
            exact_score_bonus: DEFAULT_EXACT_SCORE_BONUS,
        }
    }
}

/// Winner of a final result; a draw has none.
pub fn actual_winner(result: &MatchResult) -> Option<TeamSide> {
    result.winner()
}

/// Scores one prediction against a final result.
///
/// A draw has no winner, so no prediction can be correct. A prediction
/// without a score guess can never be exact.
pub fn evaluate_prediction(
    prediction: &Prediction,
    result: &MatchResult,
    config: &ScoringConfig,
) -> PredictionOutcome {
    let is_correct = actual_winner(result) == Some(prediction.predicted_winner);
    let is_exact_score = is_correct && prediction.predicted_result() == Some(*result);

    let points_earned = match (is_correct, is_exact_score) {
        (true, true) => config.winner_points + config.exact_score_bonus,
        (true, false) => config.winner_points,
        _ => 0,
    };

    PredictionOutcome {
        is_correct,
        is_exact_score,
        points_earned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn prediction(winner: TeamSide, a: Option<i32>, b: Option<i32>) -> Prediction {
        let now = Utc::now();
        Prediction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            match_id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            predicted_winner: winner,
            predicted_score_a: a,
            predicted_score_b: b,
            points_earned: 0,
            is_correct: false,
            is_exact_score: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_correct_winner() {
        let outcome = evaluate_prediction(
            &prediction(TeamSide::TeamA, None, None),
            &MatchResult::new(3, 1),
            &ScoringConfig::default(),
        );
        assert!(outcome.is_correct);
        assert!(!outcome.is_exact_score);
        assert_eq!(outcome.points_earned, 3);
    }

    #[test]
    fn test_exact_score_bonus() {
        let outcome = evaluate_prediction(
            &prediction(TeamSide::TeamA, Some(3), Some(1)),
            &MatchResult::new(3, 1),
            &ScoringConfig::default(),
        );
        assert_eq!(
            outcome,
            PredictionOutcome {
                is_correct: true,
                is_exact_score: true,
                points_earned: 5
            }
        );
    }

    #[test]
    fn test_correct_winner_wrong_score() {
        let outcome = evaluate_prediction(
            &prediction(TeamSide::TeamA, Some(3), Some(0)),
            &MatchResult::new(3, 1),
            &ScoringConfig::default(),
        );
        assert!(outcome.is_correct);
        assert!(!outcome.is_exact_score);
        assert_eq!(outcome.points_earned, 3);
    }

    #[test]
    fn test_incorrect_prediction() {
        let outcome = evaluate_prediction(
            &prediction(TeamSide::TeamB, Some(1), Some(3)),
            &MatchResult::new(3, 1),
            &ScoringConfig::default(),
        );
        assert_eq!(outcome, PredictionOutcome::default());
    }

    #[test]
    fn test_draw_scores_nothing() {
        let result = MatchResult::new(2, 2);
        for winner in [TeamSide::TeamA, TeamSide::TeamB] {
            let outcome = evaluate_prediction(
                &prediction(winner, Some(2), Some(2)),
                &result,
                &ScoringConfig::default(),
            );
            assert_eq!(outcome.points_earned, 0);
            assert!(!outcome.is_correct);
            assert!(!outcome.is_exact_score);
        }
    }

    #[test]
    fn test_configured_points() {
        let config = ScoringConfig {
            winner_points: 10,
            exact_score_bonus: 5,
        };
        let exact = evaluate_prediction(
            &prediction(TeamSide::TeamB, Some(0), Some(2)),
            &MatchResult::new(0, 2),
            &config,
        );
        assert_eq!(exact.points_earned, 15);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let p = prediction(TeamSide::TeamA, Some(2), Some(1));
        let result = MatchResult::new(2, 1);
        let first = evaluate_prediction(&p, &result, &ScoringConfig::default());
        for _ in 0..5 {
            assert_eq!(
                evaluate_prediction(&p, &result, &ScoringConfig::default()),
                first
            );
        }
    }
}
