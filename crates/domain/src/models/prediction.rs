//! Prediction domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::matches::{MatchResult, TeamSide};

/// One user's forecast for one match, scoped to one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Prediction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub match_id: Uuid,
    pub group_id: Uuid,
    pub predicted_winner: TeamSide,
    pub predicted_score_a: Option<i32>,
    pub predicted_score_b: Option<i32>,
    pub points_earned: i32,
    pub is_correct: bool,
    pub is_exact_score: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prediction {
    /// The guessed score, if the user supplied one.
    pub fn predicted_result(&self) -> Option<MatchResult> {
        match (self.predicted_score_a, self.predicted_score_b) {
            (Some(a), Some(b)) => Some(MatchResult::new(a, b)),
            _ => None,
        }
    }
}

/// Result of scoring a single prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PredictionOutcome {
    pub is_correct: bool,
    pub is_exact_score: bool,
    pub points_earned: i32,
}

/// Fields written when a prediction is created or edited.
///
/// Scoring fields are reset to their neutral defaults on every upsert.
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub user_id: Uuid,
    pub match_id: Uuid,
    pub group_id: Uuid,
    pub predicted_winner: TeamSide,
    pub predicted_score_a: Option<i32>,
    pub predicted_score_b: Option<i32>,
    pub submitted_at: DateTime<Utc>,
}

/// Request payload for submitting or editing a prediction.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
#[validate(schema(function = "validate_score_guess", skip_on_field_errors = true))]
pub struct SubmitPredictionRequest {
    pub predicted_winner: TeamSide,

    #[validate(range(min = 0, max = 99, message = "Score must be between 0 and 99"))]
    pub predicted_score_a: Option<i32>,

    #[validate(range(min = 0, max = 99, message = "Score must be between 0 and 99"))]
    pub predicted_score_b: Option<i32>,
}

fn validate_score_guess(request: &SubmitPredictionRequest) -> Result<(), ValidationError> {
    match (request.predicted_score_a, request.predicted_score_b) {
        (None, None) => Ok(()),
        (Some(a), Some(b)) => {
            if MatchResult::new(a, b).winner() == Some(request.predicted_winner) {
                Ok(())
            } else {
                let mut err = ValidationError::new("score_contradicts_winner");
                err.message =
                    Some("Predicted score must agree with the predicted winner".into());
                Err(err)
            }
        }
        _ => {
            let mut err = ValidationError::new("partial_score");
            err.message = Some("Provide both predicted scores or neither".into());
            Err(err)
        }
    }
}

/// Response for listing the predictions of a group for one match.
#[derive(Debug, Clone, Serialize)]
pub struct ListPredictionsResponse {
    pub data: Vec<Prediction>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(winner: TeamSide, a: Option<i32>, b: Option<i32>) -> SubmitPredictionRequest {
        SubmitPredictionRequest {
            predicted_winner: winner,
            predicted_score_a: a,
            predicted_score_b: b,
        }
    }

    #[test]
    fn test_winner_only_is_valid() {
        assert!(request(TeamSide::TeamB, None, None).validate().is_ok());
    }

    #[test]
    fn test_consistent_score_guess_is_valid() {
        assert!(request(TeamSide::TeamA, Some(3), Some(1)).validate().is_ok());
        assert!(request(TeamSide::TeamB, Some(0), Some(2)).validate().is_ok());
    }

    #[test]
    fn test_partial_score_guess_rejected() {
        assert!(request(TeamSide::TeamA, Some(3), None).validate().is_err());
        assert!(request(TeamSide::TeamA, None, Some(1)).validate().is_err());
    }

    #[test]
    fn test_contradicting_score_guess_rejected() {
        assert!(request(TeamSide::TeamA, Some(1), Some(3)).validate().is_err());
        assert!(request(TeamSide::TeamA, Some(2), Some(2)).validate().is_err());
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        assert!(request(TeamSide::TeamA, Some(100), Some(0)).validate().is_err());
        assert!(request(TeamSide::TeamB, Some(-1), Some(0)).validate().is_err());
    }

    #[test]
    fn test_request_deserializes_from_json() {
        let req: SubmitPredictionRequest =
            serde_json::from_str(r#"{"predicted_winner":"team_a","predicted_score_a":3,"predicted_score_b":1}"#)
                .unwrap();
        assert_eq!(req.predicted_winner, TeamSide::TeamA);
        assert_eq!(req.predicted_score_a, Some(3));
    }
}
