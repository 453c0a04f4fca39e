//! End-to-end scoring through the router: predictions, match finish, points and rescoring.

mod common;

use axum::http::{Method, StatusCode};
use common::{create_test_app, create_test_app_with, test_config, TestApp};
use domain::models::User;
use serde_json::{json, Value};

struct League {
    app: TestApp,
    players: Vec<User>,
    group_id: String,
    match_id: String,
}

/// One group with three players and one upcoming T1 vs Gen.G match.
async fn league(app: TestApp) -> League {
    let mut players = Vec::new();
    for _ in 0..3 {
        players.push(app.create_user().await);
    }
    let group = app.create_group(players[0].id, "Worlds Pick'em").await;
    let code = group["invite_code"].as_str().unwrap();
    for p in &players[1..] {
        let (status, _) = app.join_group(p.id, code).await;
        assert_eq!(status, StatusCode::OK);
    }
    let m = app.create_match("T1", "Gen.G").await;
    League {
        group_id: group["id"].as_str().unwrap().to_string(),
        match_id: m["id"].as_str().unwrap().to_string(),
        app,
        players,
    }
}

impl League {
    async fn predict(&self, player: usize, prediction: Value) -> (StatusCode, Value) {
        self.app
            .predict(self.players[player].id, &self.group_id, &self.match_id, prediction)
            .await
    }

    async fn leaderboard(&self) -> Value {
        let (status, body) = self
            .app
            .call(
                Method::GET,
                &format!("/api/v1/groups/{}/leaderboard", self.group_id),
                Some(self.players[0].id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn predictions(&self) -> Value {
        let (status, body) = self
            .app
            .call(
                Method::GET,
                &format!(
                    "/api/v1/groups/{}/matches/{}/predictions",
                    self.group_id, self.match_id
                ),
                Some(self.players[0].id),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn calculate_points(&self) -> (StatusCode, Value) {
        self.app
            .call(
                Method::POST,
                &format!("/api/v1/matches/{}/calculate-points", self.match_id),
                None,
                None,
            )
            .await
    }

    fn points_of(&self, predictions: &Value, player: usize) -> i64 {
        let user_id = self.players[player].id.to_string();
        predictions["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["user_id"] == user_id.as_str())
            .map(|p| p["points_earned"].as_i64().unwrap())
            .unwrap()
    }
}

#[tokio::test]
async fn test_exact_correct_and_wrong_predictions() {
    let l = league(create_test_app()).await;
    l.predict(0, json!({ "predicted_winner": "team_a", "predicted_score_a": 3, "predicted_score_b": 1 }))
        .await;
    l.predict(1, json!({ "predicted_winner": "team_a", "predicted_score_a": 3, "predicted_score_b": 0 }))
        .await;
    let (status, _) = l.predict(2, json!({ "predicted_winner": "team_b" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = l.app.finish_match(&l.match_id, 3, 1).await;
    assert_eq!(status, StatusCode::OK);

    let predictions = l.predictions().await;
    assert_eq!(predictions["count"], 3);
    assert_eq!(l.points_of(&predictions, 0), 5);
    assert_eq!(l.points_of(&predictions, 1), 3);
    assert_eq!(l.points_of(&predictions, 2), 0);

    let board = l.leaderboard().await;
    let entries = board["entries"].as_array().unwrap();
    let scores: Vec<i64> = entries.iter().map(|e| e["score"].as_i64().unwrap()).collect();
    assert_eq!(scores, vec![5, 3, 0]);
    let ranks: Vec<i64> = entries.iter().map(|e| e["rank"].as_i64().unwrap()).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert_eq!(entries[0]["user_id"], l.players[0].id.to_string());
    assert_eq!(entries[0]["display_name"], l.players[0].display_name.as_str());
}

#[tokio::test]
async fn test_rescoring_is_idempotent() {
    let l = league(create_test_app()).await;
    l.predict(0, json!({ "predicted_winner": "team_a", "predicted_score_a": 3, "predicted_score_b": 1 }))
        .await;
    l.predict(1, json!({ "predicted_winner": "team_a" })).await;
    l.app.finish_match(&l.match_id, 3, 1).await;

    let before = l.leaderboard().await;
    let (status, first) = l.calculate_points().await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = l.calculate_points().await;

    assert_eq!(first, second);
    assert_eq!(first["predictions_scored"], 2);
    assert_eq!(first["correct_predictions"], 2);
    assert_eq!(first["exact_scores"], 1);
    assert_eq!(first["actual_winner"], "team_a");
    assert_eq!(l.leaderboard().await, before);
}

#[tokio::test]
async fn test_draw_scores_nothing() {
    let l = league(create_test_app()).await;
    l.predict(0, json!({ "predicted_winner": "team_a" })).await;
    l.predict(1, json!({ "predicted_winner": "team_b" })).await;
    l.app.finish_match(&l.match_id, 2, 2).await;

    let (status, report) = l.calculate_points().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["actual_winner"], json!(null));
    assert_eq!(report["correct_predictions"], 0);

    let predictions = l.predictions().await;
    assert_eq!(l.points_of(&predictions, 0), 0);
    assert_eq!(l.points_of(&predictions, 1), 0);
}

#[tokio::test]
async fn test_edit_replaces_prediction() {
    let l = league(create_test_app()).await;
    l.predict(0, json!({ "predicted_winner": "team_b" })).await;
    let (status, edited) = l
        .predict(0, json!({ "predicted_winner": "team_a", "predicted_score_a": 3, "predicted_score_b": 2 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["predicted_winner"], "team_a");

    let predictions = l.predictions().await;
    assert_eq!(predictions["count"], 1);
}

#[tokio::test]
async fn test_prediction_validation() {
    let l = league(create_test_app()).await;

    let (status, body) = l
        .predict(0, json!({ "predicted_winner": "team_a", "predicted_score_a": 3 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Provide both predicted scores or neither");

    let (status, body) = l
        .predict(0, json!({ "predicted_winner": "team_b", "predicted_score_a": 3, "predicted_score_b": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Predicted score must agree with the predicted winner");

    let (status, _) = l
        .predict(0, json!({ "predicted_winner": "team_a", "predicted_score_a": 120, "predicted_score_b": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_prediction_rejected_after_finish() {
    let l = league(create_test_app()).await;
    l.app.finish_match(&l.match_id, 3, 1).await;

    let (status, body) = l.predict(0, json!({ "predicted_winner": "team_a" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_live_edits_follow_policy() {
    let l = league(create_test_app()).await;
    l.app
        .call(
            Method::PATCH,
            &format!("/api/v1/matches/{}", l.match_id),
            None,
            Some(json!({ "status": "live" })),
        )
        .await;
    let (status, _) = l.predict(0, json!({ "predicted_winner": "team_a" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let relaxed = league(create_test_app_with(test_config(&[(
        "predictions.allow_live_edits",
        "true",
    )])))
    .await;
    relaxed
        .app
        .call(
            Method::PATCH,
            &format!("/api/v1/matches/{}", relaxed.match_id),
            None,
            Some(json!({ "status": "live" })),
        )
        .await;
    let (status, _) = relaxed.predict(0, json!({ "predicted_winner": "team_a" })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_non_member_cannot_predict_or_read() {
    let l = league(create_test_app()).await;
    let outsider = l.app.create_user().await;

    let (status, _) = l
        .app
        .predict(outsider.id, &l.group_id, &l.match_id, json!({ "predicted_winner": "team_a" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = l
        .app
        .call(
            Method::GET,
            &format!(
                "/api/v1/groups/{}/matches/{}/predictions",
                l.group_id, l.match_id
            ),
            Some(outsider.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_custom_scoring_rules() {
    let app = create_test_app_with(test_config(&[
        ("scoring.winner_points", "2"),
        ("scoring.exact_score_bonus", "1"),
    ]));
    let l = league(app).await;
    l.predict(0, json!({ "predicted_winner": "team_a", "predicted_score_a": 3, "predicted_score_b": 1 }))
        .await;
    l.predict(1, json!({ "predicted_winner": "team_a" })).await;
    l.app.finish_match(&l.match_id, 3, 1).await;

    let predictions = l.predictions().await;
    assert_eq!(l.points_of(&predictions, 0), 3);
    assert_eq!(l.points_of(&predictions, 1), 2);
}
