//! Router tests for group stats, per-user aggregates and the global leaderboard.

mod common;

use axum::http::{Method, StatusCode};
use common::{create_test_app, TestApp};
use domain::models::User;
use serde_json::{json, Value};

/// Plays one finished match in `group_id` with the given predictions.
async fn play(app: &TestApp, group_id: &str, picks: &[(&User, Value)], score: (i32, i32)) {
    let m = app.create_match("G2", "Fnatic").await;
    let match_id = m["id"].as_str().unwrap();
    for (user, pick) in picks {
        let (status, body) = app.predict(user.id, group_id, match_id, pick.clone()).await;
        assert_eq!(status, StatusCode::OK, "prediction failed: {}", body);
    }
    let (status, _) = app.finish_match(match_id, score.0, score.1).await;
    assert_eq!(status, StatusCode::OK);
}

async fn stats(app: &TestApp, group_id: &str, user: &User) -> (StatusCode, Value) {
    app.call(
        Method::GET,
        &format!("/api/v1/groups/{}/users/{}/stats", group_id, user.id),
        None,
        None,
    )
    .await
}

#[tokio::test]
async fn test_group_stats_accuracy_rounds_half_up() {
    let app = create_test_app();
    let alice = app.create_user().await;
    let group = app.create_group(alice.id, "Stats").await;
    let group_id = group["id"].as_str().unwrap();

    // Two correct picks out of three: 66.67 rounds to 67.
    let win_a = json!({ "predicted_winner": "team_a" });
    play(&app, group_id, &[(&alice, win_a.clone())], (3, 0)).await;
    play(&app, group_id, &[(&alice, win_a.clone())], (3, 2)).await;
    play(&app, group_id, &[(&alice, win_a)], (1, 3)).await;

    let (status, body) = stats(&app, group_id, &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_predictions"], 3);
    assert_eq!(body["correct_predictions"], 2);
    assert_eq!(body["exact_scores"], 0);
    assert_eq!(body["total_points"], 6);
    assert_eq!(body["accuracy"], 67);
}

#[tokio::test]
async fn test_group_stats_without_predictions() {
    let app = create_test_app();
    let alice = app.create_user().await;
    let group = app.create_group(alice.id, "Quiet").await;

    let (status, body) = stats(&app, group["id"].as_str().unwrap(), &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_predictions"], 0);
    assert_eq!(body["accuracy"], 0);
}

#[tokio::test]
async fn test_group_stats_require_membership() {
    let app = create_test_app();
    let alice = app.create_user().await;
    let bob = app.create_user().await;
    let group = app.create_group(alice.id, "Private").await;

    let (status, _) = stats(&app, group["id"].as_str().unwrap(), &bob).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_leaderboard_unknown_group() {
    let app = create_test_app();
    let alice = app.create_user().await;
    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/v1/groups/{}/leaderboard", uuid::Uuid::new_v4()),
            Some(alice.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_leaderboard_members_only() {
    let app = create_test_app();
    let alice = app.create_user().await;
    let mallory = app.create_user().await;
    let group = app.create_group(alice.id, "Private").await;
    let uri = format!("/api/v1/groups/{}/leaderboard", group["id"].as_str().unwrap());

    let (status, body) = app.call(Method::GET, &uri, Some(mallory.id), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, board) = app.call(Method::GET, &uri, Some(alice.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["entries"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_tied_scores_share_rank() {
    let app = create_test_app();
    let alice = app.create_user().await;
    let bob = app.create_user().await;
    let carol = app.create_user().await;
    let group = app.create_group(alice.id, "Ties").await;
    let group_id = group["id"].as_str().unwrap();
    let code = group["invite_code"].as_str().unwrap();
    app.join_group(bob.id, code).await;
    app.join_group(carol.id, code).await;

    let right = json!({ "predicted_winner": "team_a" });
    let wrong = json!({ "predicted_winner": "team_b" });
    play(
        &app,
        group_id,
        &[(&alice, right.clone()), (&bob, wrong), (&carol, right)],
        (2, 0),
    )
    .await;

    let (_, board) = app
        .call(
            Method::GET,
            &format!("/api/v1/groups/{}/leaderboard", group_id),
            Some(alice.id),
            None,
        )
        .await;
    let entries = board["entries"].as_array().unwrap();
    let ranks: Vec<i64> = entries.iter().map(|e| e["rank"].as_i64().unwrap()).collect();
    assert_eq!(ranks, vec![1, 1, 3]);
    assert_eq!(entries[2]["user_id"], bob.id.to_string());
    assert_eq!(entries[2]["score"], 0);
}

#[tokio::test]
async fn test_user_overall_stats_span_groups() {
    let app = create_test_app();
    let alice = app.create_user().await;
    let first = app.create_group(alice.id, "First").await;
    let second = app.create_group(alice.id, "Second").await;

    let exact = json!({ "predicted_winner": "team_a", "predicted_score_a": 3, "predicted_score_b": 1 });
    play(&app, first["id"].as_str().unwrap(), &[(&alice, exact)], (3, 1)).await;
    play(
        &app,
        second["id"].as_str().unwrap(),
        &[(&alice, json!({ "predicted_winner": "team_b" }))],
        (3, 1),
    )
    .await;

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/users/{}/stats", alice.id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["groups_count"], 2);
    assert_eq!(body["total_points"], 5);
    assert_eq!(body["total_predictions"], 2);
    assert_eq!(body["correct_predictions"], 1);
    assert_eq!(body["exact_scores"], 1);
    assert_eq!(body["accuracy"], 50);
    assert_eq!(body["group_scores"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_user_stats_unknown_user() {
    let app = create_test_app();
    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/v1/users/{}/stats", uuid::Uuid::new_v4()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_global_leaderboard_sums_groups() {
    let app = create_test_app();
    let alice = app.create_user().await;
    let bob = app.create_user().await;
    let first = app.create_group(alice.id, "First").await;
    let second = app.create_group(bob.id, "Second").await;
    app.join_group(alice.id, second["invite_code"].as_str().unwrap())
        .await;

    let right = json!({ "predicted_winner": "team_a" });
    play(&app, first["id"].as_str().unwrap(), &[(&alice, right.clone())], (2, 1)).await;
    play(
        &app,
        second["id"].as_str().unwrap(),
        &[(&alice, right.clone()), (&bob, right)],
        (2, 1),
    )
    .await;

    let (status, body) = app
        .call(Method::GET, "/api/v1/leaderboard", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["entries"][0]["user_id"], alice.id.to_string());
    assert_eq!(body["entries"][0]["score"], 6);
    assert_eq!(body["entries"][1]["score"], 3);

    let (_, limited) = app
        .call(Method::GET, "/api/v1/leaderboard?limit=1", None, None)
        .await;
    assert_eq!(limited["count"], 1);
}

#[tokio::test]
async fn test_global_leaderboard_limit_bounds() {
    let app = create_test_app();
    for limit in ["0", "101", "-5"] {
        let (status, _) = app
            .call(
                Method::GET,
                &format!("/api/v1/leaderboard?limit={}", limit),
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "limit={}", limit);
    }
}

#[tokio::test]
async fn test_user_badges() {
    let app = create_test_app();
    let alice = app.create_user().await;
    let bob = app.create_user().await;
    let carol = app.create_user().await;
    let group = app.create_group(alice.id, "Badges").await;
    let group_id = group["id"].as_str().unwrap();
    app.join_group(bob.id, group["invite_code"].as_str().unwrap())
        .await;

    play(
        &app,
        group_id,
        &[
            (
                &alice,
                json!({ "predicted_winner": "team_a", "predicted_score_a": 2, "predicted_score_b": 0 }),
            ),
            (&bob, json!({ "predicted_winner": "team_b" })),
        ],
        (2, 0),
    )
    .await;

    let unlocked = |body: &Value| -> Vec<String> {
        body["badges"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|b| b["unlocked"] == true)
            .map(|b| b["id"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, body) = app
        .call(Method::GET, &format!("/api/v1/users/{}/badges", alice.id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        unlocked(&body),
        vec!["first_prediction", "perfect_score", "group_leader"]
    );
    assert_eq!(body["unlocked_count"], 3);
    assert_eq!(body["badges"].as_array().unwrap().len(), 6);

    let (_, body) = app
        .call(Method::GET, &format!("/api/v1/users/{}/badges", bob.id), None, None)
        .await;
    assert_eq!(unlocked(&body), vec!["first_prediction"]);

    let (_, body) = app
        .call(Method::GET, &format!("/api/v1/users/{}/badges", carol.id), None, None)
        .await;
    assert_eq!(body["unlocked_count"], 0);

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/v1/users/{}/badges", uuid::Uuid::new_v4()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
