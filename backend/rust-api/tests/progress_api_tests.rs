mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

fn learner() -> String {
    format!("learner-{}", Uuid::new_v4())
}

#[tokio::test]
async fn test_new_learner_starts_at_defaults() {
    let app = common::create_test_app().await;
    let id = learner();

    let (status, json) = common::get(&app, &format!("/api/v1/learners/{}/stats", id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["learner_id"], id.as_str());
    assert_eq!(json["xp"], 0);
    assert_eq!(json["level"], 1);
    assert_eq!(json["streak"], 0);
    assert!(json["last_activity_date"].is_null());
    assert_eq!(json["xp_to_next_level"], 100);
}

#[tokio::test]
async fn test_log_activity_awards_xp_and_counts() {
    let app = common::create_test_app().await;
    let id = learner();

    let json = common::log_activity(
        &app,
        &id,
        json!({
            "kind": "lab_session",
            "description": "Wrote my first Dockerfile",
            "timestamp": "2024-03-01T10:00:00Z",
            "week": 3
        }),
    )
    .await;

    assert_eq!(json["xp_awarded"], 100);
    assert_eq!(json["leveled_up"], true);
    assert_eq!(json["stats"]["level"], 2);
    assert_eq!(json["stats"]["labs_completed"], 1);
    assert_eq!(json["stats"]["streak"], 1);
    assert_eq!(json["stats"]["total_study_hours"], 3.0);
    assert_eq!(json["activity"]["kind"], "lab_session");
    assert_eq!(json["activity"]["week"], 3);

    let (_, stats) = common::get(&app, &format!("/api/v1/learners/{}/stats", id)).await;
    assert_eq!(stats["xp"], 100);
    assert_eq!(stats["level"], 2);
}

#[tokio::test]
async fn test_streak_continues_then_resets_across_gap() {
    let app = common::create_test_app().await;
    let id = learner();

    for ts in ["2024-03-01T09:00:00Z", "2024-03-02T21:00:00Z"] {
        common::log_activity(&app, &id, json!({ "kind": "quiz_completion", "timestamp": ts }))
            .await;
    }
    let same_day = common::log_activity(
        &app,
        &id,
        json!({ "kind": "quiz_completion", "timestamp": "2024-03-02T22:00:00Z" }),
    )
    .await;
    assert_eq!(same_day["stats"]["streak"], 2);

    let after_gap = common::log_activity(
        &app,
        &id,
        json!({ "kind": "community_help", "timestamp": "2024-03-05T08:00:00Z" }),
    )
    .await;
    assert_eq!(after_gap["stats"]["streak"], 1);
    assert_eq!(after_gap["stats"]["quizzes_completed"], 3);
    assert_eq!(after_gap["stats"]["xp"], 60 * 3 + 40);
}

#[tokio::test]
async fn test_unknown_activity_kind_is_rejected() {
    let app = common::create_test_app().await;
    let id = learner();

    let (status, json) = common::post_json(
        &app,
        &format!("/api/v1/learners/{}/activities", id),
        json!({ "kind": "napping" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("napping"));

    let (_, stats) = common::get(&app, &format!("/api/v1/learners/{}/stats", id)).await;
    assert_eq!(stats["xp"], 0);
}

#[tokio::test]
async fn test_malformed_timestamp_is_rejected() {
    let app = common::create_test_app().await;

    let (status, _) = common::post_json(
        &app,
        &format!("/api/v1/learners/{}/activities", learner()),
        json!({ "kind": "study_session", "timestamp": "yesterday" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_week_out_of_range_is_rejected() {
    let app = common::create_test_app().await;

    let (status, json) = common::post_json(
        &app,
        &format!("/api/v1/learners/{}/activities", learner()),
        json!({ "kind": "study_session", "week": 60 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_malformed_body_returns_json_error() {
    let app = common::create_test_app().await;

    let (status, json) = common::send(
        &app,
        axum::http::Request::builder()
            .method("POST")
            .uri(format!("/api/v1/learners/{}/activities", learner()))
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_invalid_learner_id_is_rejected() {
    let app = common::create_test_app().await;

    let (status, _) = common::get(&app, "/api/v1/learners/bad%20id/stats").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_is_most_recent_first_and_limited() {
    let app = common::create_test_app().await;
    let id = learner();

    for (kind, ts) in [
        ("study_session", "2024-03-01T09:00:00Z"),
        ("blog_post", "2024-03-02T09:00:00Z"),
        ("github_commit", "2024-03-03T09:00:00Z"),
    ] {
        common::log_activity(&app, &id, json!({ "kind": kind, "timestamp": ts })).await;
    }

    let (status, json) =
        common::get(&app, &format!("/api/v1/learners/{}/activities", id)).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["github_commit", "blog_post", "study_session"]);

    let (_, limited) =
        common::get(&app, &format!("/api/v1/learners/{}/activities?limit=1", id)).await;
    assert_eq!(limited.as_array().unwrap().len(), 1);
    assert_eq!(limited[0]["kind"], "github_commit");
}

#[tokio::test]
async fn test_achievements_unlock_and_relock_after_reset() {
    let app = common::create_test_app().await;
    let id = learner();

    common::log_activity(&app, &id, json!({ "kind": "study_session" })).await;

    let (status, json) =
        common::get(&app, &format!("/api/v1/learners/{}/achievements", id)).await;
    assert_eq!(status, StatusCode::OK);
    let first_steps = json["achievements"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == "first_steps")
        .cloned()
        .unwrap();
    assert_eq!(first_steps["unlocked"], true);
    assert!(json["unlocked_count"].as_u64().unwrap() >= 1);

    let (status, _) = common::delete(&app, &format!("/api/v1/learners/{}/stats", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, json) = common::get(&app, &format!("/api/v1/learners/{}/achievements", id)).await;
    assert_eq!(json["unlocked_count"], 0);

    let (_, history) = common::get(&app, &format!("/api/v1/learners/{}/activities", id)).await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_activities_do_not_lose_xp() {
    let app = common::create_test_app().await;
    let id = learner();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let app = app.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            common::log_activity(&app, &id, json!({ "kind": "github_commit" })).await;
        }));
    }
    for handle in handles {
        tokio_test::assert_ok!(handle.await);
    }

    let (_, stats) = common::get(&app, &format!("/api/v1/learners/{}/stats", id)).await;
    assert_eq!(stats["xp"], 16 * 25);
}

#[tokio::test]
async fn test_future_timestamp_is_rejected() {
    let app = common::create_test_app().await;
    let id = learner();

    let (status, json) = common::post_json(
        &app,
        &format!("/api/v1/learners/{}/activities", id),
        json!({ "kind": "study_session", "timestamp": "2099-01-01T00:00:00Z" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("future"));

    for ts in [
        "2024-03-01T10:00:00Z",
        "2024-03-02T10:00:00Z",
        "2024-03-03T10:00:00Z",
        "2024-03-04T10:00:00Z",
    ] {
        common::log_activity(&app, &id, json!({ "kind": "study_session", "timestamp": ts })).await;
    }
    let (_, stats) = common::get(&app, &format!("/api/v1/learners/{}/stats", id)).await;
    assert_eq!(stats["streak"], 4);
    assert_eq!(stats["last_activity_date"], "2024-03-04T10:00:00Z");
}

#[tokio::test]
async fn test_week_fifty_three_is_accepted() {
    let app = common::create_test_app().await;

    let json = common::log_activity(
        &app,
        &learner(),
        json!({ "kind": "blog_post", "timestamp": "2026-01-01T09:00:00Z", "week": 53 }),
    )
    .await;

    assert_eq!(json["activity"]["week"], 53);
}
