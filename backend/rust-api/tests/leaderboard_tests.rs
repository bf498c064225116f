mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_leaderboard_ranks_by_xp_then_id() {
    let app = common::create_test_app().await;

    common::log_activity(&app, "bob", json!({ "kind": "project_work" })).await;
    common::log_activity(&app, "alice", json!({ "kind": "study_session" })).await;
    common::log_activity(&app, "alice", json!({ "kind": "quiz_completion" })).await;
    common::log_activity(&app, "carol", json!({ "kind": "project_work" })).await;

    let (status, json) = common::get(&app, "/api/v1/leaderboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cached"], false);
    let entries = json["entries"].as_array().unwrap();
    let order: Vec<(u64, &str)> = entries
        .iter()
        .map(|e| (e["rank"].as_u64().unwrap(), e["learner_id"].as_str().unwrap()))
        .collect();
    assert_eq!(order, vec![(1, "bob"), (2, "carol"), (3, "alice")]);
    assert_eq!(entries[0]["xp"], 150);
}

#[tokio::test]
async fn test_leaderboard_limit_truncates() {
    let app = common::create_test_app().await;

    for id in ["a1", "a2", "a3"] {
        common::log_activity(&app, id, json!({ "kind": "blog_post" })).await;
    }

    let (_, json) = common::get(&app, "/api/v1/leaderboard?limit=2").await;
    assert_eq!(json["entries"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_reset_learner_drops_to_zero_xp() {
    let app = common::create_test_app().await;

    common::log_activity(&app, "dave", json!({ "kind": "lab_session" })).await;
    common::log_activity(&app, "erin", json!({ "kind": "study_session" })).await;
    common::delete(&app, "/api/v1/learners/dave/stats").await;

    let (_, json) = common::get(&app, "/api/v1/leaderboard").await;
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries[0]["learner_id"], "erin");
    assert!(entries.iter().all(|e| e["learner_id"] != "dave"));
}
