//! Integration tests for the symex-api endpoints.
//!
//! Each test drives the real router against a throwaway database file,
//! covering the completion transaction, the CRUD endpoints, the
//! symbol-preference submission rules, and the summary statistics.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

use symex_api::{build_router, AppState};

/// Test helper: fresh database + router. The TempDir must outlive the app.
async fn setup_app() -> (axum::Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let pool = symex_common::db::init_database(&dir.path().join("symex.db"))
        .await
        .expect("Should initialize test database");
    (build_router(AppState::new(pool)), dir)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn completion_payload(name: &str) -> Value {
    json!({
        "demographic": {
            "name": name,
            "phone_last4": "5678",
            "age": 34,
            "gender": "female",
            "vision": "corrected",
            "education": "MA",
            "has_aac_experience": true,
            "has_aac_education": false,
            "block_order": 2
        },
        "start_time": "2026-03-01T10:00:00+09:00",
        "end_time": "2026-03-01T10:25:30+09:00",
        "practice_results": [
            {"target_word": "안녕하세요", "symbol_type": "ai", "selected_symbol": "a1",
             "is_correct": false, "reaction_time": 1200, "error_count": 1}
        ],
        "trial_results": [
            {"target_word": "좋아요", "symbol_type": "ai", "selected_symbol": "x",
             "is_correct": true, "reaction_time": 500},
            {"target_word": "싫어요", "symbol_type": "kaac", "selected_symbol": "k2",
             "is_correct": false, "reaction_time": 800, "error_count": 2}
        ]
    })
}

fn preference_set(participant_id: &str, count: usize) -> Value {
    let words = [
        "안녕하세요",
        "고마워요",
        "미안합니다",
        "좋아요",
        "싫어요",
        "도와주세요",
        "배고파요",
    ];
    let preferences: Vec<Value> = words
        .iter()
        .take(count)
        .map(|word| {
            json!({
                "target_word": word,
                "ai_position": "left",
                "chosen": "left",
                "chosen_type": "ai"
            })
        })
        .collect();
    json!({"participant_id": participant_id, "preferences": preferences})
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = setup_app().await;

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "symex-api");
    assert!(body["version"].is_string());
}

// =============================================================================
// Experiment completion
// =============================================================================

#[tokio::test]
async fn test_complete_experiment_creates_all_rows() {
    let (app, _dir) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/complete-experiment/", &completion_payload("kim")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Experiment completed successfully");
    assert_eq!(body["participant_id"], "P0001");

    // Trials: 1 practice + 2 main, independently numbered from 1
    let response = app
        .clone()
        .oneshot(get_request("/api/trials/P0001/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let trials = extract_json(response.into_body()).await;
    let trials = trials.as_array().unwrap();
    assert_eq!(trials.len(), 3);

    let practice: Vec<&Value> = trials.iter().filter(|t| t["is_practice"] == true).collect();
    let main: Vec<&Value> = trials.iter().filter(|t| t["is_practice"] == false).collect();
    assert_eq!(practice.len(), 1);
    assert_eq!(practice[0]["trial_number"], 1);
    assert_eq!(main.len(), 2);
    assert_eq!(main[0]["trial_number"], 1);
    assert_eq!(main[1]["trial_number"], 2);
    assert_eq!(main[1]["error_count"], 2);

    // Participant row carries the parsed session timestamps
    let response = app
        .oneshot(get_request("/api/participants/P0001/"))
        .await
        .unwrap();
    let participant = extract_json(response.into_body()).await;
    assert_eq!(participant["name"], "kim");
    assert_eq!(participant["block_order"], 2);
    assert_eq!(participant["consent_agreed"], true);
    assert!(participant["completed_at"].is_string());
}

#[tokio::test]
async fn test_complete_experiment_single_main_trial() {
    let (app, _dir) = setup_app().await;

    // Empty practice block, one main trial
    let payload = json!({
        "demographic": {"name": "sole", "age": 20, "gender": "male"},
        "practice_results": [],
        "trial_results": [
            {"target_word": "좋아요", "symbol_type": "ai", "selected_symbol": "x",
             "is_correct": true, "reaction_time": 500}
        ]
    });

    let response = app
        .clone()
        .oneshot(post_json("/api/complete-experiment/", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let trials = extract_json(
        app.oneshot(get_request("/api/trials/P0001/"))
            .await
            .unwrap()
            .into_body(),
    )
    .await;
    let trials = trials.as_array().unwrap();
    assert_eq!(trials.len(), 1);
    assert_eq!(trials[0]["trial_number"], 1);
    assert_eq!(trials[0]["is_practice"], false);
    assert_eq!(trials[0]["is_correct"], true);
    assert_eq!(trials[0]["reaction_time"], 500);
    assert_eq!(trials[0]["target_word"], "좋아요");
}

#[tokio::test]
async fn test_complete_experiment_requires_demographic() {
    let (app, _dir) = setup_app().await;

    let payload = json!({
        "trial_results": [
            {"target_word": "좋아요", "symbol_type": "ai", "reaction_time": 500}
        ]
    });

    let response = app
        .clone()
        .oneshot(post_json("/api/complete-experiment/", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "demographic data is required");

    // Nothing was created
    let list = extract_json(
        app.oneshot(get_request("/api/participants/list/"))
            .await
            .unwrap()
            .into_body(),
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_participant_ids_increase_monotonically() {
    let (app, _dir) = setup_app().await;

    for expected in ["P0001", "P0002", "P0003"] {
        let response = app
            .clone()
            .oneshot(post_json("/api/complete-experiment/", &completion_payload(expected)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = extract_json(response.into_body()).await;
        assert_eq!(body["participant_id"], *expected);
    }
}

// =============================================================================
// Participant CRUD
// =============================================================================

#[tokio::test]
async fn test_create_and_list_participants() {
    let (app, _dir) = setup_app().await;

    let payload = json!({
        "name": "direct",
        "phone_last4": "0001",
        "age": 41,
        "gender": "male",
        "vision": "normal",
        "consent_agreed": true,
        "block_order": 1
    });

    let response = app
        .clone()
        .oneshot(post_json("/api/participants/", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["participant_id"], "P0001");
    assert_eq!(body["consent_agreed"], true);
    assert!(body["completed_at"].is_null());

    let list = extract_json(
        app.oneshot(get_request("/api/participants/list/"))
            .await
            .unwrap()
            .into_body(),
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_missing_participant_returns_404() {
    let (app, _dir) = setup_app().await;

    let response = app
        .oneshot(get_request("/api/participants/P9999/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Participant not found");
}

// =============================================================================
// Single-trial endpoints
// =============================================================================

#[tokio::test]
async fn test_create_trial_persists_presented_symbols() {
    let (app, _dir) = setup_app().await;

    app.clone()
        .oneshot(post_json("/api/participants/", &json!({"name": "t", "gender": "male"})))
        .await
        .unwrap();

    let payload = json!({
        "participant_id": "P0001",
        "trial_number": 1,
        "target_word": "고마워요",
        "symbol_type": "kaac",
        "presented_symbols": ["k1", "k2", "k3", "k4"],
        "selected_symbol": "k3",
        "is_correct": true,
        "reaction_time": 950
    });

    let response = app
        .clone()
        .oneshot(post_json("/api/trials/", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["trial_number"], 1);
    assert_eq!(body["block_type"], "kaac");
    assert_eq!(body["presented_symbols"].as_array().unwrap().len(), 4);
    assert!(body["responded_at"].is_string());
}

#[tokio::test]
async fn test_create_trial_validation_failures() {
    let (app, _dir) = setup_app().await;

    app.clone()
        .oneshot(post_json("/api/participants/", &json!({"name": "t", "gender": "male"})))
        .await
        .unwrap();

    // Unknown participant
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/trials/",
            &json!({
                "participant_id": "P0042", "trial_number": 1, "target_word": "w",
                "symbol_type": "ai", "selected_symbol": "s", "is_correct": true,
                "reaction_time": 100
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Missing participant_id
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/trials/",
            &json!({
                "trial_number": 1, "target_word": "w", "symbol_type": "ai",
                "selected_symbol": "s", "is_correct": true, "reaction_time": 100
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Zero trial number
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/trials/",
            &json!({
                "participant_id": "P0001", "trial_number": 0, "target_word": "w",
                "symbol_type": "ai", "selected_symbol": "s", "is_correct": true,
                "reaction_time": 100
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Undeserializable symbol type
    let response = app
        .oneshot(post_json(
            "/api/trials/",
            &json!({
                "participant_id": "P0001", "trial_number": 1, "target_word": "w",
                "symbol_type": "emoji", "selected_symbol": "s", "is_correct": true,
                "reaction_time": 100
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Legacy preferences
// =============================================================================

#[tokio::test]
async fn test_legacy_preference_create_and_get() {
    let (app, _dir) = setup_app().await;

    app.clone()
        .oneshot(post_json("/api/participants/", &json!({"name": "p", "gender": "female"})))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/preference/",
            &json!({
                "participant_id": "P0001",
                "easier_to_understand": "ai",
                "preference": "similar",
                "reason": "both fine"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get_request("/api/preference/P0001/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["easier_to_understand"], "ai");
    assert_eq!(body["preference"], "similar");
    assert_eq!(body["reason"], "both fine");

    // Unknown participant and participant without a judgment look the same
    let response = app
        .oneshot(get_request("/api/preference/P0777/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Data not found");
}

// =============================================================================
// Symbol preferences
// =============================================================================

#[tokio::test]
async fn test_submit_symbol_preferences_happy_path() {
    let (app, _dir) = setup_app().await;

    app.clone()
        .oneshot(post_json("/api/participants/", &json!({"name": "p", "gender": "male"})))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/submit-symbol-preferences/",
            &preference_set("P0001", 7),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["count"], 7);
    assert_eq!(body["participant_id"], "P0001");
    assert_eq!(body["preferences"].as_array().unwrap().len(), 7);

    let listed = extract_json(
        app.oneshot(get_request("/api/symbol-preferences/P0001/"))
            .await
            .unwrap()
            .into_body(),
    )
    .await;
    assert_eq!(listed["count"], 7);
    assert_eq!(listed["preferences"][0]["chosen_type"], "ai");
}

#[tokio::test]
async fn test_submit_symbol_preferences_wrong_count() {
    let (app, _dir) = setup_app().await;

    app.clone()
        .oneshot(post_json("/api/participants/", &json!({"name": "p", "gender": "male"})))
        .await
        .unwrap();

    for count in [0, 6] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/submit-symbol-preferences/",
                &preference_set("P0001", count),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // Nothing was created by the rejected submissions
    let listed = extract_json(
        app.clone()
            .oneshot(get_request("/api/symbol-preferences/P0001/"))
            .await
            .unwrap()
            .into_body(),
    )
    .await;
    assert_eq!(listed["count"], 0);

    // Missing participant_id
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/submit-symbol-preferences/",
            &json!({"preferences": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown participant
    let response = app
        .oneshot(post_json(
            "/api/submit-symbol-preferences/",
            &preference_set("P0404", 7),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resubmission_replaces_previous_set() {
    let (app, _dir) = setup_app().await;

    app.clone()
        .oneshot(post_json("/api/participants/", &json!({"name": "p", "gender": "male"})))
        .await
        .unwrap();

    app.clone()
        .oneshot(post_json(
            "/api/submit-symbol-preferences/",
            &preference_set("P0001", 7),
        ))
        .await
        .unwrap();

    // Resubmit with a different choice everywhere
    let mut resubmission = preference_set("P0001", 7);
    for entry in resubmission["preferences"].as_array_mut().unwrap() {
        entry["chosen"] = json!("right");
        entry["chosen_type"] = json!("kaac");
    }
    let response = app
        .clone()
        .oneshot(post_json("/api/submit-symbol-preferences/", &resubmission))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let listed = extract_json(
        app.oneshot(get_request("/api/symbol-preferences/P0001/"))
            .await
            .unwrap()
            .into_body(),
    )
    .await;
    assert_eq!(listed["count"], 7);
    for entry in listed["preferences"].as_array().unwrap() {
        assert_eq!(entry["chosen_type"], "kaac");
    }
}

#[tokio::test]
async fn test_preference_summary_totals_are_consistent() {
    let (app, _dir) = setup_app().await;

    // Two participants with opposing judgments
    for name in ["a", "b"] {
        app.clone()
            .oneshot(post_json("/api/participants/", &json!({"name": name, "gender": "male"})))
            .await
            .unwrap();
    }
    app.clone()
        .oneshot(post_json(
            "/api/submit-symbol-preferences/",
            &preference_set("P0001", 7),
        ))
        .await
        .unwrap();
    let mut second = preference_set("P0002", 7);
    for entry in second["preferences"].as_array_mut().unwrap() {
        entry["chosen_type"] = json!("similar");
    }
    app.clone()
        .oneshot(post_json("/api/submit-symbol-preferences/", &second))
        .await
        .unwrap();

    let response = app
        .oneshot(get_request("/api/preference-summary/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_responses"], 14);
    assert_eq!(body["total_participants"], 2);
    assert_eq!(body["overall_stats"]["ai"], 7);
    assert_eq!(body["overall_stats"]["similar"], 7);
    assert_eq!(body["overall_stats"]["kaac"], 0);

    // Per-word totals sum to the grand total, per choice type and overall
    let word_stats = body["word_stats"].as_object().unwrap();
    assert_eq!(word_stats.len(), 7);
    let mut sum_ai = 0;
    let mut sum_total = 0;
    for stats in word_stats.values() {
        sum_ai += stats["ai"].as_i64().unwrap();
        sum_total += stats["total"].as_i64().unwrap();
        assert_eq!(
            stats["total"],
            stats["ai"].as_i64().unwrap()
                + stats["kaac"].as_i64().unwrap()
                + stats["similar"].as_i64().unwrap()
        );
    }
    assert_eq!(sum_ai, body["overall_stats"]["ai"].as_i64().unwrap());
    assert_eq!(sum_total, body["total_responses"].as_i64().unwrap());
}

#[tokio::test]
async fn test_summary_on_empty_database() {
    let (app, _dir) = setup_app().await;

    let response = app
        .oneshot(get_request("/api/preference-summary/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_responses"], 0);
    assert_eq!(body["total_participants"], 0);
    assert_eq!(body["word_stats"].as_object().unwrap().len(), 7);
}
