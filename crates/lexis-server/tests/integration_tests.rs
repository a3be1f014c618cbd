//! Integration tests for the HTTP API

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use lexis_domain::analyze;
use lexis_server::{
    config::ServerConfig,
    handlers::{create_router, AppState, HealthCheckResponse, MessageResponse},
};
use lexis_store::SqliteStore;
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot

/// Helper to create a router over a fresh in-memory store
fn create_test_app() -> Router {
    let store = SqliteStore::new(":memory:").unwrap();
    create_router(AppState::new(store))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn post_raw(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/strings")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_value(value: &str) -> Request<Body> {
    post_raw(&json!({ "value": value }).to_string())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn seed(app: &Router, values: &[&str]) {
    for value in values {
        let (status, _) = send(app, post_value(value)).await;
        assert_eq!(status, StatusCode::CREATED, "seeding {value}");
    }
}

fn data_values(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["value"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_root_endpoint() {
    let app = create_test_app();
    let (status, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    let message: MessageResponse = serde_json::from_value(body).unwrap();
    assert_eq!(message.message, "Welcome to String Analyzer API!");
}

#[tokio::test]
async fn test_health_check_counts_records() {
    let app = create_test_app();
    seed(&app, &["one", "two"]).await;

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);

    let health: HealthCheckResponse = serde_json::from_value(body).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.record_count, 2);
}

#[tokio::test]
async fn test_create_get_delete_string() {
    let app = create_test_app();

    let (status, body) = send(&app, post_value("Abba")).await;
    assert_eq!(status, StatusCode::CREATED);

    let expected = analyze("Abba");
    assert_eq!(body["id"], expected.hash);
    assert_eq!(body["value"], "Abba");
    assert_eq!(body["properties"]["length"], 4);
    assert_eq!(body["properties"]["isPalindrome"], true);
    assert_eq!(body["properties"]["uniqueCharacterCount"], 3);
    assert_eq!(body["properties"]["wordCount"], 1);
    assert_eq!(body["properties"]["hash"], expected.hash);
    assert_eq!(
        body["properties"]["characterFrequency"],
        json!({"A": 1, "a": 1, "b": 2})
    );
    assert_eq!(body["createdAt"], body["updatedAt"]);
    assert!(body["createdAt"].as_str().unwrap().ends_with('Z'));

    // GET
    let (status, fetched) = send(&app, get("/strings/Abba")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, body);

    // Delete
    let (status, empty) = send(&app, delete("/strings/Abba")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(empty, Value::Null);

    // GET after delete
    let (status, body) = send(&app, get("/strings/Abba")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "String does not exist in the system");
}

#[tokio::test]
async fn test_get_value_with_spaces() {
    let app = create_test_app();
    seed(&app, &["hello world"]).await;

    let (status, body) = send(&app, get("/strings/hello%20world")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["properties"]["wordCount"], 2);
}

#[tokio::test]
async fn test_post_duplicate_conflict() {
    let app = create_test_app();

    let (status, _) = send(&app, post_value("duplicate-test")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, post_value("duplicate-test")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "String already exists in the system");
}

#[tokio::test]
async fn test_post_missing_value_is_bad_request() {
    let app = create_test_app();
    let (status, body) = send(&app, post_raw(r#"{"text": "hi"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing 'value' field");
}

#[tokio::test]
async fn test_post_wrong_type_is_unprocessable() {
    let app = create_test_app();

    for payload in [r#"{"value": 123}"#, r#"{"value": null}"#, r#"{"value": ["a"]}"#] {
        let (status, _) = send(&app, post_raw(payload)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{payload}");
    }
}

#[tokio::test]
async fn test_post_malformed_body_is_unprocessable() {
    let app = create_test_app();

    let (status, _) = send(&app, post_raw("not json")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, post_raw(r#"["value"]"#)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_post_empty_string_is_valid() {
    let app = create_test_app();
    let (status, body) = send(&app, post_value("")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["properties"]["length"], 0);
    assert_eq!(body["properties"]["wordCount"], 0);
    assert_eq!(body["properties"]["characterFrequency"], json!({}));
}

#[tokio::test]
async fn test_concurrent_identical_creates() {
    let app = create_test_app();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.oneshot(post_value("race")).await.unwrap().status()
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn test_list_with_filters() {
    let app = create_test_app();
    seed(&app, &["racecar", "zoo", "level", "hello world", "a"]).await;

    let (status, body) = send(&app, get("/strings?isPalindrome=true&minLength=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data_values(&body), vec!["racecar", "level"]);
    assert_eq!(body["count"], 2);
    assert_eq!(
        body["filtersApplied"],
        json!({"isPalindrome": true, "minLength": 2})
    );
}

#[tokio::test]
async fn test_list_without_filters() {
    let app = create_test_app();
    seed(&app, &["one", "two"]).await;

    let (status, body) = send(&app, get("/strings")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["filtersApplied"], json!({}));
}

#[tokio::test]
async fn test_list_accepts_snake_case_params() {
    let app = create_test_app();
    seed(&app, &["one", "two words", "Zebra"]).await;

    let (status, body) = send(&app, get("/strings?word_count=1&contains_character=Z")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data_values(&body), vec!["Zebra"]);
    assert_eq!(
        body["filtersApplied"],
        json!({"wordCount": 1, "containsCharacter": "z"})
    );
}

#[tokio::test]
async fn test_list_rejects_conflicting_lengths() {
    let app = create_test_app();
    let (status, _) = send(&app, get("/strings?minLength=10&maxLength=2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_rejects_multi_character_filter() {
    let app = create_test_app();
    let (status, _) = send(&app, get("/strings?containsCharacter=ab")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_rejects_badly_typed_params() {
    let app = create_test_app();

    for uri in [
        "/strings?minLength=-1",
        "/strings?wordCount=many",
        "/strings?isPalindrome=maybe",
    ] {
        let (status, _) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
    }
}

#[tokio::test]
async fn test_natural_language_filter() {
    let app = create_test_app();
    seed(&app, &["racecar", "zoo", "noon", "never odd or even"]).await;

    let (status, body) = send(
        &app,
        get("/strings/filter-by-natural-language?query=all%20single%20word%20palindromic%20strings"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(data_values(&body), vec!["racecar", "noon"]);
    assert_eq!(body["count"], 2);
    assert_eq!(
        body["interpretedQuery"]["original"],
        "all single word palindromic strings"
    );
    assert_eq!(
        body["interpretedQuery"]["parsedFilters"],
        json!({"isPalindrome": true, "wordCount": 1})
    );
}

#[tokio::test]
async fn test_natural_language_alias_param() {
    let app = create_test_app();
    seed(&app, &["fizz", "buzz", "hello"]).await;

    let (status, body) = send(
        &app,
        get("/strings/filter-by-natural-language?q=strings%20containing%20the%20letter%20z"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(data_values(&body), vec!["fizz", "buzz"]);
    assert_eq!(
        body["interpretedQuery"]["parsedFilters"],
        json!({"containsCharacter": "z"})
    );
}

#[tokio::test]
async fn test_natural_language_missing_query() {
    let app = create_test_app();

    let (status, _) = send(&app, get("/strings/filter-by-natural-language")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/strings/filter-by-natural-language?query=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_natural_language_unparseable() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        get("/strings/filter-by-natural-language?query=show%20me%20everything"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unable to parse natural language query");
}

#[tokio::test]
async fn test_natural_language_conflict_is_parse_error() {
    let app = create_test_app();

    let (status, _) = send(
        &app,
        get("/strings/filter-by-natural-language?query=longer%20than%2010%20shorter%20than%205"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_huge_length_bounds_still_match() {
    let app = create_test_app();
    seed(&app, &["hello"]).await;

    let (status, body) = send(&app, get("/strings?maxLength=10000000000000000000")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = send(
        &app,
        get("/strings/filter-by-natural-language?query=shorter%20than%2018446744073709551615"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = send(
        &app,
        get("/strings/filter-by-natural-language?query=shorter%20than%20999999999999999999999999"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_delete_value_named_like_natural_language_route() {
    let app = create_test_app();
    seed(&app, &["filter-by-natural-language"]).await;

    let (status, _) = send(&app, delete("/strings/filter-by-natural-language")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recordCount"], 0);

    let (status, _) = send(&app, delete("/strings/filter-by-natural-language")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_absent_is_not_found_every_time() {
    let app = create_test_app();

    for _ in 0..2 {
        let (status, _) = send(&app, delete("/strings/ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[test]
fn test_server_config_from_toml() {
    let toml = r#"
        bind_address = "0.0.0.0"
        bind_port = 9000
        database_path = ":memory:"
    "#;

    let config: ServerConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    assert_eq!(config.database_path, ":memory:");
    assert_eq!(config.log_filter, "info"); // Default
}
