use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use events_server::access::{ApiKeys, PolicySet};
use events_server::routes::create_routes;
use events_server::store::MemoryEventStore;
use events_server::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

const ANON_KEY: &str = "test-anon-key";
const SESSION_TOKEN: &str = "test-session-token";

fn create_app(policies: PolicySet) -> Router {
    let state = AppState::new(
        Arc::new(MemoryEventStore::new()),
        policies,
        ApiKeys::new(ANON_KEY, [SESSION_TOKEN]),
    );
    create_routes(state)
}

fn scenario_event() -> Value {
    json!({
        "start_date": "2024-06-01",
        "end_date": "2024-06-03",
        "city": "Austin",
        "brand": "Acme",
        "theme": "Summer Launch",
        "description": ""
    })
}

fn post_event(body: &Value, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri("/rest/v1/events")
        .method("POST")
        .header("content-type", "application/json")
        .header("apikey", ANON_KEY);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn get_events() -> Request<Body> {
    Request::builder()
        .uri("/rest/v1/events")
        .method("GET")
        .header("apikey", ANON_KEY)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_app(PolicySet::production());

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["access_policy"], "production");
    assert_eq!(json["data"]["store"], "memory");
}

#[tokio::test]
async fn test_insert_then_list_scenario() {
    let app = create_app(PolicySet::quick_start());

    let response = app
        .clone()
        .oneshot(post_event(&scenario_event(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["id"], 1);
    assert!(created["data"]["created_at"].is_string());

    let response = app.oneshot(get_events()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listed = body_json(response).await;
    let rows = listed["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], created["data"]);
    for field in ["start_date", "end_date", "city", "brand", "theme", "description"] {
        assert_eq!(rows[0][field], scenario_event()[field], "field {}", field);
    }
}

#[tokio::test]
async fn test_ids_strictly_increase() {
    let app = create_app(PolicySet::quick_start());

    let mut last = 0;
    for city in ["Austin", "Denver", "Boston", "Austin"] {
        let mut body = scenario_event();
        body["city"] = json!(city);
        let response = app.clone().oneshot(post_event(&body, None)).await.unwrap();
        let id = body_json(response).await["data"]["id"].as_i64().unwrap();
        assert!(id > last);
        last = id;
    }

    let listed = body_json(app.oneshot(get_events()).await.unwrap()).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_production_policy_blocks_anonymous_insert() {
    let app = create_app(PolicySet::production());

    let response = app
        .clone()
        .oneshot(post_event(&scenario_event(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "PERMISSION_DENIED");

    let response = app
        .clone()
        .oneshot(post_event(&scenario_event(), Some(SESSION_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Reads stay open to anonymous callers.
    let listed = body_json(app.oneshot(get_events()).await.unwrap()).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_required_field_is_rejected() {
    let app = create_app(PolicySet::quick_start());

    let mut body = scenario_event();
    body.as_object_mut().unwrap().remove("theme");

    let response = app.clone().oneshot(post_event(&body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert!(json["error"]["message"].as_str().unwrap().contains("theme"));

    let listed = body_json(app.oneshot(get_events()).await.unwrap()).await;
    assert!(listed["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_json_body_is_a_validation_error() {
    let app = create_app(PolicySet::quick_start());

    let request = Request::builder()
        .uri("/rest/v1/events")
        .method("POST")
        .header("content-type", "application/json")
        .header("apikey", ANON_KEY)
        .body(Body::from("city=Austin"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_requests_without_api_key_are_unauthorized() {
    let app = create_app(PolicySet::quick_start());

    let request = Request::builder()
        .uri("/rest/v1/events")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"]["code"], "AUTH_ERROR");
}

#[tokio::test]
async fn test_update_and_delete_are_denied() {
    let app = create_app(PolicySet::quick_start());
    app.clone()
        .oneshot(post_event(&scenario_event(), None))
        .await
        .unwrap();

    for (method, uri) in [
        ("PATCH", "/rest/v1/events/1"),
        ("DELETE", "/rest/v1/events/1"),
        ("PATCH", "/rest/v1/events"),
        ("DELETE", "/rest/v1/events"),
        ("PATCH", "/rest/v1/events/abc"),
    ] {
        let request = Request::builder()
            .uri(uri)
            .method(method)
            .header("apikey", ANON_KEY)
            .header("authorization", format!("Bearer {}", SESSION_TOKEN))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"city":"Denver"}"#))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{} {}", method, uri);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "PERMISSION_DENIED");
    }

    let listed = body_json(app.oneshot(get_events()).await.unwrap()).await;
    assert_eq!(listed["data"][0]["city"], "Austin");
}

#[tokio::test]
async fn test_lowercase_bearer_scheme_is_accepted() {
    let app = create_app(PolicySet::production());

    let request = Request::builder()
        .uri("/rest/v1/events")
        .method("POST")
        .header("content-type", "application/json")
        .header("apikey", ANON_KEY)
        .header("authorization", format!("bearer {}", SESSION_TOKEN))
        .body(Body::from(serde_json::to_string(&scenario_event()).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}
