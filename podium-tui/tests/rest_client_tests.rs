//! REST client against a local axum server speaking the response envelope.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use podium_cache::{Freshness, QueryCacheBridge, TeamFetcher, WriteOrigin};
use podium_core::{ApiEnvelope, TeamId, TeamPayload};
use podium_test_utils::{envelope_json, team_detail};
use podium_tui::api_client::{ApiClientError, RestClient};
use podium_tui::config::TuiConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn client(base_url: &str, token: Option<&str>) -> RestClient {
    let auth = token
        .map(|t| format!("[auth]\ntoken = \"{t}\"\n"))
        .unwrap_or_default();
    let config = TuiConfig::from_toml(&format!(
        r#"
        api_base_url = "{base_url}"
        request_timeout_ms = 300
        refresh_interval_ms = 250
        persistence_path = "/tmp/podium-state.json"
        log_path = "/tmp/podium.log"

        [retry]
        attempts = 1
        delay_ms = 10

        [theme]
        name = "podium"

        {auth}
        "#
    ))
    .unwrap();
    RestClient::new(&config).unwrap()
}

fn json(status: StatusCode, body: String) -> impl IntoResponse {
    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

#[tokio::test]
async fn test_leaderboard_is_unwrapped_and_ordered() {
    let router = Router::new().route(
        "/api/leaderboard",
        get(|| async { json(StatusCode::OK, envelope_json(&[("b", 2), ("a", 1), ("c", 3)])) }),
    );
    let rest = client(&serve(router).await, None);

    let snapshot = rest.get_leaderboard().await.unwrap();
    let ids: Vec<&str> = snapshot.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_error_envelope_message_is_kept_verbatim() {
    let router = Router::new().route(
        "/api/leaderboard",
        get(|| async {
            json(
                StatusCode::INTERNAL_SERVER_ERROR,
                r#"{"status":"error","message":"Database unavailable"}"#.to_string(),
            )
        }),
    );
    let rest = client(&serve(router).await, None);

    let err = rest.get_leaderboard().await.unwrap_err();
    match &err {
        ApiClientError::Api { status, message, .. } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "Database unavailable");
        }
        other => panic!("expected api error, got {:?}", other),
    }
    assert_eq!(err.to_string(), "Database unavailable");
}

#[tokio::test]
async fn test_error_status_inside_success_response() {
    let router = Router::new().route(
        "/api/leaderboard",
        get(|| async {
            json(
                StatusCode::OK,
                r#"{"status":"error","message":"Season closed","errors":[{"field":"season","message":"ended"}]}"#
                    .to_string(),
            )
        }),
    );
    let rest = client(&serve(router).await, None);

    match rest.get_leaderboard().await.unwrap_err() {
        ApiClientError::Api { message, errors, .. } => {
            assert_eq!(message, "Season closed");
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "season");
        }
        other => panic!("expected api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unparseable_error_body_uses_default_message() {
    let router = Router::new().route(
        "/api/leaderboard",
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let rest = client(&serve(router).await, None);

    let err = rest.get_leaderboard().await.unwrap_err();
    assert_eq!(err.to_string(), "An error occurred");
}

#[tokio::test]
async fn test_missing_team_is_not_found() {
    let router = Router::new().route(
        "/api/teams/:id",
        get(|Path(id): Path<String>| async move {
            if id == "t1" {
                let body = serde_json::to_string(&ApiEnvelope::success(TeamPayload {
                    team: team_detail("t1", "Tigers"),
                }))
                .unwrap();
                json(StatusCode::OK, body).into_response()
            } else {
                json(
                    StatusCode::NOT_FOUND,
                    r#"{"status":"error","message":"Team not found"}"#.to_string(),
                )
                .into_response()
            }
        }),
    );
    let rest = client(&serve(router).await, None);

    let team = rest.get_team(&TeamId::new("t1")).await.unwrap();
    assert_eq!(team.name, "Tigers");
    assert_eq!(team.badge_points(), 75);

    let err = rest.get_team(&TeamId::new("ghost")).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(rest.fetch_team(&TeamId::new("ghost")).await.unwrap().is_none());

    let bridge = QueryCacheBridge::default();
    let read = bridge
        .team(&TeamId::new("ghost"), Freshness::Consistent, &rest)
        .await
        .unwrap();
    assert!(read.is_none());
    assert!(bridge.cached_team(&TeamId::new("ghost")).is_none());
}

#[tokio::test]
async fn test_team_id_is_sent_as_one_path_segment() {
    let router = Router::new().route(
        "/api/teams/:id",
        get(|Path(id): Path<String>| async move {
            let body = serde_json::to_string(&ApiEnvelope::success(TeamPayload {
                team: team_detail(&id, "Odd Name"),
            }))
            .unwrap();
            json(StatusCode::OK, body)
        }),
    );
    let rest = client(&serve(router).await, None);

    let team = rest.get_team(&TeamId::new("a/b?c#d")).await.unwrap();
    assert_eq!(team.id, TeamId::new("a/b?c#d"));
}

#[tokio::test]
async fn test_leaderboard_404_keeps_server_message() {
    let router = Router::new().route(
        "/api/leaderboard",
        get(|| async {
            json(
                StatusCode::NOT_FOUND,
                r#"{"status":"error","message":"No active season"}"#.to_string(),
            )
        }),
    );
    let rest = client(&serve(router).await, None);

    let err = rest.get_leaderboard().await.unwrap_err();
    assert!(!err.is_not_found());
    match &err {
        ApiClientError::Api { status, message, .. } => {
            assert_eq!(*status, 404);
            assert_eq!(message, "No active season");
        }
        other => panic!("expected api error, got {:?}", other),
    }
    assert_eq!(err.to_string(), "No active season");
}

#[tokio::test]
async fn test_timeout_is_retried_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/api/leaderboard",
            get(|State(calls): State<Arc<AtomicUsize>>| async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
                json(StatusCode::OK, envelope_json(&[("a", 1)]))
            }),
        )
        .with_state(calls.clone());
    let rest = client(&serve(router).await, None);

    let snapshot = rest.get_leaderboard().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_envelope_errors_are_not_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/api/leaderboard",
            get(|State(calls): State<Arc<AtomicUsize>>| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                json(
                    StatusCode::SERVICE_UNAVAILABLE,
                    r#"{"status":"error","message":"Maintenance"}"#.to_string(),
                )
            }),
        )
        .with_state(calls.clone());
    let rest = client(&serve(router).await, None);

    assert!(rest.get_leaderboard().await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_connection_refused_surfaces_after_retry() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let rest = client(&format!("http://{}/api", addr), None);

    let err = rest.get_leaderboard().await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let router = Router::new().route(
        "/api/leaderboard",
        get(|headers: HeaderMap| async move {
            let authorized = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                == Some("Bearer s3cret");
            if authorized {
                json(StatusCode::OK, envelope_json(&[("a", 1)]))
            } else {
                json(
                    StatusCode::UNAUTHORIZED,
                    r#"{"status":"error","message":"Unauthorized"}"#.to_string(),
                )
            }
        }),
    );
    let base = serve(router).await;

    assert!(client(&base, Some("s3cret")).get_leaderboard().await.is_ok());
    let err = client(&base, None).get_leaderboard().await.unwrap_err();
    assert_eq!(err.to_string(), "Unauthorized");
}

#[tokio::test]
async fn test_pull_writes_cache_and_failure_leaves_it() {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/api/leaderboard",
            get(|State(calls): State<Arc<AtomicUsize>>| async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    json(StatusCode::OK, envelope_json(&[("a", 1), ("b", 2)]))
                } else {
                    json(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        r#"{"status":"error","message":"boom"}"#.to_string(),
                    )
                }
            }),
        )
        .with_state(calls);
    let rest = client(&serve(router).await, None);
    let bridge = QueryCacheBridge::default();

    bridge.pull(&rest).await.unwrap();
    let read = bridge.leaderboard().unwrap();
    assert_eq!(read.origin(), WriteOrigin::Pull);
    assert_eq!(read.len(), 2);

    assert!(bridge.pull(&rest).await.is_err());
    assert_eq!(bridge.leaderboard().unwrap().version(), read.version());
}
