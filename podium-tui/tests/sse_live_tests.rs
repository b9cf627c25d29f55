//! Event-stream client end to end: axum `Sse` server, real sockets, real clock.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{self, Stream, StreamExt};
use podium_cache::{QueryCacheBridge, WriteOrigin};
use podium_test_utils::snapshot_json;
use podium_tui::api_client::{ApiClientError, SseClient};
use podium_tui::config::TuiConfig;
use podium_tui::realtime::{
    ChannelListener, ConnectionState, PushChannelManager, PushTransport, ReconnectPolicy,
};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Default)]
struct Streams {
    opened: AtomicUsize,
    feeds: Mutex<Vec<mpsc::UnboundedSender<Event>>>,
}

impl Streams {
    fn send(&self, event: Event) {
        for feed in self.feeds.lock().unwrap().iter() {
            let _ = feed.send(event.clone());
        }
    }

    fn close_all(&self) {
        self.feeds.lock().unwrap().clear();
    }
}

async fn leaderboard_stream(
    State(streams): State<Arc<Streams>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    streams.opened.fetch_add(1, Ordering::SeqCst);
    let (tx, mut rx) = mpsc::unbounded_channel();
    streams.feeds.lock().unwrap().push(tx);
    let events = stream::poll_fn(move |cx| rx.poll_recv(cx)).map(Ok);
    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_millis(50)))
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn sse_client(base_url: &str) -> SseClient {
    let config = TuiConfig::from_toml(&format!(
        r#"
        api_base_url = "{base_url}"
        request_timeout_ms = 1000
        refresh_interval_ms = 250
        persistence_path = "/tmp/podium-state.json"
        log_path = "/tmp/podium.log"

        [theme]
        name = "podium"
        "#
    ))
    .unwrap();
    SseClient::new(&config).unwrap()
}

#[derive(Default)]
struct Counts {
    opened: AtomicUsize,
    lost: AtomicUsize,
}

impl ChannelListener for Counts {
    fn on_connection_change(&self, connected: bool) {
        if connected {
            self.opened.fetch_add(1, Ordering::SeqCst);
        } else {
            self.lost.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn on_error(&self, _message: &str) {}
}

async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {what}");
}

#[tokio::test]
async fn test_client_targets_realtime_root() {
    let client = sse_client("http://127.0.0.1:9/api/");
    assert_eq!(client.url(), "http://127.0.0.1:9/api/sse/leaderboard");
}

#[tokio::test]
async fn test_pushed_events_reach_the_cache() {
    let streams = Arc::new(Streams::default());
    let router = Router::new()
        .route("/api/sse/leaderboard", get(leaderboard_stream))
        .with_state(streams.clone());
    let base = serve(router).await;

    let bridge = QueryCacheBridge::default();
    let counts = Arc::new(Counts::default());
    let manager = PushChannelManager::spawn(
        Arc::new(sse_client(&base)),
        bridge.clone(),
        counts.clone(),
        ReconnectPolicy::default(),
    );
    manager.connect();
    eventually("open connection", || manager.state() == ConnectionState::Open).await;
    eventually("server stream", || !streams.feeds.lock().unwrap().is_empty()).await;

    streams.send(Event::default().event("ping").data("ignored"));
    streams.send(Event::default().data(snapshot_json(&[("a", 1), ("b", 2)])));
    eventually("first snapshot", || bridge.leaderboard().is_some()).await;
    let read = bridge.leaderboard().unwrap();
    assert_eq!(read.len(), 2);
    assert_eq!(read.origin(), WriteOrigin::Push);

    streams.send(Event::default().data(snapshot_json(&[("b", 1), ("a", 2), ("c", 3)])));
    eventually("second snapshot", || {
        bridge.leaderboard().map(|r| r.len()) == Some(3)
    })
    .await;
    assert_eq!(counts.opened.load(Ordering::SeqCst), 1);
    assert_eq!(counts.lost.load(Ordering::SeqCst), 0);

    manager.teardown().await;
    assert_eq!(manager.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_server_close_triggers_reconnect() {
    let streams = Arc::new(Streams::default());
    let router = Router::new()
        .route("/api/sse/leaderboard", get(leaderboard_stream))
        .with_state(streams.clone());
    let base = serve(router).await;

    let counts = Arc::new(Counts::default());
    let manager = PushChannelManager::spawn(
        Arc::new(sse_client(&base)),
        QueryCacheBridge::default(),
        counts.clone(),
        ReconnectPolicy {
            delay_ms: 50,
            jitter_ms: 0,
        },
    );
    manager.connect();
    eventually("first stream", || streams.opened.load(Ordering::SeqCst) == 1).await;
    eventually("open", || counts.opened.load(Ordering::SeqCst) == 1).await;

    streams.close_all();
    eventually("reconnect", || streams.opened.load(Ordering::SeqCst) == 2).await;
    eventually("reopen", || counts.opened.load(Ordering::SeqCst) == 2).await;
    assert_eq!(counts.lost.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_plain_json_response_is_not_a_stream() {
    let router = Router::new().route(
        "/api/sse/leaderboard",
        get(|| async { axum::Json(serde_json::json!({"status": "success"})) }),
    );
    let client = sse_client(&serve(router).await);

    match client.open().await {
        Err(ApiClientError::Stream(reason)) => assert!(reason.contains("text/event-stream")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("json body accepted as event stream"),
    }
}

#[tokio::test]
async fn test_error_status_fails_open() {
    let router = Router::new().route(
        "/api/sse/leaderboard",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE.into_response() }),
    );
    let client = sse_client(&serve(router).await);

    match client.open().await {
        Err(ApiClientError::Stream(reason)) => assert!(reason.contains("503")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("error status accepted"),
    }
}
