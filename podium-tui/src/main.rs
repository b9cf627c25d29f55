//! Podium dashboard entry point.

use chrono::Utc;
use crossterm::{
    event::{self, Event as CrosstermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use podium_cache::{CacheConfig, Freshness, QueryCacheBridge};
use podium_core::TeamId;
use podium_tui::api_client::{ApiClient, RestClient};
use podium_tui::config::TuiConfig;
use podium_tui::error::TuiError;
use podium_tui::events::{spawn_cache_forwarder, TuiEvent};
use podium_tui::keys::map_key;
use podium_tui::persistence;
use podium_tui::realtime::{EventForwarder, PushChannelManager, ReconnectPolicy};
use podium_tui::state::{App, Effect};
use podium_tui::views::render_view;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_ENV: &str = "PODIUM_LOG";
const DEFAULT_LOG_FILTER: &str = "podium_tui=info,podium_cache=info";

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;
    init_logging(&config.log_path)?;
    info!(api = %config.api_base_url, sse = %config.sse_url(), "Starting dashboard");

    let api = ApiClient::new(&config)?;
    let bridge = QueryCacheBridge::new(CacheConfig::default());
    let mut app = App::new(config);

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);
    let (channel_tx, mut channel_rx) = mpsc::unbounded_channel::<TuiEvent>();
    spawn_cache_forwarder(&bridge, event_tx.clone());

    let channel = PushChannelManager::spawn(
        Arc::new(api.sse().clone()),
        bridge.clone(),
        Arc::new(EventForwarder::new(channel_tx)),
        ReconnectPolicy::from(&app.config.reconnect),
    );

    let mut pending = vec![Effect::Pull];
    match persistence::load(&app.config.persistence_path) {
        Ok(Some(state)) => pending.extend(app.restore(state)),
        Ok(None) => {}
        Err(err) => warn!(error = %err, "Ignoring unreadable UI state"),
    }

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    spawn_input_reader(event_tx.clone());
    channel.connect();
    for effect in pending {
        run_effect(effect, &api, &bridge, &channel, &event_tx);
    }

    let tick_rate = Duration::from_millis(app.config.refresh_interval_ms);
    let mut ticker = tokio::time::interval(tick_rate);

    loop {
        terminal.draw(|f| render_view(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => {
                app.prune_notifications(Utc::now());
            }
            Some(event) = channel_rx.recv() => {
                if let Some(effect) = handle_event(&mut app, event) {
                    run_effect(effect, &api, &bridge, &channel, &event_tx);
                }
            }
            Some(event) = event_rx.recv() => {
                let effect = handle_event(&mut app, event);
                match effect {
                    Some(Effect::Quit) => break,
                    Some(effect) => run_effect(effect, &api, &bridge, &channel, &event_tx),
                    None => {}
                }
            }
        }
    }

    channel.teardown().await;
    if let Err(err) = persistence::save(&app.config.persistence_path, &app.persisted_state()) {
        warn!(error = %err, "Failed to save UI state");
    }
    info!("Dashboard stopped");
    Ok(())
}

fn init_logging(path: &Path) -> Result<(), TuiError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| TuiError::Logging(e.to_string()))
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                let event = match evt {
                    CrosstermEvent::Key(key) => TuiEvent::Input(key),
                    CrosstermEvent::Resize(width, height) => TuiEvent::Resize { width, height },
                    _ => continue,
                };
                if sender.blocking_send(event).is_err() {
                    break;
                }
            }
        }
    });
}

fn handle_event(app: &mut App, event: TuiEvent) -> Option<Effect> {
    match event {
        TuiEvent::Input(key) => {
            let action = map_key(key)?;
            app.apply_action(action)
        }
        TuiEvent::Snapshot(read) => app.on_snapshot(read),
        TuiEvent::Connection(connected) => {
            app.on_connection(connected);
            None
        }
        TuiEvent::ChannelError(message) => {
            app.on_channel_error(message);
            None
        }
        TuiEvent::PullFinished(result) => {
            app.on_pull_finished(result);
            None
        }
        TuiEvent::TeamLoaded { id, result } => {
            app.on_team_loaded(id, result);
            None
        }
        TuiEvent::Resize { .. } => None,
    }
}

fn run_effect(
    effect: Effect,
    api: &ApiClient,
    bridge: &QueryCacheBridge,
    channel: &PushChannelManager,
    events: &mpsc::Sender<TuiEvent>,
) {
    match effect {
        Effect::Quit => {}
        Effect::Reconnect => channel.connect(),
        Effect::Pull => spawn_pull(api.rest().clone(), bridge.clone(), events.clone()),
        Effect::LoadTeam(id) => {
            let freshness = bridge.config().team_freshness();
            spawn_team_load(id, freshness, api.rest().clone(), bridge.clone(), events.clone())
        }
        Effect::ReloadTeam(id) => spawn_team_load(
            id,
            Freshness::Consistent,
            api.rest().clone(),
            bridge.clone(),
            events.clone(),
        ),
    }
}

fn spawn_pull(rest: RestClient, bridge: QueryCacheBridge, events: mpsc::Sender<TuiEvent>) {
    tokio::spawn(async move {
        let result = bridge.pull(&rest).await.map(|_| ());
        let _ = events.send(TuiEvent::PullFinished(result)).await;
    });
}

fn spawn_team_load(
    id: TeamId,
    freshness: Freshness,
    rest: RestClient,
    bridge: QueryCacheBridge,
    events: mpsc::Sender<TuiEvent>,
) {
    tokio::spawn(async move {
        let result = bridge.team(&id, freshness, &rest).await;
        let _ = events.send(TuiEvent::TeamLoaded { id, result }).await;
    });
}
