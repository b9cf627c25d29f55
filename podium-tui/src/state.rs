//! Application state and the leaderboard view controller.
//!
//! Nothing here performs I/O. Handlers return an [`Effect`] when the event
//! loop has to start a request or talk to the push channel.

use crate::api_client::ApiClientError;
use crate::config::TuiConfig;
use crate::keys::KeyAction;
use crate::nav::View;
use crate::notifications::{Notification, NotificationAction, NotificationLevel};
use crate::persistence::PersistedState;
use crate::theme::Theme;
use chrono::{DateTime, Utc};
use podium_cache::CacheRead;
use podium_core::{
    LeaderboardSnapshot, Movement, RankDelta, SnapshotStore, TeamDetail, TeamId, TeamStanding,
};
use std::time::Duration;

/// Text of the announcement raised on every leaderboard transition after the first.
pub const UPDATED_ANNOUNCEMENT: &str = "Leaderboard updated";

/// How long footer notifications stay visible.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Work the event loop performs on behalf of the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Quit,
    /// Pull the leaderboard over REST.
    Pull,
    /// Read a team through the team cache.
    LoadTeam(TeamId),
    /// Re-fetch a team, bypassing cached data.
    ReloadTeam(TeamId),
    /// Ask the push channel to connect now.
    Reconnect,
}

pub struct App {
    pub config: TuiConfig,
    pub theme: Theme,
    pub active_view: View,
    pub leaderboard: LeaderboardViewState,
    pub team_view: TeamViewState,
    pub notifications: Vec<Notification>,
    pub modal: Option<Modal>,
    pub connected: bool,
}

#[derive(Debug, Clone)]
pub struct Modal {
    pub title: String,
    pub message: String,
}

impl App {
    pub fn new(config: TuiConfig) -> Self {
        let theme = Theme::by_name(&config.theme.name).unwrap_or_else(Theme::podium);
        Self {
            config,
            theme,
            active_view: View::Leaderboard,
            leaderboard: LeaderboardViewState::new(),
            team_view: TeamViewState::new(),
            notifications: Vec::new(),
            modal: None,
            connected: false,
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }

    pub fn prune_notifications(&mut self, now: DateTime<Utc>) {
        self.notifications
            .retain(|n| !n.is_expired(now, NOTIFICATION_TTL));
    }

    /// Restore persisted UI state. Returns the load needed to show it.
    pub fn restore(&mut self, state: PersistedState) -> Option<Effect> {
        self.leaderboard.selected = state.selected_team_id.clone();
        match (state.active_view, state.selected_team_id) {
            (View::TeamDetail, Some(id)) => Some(self.open_team(id)),
            _ => None,
        }
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            active_view: self.active_view,
            selected_team_id: self
                .team_view
                .team_id
                .clone()
                .filter(|_| self.active_view == View::TeamDetail)
                .or_else(|| self.leaderboard.selected.clone()),
        }
    }

    /// A leaderboard cache write reached the dashboard.
    pub fn on_snapshot(&mut self, read: CacheRead<LeaderboardSnapshot>) -> Option<Effect> {
        if !self.leaderboard.apply(read) {
            return None;
        }
        if self.leaderboard.store.transitions() > 1 {
            self.notify(NotificationLevel::Info, UPDATED_ANNOUNCEMENT);
        }
        // Related team records were invalidated by the push; re-read the open one.
        match (&self.active_view, &self.team_view.team_id) {
            (View::TeamDetail, Some(id)) => Some(Effect::LoadTeam(id.clone())),
            _ => None,
        }
    }

    pub fn on_connection(&mut self, connected: bool) {
        self.connected = connected;
        if connected {
            self.leaderboard.error = None;
        }
    }

    pub fn on_channel_error(&mut self, message: String) {
        self.notifications.push(
            Notification::new(NotificationLevel::Warning, message.clone())
                .with_action(NotificationAction::Reconnect),
        );
        self.leaderboard.error = Some(message);
    }

    pub fn on_pull_finished(&mut self, result: Result<(), ApiClientError>) {
        match result {
            Ok(()) => self.leaderboard.loading = false,
            Err(err) => {
                let message = err.to_string();
                self.notifications.push(
                    Notification::new(NotificationLevel::Error, message.clone())
                        .with_action(NotificationAction::Retry),
                );
                self.leaderboard.refresh_failed(message);
            }
        }
    }

    pub fn on_team_loaded(
        &mut self,
        id: TeamId,
        result: Result<Option<CacheRead<TeamDetail>>, ApiClientError>,
    ) {
        self.team_view.finish(id, result);
    }

    pub fn apply_action(&mut self, action: KeyAction) -> Option<Effect> {
        if self.modal.is_some() {
            return match action {
                KeyAction::Quit => Some(Effect::Quit),
                _ => {
                    self.modal = None;
                    None
                }
            };
        }

        match action {
            KeyAction::Quit => return Some(Effect::Quit),
            KeyAction::NextView => return self.switch_view(self.active_view.next()),
            KeyAction::PrevView => return self.switch_view(self.active_view.previous()),
            KeyAction::SwitchView(index) => {
                if let Some(view) = View::from_index(index) {
                    return self.switch_view(view);
                }
            }
            KeyAction::MoveDown => match self.active_view {
                View::Leaderboard => self.leaderboard.select_next(),
                View::TeamDetail => self.team_view.scroll = self.team_view.scroll.saturating_add(1),
            },
            KeyAction::MoveUp => match self.active_view {
                View::Leaderboard => self.leaderboard.select_previous(),
                View::TeamDetail => self.team_view.scroll = self.team_view.scroll.saturating_sub(1),
            },
            KeyAction::Top => match self.active_view {
                View::Leaderboard => self.leaderboard.select_first(),
                View::TeamDetail => self.team_view.scroll = 0,
            },
            KeyAction::Bottom => {
                if self.active_view == View::Leaderboard {
                    self.leaderboard.select_last();
                }
            }
            KeyAction::Open => {
                if self.active_view == View::Leaderboard {
                    let id = self.leaderboard.selected.clone()?;
                    return Some(self.open_team(id));
                }
            }
            KeyAction::Back => {
                if self.active_view == View::TeamDetail {
                    self.active_view = View::Leaderboard;
                }
            }
            KeyAction::Refresh => return Some(self.refresh()),
            KeyAction::Reconnect => return Some(Effect::Reconnect),
            KeyAction::OpenHelp => {
                self.modal = Some(Modal {
                    title: "Keybindings".to_string(),
                    message: "j/k or arrows move, Enter opens a team, Esc goes back, \
                              r refreshes, c reconnects, Tab switches views, q quits."
                        .to_string(),
                });
            }
        }
        None
    }

    /// Manual refresh from whichever view is showing.
    pub fn refresh(&mut self) -> Effect {
        match (&self.active_view, &self.team_view.team_id) {
            (View::TeamDetail, Some(id)) => {
                let id = id.clone();
                self.team_view.begin(id.clone());
                Effect::ReloadTeam(id)
            }
            _ => {
                self.leaderboard.begin_refresh();
                Effect::Pull
            }
        }
    }

    pub fn open_team(&mut self, id: TeamId) -> Effect {
        self.leaderboard.selected = Some(id.clone());
        self.active_view = View::TeamDetail;
        self.team_view.begin(id.clone());
        Effect::LoadTeam(id)
    }

    fn switch_view(&mut self, view: View) -> Option<Effect> {
        match view {
            View::TeamDetail if self.team_view.team_id.is_none() => {
                let id = self.leaderboard.selected.clone()?;
                Some(self.open_team(id))
            }
            _ => {
                self.active_view = view;
                None
            }
        }
    }
}

// ============================================================================
// LEADERBOARD VIEW CONTROLLER
// ============================================================================

/// Inputs the leaderboard screen is derived from.
#[derive(Debug)]
pub struct LeaderboardViewState {
    store: SnapshotStore,
    current: Option<CacheRead<LeaderboardSnapshot>>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected: Option<TeamId>,
}

/// What the leaderboard screen shows.
#[derive(Debug)]
pub enum LeaderboardView<'a> {
    /// Loading with nothing to show yet.
    Loading,
    /// An error with nothing to show; replaces the content.
    Failed { message: &'a str },
    Empty { stale_error: Option<&'a str> },
    Ready {
        /// First three teams, only with at least three ranked.
        podium: Option<[&'a TeamStanding; 3]>,
        rows: Vec<LeaderboardRow<'a>>,
        /// Error shown as a banner over data that stays visible.
        stale_error: Option<&'a str>,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct LeaderboardRow<'a> {
    pub standing: &'a TeamStanding,
    pub movement: Movement,
    pub selected: bool,
}

impl LeaderboardViewState {
    pub fn new() -> Self {
        Self {
            store: SnapshotStore::new(),
            current: None,
            loading: true,
            error: None,
            selected: None,
        }
    }

    /// Apply a cache write. Returns false when the write was already applied.
    pub fn apply(&mut self, read: CacheRead<LeaderboardSnapshot>) -> bool {
        if let Some(current) = &self.current {
            if current.version() >= read.version() {
                return false;
            }
        }
        self.store.apply(read.value().clone());
        self.current = Some(read);
        self.loading = false;
        self.error = None;
        self.keep_selection_valid();
        true
    }

    pub fn begin_refresh(&mut self) {
        self.error = None;
        self.loading = true;
    }

    pub fn refresh_failed(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    pub fn snapshot(&self) -> Option<&LeaderboardSnapshot> {
        self.current.as_ref().map(|read| read.value().as_ref())
    }

    pub fn cache_read(&self) -> Option<&CacheRead<LeaderboardSnapshot>> {
        self.current.as_ref()
    }

    pub fn delta(&self) -> &RankDelta {
        self.store.delta()
    }

    pub fn view(&self) -> LeaderboardView<'_> {
        let snapshot = match self.snapshot() {
            Some(snapshot) => snapshot,
            None if self.loading => return LeaderboardView::Loading,
            None => {
                return match &self.error {
                    Some(message) => LeaderboardView::Failed { message },
                    None => LeaderboardView::Loading,
                }
            }
        };
        let stale_error = self.error.as_deref();
        if snapshot.is_empty() {
            return LeaderboardView::Empty { stale_error };
        }
        let delta = self.store.delta();
        let rows = snapshot
            .iter()
            .map(|standing| LeaderboardRow {
                standing,
                movement: delta.movement(&standing.id),
                selected: self.selected.as_ref() == Some(&standing.id),
            })
            .collect();
        LeaderboardView::Ready {
            podium: snapshot.podium(),
            rows,
            stale_error,
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected.as_ref()?;
        self.snapshot()?.iter().position(|t| &t.id == id)
    }

    pub fn select_next(&mut self) {
        if let Some(snapshot) = self.current.as_ref().map(|r| r.value().clone()) {
            select_next_id(snapshot.teams(), &mut self.selected);
        }
    }

    pub fn select_previous(&mut self) {
        if let Some(snapshot) = self.current.as_ref().map(|r| r.value().clone()) {
            select_prev_id(snapshot.teams(), &mut self.selected);
        }
    }

    pub fn select_first(&mut self) {
        self.selected = self.snapshot().and_then(|s| s.teams().first()).map(|t| t.id.clone());
    }

    pub fn select_last(&mut self) {
        self.selected = self.snapshot().and_then(|s| s.teams().last()).map(|t| t.id.clone());
    }

    fn keep_selection_valid(&mut self) {
        let still_present = match (&self.selected, self.snapshot()) {
            (Some(id), Some(snapshot)) => snapshot.get(id).is_some(),
            _ => false,
        };
        if !still_present {
            self.select_first();
        }
    }
}

impl Default for LeaderboardViewState {
    fn default() -> Self {
        Self::new()
    }
}

fn select_next_id(items: &[TeamStanding], selected: &mut Option<TeamId>) {
    if items.is_empty() {
        *selected = None;
        return;
    }
    let index = selected
        .as_ref()
        .and_then(|id| items.iter().position(|item| &item.id == id));
    let next = match index {
        Some(index) => (index + 1) % items.len(),
        None => 0,
    };
    *selected = Some(items[next].id.clone());
}

fn select_prev_id(items: &[TeamStanding], selected: &mut Option<TeamId>) {
    if items.is_empty() {
        *selected = None;
        return;
    }
    let index = selected
        .as_ref()
        .and_then(|id| items.iter().position(|item| &item.id == id))
        .unwrap_or(0);
    let prev = if index == 0 { items.len() - 1 } else { index - 1 };
    *selected = Some(items[prev].id.clone());
}

// ============================================================================
// TEAM DETAIL
// ============================================================================

#[derive(Debug, Clone)]
pub enum TeamDetailState {
    Idle,
    Loading,
    NotFound,
    Failed { message: String },
    Ready(CacheRead<TeamDetail>),
}

#[derive(Debug, Clone)]
pub struct TeamViewState {
    pub team_id: Option<TeamId>,
    pub state: TeamDetailState,
    pub scroll: u16,
}

impl TeamViewState {
    pub fn new() -> Self {
        Self {
            team_id: None,
            state: TeamDetailState::Idle,
            scroll: 0,
        }
    }

    /// Start showing `id`. A reload of the team already shown keeps its data visible.
    pub fn begin(&mut self, id: TeamId) {
        let same_team = self.team_id.as_ref() == Some(&id);
        if !same_team {
            self.scroll = 0;
            self.state = TeamDetailState::Loading;
        } else if !matches!(self.state, TeamDetailState::Ready(_)) {
            self.state = TeamDetailState::Loading;
        }
        self.team_id = Some(id);
    }

    /// Apply a finished load. Results for a team no longer shown are ignored.
    pub fn finish(
        &mut self,
        id: TeamId,
        result: Result<Option<CacheRead<TeamDetail>>, ApiClientError>,
    ) {
        if self.team_id.as_ref() != Some(&id) {
            return;
        }
        self.state = match result {
            Ok(Some(read)) => TeamDetailState::Ready(read),
            Ok(None) => TeamDetailState::NotFound,
            Err(err) if err.is_not_found() => TeamDetailState::NotFound,
            Err(err) => match &self.state {
                // Keep showing data on a failed background reload.
                TeamDetailState::Ready(_) => return,
                _ => TeamDetailState::Failed {
                    message: err.to_string(),
                },
            },
        };
    }

    pub fn detail(&self) -> Option<&TeamDetail> {
        match &self.state {
            TeamDetailState::Ready(read) => Some(read.value().as_ref()),
            _ => None,
        }
    }
}

impl Default for TeamViewState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
