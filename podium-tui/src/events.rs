//! Event types for the dashboard event loop.

use crate::api_client::ApiClientError;
use crossterm::event::KeyEvent;
use podium_cache::{CacheRead, QueryCacheBridge};
use podium_core::{LeaderboardSnapshot, TeamDetail, TeamId};
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum TuiEvent {
    Input(KeyEvent),
    Resize { width: u16, height: u16 },
    /// Push channel opened (`true`) or lost (`false`).
    Connection(bool),
    ChannelError(String),
    /// The leaderboard cache slot was written.
    Snapshot(CacheRead<LeaderboardSnapshot>),
    PullFinished(Result<(), ApiClientError>),
    TeamLoaded {
        id: TeamId,
        result: Result<Option<CacheRead<TeamDetail>>, ApiClientError>,
    },
}

/// Forward every leaderboard cache write into the event loop.
pub fn spawn_cache_forwarder(bridge: &QueryCacheBridge, sender: mpsc::Sender<TuiEvent>) {
    let mut updates = bridge.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let read = updates.borrow_and_update().clone();
            if let Some(read) = read {
                if sender.send(TuiEvent::Snapshot(read)).await.is_err() {
                    break;
                }
            }
        }
    });
}
