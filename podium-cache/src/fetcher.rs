//! Fetcher seams for the pull path.
//!
//! The cache knows nothing about HTTP. Whatever can produce a snapshot or a
//! team record on demand implements these traits.

use async_trait::async_trait;
use podium_core::{LeaderboardSnapshot, TeamDetail, TeamId};

/// Request/response source of the current leaderboard.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch_leaderboard(&self) -> Result<LeaderboardSnapshot, Self::Error>;
}

/// Request/response source of team detail records.
#[async_trait]
pub trait TeamFetcher: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// `Ok(None)` means the team does not exist.
    async fn fetch_team(&self, id: &TeamId) -> Result<Option<TeamDetail>, Self::Error>;
}
