//! Query cache bridge between push delivery, manual pulls, and readers.
//!
//! A fresh leaderboard snapshot can arrive two ways: pushed by the live
//! channel, or pulled on demand over REST. Both land in the same keyed slot
//! so that readers never care which producer wrote last.
//!
//! # Slots
//!
//! - `leaderboard`: the current [`LeaderboardSnapshot`], whole-replacement,
//!   last writer wins. Readers get an `Arc` of a complete snapshot, never a mix.
//! - `teams`: per-team detail records. Marked stale in bulk whenever a new
//!   snapshot is published, and re-fetched on the next read.
//!
//! [`LeaderboardSnapshot`]: podium_core::LeaderboardSnapshot

pub mod bridge;
pub mod fetcher;
pub mod freshness;

pub use bridge::{CacheConfig, QueryCacheBridge, LEADERBOARD_KEY, TEAMS_KEY};
pub use fetcher::{SnapshotFetcher, TeamFetcher};
pub use freshness::{CacheRead, Freshness, WriteOrigin};
