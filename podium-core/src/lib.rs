//! Podium Core - Leaderboard Types
//!
//! Data model shared by every Podium crate: team standings, whole-replacement
//! leaderboard snapshots, the REST response envelope, and the snapshot store
//! that turns two successive snapshots into per-team rank movements.
//!
//! Nothing in this crate performs I/O.

pub mod delta;
pub mod envelope;
pub mod error;
pub mod snapshot;
pub mod team;

pub use delta::{Movement, RankDelta, SnapshotStore};
pub use envelope::{
    ApiEnvelope, EnvelopeStatus, FieldError, LeaderboardPayload, TeamPayload,
    DEFAULT_ERROR_MESSAGE,
};
pub use error::{EnvelopeError, SnapshotError};
pub use snapshot::LeaderboardSnapshot;
pub use team::{
    Achievement, Activity, Member, MemberCount, Role, TeamAchievement, TeamDetail, TeamId,
    TeamStanding, Timestamp,
};
