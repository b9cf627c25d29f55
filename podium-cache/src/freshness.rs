//! Freshness contracts and read metadata.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Which producer wrote a cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
    /// Delivered by the live push channel.
    Push,
    /// Fetched on demand (initial load or manual refresh).
    Pull,
}

/// Freshness requirement for detail reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    /// Serve the cached record unless it was invalidated or is older than
    /// `max_staleness`.
    BestEffort {
        max_staleness: Duration,
    },

    /// Always go to the fetcher.
    #[default]
    Consistent,
}

impl Freshness {
    pub fn best_effort(max_staleness: Duration) -> Self {
        Self::BestEffort { max_staleness }
    }

    pub fn consistent() -> Self {
        Self::Consistent
    }

    pub fn max_staleness(&self) -> Duration {
        match self {
            Self::BestEffort { max_staleness } => *max_staleness,
            Self::Consistent => Duration::ZERO,
        }
    }
}

/// Result of a cache read, carrying staleness metadata.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: Arc<T>,
    version: u64,
    written_at: DateTime<Utc>,
    origin: WriteOrigin,
    was_cache_hit: bool,
}

impl<T> CacheRead<T> {
    pub(crate) fn new(
        value: Arc<T>,
        version: u64,
        written_at: DateTime<Utc>,
        origin: WriteOrigin,
        was_cache_hit: bool,
    ) -> Self {
        Self {
            value,
            version,
            written_at,
            origin,
            was_cache_hit,
        }
    }

    pub(crate) fn mark_hit(&mut self) {
        self.was_cache_hit = true;
    }

    pub fn value(&self) -> &Arc<T> {
        &self.value
    }

    /// Monotonic write counter of the slot this read came from.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn written_at(&self) -> DateTime<Utc> {
        self.written_at
    }

    pub fn origin(&self) -> WriteOrigin {
        self.origin
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    /// Time since the slot was written.
    pub fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.written_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

impl<T> std::ops::Deref for CacheRead<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}
