//! The keyed cache slots and the push/pull write paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use podium_core::{LeaderboardSnapshot, TeamDetail, TeamId};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::fetcher::{SnapshotFetcher, TeamFetcher};
use crate::freshness::{CacheRead, Freshness, WriteOrigin};

/// Slot key of the current leaderboard snapshot.
pub const LEADERBOARD_KEY: &str = "leaderboard";

/// Key prefix of the per-team detail slots invalidated on every publish.
pub const TEAMS_KEY: &str = "teams";

/// Configuration for the query cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum age of a team record served by best-effort reads.
    pub team_max_staleness: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            team_max_staleness: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team_max_staleness(mut self, duration: Duration) -> Self {
        self.team_max_staleness = duration;
        self
    }

    /// Freshness used by ordinary detail reads.
    pub fn team_freshness(&self) -> Freshness {
        Freshness::best_effort(self.team_max_staleness)
    }
}

type LeaderboardSlot = Option<CacheRead<LeaderboardSnapshot>>;

struct TeamSlot {
    read: CacheRead<TeamDetail>,
    stale: bool,
}

struct Inner {
    config: CacheConfig,
    versions: AtomicU64,
    /// Bumped by every `invalidate_related` while the team map is locked.
    invalidations: AtomicU64,
    leaderboard: watch::Sender<LeaderboardSlot>,
    teams: RwLock<HashMap<TeamId, TeamSlot>>,
}

/// Shared cache that both the push channel and the pull path write into.
///
/// Cloning is cheap; every clone addresses the same slots.
#[derive(Clone)]
pub struct QueryCacheBridge {
    inner: Arc<Inner>,
}

impl Default for QueryCacheBridge {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl QueryCacheBridge {
    pub fn new(config: CacheConfig) -> Self {
        let (leaderboard, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                config,
                versions: AtomicU64::new(0),
                invalidations: AtomicU64::new(0),
                leaderboard,
                teams: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Overwrite the leaderboard slot with a pushed snapshot.
    ///
    /// Never blocks and never fails, so it can be called straight from the
    /// channel's message handler. Returns the new slot version.
    pub fn publish(&self, snapshot: LeaderboardSnapshot) -> u64 {
        self.write_leaderboard(Arc::new(snapshot), WriteOrigin::Push)
    }

    /// Mark every cached team record stale so the next read re-fetches it.
    ///
    /// Returns how many records were marked.
    pub fn invalidate_related(&self) -> usize {
        let mut teams = self.write_teams();
        self.inner.invalidations.fetch_add(1, Ordering::SeqCst);
        let mut marked = 0;
        for slot in teams.values_mut() {
            if !slot.stale {
                slot.stale = true;
                marked += 1;
            }
        }
        debug!(key = TEAMS_KEY, marked, "Invalidated related cache entries");
        marked
    }

    /// Fetch the current snapshot over the request/response path and store it.
    ///
    /// On failure the slot keeps whatever it held before.
    pub async fn pull<F>(&self, fetcher: &F) -> Result<Arc<LeaderboardSnapshot>, F::Error>
    where
        F: SnapshotFetcher + ?Sized,
    {
        match fetcher.fetch_leaderboard().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let version = self.write_leaderboard(Arc::clone(&snapshot), WriteOrigin::Pull);
                info!(key = LEADERBOARD_KEY, version, teams = snapshot.len(), "Pulled leaderboard");
                Ok(snapshot)
            }
            Err(err) => {
                warn!(key = LEADERBOARD_KEY, error = %err, "Leaderboard pull failed");
                Err(err)
            }
        }
    }

    /// Current leaderboard slot, if anything was ever written.
    pub fn leaderboard(&self) -> Option<CacheRead<LeaderboardSnapshot>> {
        self.inner.leaderboard.borrow().clone()
    }

    /// Receiver that wakes on every leaderboard write.
    pub fn subscribe(&self) -> watch::Receiver<Option<CacheRead<LeaderboardSnapshot>>> {
        self.inner.leaderboard.subscribe()
    }

    /// Read a team record through the cache.
    ///
    /// `Ok(None)` means the fetcher reported the team as missing; missing
    /// teams are not cached. A record whose fetch overlapped an
    /// invalidation is returned but stored stale.
    pub async fn team<F>(
        &self,
        id: &TeamId,
        freshness: Freshness,
        fetcher: &F,
    ) -> Result<Option<CacheRead<TeamDetail>>, F::Error>
    where
        F: TeamFetcher + ?Sized,
    {
        if let Freshness::BestEffort { max_staleness } = freshness {
            if let Some(slot) = self.read_teams().get(id) {
                if !slot.stale && slot.read.age() <= max_staleness {
                    return Ok(Some(slot.read.clone()));
                }
            }
        }

        let epoch = self.inner.invalidations.load(Ordering::SeqCst);
        match fetcher.fetch_team(id).await? {
            Some(detail) => Ok(Some(self.store_team(detail, Some(epoch)))),
            None => {
                self.write_teams().remove(id);
                debug!(team_id = %id, "Team not found");
                Ok(None)
            }
        }
    }

    /// Store a team record fetched elsewhere.
    pub fn put_team(&self, detail: TeamDetail) -> CacheRead<TeamDetail> {
        self.store_team(detail, None)
    }

    /// Cached team record regardless of staleness, without fetching.
    pub fn cached_team(&self, id: &TeamId) -> Option<CacheRead<TeamDetail>> {
        self.read_teams().get(id).map(|slot| slot.read.clone())
    }

    /// `Some(true)` if the record exists but was invalidated.
    pub fn is_team_stale(&self, id: &TeamId) -> Option<bool> {
        self.read_teams().get(id).map(|slot| slot.stale)
    }

    /// Drop every slot.
    pub fn clear(&self) {
        self.inner.leaderboard.send_replace(None);
        self.write_teams().clear();
    }

    /// `fetched_at_epoch` is the invalidation count seen before the fetch
    /// started; a mismatch means the record predates the latest publish.
    fn store_team(
        &self,
        detail: TeamDetail,
        fetched_at_epoch: Option<u64>,
    ) -> CacheRead<TeamDetail> {
        let version = self.next_version();
        let id = detail.id.clone();
        let read = CacheRead::new(Arc::new(detail), version, Utc::now(), WriteOrigin::Pull, false);
        let mut cached = read.clone();
        cached.mark_hit();

        let mut teams = self.write_teams();
        let stale = fetched_at_epoch
            .is_some_and(|epoch| epoch != self.inner.invalidations.load(Ordering::SeqCst));
        if stale {
            debug!(team_id = %id, "Team fetch overlapped an invalidation; stored stale");
        }
        teams.insert(id, TeamSlot { read: cached, stale });
        read
    }

    fn write_leaderboard(&self, snapshot: Arc<LeaderboardSnapshot>, origin: WriteOrigin) -> u64 {
        let teams = snapshot.len();
        let mut version = 0;
        // Numbered under the slot's lock so versions commit in order.
        self.inner.leaderboard.send_modify(|slot| {
            version = self.next_version();
            *slot = Some(CacheRead::new(snapshot, version, Utc::now(), origin, true));
        });
        debug!(key = LEADERBOARD_KEY, version, teams, ?origin, "Cache slot replaced");
        version
    }

    fn next_version(&self) -> u64 {
        self.inner.versions.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn read_teams(&self) -> RwLockReadGuard<'_, HashMap<TeamId, TeamSlot>> {
        self.inner
            .teams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_teams(&self) -> RwLockWriteGuard<'_, HashMap<TeamId, TeamSlot>> {
        self.inner
            .teams
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
