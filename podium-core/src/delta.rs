//! Snapshot store and rank-delta computation.
//!
//! Delta flow for every snapshot transition:
//! 1. Capture `rank_by_id` of the snapshot currently displayed
//! 2. Replace the current snapshot with the incoming one
//! 3. For each team in both, `delta = old_rank - new_rank`
//!
//! The delta is recomputed from scratch on every transition. It only ever
//! reflects the immediately preceding snapshot, never accumulated history.

use crate::snapshot::LeaderboardSnapshot;
use crate::team::TeamId;
use std::collections::HashMap;
use std::sync::Arc;

/// How a team moved between the previous and the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// Moved toward rank 1 by this many places.
    Up(u32),
    /// Moved away from rank 1 by this many places.
    Down(u32),
    Unchanged,
    /// Absent from the previous snapshot.
    New,
}

impl Movement {
    fn from_delta(delta: i64) -> Self {
        match delta {
            0 => Movement::Unchanged,
            d if d > 0 => Movement::Up(d as u32),
            d => Movement::Down(d.unsigned_abs() as u32),
        }
    }

    pub fn is_change(&self) -> bool {
        matches!(self, Movement::Up(_) | Movement::Down(_))
    }
}

/// Per-team rank change for one snapshot transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankDelta {
    /// Ranks in the immediately preceding snapshot.
    previous_ranks: HashMap<TeamId, u32>,
    /// `old_rank - new_rank` for teams present in both snapshots.
    changes: HashMap<TeamId, i64>,
}

impl RankDelta {
    /// Delta with no comparison baseline (first snapshot).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compare two snapshots. Teams only in `current` get no entry; teams only
    /// in `previous` are dropped silently.
    pub fn between(previous: &LeaderboardSnapshot, current: &LeaderboardSnapshot) -> Self {
        let previous_ranks = previous.rank_by_id();
        let changes = current
            .iter()
            .filter_map(|team| {
                previous_ranks
                    .get(&team.id)
                    .map(|old| (team.id.clone(), *old as i64 - team.rank as i64))
            })
            .collect();
        Self {
            previous_ranks,
            changes,
        }
    }

    /// True when there was no baseline to compare against.
    pub fn is_baseline(&self) -> bool {
        self.previous_ranks.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn previous_rank(&self, id: &TeamId) -> Option<u32> {
        self.previous_ranks.get(id).copied()
    }

    /// Positive = moved up, negative = moved down, `None` = no comparison.
    pub fn delta(&self, id: &TeamId) -> Option<i64> {
        self.changes.get(id).copied()
    }

    pub fn movement(&self, id: &TeamId) -> Movement {
        match self.changes.get(id) {
            Some(delta) => Movement::from_delta(*delta),
            None if self.is_baseline() => Movement::Unchanged,
            None => Movement::New,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TeamId, i64)> {
        self.changes.iter().map(|(id, d)| (id, *d))
    }

    /// Number of teams whose rank actually changed.
    pub fn moved_count(&self) -> usize {
        self.changes.values().filter(|d| **d != 0).count()
    }
}

/// Holds the snapshot being displayed and the delta that produced it.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    current: Option<Arc<LeaderboardSnapshot>>,
    delta: RankDelta,
    transitions: u64,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a new snapshot for rendering and return the freshly computed delta.
    ///
    /// The first snapshot ever applied yields an empty delta.
    pub fn apply(&mut self, snapshot: Arc<LeaderboardSnapshot>) -> &RankDelta {
        self.delta = match self.current.as_deref() {
            Some(previous) => RankDelta::between(previous, &snapshot),
            None => RankDelta::empty(),
        };
        self.current = Some(snapshot);
        self.transitions += 1;
        &self.delta
    }

    pub fn current(&self) -> Option<&Arc<LeaderboardSnapshot>> {
        self.current.as_ref()
    }

    pub fn delta(&self) -> &RankDelta {
        &self.delta
    }

    /// How many snapshots have been applied since creation or the last reset.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Forget everything (fresh mount): the next snapshot is a baseline again.
    pub fn reset(&mut self) {
        self.current = None;
        self.delta = RankDelta::empty();
        self.transitions = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::TeamStanding;

    fn standing(id: &str, rank: u32) -> TeamStanding {
        TeamStanding {
            id: TeamId::new(id),
            rank,
            score: 1000.0 / rank as f64,
            name: id.to_string(),
            description: None,
            avatar_url: None,
            member_count: 1,
            achievements: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn snapshot(rows: &[(&str, u32)]) -> Arc<LeaderboardSnapshot> {
        let teams = rows.iter().map(|(id, rank)| standing(id, *rank)).collect();
        Arc::new(LeaderboardSnapshot::from_standings(teams).unwrap())
    }

    fn id(s: &str) -> TeamId {
        TeamId::new(s)
    }

    #[test]
    fn test_first_snapshot_yields_empty_delta() {
        let mut store = SnapshotStore::new();
        let delta = store.apply(snapshot(&[("A", 1), ("B", 2), ("C", 3)]));
        assert!(delta.is_empty());
        assert!(delta.is_baseline());
        assert_eq!(delta.movement(&id("A")), Movement::Unchanged);
    }

    #[test]
    fn test_swap_produces_opposite_deltas() {
        let mut store = SnapshotStore::new();
        store.apply(snapshot(&[("A", 1), ("B", 2), ("C", 3)]));
        let delta = store.apply(snapshot(&[("B", 1), ("A", 2), ("C", 3)]));

        assert_eq!(delta.delta(&id("A")), Some(-1));
        assert_eq!(delta.delta(&id("B")), Some(1));
        assert_eq!(delta.delta(&id("C")), Some(0));
        assert_eq!(delta.movement(&id("A")), Movement::Down(1));
        assert_eq!(delta.movement(&id("B")), Movement::Up(1));
        assert_eq!(delta.movement(&id("C")), Movement::Unchanged);
        assert_eq!(delta.moved_count(), 2);
    }

    #[test]
    fn test_new_entrant_has_no_delta() {
        let mut store = SnapshotStore::new();
        store.apply(snapshot(&[("A", 1)]));
        let delta = store.apply(snapshot(&[("D", 1), ("A", 2)]));

        assert_eq!(delta.delta(&id("D")), None);
        assert_eq!(delta.movement(&id("D")), Movement::New);
        assert_eq!(delta.delta(&id("A")), Some(-1));
        assert_eq!(delta.previous_rank(&id("A")), Some(1));
    }

    #[test]
    fn test_departed_team_dropped_silently() {
        let mut store = SnapshotStore::new();
        store.apply(snapshot(&[("A", 1), ("B", 2)]));
        let delta = store.apply(snapshot(&[("B", 1)]));

        assert_eq!(delta.len(), 1);
        assert_eq!(delta.delta(&id("A")), None);
        assert_eq!(delta.delta(&id("B")), Some(1));
    }

    #[test]
    fn test_delta_is_recomputed_not_accumulated() {
        let mut store = SnapshotStore::new();
        store.apply(snapshot(&[("A", 1), ("B", 2), ("C", 3)]));
        store.apply(snapshot(&[("C", 1), ("A", 2), ("B", 3)]));
        let delta = store.apply(snapshot(&[("C", 1), ("B", 2), ("A", 3)]));

        // Only the last transition counts: C stayed at 1.
        assert_eq!(delta.delta(&id("C")), Some(0));
        assert_eq!(delta.delta(&id("B")), Some(1));
        assert_eq!(delta.delta(&id("A")), Some(-1));
        assert_eq!(store.transitions(), 3);
    }

    #[test]
    fn test_duplicate_ranks_do_not_panic() {
        let mut store = SnapshotStore::new();
        store.apply(snapshot(&[("A", 1), ("B", 1)]));
        let delta = store.apply(snapshot(&[("A", 2), ("B", 1)]));
        assert_eq!(delta.delta(&id("A")), Some(-1));
        assert_eq!(delta.delta(&id("B")), Some(0));
    }

    #[test]
    fn test_reset_restores_baseline_behavior() {
        let mut store = SnapshotStore::new();
        store.apply(snapshot(&[("A", 1), ("B", 2)]));
        store.reset();
        let delta = store.apply(snapshot(&[("B", 1), ("A", 2)]));
        assert!(delta.is_empty());
        assert!(store.current().is_some());
    }

    #[test]
    fn test_empty_previous_snapshot_gives_no_movement() {
        let mut store = SnapshotStore::new();
        store.apply(snapshot(&[]));
        let delta = store.apply(snapshot(&[("A", 1)]));
        // Nothing to compare against, so A is treated like a baseline row.
        assert!(delta.is_empty());
        assert_eq!(delta.movement(&id("A")), Movement::Unchanged);
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
