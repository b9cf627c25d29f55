//! Whole-replacement leaderboard snapshots.

use crate::error::SnapshotError;
use crate::team::{TeamId, TeamStanding};
use serde::Serialize;
use std::collections::HashMap;

/// Complete leaderboard state as vended by the server, ordered by ascending rank.
///
/// A snapshot is never patched: every push or pull replaces the previous one
/// wholesale.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct LeaderboardSnapshot {
    teams: Vec<TeamStanding>,
}

impl LeaderboardSnapshot {
    /// Build a snapshot from server rows.
    ///
    /// Rows are stably sorted by rank so the ordering invariant holds even if
    /// the server sends them shuffled. Rank 0 is rejected; duplicate ranks are
    /// tolerated and keep their server order.
    pub fn from_standings(mut teams: Vec<TeamStanding>) -> Result<Self, SnapshotError> {
        if let Some(bad) = teams.iter().find(|t| t.rank == 0) {
            return Err(SnapshotError::InvalidRank {
                team_id: bad.id.clone(),
            });
        }
        teams.sort_by_key(|t| t.rank);
        Ok(Self { teams })
    }

    /// Parse a JSON array of standings (the body of one push event).
    pub fn parse(payload: &str) -> Result<Self, SnapshotError> {
        let teams: Vec<TeamStanding> = serde_json::from_str(payload)?;
        Self::from_standings(teams)
    }

    pub fn teams(&self) -> &[TeamStanding] {
        &self.teams
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TeamStanding> {
        self.teams.iter()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn get(&self, id: &TeamId) -> Option<&TeamStanding> {
        self.teams.iter().find(|t| &t.id == id)
    }

    /// Top three teams, only when at least three are ranked.
    pub fn podium(&self) -> Option<[&TeamStanding; 3]> {
        match self.teams.as_slice() {
            [first, second, third, ..] => Some([first, second, third]),
            _ => None,
        }
    }

    /// Rank of every team, keyed by id. Later rows win on duplicate ids.
    pub fn rank_by_id(&self) -> HashMap<TeamId, u32> {
        self.teams
            .iter()
            .map(|t| (t.id.clone(), t.rank))
            .collect()
    }
}

impl<'a> IntoIterator for &'a LeaderboardSnapshot {
    type Item = &'a TeamStanding;
    type IntoIter = std::slice::Iter<'a, TeamStanding>;

    fn into_iter(self) -> Self::IntoIter {
        self.teams.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing(id: &str, rank: u32) -> TeamStanding {
        TeamStanding {
            id: TeamId::new(id),
            rank,
            score: 100.0 - rank as f64,
            name: id.to_uppercase(),
            description: None,
            avatar_url: None,
            member_count: 0,
            achievements: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_parse_orders_by_rank() {
        let payload = r#"[
            {"id": "c", "rank": 3, "score": 1, "name": "C"},
            {"id": "a", "rank": 1, "score": 9, "name": "A"},
            {"id": "b", "rank": 2, "score": 5, "name": "B"}
        ]"#;
        let snapshot = LeaderboardSnapshot::parse(payload).unwrap();
        let ids: Vec<&str> = snapshot.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = LeaderboardSnapshot::parse("data: nope").unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed { .. }));
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        assert!(LeaderboardSnapshot::parse(r#"{"leaderboard": []}"#).is_err());
        assert!(LeaderboardSnapshot::parse(r#"[{"id": "a"}]"#).is_err());
    }

    #[test]
    fn test_rank_zero_rejected() {
        let err = LeaderboardSnapshot::from_standings(vec![standing("a", 0)]).unwrap_err();
        assert_eq!(
            err,
            SnapshotError::InvalidRank {
                team_id: TeamId::new("a")
            }
        );
    }

    #[test]
    fn test_duplicate_ranks_keep_server_order() {
        let snapshot = LeaderboardSnapshot::from_standings(vec![
            standing("x", 2),
            standing("y", 1),
            standing("z", 2),
        ])
        .unwrap();
        let ids: Vec<&str> = snapshot.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["y", "x", "z"]);
    }

    #[test]
    fn test_podium_requires_three_teams() {
        let two = LeaderboardSnapshot::from_standings(vec![standing("a", 1), standing("b", 2)])
            .unwrap();
        assert!(two.podium().is_none());

        let four = LeaderboardSnapshot::from_standings(vec![
            standing("a", 1),
            standing("b", 2),
            standing("c", 3),
            standing("d", 4),
        ])
        .unwrap();
        let podium = four.podium().unwrap();
        assert_eq!(podium[0].id.as_str(), "a");
        assert_eq!(podium[2].id.as_str(), "c");
    }

    #[test]
    fn test_empty_array_is_valid_snapshot() {
        let snapshot = LeaderboardSnapshot::parse("[]").unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.rank_by_id().is_empty());
    }
}
