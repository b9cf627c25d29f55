//! Podium Test Utilities
//!
//! Shared test infrastructure for the Podium workspace:
//! - Proptest generators for standings and snapshots
//! - Fixtures for common leaderboard and team scenarios
//! - Assertions over snapshot ordering and rank movement
//!
//! Mock fetchers and transports live next to the tests that use them so this
//! crate only depends on `podium-core`.

// Re-export core types for convenience
pub use podium_core::{
    Achievement, Activity, ApiEnvelope, LeaderboardPayload, LeaderboardSnapshot, Member,
    MemberCount, Movement, RankDelta, Role, TeamAchievement, TeamDetail, TeamId, TeamPayload,
    TeamStanding, Timestamp,
};

pub use fixtures::{envelope_json, snapshot, snapshot_json, standing, team_detail};
pub use generators::arb_snapshot;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating leaderboard data.

    use super::*;
    use proptest::prelude::*;

    /// Generate a team id from a small pool so successive snapshots overlap.
    pub fn arb_team_id() -> impl Strategy<Value = TeamId> {
        "[a-h]".prop_map(TeamId::new)
    }

    /// Generate a score in the range the server actually vends.
    pub fn arb_score() -> impl Strategy<Value = f64> {
        (0u32..50_000).prop_map(f64::from)
    }

    /// Generate a snapshot with unique ids and a shuffled 1..=n rank permutation.
    pub fn arb_snapshot() -> impl Strategy<Value = LeaderboardSnapshot> {
        prop::collection::hash_set("[a-h]", 0..8).prop_flat_map(|ids| {
            let ids: Vec<String> = ids.into_iter().collect();
            let ranks: Vec<u32> = (1..=ids.len() as u32).collect();
            let scores = prop::collection::vec(arb_score(), ids.len());
            (Just(ids), Just(ranks).prop_shuffle(), scores).prop_map(|(ids, ranks, scores)| {
                let teams = ids
                    .into_iter()
                    .zip(ranks)
                    .zip(scores)
                    .map(|((id, rank), score)| TeamStanding {
                        score,
                        ..standing(&id, rank)
                    })
                    .collect();
                LeaderboardSnapshot::from_standings(teams).unwrap_or_default()
            })
        })
    }

    /// Generate a pair of snapshots drawn from the same id pool.
    pub fn arb_snapshot_pair() -> impl Strategy<Value = (LeaderboardSnapshot, LeaderboardSnapshot)>
    {
        (arb_snapshot(), arb_snapshot())
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use chrono::{TimeZone, Utc};

    /// Fixed timestamp so fixtures compare equal across runs.
    pub fn fixed_time() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// A standing whose name is the upper-cased id and whose score falls with rank.
    pub fn standing(id: &str, rank: u32) -> TeamStanding {
        TeamStanding {
            id: TeamId::new(id),
            rank,
            score: f64::from(1000u32.saturating_sub(rank * 10)),
            name: id.to_uppercase(),
            description: None,
            avatar_url: None,
            member_count: 3,
            achievements: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Build a snapshot from `(id, rank)` pairs.
    ///
    /// Panics on rank 0; fixtures are expected to be valid.
    pub fn snapshot(rows: &[(&str, u32)]) -> LeaderboardSnapshot {
        LeaderboardSnapshot::from_standings(
            rows.iter().map(|(id, rank)| standing(id, *rank)).collect(),
        )
        .expect("fixture ranks must be non-zero")
    }

    /// JSON array body of a push event for `(id, rank)` pairs.
    pub fn snapshot_json(rows: &[(&str, u32)]) -> String {
        let teams: Vec<TeamStanding> = rows.iter().map(|(id, rank)| standing(id, *rank)).collect();
        serde_json::to_string(&teams).expect("standings serialize")
    }

    /// Success envelope around a leaderboard payload.
    pub fn envelope_json(rows: &[(&str, u32)]) -> String {
        let payload = LeaderboardPayload {
            leaderboard: rows.iter().map(|(id, rank)| standing(id, *rank)).collect(),
        };
        serde_json::to_string(&ApiEnvelope::success(payload)).expect("envelope serializes")
    }

    pub fn achievement(id: &str, icon: &str, points: i64) -> TeamAchievement {
        TeamAchievement {
            id: format!("ta-{id}"),
            team_id: None,
            achievement_id: Some(id.to_string()),
            achievement: Achievement {
                id: id.to_string(),
                name: format!("Badge {id}"),
                description: Some(format!("Awarded for {id}")),
                icon: icon.to_string(),
                points,
                created_at: None,
            },
            awarded_at: fixed_time(),
        }
    }

    pub fn member(id: &str, role: Role) -> Member {
        Member {
            id: id.to_string(),
            name: format!("Member {id}"),
            email: format!("{id}@example.com"),
            role,
            team_id: None,
            created_at: Some(fixed_time()),
        }
    }

    pub fn activity(id: &str, points: i64) -> Activity {
        Activity {
            id: id.to_string(),
            kind: "SCORE_UPDATE".to_string(),
            description: format!("Scored {points} points"),
            points,
            team_id: None,
            created_at: fixed_time(),
        }
    }

    /// A fully populated team record.
    pub fn team_detail(id: &str, name: &str) -> TeamDetail {
        TeamDetail {
            id: TeamId::new(id),
            name: name.to_string(),
            description: Some(format!("{name} compete here")),
            avatar_url: None,
            score: 1250.0,
            created_at: Some(fixed_time()),
            updated_at: Some(fixed_time()),
            count: Some(MemberCount { members: 2 }),
            members: vec![member("m1", Role::Admin), member("m2", Role::User)],
            achievements: vec![achievement("launch", "rocket", 50), achievement("guard", "shield", 25)],
            activities: vec![activity("act-1", 100), activity("act-2", -20)],
        }
    }

    /// Team record with no members, badges, or activity.
    pub fn empty_team_detail(id: &str, name: &str) -> TeamDetail {
        TeamDetail {
            description: None,
            count: None,
            members: Vec::new(),
            achievements: Vec::new(),
            activities: Vec::new(),
            ..team_detail(id, name)
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertions for leaderboard validation.

    use super::*;

    /// Assert the snapshot's rows are in non-decreasing rank order.
    pub fn assert_rank_ordered(snapshot: &LeaderboardSnapshot) {
        let ranks: Vec<u32> = snapshot.iter().map(|t| t.rank).collect();
        assert!(
            ranks.windows(2).all(|w| w[0] <= w[1]),
            "Snapshot not rank ordered: {:?}",
            ranks
        );
    }

    /// Assert the snapshot's team ids in display order.
    pub fn assert_ids(snapshot: &LeaderboardSnapshot, expected: &[&str]) {
        let ids: Vec<&str> = snapshot.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, expected, "Unexpected snapshot order");
    }

    /// Assert one team's movement in a delta.
    pub fn assert_movement(delta: &RankDelta, id: &str, expected: Movement) {
        let actual = delta.movement(&TeamId::new(id));
        assert_eq!(actual, expected, "Unexpected movement for team {}", id);
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Property: generated snapshots are rank ordered with unique ranks
        #[test]
        fn prop_generated_snapshot_is_ordered(snap in generators::arb_snapshot()) {
            assertions::assert_rank_ordered(&snap);
            let ranks: Vec<u32> = snap.iter().map(|t| t.rank).collect();
            let expected: Vec<u32> = (1..=snap.len() as u32).collect();
            prop_assert_eq!(ranks, expected);
        }
    }
}
