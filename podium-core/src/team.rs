//! Team entities as served by the leaderboard API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Opaque team identifier, stable across snapshots.
///
/// The server mints these; the client never parses them, it only uses them
/// as the join key between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TeamId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One row of a leaderboard snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub id: TeamId,
    /// 1 = highest score.
    pub rank: u32,
    pub score: f64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub achievements: Vec<TeamAchievement>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Badge definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Icon tag (e.g. `rocket`, `shield`); the client maps it to a glyph.
    pub icon: String,
    pub points: i64,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// A badge awarded to a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAchievement {
    pub id: String,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub achievement_id: Option<String>,
    pub achievement: Achievement,
    pub awarded_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

/// Team member as embedded in the team detail response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

fn default_role() -> Role {
    Role::User
}

/// Entry in a team's activity feed (score changes, awards).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub points: i64,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCount {
    pub members: u32,
}

/// Full team record returned by `GET /teams/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(default, rename = "_count")]
    pub count: Option<MemberCount>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub achievements: Vec<TeamAchievement>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl TeamDetail {
    /// Member count, preferring the embedded member list over the `_count` aggregate.
    pub fn member_count(&self) -> u32 {
        if !self.members.is_empty() {
            return self.members.len() as u32;
        }
        self.count.map(|c| c.members).unwrap_or(0)
    }

    /// Sum of the point values of every awarded badge.
    pub fn badge_points(&self) -> i64 {
        self.achievements.iter().map(|a| a.achievement.points).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standing_parses_camel_case_fields() {
        let json = r#"{
            "id": "team-a",
            "rank": 1,
            "score": 1250,
            "name": "Alpha",
            "description": null,
            "avatarUrl": "https://cdn.example/alpha.png",
            "memberCount": 4,
            "achievements": [{
                "id": "ta-1",
                "teamId": "team-a",
                "achievementId": "ach-1",
                "achievement": {"id": "ach-1", "name": "Launch", "icon": "rocket", "points": 50},
                "awardedAt": "2026-03-01T10:00:00Z"
            }],
            "createdAt": "2026-01-01T00:00:00Z"
        }"#;
        let standing: TeamStanding = serde_json::from_str(json).expect("valid standing");
        assert_eq!(standing.id, TeamId::new("team-a"));
        assert_eq!(standing.rank, 1);
        assert_eq!(standing.score, 1250.0);
        assert_eq!(standing.member_count, 4);
        assert_eq!(standing.avatar_url.as_deref(), Some("https://cdn.example/alpha.png"));
        assert_eq!(standing.achievements.len(), 1);
        assert_eq!(standing.achievements[0].achievement.icon, "rocket");
        assert!(standing.updated_at.is_none());
    }

    #[test]
    fn test_standing_optional_fields_default() {
        let json = r#"{"id": "b", "rank": 2, "score": 10.5, "name": "Bravo"}"#;
        let standing: TeamStanding = serde_json::from_str(json).expect("valid standing");
        assert_eq!(standing.member_count, 0);
        assert!(standing.achievements.is_empty());
        assert!(standing.description.is_none());
    }

    #[test]
    fn test_team_detail_member_count_prefers_members() {
        let json = r#"{
            "id": "t",
            "name": "Team",
            "score": 0,
            "_count": {"members": 7},
            "members": [
                {"id": "u1", "name": "Ana", "email": "ana@example.com", "role": "ADMIN"}
            ],
            "activities": [
                {"id": "a1", "type": "SCORE", "description": "Bonus", "points": -5, "createdAt": "2026-02-02T00:00:00Z"}
            ]
        }"#;
        let detail: TeamDetail = serde_json::from_str(json).expect("valid detail");
        assert_eq!(detail.member_count(), 1);
        assert_eq!(detail.members[0].role, Role::Admin);
        assert_eq!(detail.activities[0].kind, "SCORE");
        assert_eq!(detail.activities[0].points, -5);
    }

    #[test]
    fn test_team_detail_member_count_falls_back_to_aggregate() {
        let json = r#"{"id": "t", "name": "Team", "score": 3, "_count": {"members": 7}}"#;
        let detail: TeamDetail = serde_json::from_str(json).expect("valid detail");
        assert_eq!(detail.member_count(), 7);
        assert_eq!(detail.badge_points(), 0);
    }

    #[test]
    fn test_team_id_display_round_trips_string() {
        let id = TeamId::from("clx9abc");
        assert_eq!(id.to_string(), "clx9abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"clx9abc\"");
    }
}
