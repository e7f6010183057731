// src/models/leaderboard.rs

use serde::{Deserialize, Serialize};

use crate::models::assessment::Modality;

/// One ranked row of the leaderboard response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub name: String,
    pub score: f64,
    pub rank: usize,
}

/// A user's windowed mean before ranking.
#[derive(Debug, Clone)]
pub struct ScoredUser {
    pub user_id: String,
    pub name: String,
    pub score: f64,
}

/// What the leaderboard ranks over: one modality, or the blend of all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardKind {
    Overall,
    Single(Modality),
}

impl std::str::FromStr for LeaderboardKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "overall" {
            return Ok(LeaderboardKind::Overall);
        }
        s.parse::<Modality>().map(LeaderboardKind::Single)
    }
}

/// Query parameters for the leaderboard endpoint.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    /// overall | speech | video | text (default: overall).
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Trailing window in days (default: 7, floored at 1).
    pub days: Option<i64>,
}
