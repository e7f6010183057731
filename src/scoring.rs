// src/scoring.rs
//
// Pure aggregation arithmetic shared by the progress handlers. Everything
// here operates on values the handlers already fetched; no I/O.

use crate::models::badge::{Badge, BadgeStats};
use crate::models::leaderboard::{LeaderboardEntry, ScoredUser};

/// Hard cap on returned leaderboard entries. No pagination.
pub const LEADERBOARD_LIMIT: usize = 50;

/// Default leaderboard window.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Window for the volume badges (point total, session count).
pub const VOLUME_WINDOW_DAYS: i64 = 7;

/// Window for the quality badges (per-modality mean thresholds).
pub const QUALITY_WINDOW_DAYS: i64 = 30;

const RISING_STAR_POINTS: f64 = 100.0;
const CONSISTENT_SESSIONS: i64 = 5;
const QUALITY_THRESHOLD: f64 = 85.0;

/// Rounds to 2 decimal places, the precision every score response uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of the values that are present.
///
/// `None` when nothing is present; absent modalities never drag a blended
/// score toward zero.
pub fn blend(parts: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = parts.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Sorts candidates by score descending, keeps the top `LEADERBOARD_LIMIT`
/// and assigns 1-based ranks.
///
/// The sort is stable: equal scores keep the order the candidates were
/// assembled in (ascending user id).
pub fn rank_leaderboard(mut candidates: Vec<ScoredUser>) -> Vec<LeaderboardEntry> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(LEADERBOARD_LIMIT);

    candidates
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| LeaderboardEntry {
            user_id: candidate.user_id,
            name: candidate.name,
            score: candidate.score,
            rank: i + 1,
        })
        .collect()
}

/// Evaluates the full badge catalog against one user's window stats.
///
/// Unearned badges are returned too; the caller always sees all five.
pub fn evaluate_badges(stats: &BadgeStats) -> Vec<Badge> {
    vec![
        Badge {
            id: "rising_star",
            name: "Rising Star",
            description: "Earn 100+ total points in a week",
            earned: stats.points_7d >= RISING_STAR_POINTS,
        },
        Badge {
            id: "consistent_practitioner",
            name: "Consistent Practitioner",
            description: "Complete 5+ practice sessions in a week",
            earned: stats.sessions_7d >= CONSISTENT_SESSIONS,
        },
        Badge {
            id: "top_communicator",
            name: "Top Communicator",
            description: "Average speech score >= 85 over 30 days",
            earned: stats.speech_avg_30d.is_some_and(|avg| avg >= QUALITY_THRESHOLD),
        },
        Badge {
            id: "grammar_guru",
            name: "Grammar Guru",
            description: "Average writing score >= 85 over 30 days",
            earned: stats.text_avg_30d.is_some_and(|avg| avg >= QUALITY_THRESHOLD),
        },
        Badge {
            id: "body_language_ace",
            name: "Body Language Ace",
            description: "Average non-verbal score >= 85 over 30 days",
            earned: stats.video_avg_30d.is_some_and(|avg| avg >= QUALITY_THRESHOLD),
        },
    ]
}
