// src/handlers/progress.rs

use std::collections::{BTreeMap, HashMap};

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        assessment::{AssessmentRow, Modality},
        badge::BadgeStats,
        leaderboard::{LeaderboardKind, LeaderboardParams, ScoredUser},
        session::Session,
        summary::SummaryView,
        user::{ANONYMOUS, UserRow, display_name},
    },
    scoring,
};

/// Per-modality cap when assembling the session timeline.
const SESSION_FETCH_LIMIT: i64 = 200;

/// Query parameters for the user-scoped endpoints.
#[derive(Debug, Deserialize, Validate)]
pub struct UserParams {
    #[serde(rename = "userId", default)]
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,
}

/// Lists a user's practice sessions across all three modalities, normalized
/// into one timeline, newest first.
pub async fn get_sessions(
    State(pool): State<SqlitePool>,
    Query(params): Query<UserParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let (speech, video, text) = tokio::try_join!(
        recent_records(&pool, Modality::Speech, &params.user_id),
        recent_records(&pool, Modality::Video, &params.user_id),
        recent_records(&pool, Modality::Text, &params.user_id),
    )?;

    let mut sessions: Vec<Session> =
        Vec::with_capacity(speech.len() + video.len() + text.len());
    sessions.extend(
        speech
            .into_iter()
            .map(|row| Session::from_record(Modality::Speech, row)),
    );
    sessions.extend(
        video
            .into_iter()
            .map(|row| Session::from_record(Modality::Video, row)),
    );
    sessions.extend(
        text.into_iter()
            .map(|row| Session::from_record(Modality::Text, row)),
    );

    sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    Ok(Json(json!({ "sessions": sessions })))
}

/// Per-modality all-time averages plus a blended overall score.
pub async fn get_summary(
    State(pool): State<SqlitePool>,
    Query(params): Query<UserParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let (speech, video, text) = tokio::try_join!(
        mean_score(&pool, Modality::Speech, &params.user_id, None),
        mean_score(&pool, Modality::Video, &params.user_id, None),
        mean_score(&pool, Modality::Text, &params.user_id, None),
    )?;

    let speech_avg = speech.map(scoring::round2);
    let video_avg = video.map(scoring::round2);
    let text_avg = text.map(scoring::round2);
    let overall = scoring::blend(&[speech_avg, video_avg, text_avg]).map(scoring::round2);

    Ok(Json(json!({
        "summary": SummaryView {
            speech_avg,
            video_avg,
            text_avg,
            overall,
        }
    })))
}

/// Fetches one raw assessment document by modality and id.
pub async fn get_session_by_id(
    State(pool): State<SqlitePool>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let modality = kind
        .parse::<Modality>()
        .map_err(|_| AppError::BadRequest(format!("Unknown session type: {}", kind)))?;

    let sql = format!(
        "SELECT id, user_id, payload, created_at FROM {} WHERE id = ?1",
        modality.table()
    );
    let row = sqlx::query_as::<_, AssessmentRow>(&sql)
        .bind(&id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Session not found".to_string()))?;

    Ok(Json(json!({ "session": row.into_document() })))
}

/// Competitive ranking over a trailing window, either per modality or
/// blended across the three ("overall").
pub async fn get_leaderboard(
    State(pool): State<SqlitePool>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let requested = params.kind.as_deref().unwrap_or("overall");
    let kind = requested
        .parse::<LeaderboardKind>()
        .map_err(|_| AppError::BadRequest(format!("Unknown leaderboard type: {}", requested)))?;

    let days = params.days.unwrap_or(scoring::DEFAULT_WINDOW_DAYS).max(1);
    let since = Utc::now() - Duration::days(days);

    let candidates = match kind {
        LeaderboardKind::Single(modality) => {
            modality_candidates(&pool, modality, since).await?
        }
        LeaderboardKind::Overall => overall_candidates(&pool, since).await?,
    };

    Ok(Json(json!({ "leaderboard": scoring::rank_leaderboard(candidates) })))
}

/// Evaluates the badge catalog for one user.
pub async fn get_badges(
    State(pool): State<SqlitePool>,
    Query(params): Query<UserParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let now = Utc::now();
    let since_volume = now - Duration::days(scoring::VOLUME_WINDOW_DAYS);
    let since_quality = now - Duration::days(scoring::QUALITY_WINDOW_DAYS);

    let (speech_vol, video_vol, text_vol, speech_avg_30d, video_avg_30d, text_avg_30d) =
        tokio::try_join!(
            window_volume(&pool, Modality::Speech, &params.user_id, since_volume),
            window_volume(&pool, Modality::Video, &params.user_id, since_volume),
            window_volume(&pool, Modality::Text, &params.user_id, since_volume),
            mean_score(&pool, Modality::Speech, &params.user_id, Some(since_quality)),
            mean_score(&pool, Modality::Video, &params.user_id, Some(since_quality)),
            mean_score(&pool, Modality::Text, &params.user_id, Some(since_quality)),
        )?;

    let stats = BadgeStats {
        points_7d: speech_vol.points + video_vol.points + text_vol.points,
        sessions_7d: speech_vol.sessions + video_vol.sessions + text_vol.sessions,
        speech_avg_30d,
        video_avg_30d,
        text_avg_30d,
    };

    Ok(Json(json!({ "badges": scoring::evaluate_badges(&stats) })))
}

/// Row shape for batched per-user window means.
#[derive(Debug, sqlx::FromRow)]
struct UserMean {
    user_id: String,
    avg_score: f64,
}

/// Row shape for the per-modality leaderboard query, joined to the user
/// directory.
#[derive(Debug, sqlx::FromRow)]
struct RankedRow {
    user_id: String,
    avg_score: f64,
    name: Option<String>,
    email: Option<String>,
}

/// Row shape for the 7-day volume aggregate.
#[derive(Debug, sqlx::FromRow)]
struct WindowVolume {
    sessions: i64,
    points: f64,
}

async fn recent_records(
    pool: &SqlitePool,
    modality: Modality,
    user_id: &str,
) -> Result<Vec<AssessmentRow>, AppError> {
    let sql = format!(
        "SELECT id, user_id, payload, created_at FROM {} \
         WHERE user_id = ?1 ORDER BY created_at DESC LIMIT {}",
        modality.table(),
        SESSION_FETCH_LIMIT
    );
    let rows = sqlx::query_as::<_, AssessmentRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Mean score for one user in one modality, optionally windowed. NULL scores
/// are skipped by AVG; a user with no scored record yields `None`.
async fn mean_score(
    pool: &SqlitePool,
    modality: Modality,
    user_id: &str,
    since: Option<DateTime<Utc>>,
) -> Result<Option<f64>, AppError> {
    let sql = format!(
        "SELECT AVG({expr}) FROM {table} \
         WHERE user_id = ?1 AND (?2 IS NULL OR created_at >= ?2)",
        expr = modality.score_expr(),
        table = modality.table()
    );
    let avg: Option<f64> = sqlx::query_scalar(&sql)
        .bind(user_id)
        .bind(since)
        .fetch_one(pool)
        .await?;
    Ok(avg)
}

/// Record count and point total for one user in one modality over a window.
/// TOTAL() treats missing scores as 0, unlike the AVG() in `mean_score`.
async fn window_volume(
    pool: &SqlitePool,
    modality: Modality,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<WindowVolume, AppError> {
    let sql = format!(
        "SELECT COUNT(*) AS sessions, TOTAL({expr}) AS points FROM {table} \
         WHERE user_id = ?1 AND created_at >= ?2",
        expr = modality.score_expr(),
        table = modality.table()
    );
    let volume = sqlx::query_as::<_, WindowVolume>(&sql)
        .bind(user_id)
        .bind(since)
        .fetch_one(pool)
        .await?;
    Ok(volume)
}

/// In-window mean per user for one modality, every user in one pass.
/// Users whose records carry no usable score are dropped by the HAVING
/// clause rather than surfacing with a score of 0.
async fn window_means(
    pool: &SqlitePool,
    modality: Modality,
    since: DateTime<Utc>,
) -> Result<Vec<UserMean>, AppError> {
    let sql = format!(
        "SELECT user_id, AVG({expr}) AS avg_score FROM {table} \
         WHERE created_at >= ?1 \
         GROUP BY user_id \
         HAVING avg_score IS NOT NULL \
         ORDER BY user_id",
        expr = modality.score_expr(),
        table = modality.table()
    );
    let means = sqlx::query_as::<_, UserMean>(&sql)
        .bind(since)
        .fetch_all(pool)
        .await?;
    Ok(means)
}

async fn modality_candidates(
    pool: &SqlitePool,
    modality: Modality,
    since: DateTime<Utc>,
) -> Result<Vec<ScoredUser>, AppError> {
    let sql = format!(
        "SELECT r.user_id, AVG({expr}) AS avg_score, u.name, u.email \
         FROM {table} r LEFT JOIN users u ON u.id = r.user_id \
         WHERE r.created_at >= ?1 \
         GROUP BY r.user_id \
         HAVING avg_score IS NOT NULL \
         ORDER BY r.user_id",
        expr = modality.score_expr(),
        table = modality.table()
    );
    let rows = sqlx::query_as::<_, RankedRow>(&sql)
        .bind(since)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| ScoredUser {
            name: display_name(row.name.as_deref(), row.email.as_deref()),
            user_id: row.user_id,
            score: scoring::round2(row.avg_score),
        })
        .collect())
}

/// Blended ranking: one batched group-by per modality, joined in memory by
/// user id, then averaged over the modalities each user actually has data
/// for.
async fn overall_candidates(
    pool: &SqlitePool,
    since: DateTime<Utc>,
) -> Result<Vec<ScoredUser>, AppError> {
    let (speech, video, text, users) = tokio::try_join!(
        window_means(pool, Modality::Speech, since),
        window_means(pool, Modality::Video, since),
        window_means(pool, Modality::Text, since),
        load_directory(pool),
    )?;

    // Ascending user id keeps tie-breaking deterministic under the stable
    // rank sort.
    let mut by_user: BTreeMap<String, [Option<f64>; 3]> = BTreeMap::new();
    for (slot, means) in [speech, video, text].into_iter().enumerate() {
        for mean in means {
            by_user.entry(mean.user_id).or_default()[slot] = Some(mean.avg_score);
        }
    }

    let directory: HashMap<String, UserRow> =
        users.into_iter().map(|u| (u.id.clone(), u)).collect();

    Ok(by_user
        .into_iter()
        .filter_map(|(user_id, parts)| {
            scoring::blend(&parts).map(|avg| ScoredUser {
                name: directory
                    .get(&user_id)
                    .map(UserRow::display_name)
                    .unwrap_or_else(|| ANONYMOUS.to_string()),
                user_id,
                score: scoring::round2(avg),
            })
        })
        .collect())
}

async fn load_directory(pool: &SqlitePool) -> Result<Vec<UserRow>, AppError> {
    let users = sqlx::query_as::<_, UserRow>("SELECT id, name, email FROM users")
        .fetch_all(pool)
        .await?;
    Ok(users)
}
