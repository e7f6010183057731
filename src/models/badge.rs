// src/models/badge.rs

use serde::Serialize;

/// A named achievement with its earned status for one user.
///
/// Earning is a pure function of current records, re-evaluated per request;
/// nothing is persisted, so a badge can lapse once its supporting data ages
/// out of the window.
#[derive(Debug, Clone, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub earned: bool,
}

/// Window aggregates a badge evaluation runs against.
///
/// The numeric policy is asymmetric on purpose: `points_7d` counts missing
/// scores as 0 and `sessions_7d` counts unscored records, while the 30-day
/// means exclude missing scores entirely.
#[derive(Debug, Default)]
pub struct BadgeStats {
    /// Point total over the trailing 7 days, across all modalities.
    pub points_7d: f64,

    /// Record count over the trailing 7 days, scored or not.
    pub sessions_7d: i64,

    /// 30-day per-modality means; `None` when no scored record exists.
    pub speech_avg_30d: Option<f64>,
    pub video_avg_30d: Option<f64>,
    pub text_avg_30d: Option<f64>,
}
