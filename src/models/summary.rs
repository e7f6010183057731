// src/models/summary.rs

use serde::Serialize;

/// Per-user scalar aggregates across all recorded sessions (no time window).
///
/// Each modality average is null when the user has no scored record in that
/// modality; `overall` blends only the non-null averages and is null when
/// all three are.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub speech_avg: Option<f64>,
    pub video_avg: Option<f64>,
    pub text_avg: Option<f64>,
    pub overall: Option<f64>,
}
