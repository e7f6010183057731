// src/models/session.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::models::assessment::{AssessmentRow, Modality};

/// The normalized projection of one assessment record.
///
/// Built on the fly for read requests; never persisted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Modality,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,

    /// Always a finite number (0-100) or null; null means the analysis
    /// produced no usable score.
    pub score: Option<f64>,

    /// Modality-specific feedback block, passed through unparsed.
    pub summary: Option<Value>,

    /// The full document as persisted.
    pub raw: Value,
}

impl Session {
    /// Normalizes a raw record from `modality`'s collection.
    pub fn from_record(modality: Modality, row: AssessmentRow) -> Self {
        let score = modality.extract_score(&row.payload);
        let summary = modality.extract_summary(&row.payload);
        let id = row.id.clone();
        let user_id = row.user_id.clone();
        let timestamp = row.created_at;

        Session {
            id,
            kind: modality,
            user_id,
            timestamp,
            score,
            summary,
            raw: row.into_document(),
        }
    }
}
