// src/models/assessment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;

/// One of the three independent assessment channels.
///
/// The modality is implicit from which table a record lives in; it is never
/// stored as a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Speech,
    Video,
    Text,
}

impl Modality {
    /// Table holding this modality's assessment records.
    pub fn table(self) -> &'static str {
        match self {
            Modality::Speech => "speech_results",
            Modality::Video => "video_results",
            Modality::Text => "text_results",
        }
    }

    /// SQL expression extracting this modality's score from `payload`,
    /// normalized to the 0-100 scale.
    ///
    /// The writing analyzer stores its overall score on a 0-10 scale; it is
    /// rescaled here so blended aggregates compare like with like. Must stay
    /// in sync with `extract_score`.
    pub fn score_expr(self) -> &'static str {
        match self {
            Modality::Speech => "json_extract(payload, '$.scoring.overallScore')",
            Modality::Video => "json_extract(payload, '$.overall.score')",
            Modality::Text => "json_extract(payload, '$.analysisResults.overall_score') * 10.0",
        }
    }

    /// Extracts the 0-100 score from a raw payload document.
    ///
    /// Total: any missing or malformed level of the nested path degrades to
    /// `None`, never an error.
    pub fn extract_score(self, payload: &Value) -> Option<f64> {
        match self {
            Modality::Speech => SpeechPayload::deserialize(payload)
                .ok()?
                .scoring?
                .overall_score,
            Modality::Video => VideoPayload::deserialize(payload).ok()?.overall?.score,
            Modality::Text => TextPayload::deserialize(payload)
                .ok()?
                .analysis_results?
                .overall_score
                .map(|score| score * 10.0),
        }
    }

    /// Extracts the modality-specific feedback block, passed through opaquely.
    pub fn extract_summary(self, payload: &Value) -> Option<Value> {
        match self {
            Modality::Speech => SpeechPayload::deserialize(payload).ok()?.summary,
            Modality::Video => VideoPayload::deserialize(payload).ok()?.overall?.feedback,
            Modality::Text => TextPayload::deserialize(payload).ok()?.suggestions,
        }
    }
}

impl std::str::FromStr for Modality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "speech" => Ok(Modality::Speech),
            "video" => Ok(Modality::Video),
            "text" => Ok(Modality::Text),
            _ => Err(()),
        }
    }
}

/// A raw assessment record as persisted by the analysis pipeline.
///
/// `payload` is the modality-specific result document, opaque apart from the
/// score and feedback paths above.
#[derive(Debug, Clone, FromRow)]
pub struct AssessmentRow {
    pub id: String,
    pub user_id: String,
    pub payload: Json<Value>,
    pub created_at: DateTime<Utc>,
}

impl AssessmentRow {
    /// Reconstitutes the document shape the pipeline persisted: payload
    /// fields plus the record envelope at the top level.
    pub fn into_document(self) -> Value {
        let mut doc = match self.payload.0 {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                if !other.is_null() {
                    map.insert("payload".to_string(), other);
                }
                map
            }
        };
        doc.insert("id".to_string(), Value::String(self.id));
        doc.insert("userId".to_string(), Value::String(self.user_id));
        doc.insert(
            "createdAt".to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );
        Value::Object(doc)
    }
}

/// Typed views over the modality payloads. Every level is optional so a
/// partial analysis degrades to `None` instead of a deserialization error.
#[derive(Debug, Deserialize)]
struct SpeechPayload {
    scoring: Option<SpeechScoring>,
    summary: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SpeechScoring {
    #[serde(rename = "overallScore")]
    overall_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct VideoPayload {
    overall: Option<VideoOverall>,
}

#[derive(Debug, Deserialize)]
struct VideoOverall {
    score: Option<f64>,
    feedback: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct TextPayload {
    #[serde(rename = "analysisResults")]
    analysis_results: Option<TextAnalysis>,
    suggestions: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct TextAnalysis {
    overall_score: Option<f64>,
}
