//! Domain types shared between the gateway surface and the adapters.
//!
//! These mirror the unified schema's output types. Reshaping from backend
//! responses is field renaming and defaulting only — the `_id` spelling of
//! the record stores and the chart-oriented `Duration` key of the trend
//! endpoint are accepted on input and re-emitted under their schema names.

use serde::{Deserialize, Serialize};

/// A single exercise record from the activity domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Record identifier. The record store spells this `_id`.
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    pub exercise_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Duration in minutes.
    pub duration: i64,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Input for adding or updating an exercise record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseInput {
    pub username: String,
    pub exercise_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub duration: i64,
    pub date: String,
}

/// Total duration for one exercise type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseStats {
    pub exercise_type: String,
    pub total_duration: i64,
}

/// Per-user aggregate: one entry per exercise type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub username: String,
    pub exercises: Vec<ExerciseStats>,
}

/// Per-type totals within a requested date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub exercise_type: String,
    pub total_duration: i64,
}

/// One day in the seven-day duration trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Weekday label (`"Mon"` .. `"Sun"`).
    pub name: String,
    /// Total duration for the day. The analytics backend emits the
    /// chart-oriented `Duration` key.
    #[serde(rename = "duration", alias = "Duration")]
    pub duration: i64,
    /// ISO date (`YYYY-MM-DD`).
    pub date: String,
}

/// A journal entry: one activity with its optional coach comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    pub exercise_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub duration: i64,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// Acknowledgement for a comment update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAck {
    pub ok: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exercise_accepts_record_store_id_spelling() {
        let doc = serde_json::json!({
            "_id": "65f1c0ffee",
            "username": "alice",
            "exerciseType": "Running",
            "duration": 30,
            "date": "2024-03-10",
        });

        let exercise: Exercise = serde_json::from_value(doc).unwrap();
        assert_eq!(exercise.id, "65f1c0ffee");
        assert_eq!(exercise.exercise_type, "Running");
        assert!(exercise.description.is_none());

        // Re-emitted under the schema's `id` name.
        let out = serde_json::to_value(&exercise).unwrap();
        assert_eq!(out["id"], "65f1c0ffee");
        assert!(out.get("_id").is_none());
    }

    #[test]
    fn trend_point_accepts_chart_duration_key() {
        let doc = serde_json::json!({
            "name": "Mon",
            "Duration": 45,
            "date": "2024-03-11",
        });

        let point: TrendPoint = serde_json::from_value(doc).unwrap();
        assert_eq!(point.duration, 45);

        let out = serde_json::to_value(&point).unwrap();
        assert_eq!(out["duration"], 45);
    }

    #[test]
    fn exercise_input_uses_camel_case_wire_names() {
        let input = ExerciseInput {
            username: "bob".to_string(),
            exercise_type: "Swimming".to_string(),
            description: None,
            duration: 20,
            date: "2024-03-12".to_string(),
        };

        let out = serde_json::to_value(&input).unwrap();
        assert_eq!(out["exerciseType"], "Swimming");
        assert!(out.get("description").is_none());
    }
}
