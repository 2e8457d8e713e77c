use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::record::{Record, compare_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl EvaluationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub evaluation_type: String,
    pub status: EvaluationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinician_name: Option<String>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EvaluationPreset {
    #[default]
    All,
    /// Scheduled or in progress.
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EvaluationSortField {
    #[default]
    ScheduledAt,
    PatientName,
    Status,
    CreatedAt,
}

impl Record for Evaluation {
    type Status = EvaluationStatus;
    type Preset = EvaluationPreset;
    type SortField = EvaluationSortField;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> EvaluationStatus {
        self.status
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.patient_name.as_str(), self.evaluation_type.as_str()];
        fields.extend(
            [&self.clinician_name, &self.notes]
                .into_iter()
                .filter_map(|f| f.as_deref()),
        );
        fields
    }

    fn matches_preset(&self, preset: EvaluationPreset) -> bool {
        match preset {
            EvaluationPreset::All => true,
            EvaluationPreset::Pending => matches!(
                self.status,
                EvaluationStatus::Scheduled | EvaluationStatus::InProgress
            ),
            EvaluationPreset::Completed => self.status == EvaluationStatus::Completed,
        }
    }

    fn compare_by(&self, other: &Self, field: EvaluationSortField) -> Ordering {
        match field {
            EvaluationSortField::ScheduledAt => self.scheduled_at.cmp(&other.scheduled_at),
            EvaluationSortField::PatientName => {
                compare_text(&self.patient_name, &other.patient_name)
            }
            EvaluationSortField::Status => self.status.cmp(&other.status),
            EvaluationSortField::CreatedAt => self.created_at.cmp(&other.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvaluationRequest {
    pub patient_id: String,
    pub evaluation_type: String,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_at: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvaluationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_type: Option<String>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_at: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pending_preset_and_search() {
        let eval: Evaluation = serde_json::from_value(json!({
            "id": "ev-1",
            "patientId": "p-1",
            "patientName": "Jane Doe",
            "evaluationType": "Initial Assessment",
            "status": "in_progress",
            "clinicianName": "Dr. Rivera",
            "createdAt": "2024-04-01T12:00:00Z"
        }))
        .unwrap();
        assert!(eval.matches_preset(EvaluationPreset::Pending));
        assert!(!eval.matches_preset(EvaluationPreset::Completed));
        assert!(eval.search_fields().contains(&"Dr. Rivera"));
    }
}
