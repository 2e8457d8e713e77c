use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::record::{Record, compare_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    Active,
    Inactive,
    Discharged,
}

impl PatientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Discharged => "discharged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// ISO date (`YYYY-MM-DD`) as sent by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_condition: Option<String>,
    pub status: PatientStatus,
    #[serde(default)]
    pub needs_follow_up: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_visit_at: Option<OffsetDateTime>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PatientPreset {
    #[default]
    All,
    Active,
    NeedsFollowUp,
    Discharged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PatientSortField {
    #[default]
    Name,
    CreatedAt,
    LastVisit,
    Status,
}

impl Record for Patient {
    type Status = PatientStatus;
    type Preset = PatientPreset;
    type SortField = PatientSortField;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> PatientStatus {
        self.status
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.first_name.as_str(), self.last_name.as_str()];
        fields.extend(
            [&self.email, &self.phone, &self.primary_condition]
                .into_iter()
                .filter_map(|f| f.as_deref()),
        );
        fields
    }

    fn matches_preset(&self, preset: PatientPreset) -> bool {
        match preset {
            PatientPreset::All => true,
            PatientPreset::Active => self.status == PatientStatus::Active,
            PatientPreset::NeedsFollowUp => {
                self.needs_follow_up && self.status != PatientStatus::Discharged
            }
            PatientPreset::Discharged => self.status == PatientStatus::Discharged,
        }
    }

    fn compare_by(&self, other: &Self, field: PatientSortField) -> Ordering {
        match field {
            PatientSortField::Name => compare_text(&self.last_name, &other.last_name)
                .then_with(|| compare_text(&self.first_name, &other.first_name)),
            PatientSortField::CreatedAt => self.created_at.cmp(&other.created_at),
            // Never-seen patients sort before everyone else.
            PatientSortField::LastVisit => self.last_visit_at.cmp(&other.last_visit_at),
            PatientSortField::Status => self.status.cmp(&other.status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_condition: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_follow_up: Option<bool>,
}

/// A file attached to a patient's chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDocument {
    pub id: String,
    #[serde(alias = "filename")]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub uploaded_at: Option<OffsetDateTime>,
}
