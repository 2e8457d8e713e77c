use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::record::{Record, compare_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::CheckedIn => "checked_in",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }

    /// Still expected to happen.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed | Self::CheckedIn)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    pub appointment_type: String,
    pub status: AppointmentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_duration() -> u32 {
    30
}

impl Appointment {
    pub fn end_time(&self) -> OffsetDateTime {
        self.start_time + time::Duration::minutes(i64::from(self.duration_minutes))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AppointmentPreset {
    #[default]
    All,
    /// Scheduled, confirmed or checked in.
    Open,
    Completed,
    /// Cancelled or no-show.
    Missed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AppointmentSortField {
    #[default]
    StartTime,
    PatientName,
    Status,
}

impl Record for Appointment {
    type Status = AppointmentStatus;
    type Preset = AppointmentPreset;
    type SortField = AppointmentSortField;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> AppointmentStatus {
        self.status
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.patient_name.as_str(), self.appointment_type.as_str()];
        fields.extend(
            [&self.provider_name, &self.location, &self.notes]
                .into_iter()
                .filter_map(|f| f.as_deref()),
        );
        fields
    }

    fn matches_preset(&self, preset: AppointmentPreset) -> bool {
        match preset {
            AppointmentPreset::All => true,
            AppointmentPreset::Open => self.status.is_open(),
            AppointmentPreset::Completed => self.status == AppointmentStatus::Completed,
            AppointmentPreset::Missed => matches!(
                self.status,
                AppointmentStatus::Cancelled | AppointmentStatus::NoShow
            ),
        }
    }

    fn compare_by(&self, other: &Self, field: AppointmentSortField) -> Ordering {
        match field {
            AppointmentSortField::StartTime => self.start_time.cmp(&other.start_time),
            AppointmentSortField::PatientName => {
                compare_text(&self.patient_name, &other.patient_name)
            }
            AppointmentSortField::Status => self.status.cmp(&other.status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient_id: String,
    pub appointment_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
