use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::record::{Record, compare_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    New,
    Contacted,
    Scheduled,
    Converted,
    Closed,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Scheduled => "scheduled",
            Self::Converted => "converted",
            Self::Closed => "closed",
        }
    }
}

/// Ordered from least to most pressing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethod {
    Phone,
    Email,
    Sms,
    InPerson,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAttempt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub method: ContactMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub attempted_at: OffsetDateTime,
}

/// Contact attempts as delivered by the backend.
///
/// Depending on the caller's privileges the field arrives either as a bare
/// count or as the full list of attempts. Downstream code reads
/// [`count`](Self::count) and [`items`](Self::items) and never needs to know
/// which variant arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContactAttempts {
    Count(u32),
    List(Vec<ContactAttempt>),
}

impl Default for ContactAttempts {
    fn default() -> Self {
        Self::Count(0)
    }
}

impl ContactAttempts {
    pub fn count(&self) -> usize {
        match self {
            Self::Count(n) => *n as usize,
            Self::List(items) => items.len(),
        }
    }

    /// Attempt records; empty for the count-only variant.
    pub fn items(&self) -> &[ContactAttempt] {
        match self {
            Self::Count(_) => &[],
            Self::List(items) => items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub status: InquiryStatus,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub contact_attempts: ContactAttempts,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Inquiry {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    #[cfg(test)]
    pub(crate) fn sample(id: &str, name: &str, urgency: Urgency) -> Self {
        let mut parts = name.splitn(2, ' ');
        Self {
            id: id.to_string(),
            first_name: parts.next().unwrap_or_default().to_string(),
            last_name: parts.next().unwrap_or_default().to_string(),
            email: None,
            phone: None,
            message: None,
            source: None,
            status: InquiryStatus::New,
            urgency,
            contact_attempts: ContactAttempts::default(),
            created_at: time::macros::datetime!(2024-03-01 09:00 UTC),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InquiryPreset {
    #[default]
    All,
    /// High or urgent inquiries.
    HighPriority,
    /// New inquiries nobody has reached out to yet.
    NeedsContact,
    Converted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InquirySortField {
    #[default]
    CreatedAt,
    Urgency,
    Name,
    Status,
}

impl Record for Inquiry {
    type Status = InquiryStatus;
    type Preset = InquiryPreset;
    type SortField = InquirySortField;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> InquiryStatus {
        self.status
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.first_name.as_str(), self.last_name.as_str()];
        fields.extend(
            [&self.email, &self.phone, &self.message]
                .into_iter()
                .filter_map(|f| f.as_deref()),
        );
        fields
    }

    fn matches_preset(&self, preset: InquiryPreset) -> bool {
        match preset {
            InquiryPreset::All => true,
            InquiryPreset::HighPriority => self.urgency >= Urgency::High,
            InquiryPreset::NeedsContact => {
                self.status == InquiryStatus::New && self.contact_attempts.count() == 0
            }
            InquiryPreset::Converted => self.status == InquiryStatus::Converted,
        }
    }

    fn compare_by(&self, other: &Self, field: InquirySortField) -> Ordering {
        match field {
            InquirySortField::CreatedAt => self.created_at.cmp(&other.created_at),
            InquirySortField::Urgency => self.urgency.cmp(&other.urgency),
            InquirySortField::Name => compare_text(&self.last_name, &other.last_name)
                .then_with(|| compare_text(&self.first_name, &other.first_name)),
            InquirySortField::Status => self.status.cmp(&other.status),
        }
    }
}

/// Body of `POST /inquiries`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInquiryRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub urgency: Urgency,
}

/// Body of `PUT /inquiries/{id}`; absent fields are left unchanged server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInquiryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
}

/// Body of `POST /inquiries/{id}/contact-attempts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogContactAttemptRequest {
    pub method: ContactMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inquiry_json(attempts: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "inq-1",
            "firstName": "Mary",
            "lastName": "Major",
            "status": "new",
            "urgency": "high",
            "contactAttempts": attempts,
            "createdAt": "2024-03-01T09:00:00Z"
        })
    }

    #[test]
    fn test_contact_attempts_as_count() {
        let inquiry: Inquiry = serde_json::from_value(inquiry_json(json!(3))).unwrap();
        assert_eq!(inquiry.contact_attempts.count(), 3);
        assert!(inquiry.contact_attempts.items().is_empty());
    }

    #[test]
    fn test_contact_attempts_as_list() {
        let inquiry: Inquiry = serde_json::from_value(inquiry_json(json!([
            { "method": "phone", "outcome": "voicemail", "attemptedAt": "2024-03-02T10:00:00Z" },
            { "method": "carrier_pigeon", "attemptedAt": "2024-03-03T10:00:00Z" }
        ])))
        .unwrap();
        assert_eq!(inquiry.contact_attempts.count(), 2);
        assert_eq!(inquiry.contact_attempts.items()[0].method, ContactMethod::Phone);
        assert_eq!(inquiry.contact_attempts.items()[1].method, ContactMethod::Other);
    }

    #[test]
    fn test_contact_attempts_absent_defaults_to_zero() {
        let mut value = inquiry_json(json!(0));
        value.as_object_mut().unwrap().remove("contactAttempts");
        let inquiry: Inquiry = serde_json::from_value(value).unwrap();
        assert_eq!(inquiry.contact_attempts, ContactAttempts::Count(0));
        assert!(inquiry.matches_preset(InquiryPreset::NeedsContact));
    }

    #[test]
    fn test_update_request_skips_unset_fields() {
        let body = serde_json::to_value(UpdateInquiryRequest {
            urgency: Some(Urgency::Urgent),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, json!({ "urgency": "urgent" }));
    }
}
