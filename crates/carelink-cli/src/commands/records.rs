use anyhow::{Context, Result};
use carelink_client::{Resource, SyncCollection};
use carelink_core::SortDirection;
use carelink_core::models::{
    Appointment, AppointmentPreset, AppointmentSortField, Evaluation, EvaluationPreset,
    EvaluationSortField, Inquiry, InquiryPreset, InquirySortField, Patient, PatientPreset,
    PatientSortField,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;

use crate::cli::{ListArgs, OutputFormat, RecordCommands, SetStatusArgs};
use crate::output::{cell, print_json, print_success, print_table};

/// How a record type is named, filtered and tabulated on the command line.
pub trait Listing: Resource + Serialize {
    const NOUN: &'static str;
    const PRESETS: &'static [(&'static str, Self::Preset)];
    const SORT_FIELDS: &'static [(&'static str, Self::SortField)];
    const HEADERS: &'static [&'static str];

    fn row(&self) -> Vec<String>;
}

pub async fn run<R>(
    collection: SyncCollection<R>,
    command: &RecordCommands,
    format: OutputFormat,
) -> Result<()>
where
    R: Listing,
    R::Status: DeserializeOwned,
{
    match command {
        RecordCommands::List(args) => list(&collection, args, format).await,
        RecordCommands::SetStatus(args) => set_status(&collection, args, format).await,
    }
}

async fn list<R>(
    collection: &SyncCollection<R>,
    args: &ListArgs,
    format: OutputFormat,
) -> Result<()>
where
    R: Listing,
    R::Status: DeserializeOwned,
{
    if let Some(text) = &args.search {
        collection.set_search_text(text.as_str());
    }
    if let Some(status) = &args.status {
        collection.set_status_filter(Some(parse_status::<R>(status)?));
    }
    if let Some(preset) = &args.preset {
        collection.set_preset(lookup(R::PRESETS, preset, "preset")?);
    }
    let direction = if args.desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    let field = match &args.sort {
        Some(name) => lookup(R::SORT_FIELDS, name, "sort field")?,
        None => collection.criteria().sort_field,
    };
    collection.set_sort(field, direction);

    collection
        .load()
        .await
        .with_context(|| format!("Failed to load {}", R::NOUN))?;
    for _ in 1..args.pages {
        if !collection.has_more() {
            break;
        }
        collection
            .load_more()
            .await
            .with_context(|| format!("Failed to load more {}", R::NOUN))?;
    }

    let visible = collection.visible();
    match format {
        OutputFormat::Json => print_json(&*visible)?,
        OutputFormat::Table => {
            print_table(
                R::HEADERS,
                visible.iter().map(Listing::row),
                &format!("No {} found.", R::NOUN),
            );
            println!(
                "{}",
                footer(
                    visible.len(),
                    collection.len(),
                    collection.criteria().is_filtering(),
                    collection.has_more(),
                )
            );
        }
    }
    Ok(())
}

async fn set_status<R>(
    collection: &SyncCollection<R>,
    args: &SetStatusArgs,
    format: OutputFormat,
) -> Result<()>
where
    R: Listing,
    R::Status: DeserializeOwned,
{
    let status = parse_status::<R>(&args.status)?;
    let record = collection
        .update_status(&args.id, status)
        .await
        .with_context(|| format!("Failed to update {} {}", R::NOUN, args.id))?;
    match format {
        OutputFormat::Json => print_json(&record)?,
        OutputFormat::Table => {
            print_success(&format!("Updated {} {}", R::NOUN, args.id));
            print_table(R::HEADERS, [record.row()], "");
        }
    }
    Ok(())
}

fn footer(shown: usize, loaded: usize, filtering: bool, more: bool) -> String {
    let mut line = format!("Showing {shown} of {loaded} loaded");
    if filtering {
        line.push_str(", filtered");
    }
    if more {
        line.push_str(" (more available, use --pages)");
    }
    line
}

/// Statuses are spelled as on the wire (`in_progress`, `no_show`); dashes
/// are accepted in place of underscores.
fn parse_status<R: Listing>(value: &str) -> Result<R::Status>
where
    R::Status: DeserializeOwned,
{
    let wire = value.trim().to_ascii_lowercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(wire))
        .with_context(|| format!("Unknown {} status: {value}", R::NOUN))
}

fn lookup<T: Copy>(table: &[(&str, T)], name: &str, what: &str) -> Result<T> {
    let key = name.trim().to_ascii_lowercase().replace('_', "-");
    if let Some((_, value)) = table.iter().find(|(k, _)| *k == key) {
        return Ok(*value);
    }
    let valid: Vec<&str> = table.iter().map(|(k, _)| *k).collect();
    anyhow::bail!("Unknown {what}: {name}. Valid values: {}", valid.join(", "))
}

fn date(value: OffsetDateTime) -> String {
    value.date().to_string()
}

fn minute(value: OffsetDateTime) -> String {
    format!("{} {:02}:{:02}", value.date(), value.hour(), value.minute())
}

impl Listing for Patient {
    const NOUN: &'static str = "patients";
    const PRESETS: &'static [(&'static str, PatientPreset)] = &[
        ("all", PatientPreset::All),
        ("active", PatientPreset::Active),
        ("needs-follow-up", PatientPreset::NeedsFollowUp),
        ("discharged", PatientPreset::Discharged),
    ];
    const SORT_FIELDS: &'static [(&'static str, PatientSortField)] = &[
        ("name", PatientSortField::Name),
        ("created-at", PatientSortField::CreatedAt),
        ("last-visit", PatientSortField::LastVisit),
        ("status", PatientSortField::Status),
    ];
    const HEADERS: &'static [&'static str] = &["ID", "Name", "Status", "Condition", "Last Visit"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.full_name(),
            self.status.as_str().to_string(),
            cell(self.primary_condition.as_deref()),
            self.last_visit_at.map(date).unwrap_or_else(|| "-".into()),
        ]
    }
}

impl Listing for Inquiry {
    const NOUN: &'static str = "inquiries";
    const PRESETS: &'static [(&'static str, InquiryPreset)] = &[
        ("all", InquiryPreset::All),
        ("high-priority", InquiryPreset::HighPriority),
        ("needs-contact", InquiryPreset::NeedsContact),
        ("converted", InquiryPreset::Converted),
    ];
    const SORT_FIELDS: &'static [(&'static str, InquirySortField)] = &[
        ("created-at", InquirySortField::CreatedAt),
        ("urgency", InquirySortField::Urgency),
        ("name", InquirySortField::Name),
        ("status", InquirySortField::Status),
    ];
    const HEADERS: &'static [&'static str] =
        &["ID", "Name", "Status", "Urgency", "Attempts", "Received"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.full_name(),
            self.status.as_str().to_string(),
            self.urgency.as_str().to_string(),
            self.contact_attempts.count().to_string(),
            date(self.created_at),
        ]
    }
}

impl Listing for Evaluation {
    const NOUN: &'static str = "evaluations";
    const PRESETS: &'static [(&'static str, EvaluationPreset)] = &[
        ("all", EvaluationPreset::All),
        ("pending", EvaluationPreset::Pending),
        ("completed", EvaluationPreset::Completed),
    ];
    const SORT_FIELDS: &'static [(&'static str, EvaluationSortField)] = &[
        ("scheduled-at", EvaluationSortField::ScheduledAt),
        ("patient-name", EvaluationSortField::PatientName),
        ("status", EvaluationSortField::Status),
        ("created-at", EvaluationSortField::CreatedAt),
    ];
    const HEADERS: &'static [&'static str] =
        &["ID", "Patient", "Type", "Status", "Clinician", "Scheduled"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.patient_name.clone(),
            self.evaluation_type.clone(),
            self.status.as_str().to_string(),
            cell(self.clinician_name.as_deref()),
            self.scheduled_at.map(minute).unwrap_or_else(|| "-".into()),
        ]
    }
}

impl Listing for Appointment {
    const NOUN: &'static str = "appointments";
    const PRESETS: &'static [(&'static str, AppointmentPreset)] = &[
        ("all", AppointmentPreset::All),
        ("open", AppointmentPreset::Open),
        ("completed", AppointmentPreset::Completed),
        ("missed", AppointmentPreset::Missed),
    ];
    const SORT_FIELDS: &'static [(&'static str, AppointmentSortField)] = &[
        ("start-time", AppointmentSortField::StartTime),
        ("patient-name", AppointmentSortField::PatientName),
        ("status", AppointmentSortField::Status),
    ];
    const HEADERS: &'static [&'static str] =
        &["ID", "Patient", "Type", "Status", "Start", "Minutes", "Location"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.patient_name.clone(),
            self.appointment_type.clone(),
            self.status.as_str().to_string(),
            minute(self.start_time),
            self.duration_minutes.to_string(),
            cell(self.location.as_deref()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelink_core::models::{AppointmentStatus, EvaluationStatus, InquiryStatus};

    #[test]
    fn test_parse_status_uses_wire_names() {
        assert_eq!(parse_status::<Inquiry>("contacted").unwrap(), InquiryStatus::Contacted);
        assert_eq!(
            parse_status::<Evaluation>("In-Progress").unwrap(),
            EvaluationStatus::InProgress
        );
        assert_eq!(
            parse_status::<Appointment>("no_show").unwrap(),
            AppointmentStatus::NoShow
        );
        let err = parse_status::<Inquiry>("archived").unwrap_err();
        assert!(err.to_string().contains("Unknown inquiries status"));
    }

    #[test]
    fn test_lookup_lists_valid_values() {
        assert_eq!(
            lookup(Inquiry::PRESETS, "HIGH_PRIORITY", "preset").unwrap(),
            InquiryPreset::HighPriority
        );
        let err = lookup(Patient::SORT_FIELDS, "age", "sort field").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown sort field: age. Valid values: name, created-at, last-visit, status"
        );
    }

    #[test]
    fn test_footer_marks_filtered_and_partial_lists() {
        assert_eq!(footer(3, 3, false, false), "Showing 3 of 3 loaded");
        assert_eq!(
            footer(1, 20, true, true),
            "Showing 1 of 20 loaded, filtered (more available, use --pages)"
        );
    }

    #[test]
    fn test_every_preset_and_sort_field_is_named() {
        assert_eq!(Patient::PRESETS.len(), 4);
        assert_eq!(Inquiry::SORT_FIELDS.len(), 4);
        assert_eq!(Evaluation::PRESETS.len(), 3);
        assert_eq!(Appointment::SORT_FIELDS.len(), 3);
    }

    #[test]
    fn test_rows_match_headers() {
        let inquiry: Inquiry = serde_json::from_value(serde_json::json!({
            "id": "i-1",
            "firstName": "Lena",
            "lastName": "Ortiz",
            "status": "new",
            "urgency": "high",
            "createdAt": "2024-03-01T09:00:00Z"
        }))
        .unwrap();
        let row = inquiry.row();
        assert_eq!(row.len(), Inquiry::HEADERS.len());
        assert_eq!(row[1], "Lena Ortiz");
        assert_eq!(row[3], "high");
        assert_eq!(row[5], "2024-03-01");
    }
}
