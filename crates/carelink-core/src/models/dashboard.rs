//! Dashboard aggregate.
//!
//! The aggregate is an immutable value. Changing one task or alert produces
//! a new aggregate via the `with_*` methods, so holders can detect the change
//! by identity as well as by equality.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::appointment::Appointment;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_patients: u32,
    #[serde(default)]
    pub active_patients: u32,
    #[serde(default)]
    pub new_inquiries: u32,
    #[serde(default)]
    pub todays_appointments: u32,
    #[serde(default)]
    pub pending_evaluations: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_at: Option<OffsetDateTime>,
}

impl DashboardTask {
    pub fn with_completed(&self, completed: bool) -> Self {
        Self {
            completed,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    #[default]
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAlert {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub severity: AlertSeverity,
    #[serde(default)]
    pub read: bool,
}

impl DashboardAlert {
    pub fn with_read(&self, read: bool) -> Self {
        Self {
            read,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[serde(default)]
    pub stats: DashboardStats,
    #[serde(default)]
    pub tasks: Vec<DashboardTask>,
    #[serde(default)]
    pub alerts: Vec<DashboardAlert>,
    #[serde(default)]
    pub upcoming_appointments: Vec<Appointment>,
}

impl DashboardSummary {
    /// Copy of this summary with exactly one task replaced.
    ///
    /// Returns `None` when no task has the given id.
    pub fn with_task(
        &self,
        task_id: &str,
        f: impl FnOnce(&DashboardTask) -> DashboardTask,
    ) -> Option<Self> {
        let index = self.tasks.iter().position(|t| t.id == task_id)?;
        let mut tasks = self.tasks.clone();
        tasks[index] = f(&self.tasks[index]);
        Some(Self {
            tasks,
            ..self.clone()
        })
    }

    /// Copy of this summary with exactly one alert replaced.
    pub fn with_alert(
        &self,
        alert_id: &str,
        f: impl FnOnce(&DashboardAlert) -> DashboardAlert,
    ) -> Option<Self> {
        let index = self.alerts.iter().position(|a| a.id == alert_id)?;
        let mut alerts = self.alerts.clone();
        alerts[index] = f(&self.alerts[index]);
        Some(Self {
            alerts,
            ..self.clone()
        })
    }

    pub fn open_task_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    pub fn unread_alert_count(&self) -> usize {
        self.alerts.iter().filter(|a| !a.read).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary() -> DashboardSummary {
        serde_json::from_value(json!({
            "stats": { "totalPatients": 12, "newInquiries": 3 },
            "tasks": [
                { "id": "t-1", "title": "Call back Mrs. Chen" },
                { "id": "t-2", "title": "Sign evaluation", "priority": "high" }
            ],
            "alerts": [
                { "id": "al-1", "title": "Insurance expired", "severity": "warning" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_with_task_rebuilds_only_the_target() {
        let original = summary();
        let updated = original
            .with_task("t-2", |t| t.with_completed(true))
            .unwrap();

        assert!(updated.tasks[1].completed);
        assert_eq!(updated.tasks[0], original.tasks[0]);
        assert_eq!(updated.alerts, original.alerts);
        assert!(!original.tasks[1].completed);
        assert_eq!(updated.open_task_count(), 1);
    }

    #[test]
    fn test_with_alert_unknown_id() {
        let original = summary();
        assert!(original.with_alert("missing", |a| a.with_read(true)).is_none());
        let read = original.with_alert("al-1", |a| a.with_read(true)).unwrap();
        assert_eq!(read.unread_alert_count(), 0);
        assert_eq!(original.unread_alert_count(), 1);
    }

    #[test]
    fn test_stats_defaults() {
        let s = summary();
        assert_eq!(s.stats.total_patients, 12);
        assert_eq!(s.stats.pending_evaluations, 0);
        assert!(s.upcoming_appointments.is_empty());
    }
}
