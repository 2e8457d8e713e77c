use anyhow::{Context, Result};
use carelink_client::DashboardAggregator;
use carelink_core::models::DashboardSummary;
use colored::Colorize;

use crate::cli::{DashboardArgs, OutputFormat};
use crate::output::{print_field, print_json, print_success, print_table};

pub async fn show(
    dashboard: &DashboardAggregator,
    args: &DashboardArgs,
    format: OutputFormat,
) -> Result<()> {
    dashboard.load().await.context("Failed to load dashboard")?;

    if let Some(task_id) = &args.complete_task {
        dashboard
            .mark_task_complete(task_id)
            .await
            .with_context(|| format!("Failed to complete task {task_id}"))?;
        print_success(&format!("Task {task_id} marked complete"));
    }
    if let Some(alert_id) = &args.read_alert {
        dashboard
            .mark_alert_read(alert_id)
            .await
            .with_context(|| format!("Failed to mark alert {alert_id} read"))?;
        print_success(&format!("Alert {alert_id} marked read"));
    }

    let summary = dashboard.load().await?;
    match format {
        OutputFormat::Json => print_json(&*summary)?,
        OutputFormat::Table => print_summary(&summary),
    }
    Ok(())
}

fn print_summary(summary: &DashboardSummary) {
    let stats = &summary.stats;
    print_field(
        "Patients",
        &format!("{} ({} active)", stats.total_patients, stats.active_patients),
    );
    print_field("New inquiries", &stats.new_inquiries.to_string());
    print_field("Today's appointments", &stats.todays_appointments.to_string());
    print_field("Pending evaluations", &stats.pending_evaluations.to_string());

    println!();
    println!("{} ({} open)", "Tasks".bold(), summary.open_task_count());
    print_table(
        &["ID", "Task", "Priority", "Done"],
        summary.tasks.iter().map(|t| {
            vec![
                t.id.clone(),
                t.title.clone(),
                format!("{:?}", t.priority).to_lowercase(),
                if t.completed { "✓".into() } else { String::new() },
            ]
        }),
        "No tasks.",
    );

    println!();
    println!("{} ({} unread)", "Alerts".bold(), summary.unread_alert_count());
    print_table(
        &["ID", "Alert", "Severity", "Read"],
        summary.alerts.iter().map(|a| {
            vec![
                a.id.clone(),
                a.title.clone(),
                format!("{:?}", a.severity).to_lowercase(),
                if a.read { "✓".into() } else { String::new() },
            ]
        }),
        "No alerts.",
    );
}
