use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "carelink")]
#[command(about = "CareLink CLI: patients, inquiries and schedules from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL (overrides config and CARELINK_URL env var)
    #[arg(short, long, global = true, env = "CARELINK_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "CARELINK_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Client settings file (defaults to ./carelink.toml when present)
    #[arg(long, global = true, env = "CARELINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter for this run, e.g. `debug` or `carelink_client=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq, Debug)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password, or with the biometric token
    Login(LoginArgs),
    /// Sign out and erase the stored session
    Logout,
    /// Show the signed-in provider
    Whoami,
    /// Manage biometric sign-in
    Biometrics(BiometricsArgs),
    /// Patient charts
    Patients(RecordArgs),
    /// Prospective patient inquiries
    Inquiries(RecordArgs),
    /// Clinical evaluations
    Evaluations(RecordArgs),
    /// Scheduled appointments
    Appointments(RecordArgs),
    /// Show the dashboard summary
    Dashboard(DashboardArgs),
    /// Attach a document to a patient's chart
    Upload(UploadArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long)]
    pub email: Option<String>,
    /// Account password
    #[arg(long, env = "CARELINK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Sign in with the token stored by `biometrics enable`
    #[arg(long, conflicts_with = "email")]
    pub biometric: bool,
}

#[derive(clap::Args)]
pub struct BiometricsArgs {
    #[command(subcommand)]
    pub command: BiometricsCommands,
}

#[derive(Subcommand)]
pub enum BiometricsCommands {
    /// Keep a biometric-protected copy of the current session
    Enable,
    /// Erase the biometric-protected copy
    Disable,
}

#[derive(clap::Args)]
pub struct RecordArgs {
    #[command(subcommand)]
    pub command: RecordCommands,
}

#[derive(Subcommand)]
pub enum RecordCommands {
    /// List records, newest server state first
    List(ListArgs),
    /// Change a record's workflow status
    SetStatus(SetStatusArgs),
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Case-insensitive text search
    #[arg(long)]
    pub search: Option<String>,
    /// Only show records with this status (e.g. new, in_progress)
    #[arg(long)]
    pub status: Option<String>,
    /// Quick filter (e.g. high-priority, needs-contact)
    #[arg(long)]
    pub preset: Option<String>,
    /// Sort field (e.g. name, created-at)
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort descending
    #[arg(long)]
    pub desc: bool,
    /// Number of pages to fetch
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,
}

#[derive(clap::Args)]
pub struct SetStatusArgs {
    /// Record id
    pub id: String,
    /// New status (e.g. contacted, completed)
    pub status: String,
}

#[derive(clap::Args)]
pub struct DashboardArgs {
    /// Mark a task complete before showing the summary
    #[arg(long, value_name = "ID")]
    pub complete_task: Option<String>,
    /// Mark an alert read before showing the summary
    #[arg(long, value_name = "ID")]
    pub read_alert: Option<String>,
}

#[derive(clap::Args)]
pub struct UploadArgs {
    /// Patient id
    pub patient_id: String,
    /// Path of the file to upload
    pub file: PathBuf,
    /// Extra form fields as key=value pairs (e.g. category=intake)
    #[arg(long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, format)
    pub key: String,
    /// Value
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_flags() {
        let cli = Cli::try_parse_from([
            "carelink", "inquiries", "list", "--preset", "high-priority", "--desc", "--pages", "3",
        ])
        .unwrap();
        let Commands::Inquiries(RecordArgs {
            command: RecordCommands::List(args),
        }) = cli.command
        else {
            panic!("expected inquiries list");
        };
        assert_eq!(args.preset.as_deref(), Some("high-priority"));
        assert!(args.desc);
        assert_eq!(args.pages, 3);
        assert_eq!(cli.profile, "default");
    }

    #[test]
    fn test_biometric_login_rejects_email() {
        let result = Cli::try_parse_from([
            "carelink",
            "login",
            "--biometric",
            "--email",
            "dr@clinic.example",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_pages_rejected() {
        let result = Cli::try_parse_from(["carelink", "patients", "list", "--pages", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_level_is_global() {
        let cli = Cli::try_parse_from(["carelink", "whoami", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));

        let cli = Cli::try_parse_from(["carelink", "whoami"]).unwrap();
        assert_eq!(cli.log_level, None);
    }

    #[test]
    fn test_output_format_from_config_value() {
        assert_eq!(OutputFormat::parse("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }
}
