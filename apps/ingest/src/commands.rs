//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use clubfeed_core::{IngestSummary, ProgressReporter, RowFailure};
use clubfeed_shared::{
    AppConfig, EmptySheetPolicy, IngestConfig, init_config, load_config, load_config_from,
};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// clubfeed ingest: publish verified club registrations as OpenActive data.
#[derive(Parser)]
#[command(
    name = "clubfeed-ingest",
    version,
    about = "Map verified club form responses into an OpenActive opportunities file.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.clubfeed/clubfeed.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub paths: PathArgs,

    /// What to do with a spreadsheet that returns no rows.
    #[arg(long, global = true)]
    pub empty_sheets: Option<EmptySheets>,

    /// Defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum EmptySheets {
    Skip,
    Abort,
}

impl From<EmptySheets> for EmptySheetPolicy {
    fn from(value: EmptySheets) -> Self {
        match value {
            EmptySheets::Skip => EmptySheetPolicy::Skip,
            EmptySheets::Abort => EmptySheetPolicy::Abort,
        }
    }
}

/// Input and output locations. Each overrides its `[paths]` entry.
#[derive(Args, Debug, Default)]
pub(crate) struct PathArgs {
    /// Directory holding the service-account key.
    #[arg(long, env = "RELATIVE_FILEPATH_KEY", global = true)]
    pub key_dir: Option<String>,

    /// Service-account key file name.
    #[arg(long, env = "FILENAME_KEY", global = true)]
    pub key_file: Option<String>,

    /// Directory holding the spreadsheet id list.
    #[arg(long, env = "RELATIVE_FILEPATH_SPREADSHEET_IDS", global = true)]
    pub spreadsheet_ids_dir: Option<String>,

    /// Spreadsheet id list file name.
    #[arg(long, env = "FILENAME_SPREADSHEET_IDS", global = true)]
    pub spreadsheet_ids_file: Option<String>,

    /// Directory the opportunities file is written to.
    #[arg(long, env = "RELATIVE_FILEPATH_OPPORTUNITIES", global = true)]
    pub opportunities_dir: Option<String>,

    /// Opportunities file name.
    #[arg(long, env = "FILENAME_OPPORTUNITIES", global = true)]
    pub opportunities_file: Option<String>,
}

impl PathArgs {
    fn apply(&self, config: &mut AppConfig) {
        let paths = &mut config.paths;
        for (arg, slot) in [
            (&self.key_dir, &mut paths.key_dir),
            (&self.key_file, &mut paths.key_file),
            (&self.spreadsheet_ids_dir, &mut paths.spreadsheet_ids_dir),
            (&self.spreadsheet_ids_file, &mut paths.spreadsheet_ids_file),
            (&self.opportunities_dir, &mut paths.opportunities_dir),
            (&self.opportunities_file, &mut paths.opportunities_file),
        ] {
            if arg.is_some() {
                slot.clone_from(arg);
            }
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the ingestion pipeline once.
    Run,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "clubfeed=info",
        1 => "clubfeed=debug",
        _ => "clubfeed=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        None | Some(Command::Run) => cmd_run(&cli).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&cli),
        },
    }
}

/// File config (or defaults), then CLI flags and environment on top.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    cli.paths.apply(&mut config);
    if let Some(policy) = cli.empty_sheets {
        config.mapping.empty_sheet_policy = policy.into();
    }
    Ok(config)
}

async fn cmd_run(cli: &Cli) -> Result<()> {
    let config = IngestConfig::resolve(&resolve_config(cli)?)?;

    info!(
        spreadsheet_ids = %config.spreadsheet_ids_path.display(),
        artifact = %config.opportunities_path.display(),
        "running ingest"
    );

    let reporter = CliProgress::new();
    let summary = match clubfeed_core::ingest(&config, &reporter).await {
        Ok(summary) => summary,
        Err(e) => {
            reporter.spinner.finish_and_clear();
            error!(error = %e, "ingest failed, artifact left unchanged");
            return Err(e.into());
        }
    };

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &IngestSummary) {
    println!();
    println!("  Ingest complete.");
    println!("  Spreadsheets: {}", summary.spreadsheets);
    if summary.sheets_skipped > 0 {
        println!("  Skipped:      {} (no rows)", summary.sheets_skipped);
    }
    println!("  Rows:         {}", summary.rows_seen);
    println!("  Unverified:   {}", summary.rows_unverified);
    println!("  Failed:       {}", summary.failures.len());
    println!("  Records:      {}", summary.records);
    println!(
        "  Artifact:     {}{}",
        summary.artifact_path.display(),
        if summary.changed { "" } else { " (unchanged)" }
    );
    println!("  Time:         {:.1}s", summary.elapsed.as_secs_f64());

    if !summary.failures.is_empty() {
        println!();
        println!("  Failed rows:");
        for failure in &summary.failures {
            println!(
                "    {} row {}: {}",
                failure.spreadsheet_id, failure.row_number, failure.reason
            );
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn sheet_started(&self, spreadsheet_id: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Mapping [{current}/{total}] {spreadsheet_id}"));
    }

    fn row_failed(&self, failure: &RowFailure) {
        self.spinner.println(format!(
            "  ! {} row {}: {}",
            failure.spreadsheet_id, failure.row_number, failure.reason
        ));
    }

    fn done(&self, _summary: &IngestSummary) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_is_the_default_command() {
        let cli = Cli::try_parse_from(["clubfeed-ingest"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn path_flags_override_file_config() {
        let cli = Cli::try_parse_from([
            "clubfeed-ingest",
            "run",
            "--key-dir",
            "secrets",
            "--key-file",
            "key.json",
            "--opportunities-file",
            "clubs.json",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        config.paths.key_file = Some("old.json".into());
        config.paths.opportunities_dir = Some("data".into());
        cli.paths.apply(&mut config);

        assert_eq!(config.paths.key_dir.as_deref(), Some("secrets"));
        assert_eq!(config.paths.key_file.as_deref(), Some("key.json"));
        assert_eq!(config.paths.opportunities_dir.as_deref(), Some("data"));
        assert_eq!(config.paths.opportunities_file.as_deref(), Some("clubs.json"));
    }

    #[test]
    fn empty_sheet_flag_sets_policy() {
        let cli = Cli::try_parse_from(["clubfeed-ingest", "--empty-sheets", "abort"]).unwrap();
        let policy: EmptySheetPolicy = cli.empty_sheets.unwrap().into();
        assert_eq!(policy, EmptySheetPolicy::Abort);
    }
}
