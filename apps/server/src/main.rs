//! clubfeed server: serves the published club collection as an RPDE feed.

use std::path::PathBuf;

use clap::Parser;
use clubfeed_shared::{AppConfig, FeedConfig, load_config, load_config_from};
use color_eyre::eyre::Result;
use tracing::info;

/// clubfeed server: the opportunities file over HTTP.
#[derive(Parser)]
#[command(name = "clubfeed-server", version, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.clubfeed/clubfeed.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory holding the opportunities file.
    #[arg(long, env = "RELATIVE_FILEPATH_OPPORTUNITIES")]
    opportunities_dir: Option<String>,

    /// Opportunities file name.
    #[arg(long, env = "FILENAME_OPPORTUNITIES")]
    opportunities_file: Option<String>,

    /// Interface to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Public base URL used in `next` links.
    #[arg(long, env = "CLUBFEED_BASE_URL")]
    base_url: Option<String>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// File config (or defaults), then CLI flags and environment on top.
    fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)?,
            None => load_config()?,
        };

        if self.opportunities_dir.is_some() {
            config.paths.opportunities_dir.clone_from(&self.opportunities_dir);
        }
        if self.opportunities_file.is_some() {
            config.paths.opportunities_file.clone_from(&self.opportunities_file);
        }
        if let Some(host) = &self.host {
            config.feed.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.feed.port = port;
        }
        if self.base_url.is_some() {
            config.feed.base_url.clone_from(&self.base_url);
        }

        Ok(config)
    }
}

fn init_tracing(cli: &Cli) {
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

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = FeedConfig::resolve(&cli.resolve_config()?)?;
    info!(
        host = %config.host,
        port = config.port,
        base_url = config.base_url.as_deref().unwrap_or("<from request>"),
        "starting feed server"
    );

    clubfeed_feed::serve(&config).await?;
    Ok(())
}
