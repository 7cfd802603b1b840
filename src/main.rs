use anyhow::Context;
use clap::Parser;
use fbusage::client::FlashbladeClient;
use fbusage::collectors::UsageCollector;
use fbusage::config::Config;
use fbusage::report::{OutputFormat, UsageReport};
use log::{error, info, warn};
use std::path::PathBuf;

/// Command-line arguments for the FlashBlade usage collector
#[derive(Parser, Debug)]
#[command(
    name = "fbusage",
    about = "Collect per-filesystem group and user usage from a FlashBlade array",
    long_about = "Lists the file systems of a FlashBlade array, keeps those whose name matches \
                  a regular expression and prints their group and user quota usage. Each \
                  matching file system costs two REST calls, so narrow the filter on large arrays."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,

    /// Array management address, overrides flashblade.endpoint
    #[arg(long, value_name = "HOST")]
    endpoint: Option<String>,

    /// API token, overrides flashblade.api_token
    #[arg(long, value_name = "TOKEN", env = "FB_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Only query file systems whose name matches this regex
    #[arg(long = "filesystem-filter-regexp", value_name = "REGEX")]
    filesystem_filter: Option<String>,

    /// Treat an invalid filter regex as matching nothing instead of failing
    #[arg(long)]
    legacy_filter: bool,

    /// Accept invalid TLS certificates from the array
    #[arg(long)]
    insecure: bool,

    /// Output format, overrides usage.format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// # Returns
    ///
    /// `Ok(())` if all arguments are valid, `Err(String)` with error message otherwise
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files fall back to defaults in Config::load
            if config_path.exists() && !config_path.is_file() {
                return Err(format!(
                    "Configuration path is not a file: {}",
                    config_path.display()
                ));
            }

            if let Some(extension) = config_path.extension() {
                if extension != "toml" {
                    warn!(
                        "Configuration file does not have .toml extension: {}",
                        config_path.display()
                    );
                }
            }
        }

        if let Some(ref endpoint) = self.endpoint {
            if endpoint.trim().is_empty() {
                return Err("--endpoint must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Apply command-line overrides on top of the loaded configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(ref endpoint) = self.endpoint {
            config.flashblade.endpoint = endpoint.trim().to_string();
        }
        if let Some(ref api_token) = self.api_token {
            config.flashblade.api_token = Some(api_token.clone());
        }
        if let Some(ref filter) = self.filesystem_filter {
            config.usage.filesystem_filter = filter.clone();
        }
        if self.legacy_filter {
            config.usage.legacy_filter = true;
        }
        if self.insecure {
            config.flashblade.insecure = true;
        }
        if let Some(format) = self.format {
            config.usage.format = format;
        }
    }
}

/// Log in, collect, print, log out
///
/// A partial collection is printed before its error is returned.
async fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;
    config
        .validate_connection()
        .context("Incomplete connection settings")?;

    let mut client =
        FlashbladeClient::from_config(&config.flashblade).context("Failed to create client")?;
    client.login().await.context("Failed to log in")?;

    let result = UsageCollector::new(&client)
        .with_legacy_filter(config.usage.legacy_filter)
        .usage_matching(&config.usage.filesystem_filter)
        .await;

    if let Err(e) = client.logout().await {
        warn!("Failed to log out: {}", e);
    }

    let format = config.usage.format;
    match result {
        Ok(usage) => {
            info!("Collected usage for {} file systems", usage.len());
            println!("{}", UsageReport::new(usage, true).render(format)?);
            Ok(())
        }
        Err(e) => {
            if let Some(partial) = e.partial() {
                println!(
                    "{}",
                    UsageReport::new(partial.clone(), false).render(format)?
                );
            }
            Err(e.into())
        }
    }
}

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
