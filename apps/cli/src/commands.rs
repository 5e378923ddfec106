//! CLI command definitions, routing, and tracing setup.

use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing::info;

use resourcesync_core::{RecaptureOptions, SyncOptions, run_recapture, run_sync};
use resourcesync_corpus::CorpusClient;
use resourcesync_fetch::StrategyFetcher;
use resourcesync_shared::{
    AppConfig, SourceType, corpus_credentials, init_config, load_config,
};
use resourcesync_store::CaptureStore;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// resourcesync — capture referenced resources into a local text store.
#[derive(Parser)]
#[command(
    name = "resourcesync",
    version,
    about = "Harvest Notion pages and Google Docs referenced by corpus posts into local text files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Capture every referenced-but-uncovered resource.
    Sync {
        /// Compute the uncovered set and planned filenames without fetching.
        #[arg(long)]
        dry_run: bool,

        /// Restrict the run to one source type.
        #[arg(long, value_enum)]
        domain: Option<DomainArg>,

        /// Browser debug endpoint host (overrides config).
        #[arg(long)]
        cdp_host: Option<String>,

        /// Browser debug endpoint port (overrides config).
        #[arg(long)]
        cdp_port: Option<u16>,
    },

    /// Re-capture published Notion assets and push content back to the corpus.
    Rescrape {
        /// List the assets that would be refreshed without fetching.
        #[arg(long)]
        dry_run: bool,

        /// Browser debug endpoint host (overrides config).
        #[arg(long)]
        cdp_host: Option<String>,

        /// Browser debug endpoint port (overrides config).
        #[arg(long)]
        cdp_port: Option<u16>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Source type filter for sync.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum DomainArg {
    Notion,
    Gdoc,
    Gsheet,
}

impl From<DomainArg> for SourceType {
    fn from(arg: DomainArg) -> Self {
        match arg {
            DomainArg::Notion => SourceType::Notion,
            DomainArg::Gdoc => SourceType::Gdoc,
            DomainArg::Gsheet => SourceType::Gsheet,
        }
    }
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
        0 => "resourcesync=info",
        1 => "resourcesync=debug",
        _ => "resourcesync=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
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
    match cli.command {
        Command::Sync {
            dry_run,
            domain,
            cdp_host,
            cdp_port,
        } => cmd_sync(dry_run, domain, cdp_host.as_deref(), cdp_port).await,
        Command::Rescrape {
            dry_run,
            cdp_host,
            cdp_port,
        } => cmd_rescrape(dry_run, cdp_host.as_deref(), cdp_port).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Load config and apply browser endpoint overrides from CLI flags.
fn resolve_config(cdp_host: Option<&str>, cdp_port: Option<u16>) -> Result<AppConfig> {
    let mut config = load_config()?;
    if let Some(host) = cdp_host {
        config.browser.host = host.to_string();
    }
    if let Some(port) = cdp_port {
        config.browser.port = port;
    }
    Ok(config)
}

async fn cmd_sync(
    dry_run: bool,
    domain: Option<DomainArg>,
    cdp_host: Option<&str>,
    cdp_port: Option<u16>,
) -> Result<()> {
    let config = resolve_config(cdp_host, cdp_port)?;
    let creds = corpus_credentials(&config)?;

    let corpus = CorpusClient::new(&creds, config.corpus.query_limit)?;
    let store = CaptureStore::new(&config.store.dir);
    let mut fetcher = StrategyFetcher::new(config.browser.clone())?;

    let opts = SyncOptions {
        dry_run,
        domain: domain.map(SourceType::from),
        browser_delay: Duration::from_millis(config.limits.browser_delay_ms),
        http_delay: Duration::from_millis(config.limits.http_delay_ms),
    };

    info!(dry_run, store = %config.store.dir, "starting sync");

    let report = run_sync(&corpus, &store, &mut fetcher, &opts).await?;

    println!();
    println!("  Sync complete");
    println!("  Referenced: {}", report.referenced);
    println!("  Covered:    {}", report.covered);
    for (source, count) in &report.uncovered_by_type {
        println!("  Uncovered:  {count} ({source})");
    }

    if dry_run {
        println!();
        println!("  Would capture {} file(s):", report.planned.len());
        for name in &report.planned {
            println!("    {name}");
        }
    } else {
        println!("  Extracted:  {}", report.extracted);
        if report.skipped_no_browser > 0 {
            println!("  Skipped:    {} (browser unreachable)", report.skipped_no_browser);
        }
        if !report.failed.is_empty() {
            println!("  Failed:     {}", report.failed.len());
            for (url, reason) in &report.failed {
                println!("    {url}: {reason}");
            }
        }
    }
    println!();

    Ok(())
}

async fn cmd_rescrape(
    dry_run: bool,
    cdp_host: Option<&str>,
    cdp_port: Option<u16>,
) -> Result<()> {
    let config = resolve_config(cdp_host, cdp_port)?;
    let creds = corpus_credentials(&config)?;

    let corpus = CorpusClient::new(&creds, config.corpus.query_limit)?;
    let store = CaptureStore::new(&config.store.dir);
    let mut fetcher = StrategyFetcher::new(config.browser.clone())?;

    let opts = RecaptureOptions {
        dry_run,
        delay: Duration::from_millis(config.limits.browser_delay_ms),
    };

    info!(dry_run, "starting re-capture");

    let report = run_recapture(&corpus, &store, &mut fetcher, &opts).await?;

    println!();
    println!("  Re-capture complete");
    if dry_run {
        println!("  Would refresh {} asset(s):", report.planned.len());
        for name in &report.planned {
            println!("    {name}");
        }
    } else {
        println!("  Updated:    {}", report.updated);
    }
    if report.skipped_no_url > 0 {
        println!("  Skipped:    {} (no published URL)", report.skipped_no_url);
    }
    if !report.failed.is_empty() {
        println!("  Failed:     {}", report.failed.len());
        for (name, reason) in &report.failed {
            println!("    {name}: {reason}");
        }
    }
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
