//! Linkspider main entry point
//!
//! This is the command-line interface for the linkspider revisit store and
//! ingestion pipeline.

use clap::{Parser, Subcommand};
use linkspider::config::{load_config_with_hash, Config};
use linkspider::crawler::{Crawler, FetchedResponse, IngestPipeline};
use linkspider::index::{open_index, IndexSink};
use linkspider::store::RevisitStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url::Url;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Linkspider: revisit scheduling and document ingestion for Linked Data
///
/// Linkspider fetches Linked-Data documents that are new or expired, turns
/// their headers and statements into index records and remembers when each
/// document has to be fetched again.
#[derive(Parser, Debug)]
#[command(name = "linkspider")]
#[command(version)]
#[command(about = "Revisit scheduling and document ingestion for Linked Data", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show it without doing anything
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and ingest the given URIs if they are new or expired
    Crawl {
        #[arg(value_name = "URI", required = true)]
        uris: Vec<String>,
    },

    /// Fetch and ingest every expired URI in the revisit store
    Recrawl,

    /// Ingest a local file as if it had been fetched with status 200
    Ingest {
        /// URI the document is attributed to
        #[arg(long)]
        uri: String,

        /// Mime type used to pick the body handler
        #[arg(long)]
        content_type: String,

        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Tell whether a URI is due for download
    Check {
        #[arg(value_name = "URI")]
        uri: String,
    },

    /// List every expired URI
    Expired,

    /// Log the full revisit state
    State,
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    let Some(command) = cli.command else {
        return Err("no command given, see --help".into());
    };

    let store = Arc::new(RevisitStore::new(&config.store.data_dir));
    store.initialize()?;

    let result = run_command(command, &config, Arc::clone(&store)).await;

    // Persist whatever was registered, even if the command failed
    let shutdown = store.shutdown();
    if let Err(e) = &result {
        tracing::error!("Command failed: {}", e);
    }
    result?;
    shutdown?;
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkspider=info,warn"),
            1 => EnvFilter::new("linkspider=debug,info"),
            2 => EnvFilter::new("linkspider=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run_command(command: Command, config: &Config, store: Arc<RevisitStore>) -> CliResult<()> {
    match command {
        Command::Crawl { uris } => {
            let uris = uris
                .iter()
                .map(|uri| Url::parse(uri))
                .collect::<Result<Vec<_>, _>>()?;
            handle_crawl(config, store, uris).await
        }
        Command::Recrawl => {
            let uris: Vec<Url> = store.expired_uris()?.collect();
            tracing::info!("{} expired URIs to recrawl", uris.len());
            handle_crawl(config, store, uris).await
        }
        Command::Ingest {
            uri,
            content_type,
            file,
        } => handle_ingest(config, store, Url::parse(&uri)?, content_type, file).await,
        Command::Check { uri } => {
            let uri = Url::parse(&uri)?;
            let required = store.is_download_required(&uri)?;
            let expiry = store
                .expiry_of(&uri)?
                .map(|expiry| expiry.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "{}: {} (expiry: {})",
                uri,
                if required { "download required" } else { "up to date" },
                expiry
            );
            Ok(())
        }
        Command::Expired => {
            for uri in store.expired_uris()? {
                println!("{}", uri);
            }
            Ok(())
        }
        Command::State => {
            println!("{} known URIs in '{}'", store.len()?, store.state_file().display());
            store.log_state()?;
            Ok(())
        }
    }
}

/// Opens the index on the blocking pool; blocking HTTP clients must not run on the async threads
async fn open_sink(config: &Config) -> CliResult<Arc<dyn IndexSink>> {
    let index = config.index.clone();
    let sink = tokio::task::spawn_blocking(move || open_index(&index)).await??;
    tracing::info!("Writing documents to the {} index", sink.name());
    Ok(sink)
}

/// Commits and releases the index on the blocking pool
async fn close_sink(sink: Arc<dyn IndexSink>) -> CliResult<()> {
    tokio::task::spawn_blocking(move || sink.commit()).await??;
    Ok(())
}

/// Handles the crawl and recrawl commands
async fn handle_crawl(config: &Config, store: Arc<RevisitStore>, uris: Vec<Url>) -> CliResult<()> {
    let sink = open_sink(config).await?;
    let pipeline = Arc::new(IngestPipeline::from_config(config, Arc::clone(&sink)));

    let summary = {
        let crawler = Crawler::new(config, store, pipeline)?;
        crawler.run(uris).await
    };
    close_sink(sink).await?;
    let summary = summary?;

    println!(
        "Fetched {} ({} indexed, {} discarded, {} index failures), {} fetch failures ({} unreachable), {} skipped",
        summary.fetched(),
        summary.flushed,
        summary.discarded,
        summary.write_failed,
        summary.failed,
        summary.unreachable,
        summary.skipped
    );
    Ok(())
}

/// Handles the ingest command
async fn handle_ingest(
    config: &Config,
    store: Arc<RevisitStore>,
    uri: Url,
    content_type: String,
    file: PathBuf,
) -> CliResult<()> {
    let body = std::fs::read(&file)?;
    let response = FetchedResponse::from_body(uri.clone(), content_type, body);

    let sink = open_sink(config).await?;
    let pipeline = IngestPipeline::from_config(config, Arc::clone(&sink));
    let report = tokio::task::spawn_blocking(move || pipeline.ingest(&response)).await??;
    close_sink(sink).await?;

    store.register(&uri, report.expiry)?;
    println!("{}: {:?}", uri, report.outcome);
    Ok(())
}

/// Handles the --dry-run mode: validates config and shows it
fn handle_dry_run(config: &Config) -> CliResult<()> {
    println!("=== Linkspider Dry Run ===\n");

    println!("Revisit Store:");
    println!("  Data folder: {}", config.store.data_dir);

    println!("\nCrawler Configuration:");
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Default TTL: {}s", config.crawler.default_ttl_secs);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nIndex:");
    println!("  Backend: {:?}", config.index.backend);
    if let Some(path) = &config.index.database_path {
        println!("  Database: {}", path);
    }
    if let Some(url) = &config.index.solr_url {
        println!("  Solr: {}", url);
    }

    println!(
        "\nN-Triples mime types ({}):",
        config.content.ntriples_mime_types.len()
    );
    for mime in &config.content.ntriples_mime_types {
        println!("  - {}", mime);
    }

    println!("\nVocabulary:");
    for (name, iri) in config.vocabulary.entries() {
        println!("  {}: {}", name, iri);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}
