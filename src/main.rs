//! Pixel-Harvest main entry point
//!
//! This is the command-line interface for the Pixel-Harvest image dataset builder.

use anyhow::Context;
use clap::Parser;
use pixel_harvest::config::{hash_content, load_config_with_hash, prepare_output_directory, validate, Config};
use pixel_harvest::crawler::build_analyzer;
use pixel_harvest::output::{load_statistics, print_statistics};
use pixel_harvest::storage::{open_storage, RunStatus, SqliteStorage, Storage};
use pixel_harvest::{CrawlState, Dataset, SessionPlan};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Pixel-Harvest: a polite single-site image dataset builder
///
/// Pixel-Harvest crawls the article pages of one site breadth-first,
/// collects the image links on every page, and saves each image rescaled
/// and center-cropped. Progress is stored in a SQLite database so an
/// interrupted harvest resumes where it stopped.
#[derive(Parser, Debug)]
#[command(name = "pixel-harvest")]
#[command(version)]
#[command(about = "A polite single-site image dataset builder", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Page to start crawling from (default: last visited page)
    #[arg(long, value_name = "URL")]
    start: Option<String>,

    /// Pages to visit in this session (0 = no limit)
    #[arg(long, value_name = "N")]
    pages: Option<u32>,

    /// Image links to find in this session (0 = no limit)
    #[arg(long, value_name = "N")]
    images: Option<u32>,

    /// Pages per crawl batch before downloading (0 = crawl everything first)
    #[arg(long, value_name = "N")]
    batch_size: Option<u32>,

    /// Directory the processed images are written to
    #[arg(short, long, value_name = "DIR")]
    directory: Option<String>,

    /// Size of the smaller dimension after resizing (0 = keep original size)
    #[arg(long, value_name = "PX")]
    rescale: Option<u32>,

    /// Width after center crop (0 = no crop)
    #[arg(long, value_name = "PX")]
    width: Option<u32>,

    /// Height after center crop (0 = no crop)
    #[arg(long, value_name = "PX")]
    height: Option<u32>,

    /// Size of the download worker pool
    #[arg(short, long, value_name = "N")]
    workers: Option<u32>,

    /// Explicit log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", conflicts_with_all = ["verbose", "quiet"])]
    log_level: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard the stored crawl state and start over
    #[arg(long)]
    fresh: bool,

    /// Forget visited pages and discovered images before the first batch of this session
    #[arg(long)]
    from_scratch: bool,

    /// Validate config and show where the harvest would resume without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.log_level.as_deref(), cli.verbose, cli.quiet);

    let (config, config_hash) = load_configuration(&cli)?;

    if cli.stats {
        handle_stats(&config)
    } else if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_harvest(config, &config_hash, &cli).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(level: Option<&str>, verbose: u8, quiet: bool) {
    let filter = if let Some(level) = level {
        EnvFilter::new(format!("pixel_harvest={},warn", level))
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pixel_harvest=info,warn"),
            1 => EnvFilter::new("pixel_harvest=debug,info"),
            2 => EnvFilter::new("pixel_harvest=trace,debug"),
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

/// Loads the config file (or defaults), applies CLI overrides, and validates
fn load_configuration(cli: &Cli) -> anyhow::Result<(Config, String)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, hash)
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            (Config::default(), hash_content(b""))
        }
    };

    apply_overrides(&mut config, cli);
    validate(&config).context("invalid configuration after command-line overrides")?;

    Ok((config, hash))
}

/// Command-line flags take precedence over file values
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(pages) = cli.pages {
        config.crawler.max_pages = pages;
    }
    if let Some(images) = cli.images {
        config.crawler.max_images = images;
    }
    if let Some(batch_size) = cli.batch_size {
        config.crawler.batch_size = batch_size;
    }
    if cli.from_scratch {
        config.crawler.from_scratch = true;
    }
    if let Some(directory) = &cli.directory {
        config.download.directory = directory.clone();
    }
    if let Some(rescale) = cli.rescale {
        config.download.rescale = rescale;
    }
    if let Some(width) = cli.width {
        config.download.crop_width = width;
    }
    if let Some(height) = cli.height {
        config.download.crop_height = height;
    }
    if let Some(workers) = cli.workers {
        config.download.workers = workers;
    }
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --dry-run mode: shows the effective settings and the resume point
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Pixel-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Origin: {}", config.site.origin);
    println!("  Entrypoint: {}", config.site.entrypoint);

    println!("\nSelectors:");
    println!("  Article links: {}", config.selectors.article_links.join(", "));
    println!("  Image links: {}", config.selectors.image_links.join(", "));
    println!("  Full image link: {}", config.selectors.full_image_link);

    println!("\nCrawler:");
    println!("  Fetch delay: {}ms", config.crawler.fetch_delay_ms);
    println!(
        "  Attempts: {} (jitter up to {}ms)",
        config.crawler.max_attempts, config.crawler.max_jitter_ms
    );
    println!("  Max pages: {}", limit(config.crawler.max_pages));
    println!("  Max images: {}", limit(config.crawler.max_images));
    println!("  Batch size: {}", limit(config.crawler.batch_size));
    println!("  From scratch: {}", config.crawler.from_scratch);

    println!("\nDownload:");
    println!("  Directory: {}", config.download.directory);
    println!("  Rescale: {}", limit(config.download.rescale));
    println!(
        "  Crop: {}x{}",
        config.download.crop_width, config.download.crop_height
    );
    println!("  Workers: {}", config.download.workers);

    println!("\nUser Agent:");
    if config.user_agent.rotate {
        println!("  Rotating ({} custom agents)", config.user_agent.agents.len());
    } else {
        println!(
            "  {}/{} (+{})",
            config.user_agent.crawler_name,
            config.user_agent.crawler_version,
            config.user_agent.contact_url
        );
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let db_path = Path::new(&config.output.database_path);
    let stored = if db_path.exists() {
        SqliteStorage::new(db_path)?.load_state()?
    } else {
        None
    };

    println!();
    match stored {
        Some(state) => println!(
            "✓ Would resume from {} ({} pages visited, {} queued, {} images pending)",
            state.last_visited(),
            state.visited().len(),
            state.frontier().len(),
            state.pending_downloads().len()
        ),
        None => println!("✓ Would start from {}", config.site.entrypoint),
    }
    println!("✓ Configuration is valid");

    Ok(())
}

fn limit(value: u32) -> String {
    if value == 0 {
        "unlimited".to_string()
    } else {
        value.to_string()
    }
}

/// Handles the main harvest session
async fn handle_harvest(config: Config, config_hash: &str, cli: &Cli) -> anyhow::Result<()> {
    let destination = prepare_output_directory(&config.download.directory)?;
    let mut storage = open_storage(Path::new(&config.output.database_path))?;

    if cli.fresh {
        tracing::info!("Starting fresh harvest (discarding stored state)");
        storage.clear_state()?;
    }

    if let Some(previous) = storage.get_latest_run()? {
        if previous.status == RunStatus::Running {
            tracing::warn!("Run #{} did not finish, marking it interrupted", previous.id);
            storage.update_run_status(previous.id, RunStatus::Interrupted)?;
        }
    }

    let run_id = storage.create_run(config_hash)?;

    let state = match storage.load_state()? {
        Some(state) => {
            tracing::info!(
                "Resuming from {} ({} visited, {} queued, {} pending images)",
                state.last_visited(),
                state.visited().len(),
                state.frontier().len(),
                state.pending_downloads().len()
            );
            state
        }
        None => CrawlState::new(config.site.entrypoint.clone()),
    };

    let analyzer = build_analyzer(&config)?;
    let mut dataset = Dataset::with_state(state, analyzer)
        .with_storage(Box::new(storage), run_id)
        .from_scratch(config.crawler.from_scratch);

    let mut plan = SessionPlan::from_config(&config, destination);
    plan.start = cli.start.clone();

    let outcome = dataset.run_session(&plan).await;

    let Some((mut storage, run_id)) = dataset.into_storage() else {
        anyhow::bail!("storage backend was lost during the session");
    };

    match outcome {
        Ok(summary) => {
            storage.complete_run(run_id)?;
            tracing::info!(
                "Harvest completed: {} pages visited, {} failed, {} images saved, {} failed",
                summary.pages_visited,
                summary.pages_failed,
                summary.images_saved,
                summary.images_failed
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            storage.update_run_status(run_id, RunStatus::Failed)?;
            Err(e.into())
        }
    }
}
