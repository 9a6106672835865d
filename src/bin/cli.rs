//! Cafe Crawler CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use cafe_crawler::{
    error::Result,
    models::{Config, DetailOptions, PaginationOptions, PostSummary, RetrievalMode},
    pipeline::{self, CrawlOptions},
    services::{
        ArticleDetailService, ArticleListService, DetailSource, HtmlDetailParser, HtmlListParser,
        ListSource,
    },
    session::{HttpSession, Session},
    storage::{ArticleStorage, CheckpointStore, LocalStorage},
    utils::{Pacer, RandomPacer},
};
use clap::{Args, Parser, Subcommand};

/// Cafe Crawler - Naver cafe post and comment collector
#[derive(Parser, Debug)]
#[command(
    name = "cafe-crawler",
    version,
    about = "Collects cafe posts and comments via the API with HTML fallback"
)]
struct Cli {
    /// Path to storage directory containing config.toml and run state
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Retrieval path selection shared by the network commands.
#[derive(Args, Debug, Clone, Copy)]
struct PathFlags {
    /// Only parse page markup
    #[arg(long)]
    force_html: bool,

    /// Only use the API
    #[arg(long)]
    force_api: bool,
}

impl PathFlags {
    fn mode(self) -> RetrievalMode {
        RetrievalMode::from_flags(self.force_html, self.force_api)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect posts, write output documents and update the checkpoint
    Crawl {
        /// Number of posts to collect
        #[arg(long)]
        total: Option<usize>,

        #[arg(long)]
        start_page: Option<u32>,

        #[arg(long)]
        end_page: Option<u32>,

        #[arg(long)]
        page_size: Option<u32>,

        /// Posts per detail chunk
        #[arg(long)]
        batch_size: Option<usize>,

        /// Fetch the pages of a batch concurrently
        #[arg(long)]
        parallel: Option<bool>,

        /// Ignore the stored checkpoint
        #[arg(long)]
        fresh: bool,

        #[command(flatten)]
        paths: PathFlags,
    },

    /// Print one board page as JSON
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[command(flatten)]
        paths: PathFlags,
    },

    /// Print one post as JSON
    Detail {
        /// Article ID
        id: String,

        #[command(flatten)]
        paths: PathFlags,
    },

    /// Validate configuration and selectors
    Validate,

    /// Show the checkpoint and the last run summary
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn open_session(config: &Config) -> Result<Arc<dyn Session>> {
    let session = HttpSession::from_cookie_file(config, &config.paths.cookie_file).await?;
    Ok(Arc::new(session))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Cafe Crawler starting...");

    let config_path = cli.storage_dir.join("config.toml");
    let mut config = Config::load_or_default(&config_path);
    config.paths = config.paths.rooted(&cli.storage_dir);

    log::info!("Loaded configuration from {}", cli.storage_dir.display());

    let checkpoints = CheckpointStore::new(&config.paths.checkpoint_file);
    let storage = LocalStorage::new(&config.paths.output_dir);

    match cli.command {
        Command::Crawl {
            total,
            start_page,
            end_page,
            page_size,
            batch_size,
            parallel,
            fresh,
            paths,
        } => {
            let crawler = &mut config.crawler;
            if let Some(total) = total {
                crawler.total_articles = total;
            }
            if let Some(start_page) = start_page {
                crawler.start_page = start_page;
            }
            if end_page.is_some() {
                crawler.end_page = end_page;
            }
            if let Some(page_size) = page_size {
                crawler.page_size = page_size;
            }
            if let Some(batch_size) = batch_size {
                crawler.detail_batch_size = batch_size;
            }
            if let Some(parallel) = parallel {
                crawler.parallel = parallel;
            }
            config.validate()?;

            let config = Arc::new(config);
            let session = open_session(&config).await?;
            let pacer: Arc<dyn Pacer> = Arc::new(RandomPacer::new(config.delay.clone()));
            let options = CrawlOptions {
                mode: paths.mode(),
                fresh,
            };

            let report = pipeline::run_crawler(
                Arc::clone(&config),
                session,
                pacer,
                &storage,
                &checkpoints,
                options,
            )
            .await?;

            for file in &report.files {
                log::info!("    {}", file);
            }
            log::info!("Crawl complete!");
        }

        Command::List { page, paths } => {
            config.validate()?;
            let config = Arc::new(config);
            let session = open_session(&config).await?;
            let pacer: Arc<dyn Pacer> = Arc::new(RandomPacer::new(config.delay.clone()));
            let service = ArticleListService::new(Arc::clone(&config), session, pacer)?;

            let options = PaginationOptions::from_config(&config, paths.mode())
                .page(page, config.crawler.page_size as usize);
            let result = service.fetch_page(&options).await?;
            log::info!("Page {}: {} posts ({:?})", page, result.data.posts.len(), result.source);
            println!("{}", serde_json::to_string_pretty(&result.data.posts)?);
        }

        Command::Detail { id, paths } => {
            config.validate()?;
            let config = Arc::new(config);
            let session = open_session(&config).await?;
            let pacer: Arc<dyn Pacer> = Arc::new(RandomPacer::new(config.delay.clone()));
            let service = ArticleDetailService::new(Arc::clone(&config), session, pacer)?;

            let summary = PostSummary {
                url: config.cafe.article_url(&id),
                id,
                title: String::new(),
                author: String::new(),
                date: String::new(),
                view_count: 0,
                comment_count: 0,
                menu_name: None,
                summary: None,
            };
            let options = DetailOptions {
                mode: paths.mode(),
                include_comments: config.crawler.include_comments,
                include_images: config.crawler.include_images,
            };
            let result = service.fetch_detail(&summary, &options).await?;
            if let Some(error) = &result.data.error {
                log::error!("Article {} could not be retrieved: {}", summary.id, error);
            }
            println!("{}", serde_json::to_string_pretty(&result.data)?);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            HtmlListParser::new(&config)?;
            HtmlDetailParser::new(&config)?;
            log::info!("✓ Selectors OK");

            if config.paths.cookie_file.exists() {
                log::info!("✓ Cookie file {}", config.paths.cookie_file.display());
            } else {
                log::warn!(
                    "Cookie file not found at {}",
                    config.paths.cookie_file.display()
                );
            }

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!("Cafe: {} (menu {})", config.cafe.cafe_id, config.cafe.menu_id);

            let checkpoint = checkpoints.load().await?;
            match checkpoint.resume_from() {
                Some(id) => log::info!("Checkpoint: resume after article {}", id),
                None if checkpoint.last_article_id.is_empty() => log::info!("No checkpoint yet."),
                None => log::info!(
                    "Checkpoint: article {} (resuming disabled)",
                    checkpoint.last_article_id
                ),
            }

            match storage.load_summary().await? {
                Some(summary) => {
                    log::info!("Last run: {} posts", summary.total_count);
                    log::info!("Collected at: {}", summary.collected_at);
                    if let Some(id) = &summary.last_article_id {
                        log::info!("Highest article ID: {}", id);
                    }
                }
                None => log::info!("No run summary found yet."),
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
