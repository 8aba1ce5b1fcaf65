use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::app::Stores;
use crate::cli::{Cli, ExportFormat, ExportKind};
use crate::config::{Config, LoggingConfig};
use crate::error::Error;
use crate::models::{Article, Category, NewComment, SubscribeOutcome};
use crate::storage::HealthStatus;
use crate::store::{paginate, ARTICLES_PER_PAGE};

type CliResult = anyhow::Result<()>;

/// Write a default configuration file and create the seeded data files.
///
/// `resolved` is the configuration already merged with `CARA_STORE_*`
/// overrides; an explicit `data_dir` wins over it.
pub fn init(
    config_path: Option<PathBuf>,
    resolved: &Config,
    data_dir: Option<PathBuf>,
) -> CliResult {
    info!("Initializing cara-store");

    let config_file = match config_path {
        Some(path) => path,
        None => Config::config_file()?,
    };
    if let Some(parent) = config_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let data_dir = match data_dir {
        Some(dir) => dir,
        None => resolved.resolved_data_dir()?,
    };

    if config_file.exists() {
        warn!("Configuration file already exists: {}", config_file.display());
    } else {
        let mut file_config = Config::default();
        file_config.storage.data_dir = Some(data_dir.clone());
        file_config.save(&config_file)?;
        info!("Created default configuration: {}", config_file.display());
    }

    let mut config = resolved.clone();
    config.storage.data_dir = Some(data_dir);
    let stores = Stores::open(&config)?;

    println!("✅ cara-store initialized successfully!");
    println!("   Config file: {}", config_file.display());
    println!("   Data directory: {}", config.resolved_data_dir()?.display());
    println!("   Articles: {}", stores.articles.len());
    println!("   Comments: {}", stores.comments.len());
    println!("   Subscribers: {}", stores.subscribers.len());
    println!();
    println!("Next steps:");
    println!("   1. Browse articles: cara-store articles");
    println!("   2. Log in as admin: cara-store login <username> <password>");

    Ok(())
}

pub fn login(stores: &Stores, username: &str, password: &str) -> CliResult {
    if !stores.admin.login(username, password)? {
        return Err(Error::PermissionDenied("invalid admin credentials".to_string()).into());
    }
    println!("🔓 Logged in as {}", username);
    Ok(())
}

pub fn logout(stores: &Stores) -> CliResult {
    stores.admin.logout()?;
    println!("🔒 Logged out");
    Ok(())
}

pub fn list_articles(
    stores: &Stores,
    query: Option<String>,
    category: Option<Category>,
    page: usize,
) -> CliResult {
    let matches = stores
        .articles
        .search(query.as_deref().unwrap_or(""), category);

    if matches.is_empty() {
        println!("📋 No articles match.");
        return Ok(());
    }

    let page = paginate(&matches, page, ARTICLES_PER_PAGE);
    println!(
        "📋 Articles (page {}/{}, {} total)",
        page.page, page.total_pages, page.total_items
    );
    println!("========================");

    for article in &page.items {
        println!("\n📰 [{}] {}", article.id, article.title);
        println!(
            "   {} · {} · {} min · {}",
            article.category, article.published_on, article.reading_minutes, article.author
        );
        println!("   {}", article.description);
        println!(
            "   👁  {} views · 💬 {} comments",
            stores.views.views_for(&article.id),
            stores.comments.count_for(&article.id)
        );
    }

    Ok(())
}

pub fn show_article(stores: &Stores, id: &str, as_html: bool) -> CliResult {
    let article = stores
        .articles
        .get(id)
        .ok_or_else(|| Error::NotFound(format!("Article '{}' not found", id)))?;

    let views = stores.views.increment_views(id);

    println!("📰 {}", article.title);
    println!(
        "   {} · {} · {} · {} views",
        article.category, article.published_on, article.author, views
    );
    if let Some(tags) = &article.tags {
        println!("   🏷  {}", tags.join(", "));
    }
    println!();

    if as_html {
        println!("{}", article.render_html());
    } else {
        println!("{}", article.content_markdown);
    }

    let comments = stores.comments.by_article(id);
    println!("\n💬 {} comments", comments.len());
    for comment in comments {
        println!(
            "   {} ({}): {}",
            comment.author_name,
            comment.created_at.format("%d/%m/%Y %H:%M"),
            comment.content
        );
    }

    Ok(())
}

fn read_article(path: &Path) -> anyhow::Result<Article> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let article = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid article", path.display()))?;
    Ok(article)
}

pub fn add_article(stores: &Stores, file: &Path) -> CliResult {
    stores.admin.require()?;
    let article = read_article(file)?;
    let id = article.id.clone();
    stores.articles.add(article)?;
    println!("✅ Article '{}' added", id);
    Ok(())
}

pub fn update_article(stores: &Stores, file: &Path) -> CliResult {
    stores.admin.require()?;
    let article = read_article(file)?;
    let id = article.id.clone();
    if !stores.articles.update(article)? {
        return Err(Error::NotFound(format!("Article '{}' not found", id)).into());
    }
    println!("✅ Article '{}' updated", id);
    Ok(())
}

pub fn delete_article(stores: &Stores, id: &str) -> CliResult {
    stores.admin.require()?;
    if !stores.articles.delete(id) {
        return Err(Error::NotFound(format!("Article '{}' not found", id)).into());
    }
    println!("🗑  Article '{}' deleted", id);
    Ok(())
}

pub fn list_comments(stores: &Stores, article_id: &str) -> CliResult {
    let comments = stores.comments.by_article(article_id);
    if comments.is_empty() {
        println!("💬 No comments on article {} yet.", article_id);
        return Ok(());
    }

    println!("💬 Comments on article {}:", article_id);
    for comment in comments {
        println!("\n   [{}] {}", comment.id, comment.author_name);
        println!("   {}", comment.created_at.format("%d/%m/%Y %H:%M"));
        println!("   {}", comment.content);
    }
    Ok(())
}

pub fn add_comment(stores: &Stores, article_id: &str, author: &str, content: &str) -> CliResult {
    if stores.articles.get(article_id).is_none() {
        return Err(Error::NotFound(format!("Article '{}' not found", article_id)).into());
    }
    let comment = stores
        .comments
        .add(NewComment::new(article_id, author, content))?;
    println!("✅ Comment {} posted", comment.id);
    Ok(())
}

pub fn delete_comment(stores: &Stores, id: &str) -> CliResult {
    stores.admin.require()?;
    if !stores.comments.delete(id) {
        return Err(Error::NotFound(format!("Comment '{}' not found", id)).into());
    }
    println!("🗑  Comment '{}' deleted", id);
    Ok(())
}

pub fn subscribe(stores: &Stores, email: &str, source: Option<&str>) -> CliResult {
    match stores.subscribers.add(email, source)? {
        SubscribeOutcome::Subscribed(subscriber) => {
            println!("✅ {} subscribed to the newsletter", subscriber.email)
        }
        SubscribeOutcome::Reactivated(subscriber) => {
            println!("✅ Welcome back, {} is subscribed again", subscriber.email)
        }
        SubscribeOutcome::AlreadyActive => println!("ℹ️  This address is already subscribed"),
    }
    Ok(())
}

pub fn unsubscribe(stores: &Stores, email: &str) -> CliResult {
    if !stores.subscribers.unsubscribe(email) {
        return Err(Error::NotFound(format!("No subscriber with address '{}'", email)).into());
    }
    println!("👋 {} unsubscribed", email);
    Ok(())
}

pub fn list_subscribers(stores: &Stores) -> CliResult {
    stores.admin.require()?;
    let stats = stores.subscribers.stats();

    println!(
        "📬 Subscribers: {} total, {} active, {} inactive",
        stats.total, stats.active, stats.inactive
    );
    println!("========================");
    for subscriber in stores.subscribers.all() {
        println!(
            "{} [{}] {} · {} · {}",
            if subscriber.is_active { "✅" } else { "❌" },
            subscriber.id,
            subscriber.email,
            subscriber.subscribed_at.format("%d/%m/%Y"),
            subscriber.source.as_deref().unwrap_or("unknown")
        );
    }
    Ok(())
}

pub fn delete_subscriber(stores: &Stores, id: &str) -> CliResult {
    stores.admin.require()?;
    if !stores.subscribers.delete(id) {
        return Err(Error::NotFound(format!("Subscriber '{}' not found", id)).into());
    }
    println!("🗑  Subscriber '{}' deleted", id);
    Ok(())
}

/// Render an export as a string
pub fn render_export(
    stores: &Stores,
    format: ExportFormat,
    what: ExportKind,
) -> anyhow::Result<String> {
    let content = match (format, what) {
        (ExportFormat::Csv, ExportKind::Subscribers) => stores.subscribers.export_csv(),
        (ExportFormat::Csv, other) => {
            bail!("CSV export is only available for subscribers, not {:?}", other)
        }
        (ExportFormat::Json, ExportKind::Subscribers) => stores.subscribers.export_json()?,
        (ExportFormat::Json, ExportKind::Comments) => stores.comments.export_json()?,
        (ExportFormat::Json, ExportKind::Views) => stores.views.export_json()?,
    };
    Ok(content)
}

pub fn export(
    stores: &Stores,
    format: ExportFormat,
    what: ExportKind,
    output: Option<PathBuf>,
) -> CliResult {
    stores.admin.require()?;
    let content = render_export(stores, format, what)?;

    match output {
        Some(path) => {
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Exported {:?} to {}", what, path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

pub fn stats(stores: &Stores) -> CliResult {
    println!("📊 cara-store Status");
    println!("==================");

    match stores.health() {
        HealthStatus::Healthy => println!("✅ Storage: healthy"),
        HealthStatus::Warning(msg) => println!("⚠️  Storage: {}", msg),
        HealthStatus::Unavailable(msg) => println!("❌ Storage: {}", msg),
    }

    let views = stores.views.global_stats();
    println!("\n👁  Views");
    println!("   Total: {}", views.total_views);
    println!("   Unique: {}", views.total_unique_views);
    println!("   Today: {}", views.today_views);
    println!("   Articles tracked: {}", views.articles_with_views);
    println!("   Average per article: {}", views.average_views_per_article);

    println!("\n🏆 Most viewed");
    for (rank, entry) in stores.views.most_viewed(5).iter().enumerate() {
        let title = stores
            .articles
            .get(&entry.article_id)
            .map(|a| a.title)
            .unwrap_or_else(|| format!("article {}", entry.article_id));
        println!("   {}. {} ({} views)", rank + 1, title, entry.views);
    }

    let comments = stores.comments.stats();
    println!("\n💬 Comments: {}", comments.total);
    for (article_id, count) in &comments.by_article {
        println!("   article {}: {}", article_id, count);
    }

    let subscribers = stores.subscribers.stats();
    println!(
        "\n📬 Subscribers: {} ({} active, {} inactive)",
        subscribers.total, subscribers.active, subscribers.inactive
    );

    Ok(())
}

/// Start the background tasks and keep them running until Ctrl-C
pub async fn run(config: &Config) -> CliResult {
    let stores = Stores::open(config)?;

    let comments = stores.comments.clone();
    let _comment_watch = stores
        .comments
        .subscribe(move || info!("Comments changed, {} stored", comments.len()));
    let views = stores.views.clone();
    let _view_watch = stores
        .views
        .subscribe(move || debug!("Views changed, {} total", views.global_stats().total_views));

    let tasks = stores.start_background(&config.simulation);
    println!("🚀 Running {} background tasks: {}", tasks.len(), tasks.names().join(", "));
    println!("   Press Ctrl+C to stop");

    wait_for_shutdown().await;
    tasks.shutdown().await;

    println!("✅ Stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C)
async fn wait_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(err) => {
            warn!("Failed to listen for shutdown signal: {}", err);
        }
    }
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let cmd_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, cmd_name, &mut std::io::stdout());
}

/// Set up tracing. The returned guard must be kept alive while logging to a file.
pub fn init_logging(
    settings: &LoggingConfig,
    debug: bool,
    verbose: bool,
) -> anyhow::Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level))
    };

    let console = if settings.json_format {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(debug)
            .with_line_number(debug)
            .boxed()
    };

    let (file, guard) = if settings.log_to_file {
        let path = Path::new(&settings.log_file);
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = path
            .file_name()
            .with_context(|| format!("Invalid log file path '{}'", settings.log_file))?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        let layer = if settings.json_format {
            layer.json().boxed()
        } else {
            layer.boxed()
        };
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized");
    Ok(guard)
}
