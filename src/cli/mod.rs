pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::app::Stores;
use crate::config::Config;
use crate::models::Category;

#[derive(Parser)]
#[command(name = "cara-store")]
#[command(about = "Manage the CaraNutrition blog stores: articles, comments, newsletter and views")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CARA_STORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration and seed the data directory
    Init {
        /// Data directory (defaults to the platform data dir)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Open an admin session
    Login {
        username: String,
        password: String,
    },

    /// Close the admin session
    Logout,

    /// List articles, newest first
    Articles {
        /// Search title, description and tags
        #[arg(short, long)]
        query: Option<String>,

        /// Only this category (Nutrition, Recette, Santé, Budget)
        #[arg(long)]
        category: Option<Category>,

        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// Read an article; counts as a view
    Show {
        id: String,

        /// Render the body as HTML instead of markdown
        #[arg(long)]
        html: bool,
    },

    /// Add an article from a JSON file (admin)
    AddArticle { file: PathBuf },

    /// Replace an article from a JSON file (admin)
    UpdateArticle { file: PathBuf },

    /// Delete an article (admin)
    DeleteArticle { id: String },

    /// List the comments on an article
    Comments { article_id: String },

    /// Post a comment
    Comment {
        article_id: String,
        author: String,
        content: String,
    },

    /// Delete a comment (admin)
    DeleteComment { id: String },

    /// Subscribe an address to the newsletter
    Subscribe {
        email: String,

        /// Where the signup came from
        #[arg(long)]
        source: Option<String>,
    },

    /// Unsubscribe an address from the newsletter
    Unsubscribe { email: String },

    /// List newsletter subscribers (admin)
    Subscribers,

    /// Delete a subscriber record (admin)
    DeleteSubscriber { id: String },

    /// Export data (admin)
    Export {
        #[arg(value_enum)]
        format: ExportFormat,

        /// Which collection to export
        #[arg(long, value_enum, default_value_t = ExportKind::Subscribers)]
        what: ExportKind,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show view, comment and subscriber statistics
    Stats,

    /// Run the simulators and the midnight reset until Ctrl-C
    Run,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    Subscribers,
    Comments,
    Views,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::resolve(self.config.as_deref())?;
        let _log_guard = commands::init_logging(&config.logging, self.debug, self.verbose)?;

        let open = || Stores::open(&config);

        match self.command {
            Commands::Init { data_dir } => commands::init(self.config, &config, data_dir),
            Commands::Login { username, password } => {
                commands::login(&open()?, &username, &password)
            }
            Commands::Logout => commands::logout(&open()?),
            Commands::Articles {
                query,
                category,
                page,
            } => commands::list_articles(&open()?, query, category, page),
            Commands::Show { id, html } => commands::show_article(&open()?, &id, html),
            Commands::AddArticle { file } => commands::add_article(&open()?, &file),
            Commands::UpdateArticle { file } => commands::update_article(&open()?, &file),
            Commands::DeleteArticle { id } => commands::delete_article(&open()?, &id),
            Commands::Comments { article_id } => commands::list_comments(&open()?, &article_id),
            Commands::Comment {
                article_id,
                author,
                content,
            } => commands::add_comment(&open()?, &article_id, &author, &content),
            Commands::DeleteComment { id } => commands::delete_comment(&open()?, &id),
            Commands::Subscribe { email, source } => {
                commands::subscribe(&open()?, &email, source.as_deref())
            }
            Commands::Unsubscribe { email } => commands::unsubscribe(&open()?, &email),
            Commands::Subscribers => commands::list_subscribers(&open()?),
            Commands::DeleteSubscriber { id } => commands::delete_subscriber(&open()?, &id),
            Commands::Export {
                format,
                what,
                output,
            } => commands::export(&open()?, format, what, output),
            Commands::Stats => commands::stats(&open()?),
            Commands::Run => commands::run(&config).await,
            Commands::Completions { shell } => {
                commands::generate_completions(shell);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_articles_filters() {
        let cli = Cli::parse_from([
            "cara-store", "articles", "--query", "bissap", "--category", "Santé", "--page", "2",
        ]);
        match cli.command {
            Commands::Articles {
                query,
                category,
                page,
            } => {
                assert_eq!(query.as_deref(), Some("bissap"));
                assert_eq!(category, Some(Category::Sante));
                assert_eq!(page, 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::parse_from(["cara-store", "export", "csv", "-o", "out.csv"]);
        match cli.command {
            Commands::Export {
                format,
                what,
                output,
            } => {
                assert_eq!(format, ExportFormat::Csv);
                assert_eq!(what, ExportKind::Subscribers);
                assert_eq!(output, Some(PathBuf::from("out.csv")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
