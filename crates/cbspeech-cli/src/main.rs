use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod analysis;
mod import;

#[derive(Debug, Parser)]
#[command(name = "cbspeech")]
#[command(about = "Central bank speech sentiment command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import speeches from a scraper JSON export
    Import {
        /// JSON file holding an array of speeches
        path: PathBuf,
    },
    /// Show how a text would be chunked for the classifier
    Chunk {
        /// Read the text from a file instead of the argument or stdin
        #[arg(long)]
        file: Option<PathBuf>,

        /// Text to chunk; read from stdin when omitted
        text: Option<String>,
    },
    /// Score one text and print the verdict as JSON
    Score {
        /// Read the text from a file instead of the argument or stdin
        #[arg(long)]
        file: Option<PathBuf>,

        /// Text to score; read from stdin when omitted
        text: Option<String>,
    },
    /// Score every stored speech lacking a verdict for the configured model
    Analyze {
        /// Maximum number of speeches to analyze in this run
        #[arg(long)]
        limit: Option<usize>,

        /// Report how many speeches would be analyzed without scoring them
        #[arg(long)]
        dry_run: bool,
    },
    /// List recently stored verdicts for the configured model
    Scores {
        /// Number of verdicts to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check the database connection
    Ping,
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    // stdout carries command output such as the `score` JSON.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("cbspeech: no command given; run `cbspeech --help`");
        return Ok(());
    };

    let config = cbspeech_core::load_app_config()?;
    init_tracing(&config.log_level)?;
    tracing::debug!(?config, "configuration loaded");

    match command {
        Commands::Import { path } => {
            let pool = cbspeech_db::connect_from_config(&config).await?;
            import::run_import(&pool, &path).await?;
        }
        Commands::Chunk { file, text } => {
            let input = analysis::read_input(file.as_deref(), text)?;
            analysis::run_chunk(&config, &input)?;
        }
        Commands::Score { file, text } => {
            let input = analysis::read_input(file.as_deref(), text)?;
            analysis::run_score(&config, &input).await?;
        }
        Commands::Analyze { limit, dry_run } => {
            let pool = cbspeech_db::connect_from_config(&config).await?;
            analysis::run_analyze(&pool, &config, limit, dry_run).await?;
        }
        Commands::Scores { limit } => {
            let pool = cbspeech_db::connect_from_config(&config).await?;
            analysis::run_scores(&pool, &config.model_name, limit).await?;
        }
        Commands::Db { command } => {
            let pool = cbspeech_db::connect_from_config(&config).await?;
            match command {
                DbCommands::Migrate => {
                    let applied = cbspeech_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
                DbCommands::Ping => {
                    cbspeech_db::ping(&pool).await?;
                    println!("database connection ok");
                }
            }
        }
    }

    Ok(())
}
