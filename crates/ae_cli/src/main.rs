use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ae_client::{render, ArticleClient, ViewState, DEFAULT_API_URL};
use ae_core::{ArticleFilter, ArticleStorage};
use ae_storage::StorageKind;
use ae_web::{AppState, ServerConfig, DEFAULT_BIND};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};
use url::Url;

const STORAGE_RETRIES: u32 = 3;

#[derive(Parser, Debug)]
#[command(author, version, about = "Store original and AI-enhanced articles and view them side by side", long_about = None)]
pub struct Cli {
    /// error, warn, info, debug or trace
    #[arg(long, global = true, env = "AE_LOG_LEVEL", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the article API
    Serve {
        #[arg(long, env = "AE_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,
        /// memory or sqlite
        #[arg(long, env = "AE_STORAGE", default_value = "memory")]
        storage: StorageKind,
        /// SQLite database file
        #[arg(long, env = "AE_DATABASE", default_value = "articles.db")]
        database: String,
    },
    /// Fetch every article, pair originals with their enhanced versions and print them
    Show {
        /// Server root of the article API
        #[arg(long, env = "AE_API_URL", default_value = DEFAULT_API_URL)]
        api_url: Url,
        /// Exit on the first failure instead of offering a retry
        #[arg(long)]
        no_retry: bool,
    },
}

fn parse_level(raw: &str) -> Level {
    match raw.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}

fn init_logging(raw_level: &str) {
    tracing_subscriber::fmt()
        .with_max_level(parse_level(raw_level))
        .with_writer(std::io::stderr)
        .init();
}

async fn check_storage(storage: &Arc<dyn ArticleStorage>, kind: StorageKind) -> Result<()> {
    let total = storage.count(&ArticleFilter::all()).await?;
    info!("✨ Storage ready ({:?}, {} articles stored)", kind, total);
    Ok(())
}

async fn open_storage(kind: StorageKind, database: &str) -> Result<Arc<dyn ArticleStorage>> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = async {
            let storage = ae_storage::create_storage(kind, Some(database)).await?;
            check_storage(&storage, kind).await?;
            Ok::<_, anyhow::Error>(storage)
        }
        .await;

        match result {
            Ok(storage) => return Ok(storage),
            Err(e) if attempt < STORAGE_RETRIES => {
                info!(
                    "Storage initialization failed ({}), retrying {}/{}...",
                    e, attempt, STORAGE_RETRIES
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            Err(e) => return Err(e.context("Storage initialization failed after all retries")),
        }
    }
}

async fn serve(bind: SocketAddr, kind: StorageKind, database: &str) -> Result<()> {
    info!("💾 Opening storage...");
    let storage = open_storage(kind, database).await?;
    ae_web::serve(&ServerConfig { bind }, AppState::new(storage)).await
}

async fn show(api_url: Url, no_retry: bool) -> Result<()> {
    let client = ArticleClient::new(api_url);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut state = ViewState::Idle;

    loop {
        eprint!("{}", render(&ViewState::Loading));
        state = client.refresh(state).await;
        print!("{}", render(&state));

        let ViewState::Error(message) = &state else {
            return Ok(());
        };
        if no_retry {
            bail!("{}", message);
        }

        eprintln!("Press Enter to try again, or type q to quit.");
        match stdin.next_line().await.context("Failed to read from stdin")? {
            Some(line) if line.trim().eq_ignore_ascii_case("q") => bail!("{}", message),
            None => bail!("{}", message),
            Some(_) => continue,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Serve {
            bind,
            storage,
            database,
        } => serve(bind, storage, &database).await,
        Commands::Show { api_url, no_retry } => show(api_url, no_retry).await,
    }
}
