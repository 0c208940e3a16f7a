use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use maira_core::client::GeminiClient;
use maira_core::resolver::ModelResolver;
use maira_memory::{FileBackend, MemoryStore};
use maira_server::config::AppConfig;
use maira_server::http_server::{self, AppState};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "maira-daemon", about = "Maira document-chat backend")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP port (overrides config and the PORT environment variable)
    #[arg(short, long)]
    port: Option<u16>,

    /// Gemini API key (overrides GEMINI_API_KEY)
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Data root holding the memory file and the uploads scratch dir
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Directory of static front-end assets
    #[arg(long)]
    public_dir: Option<PathBuf>,

    /// Model identifier used when resolution fails
    #[arg(long)]
    fallback_model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pull in .env before anything reads the environment.
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Starting Maira daemon");

    let args = Args::parse();

    // Load config from file (or defaults), then fill from environment.
    let mut config = match &args.config {
        Some(config_path) => match AppConfig::load_from_file(config_path) {
            Ok(cfg) => {
                info!("Loaded configuration from {}", config_path.display());
                cfg
            }
            Err(e) => {
                error!("Failed to load configuration from {}: {}", config_path.display(), e);
                return Err(anyhow::anyhow!("Configuration error: {}", e));
            }
        },
        None => AppConfig::default(),
    };
    config = config.fill_from_env();

    // Update config from CLI args
    if args.port.is_some() {
        config.port = args.port;
    }
    if args.data_dir.is_some() {
        config.data_dir = args.data_dir;
    }
    if args.public_dir.is_some() {
        config.public_dir = args.public_dir;
    }
    if args.api_key.is_some() {
        config.gemini.api_key = args.api_key.clone();
    }
    if args.fallback_model.is_some() {
        config.gemini.fallback_model = args.fallback_model.clone();
    }

    // The uploads scratch dir must exist before the first request.
    tokio::fs::create_dir_all(config.uploads_dir()).await?;

    // Initialize Gemini client
    let gemini_client = match GeminiClient::new(&config.gemini) {
        Ok(client) => {
            info!("Initialized Gemini client");
            client
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize Gemini client");
            return Err(anyhow::anyhow!("Failed to initialize Gemini client: {}", e));
        }
    };

    let resolver = ModelResolver::new(
        Arc::new(gemini_client.clone()),
        config.gemini.fallback_model(),
    );

    // Load the persisted document memory.
    let backend = Arc::new(FileBackend::new(config.memory_file()));
    let store = MemoryStore::load(backend).await;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    let state = AppState::new(config, gemini_client, resolver, store);

    http_server::run_server(state, addr).await
}
