use std::fs;
use std::process::ExitCode;

use bookshelf::http::{self, AppState};
use bookshelf::{Config, InMemoryStore, JsonFileStore, RecordStore};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = fs::create_dir_all(&config.uploads_dir) {
        error!(
            "Failed to create uploads directory {}: {e}",
            config.uploads_dir.display()
        );
        return ExitCode::FAILURE;
    }

    let result = match config.data_file.clone() {
        Some(path) => match JsonFileStore::open(&path) {
            Ok(store) => {
                info!("Using data file {}", path.display());
                run(store, config).await
            }
            Err(e) => {
                error!("Failed to open data file {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => {
            info!("DATA_FILE not set, records are kept in memory only");
            run(InMemoryStore::new(), config).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run<S: RecordStore + Clone + 'static>(
    store: S,
    config: Config,
) -> Result<(), std::io::Error> {
    http::serve(AppState::new(store, config)).await
}
