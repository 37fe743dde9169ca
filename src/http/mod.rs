//! HTTP transport: axum routes over the catalog, rating engine and auth.
//!
//! Requires the `http` feature (on by default).
//!
//! ## Routes
//!
//! | Method & Path | Auth | Body |
//! |---|---|---|
//! | `POST /api/auth/signup` | - | `{ email, password }` |
//! | `POST /api/auth/login` | - | `{ email, password }` |
//! | `GET /api/books` | - | - |
//! | `GET /api/books/bestrating` | - | - |
//! | `GET /api/books/:id` | - | - |
//! | `POST /api/books` | bearer | multipart: `book` (JSON string), optional `image` |
//! | `PUT /api/books/:id` | bearer | multipart: `book` (JSON string), optional `image` |
//! | `DELETE /api/books/:id` | bearer | - |
//! | `POST /api/books/:id/rating` | bearer | `{ rating }` |
//! | `GET /images/:file` | - | - |
//! | `GET /health` | - | - |
//!
//! ## Example
//!
//! ```ignore
//! use bookshelf::{http, Config, InMemoryStore};
//!
//! let state = http::AppState::new(InMemoryStore::new(), Config::from_env()?);
//!
//! // Get the router to compose with other axum routes
//! let app = http::router(state.clone());
//!
//! // Or serve directly, stopping on Ctrl+C / SIGTERM
//! http::serve(state).await?;
//! ```

mod extract;
mod handlers;
mod multipart;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::store::RecordStore;

pub use extract::{bearer_token, AuthUser};
pub use state::AppState;

/// Largest accepted request body (covers included).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the axum `Router` for the given state.
pub fn router<S: RecordStore + Clone + 'static>(state: Arc<AppState<S>>) -> Router {
    let images = ServeDir::new(&state.config.uploads_dir);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/signup", post(handlers::signup::<S>))
        .route("/api/auth/login", post(handlers::login::<S>))
        .route(
            "/api/books",
            get(handlers::list_books::<S>).post(handlers::create_book::<S>),
        )
        .route("/api/books/bestrating", get(handlers::best_rating::<S>))
        .route(
            "/api/books/:id",
            get(handlers::get_book::<S>)
                .put(handlers::update_book::<S>)
                .delete(handlers::delete_book::<S>),
        )
        .route("/api/books/:id/rating", post(handlers::rate_book::<S>))
        .nest_service("/images", images)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}

/// Serve on `config.address()` until Ctrl+C or SIGTERM.
pub async fn serve<S: RecordStore + Clone + 'static>(
    state: Arc<AppState<S>>,
) -> Result<(), std::io::Error> {
    let address = state.config.address();
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
