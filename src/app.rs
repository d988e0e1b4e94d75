use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::article::Article;
use crate::config::Config;
use crate::error::StoreError;
use crate::store::ArticleStore;

pub struct AppState {
    pub store: ArticleStore,
}

/// Errors returned by the API handlers, rendered as `{error}` JSON
#[derive(Error, Debug)]
pub enum AppError {
    #[error("API endpoint not found")]
    NotFound,

    #[error("Internal server error")]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Store(e) => {
                error!("Article store failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

#[derive(Serialize)]
struct ArticlesResponse {
    success: bool,
    articles: Vec<Article>,
}

/// Build the router: the read side of the API under `/api`, static files elsewhere
pub fn router(state: Arc<AppState>, config: &Config) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/articles", get(list_articles))
        .fallback(api_not_found);

    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .nest("/api", api)
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(cors)
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = ArticleStore::init(&config.articles_file)?;
    info!("Serving articles from {}", store.path().display());

    let app_state = Arc::new(AppState { store });
    let app = router(app_state, &config);

    let address = config.address();
    let listener = TcpListener::bind(&address).await?;
    info!("Proto backend running on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down");
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Proto Backend is running",
    })
}

async fn list_articles(State(state): State<Arc<AppState>>) -> Result<Json<ArticlesResponse>, AppError> {
    let store = state.store.clone();
    let articles = tokio::task::spawn_blocking(move || store.approved())
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;

    Ok(Json(ArticlesResponse {
        success: true,
        articles,
    }))
}

async fn api_not_found() -> AppError {
    AppError::NotFound
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
