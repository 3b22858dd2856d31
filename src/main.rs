mod api;
mod client;
mod config;
mod db;
mod entities;
mod error;
mod models;
mod repo;
mod routes;
mod store;
mod templates;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{client::ApiClient, config::Config, repo::MovieRepo, store::Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,filmtrack=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::connect_and_migrate(&config.database_url)
        .await
        .context("connecting to database")?;
    tracing::info!("connected to database");
    let repo = MovieRepo::new(db);

    let http = reqwest::Client::builder().user_agent("filmtrack/0.1").build()?;
    let store = Store::new(ApiClient::new(http, config.api_url.clone()));

    let state = Arc::new(AppState { store: store.clone() });

    let app = app(state, repo);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, api_url = %config.api_url, "listening");

    // the listener is bound, so the initial load can reach our own API
    tokio::spawn(async move { store.load().await });

    axum::serve(listener, app).await?;

    Ok(())
}

fn app(state: Arc<AppState>, repo: MovieRepo) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/movies", post(routes::create))
        .route("/movies/{id}/toggle", post(routes::toggle))
        .route("/movies/{id}/delete", post(routes::delete))
        .route("/filter", post(routes::filter))
        .route("/stats", post(routes::stats))
        .route("/refresh", post(routes::refresh))
        .with_state(state)
        .nest("/api", api::router(repo))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
