use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use jiff::Timestamp;
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId, MovieInput, validate},
    repo::MovieRepo,
};

pub fn router(repo: MovieRepo) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/movies", get(list).post(create))
        .route("/movies/{id}", axum::routing::put(update).delete(remove))
        .with_state(repo)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": Timestamp::now() }))
}

pub async fn list(State(repo): State<MovieRepo>) -> AppResult<Json<Vec<Movie>>> {
    Ok(Json(repo.list().await?))
}

pub async fn create(
    State(repo): State<MovieRepo>,
    body: Result<Json<MovieInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    const MESSAGE: &str = "Validation failed";

    let Json(input) =
        body.map_err(|rej| AppError::BadRequest { message: MESSAGE, error: rej.body_text() })?;
    let fields = validate(&input).map_err(|errors| AppError::invalid(MESSAGE, &errors))?;

    let movie = repo.create(fields).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn update(
    State(repo): State<MovieRepo>,
    Path(id): Path<String>,
    body: Result<Json<MovieInput>, JsonRejection>,
) -> AppResult<Json<Movie>> {
    const MESSAGE: &str = "Update failed";

    let id = parse_id(&id)?;
    if repo.get(id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let Json(input) =
        body.map_err(|rej| AppError::BadRequest { message: MESSAGE, error: rej.body_text() })?;
    let fields = validate(&input).map_err(|errors| AppError::invalid(MESSAGE, &errors))?;

    let movie = repo.update(id, fields).await?.ok_or(AppError::NotFound)?;
    Ok(Json(movie))
}

pub async fn remove(
    State(repo): State<MovieRepo>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    if !repo.delete(id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Ids are opaque to callers; anything that is not one of ours is unknown.
fn parse_id(raw: &str) -> AppResult<MovieId> {
    raw.parse().map_err(|_| {
        debug!(id = %raw, "unrecognised movie id");
        AppError::NotFound
    })
}

/// Serves the API on an ephemeral local port and returns its base URL.
#[cfg(test)]
pub async fn spawn_test_server() -> String {
    let repo = MovieRepo::new(crate::db::connect_memory().await);
    let app = Router::new().nest("/api", router(repo));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{addr}")
}
