use std::sync::Arc;

use axum::{
    extract::{Form, Path, State},
    response::{Html, Redirect},
};
use serde::Deserialize;

use crate::{
    AppState,
    models::{MovieForm, MovieId},
    store::Filter,
    templates,
};

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let snapshot = state.store.snapshot().await;
    Html(templates::index_page(&snapshot))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Form(form): Form<MovieForm>,
) -> Redirect {
    state.store.create(form).await;
    Redirect::to("/")
}

pub async fn toggle(State(state): State<Arc<AppState>>, Path(id): Path<MovieId>) -> Redirect {
    state.store.toggle_watched(id).await;
    Redirect::to("/")
}

pub async fn delete(State(state): State<Arc<AppState>>, Path(id): Path<MovieId>) -> Redirect {
    state.store.delete(id).await;
    Redirect::to("/")
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    filter: Filter,
}

pub async fn filter(
    State(state): State<Arc<AppState>>,
    Form(req): Form<FilterRequest>,
) -> Redirect {
    state.store.set_filter(req.filter).await;
    Redirect::to("/")
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Redirect {
    state.store.toggle_stats().await;
    Redirect::to("/")
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> Redirect {
    state.store.load().await;
    Redirect::to("/")
}
