use std::{collections::HashSet, sync::Arc};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    client::ApiClient,
    models::{Movie, MovieForm, MovieId, MovieInput, ValidationErrors},
};

pub const MISSING_FIELDS_MESSAGE: &str = "Please fill title, director, and year.";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Backlog,
    Watched,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Backlog, Filter::Watched];

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Backlog => "backlog",
            Filter::Watched => "watched",
        }
    }

    pub fn matches(self, movie: &Movie) -> bool {
        match self {
            Filter::All => true,
            Filter::Backlog => !movie.watched,
            Filter::Watched => movie.watched,
        }
    }
}

/// What a save in flight is acting on.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SavingKey {
    New,
    Movie(MovieId),
}

#[derive(Clone, Debug, Default)]
pub struct ClientState {
    pub movies: Vec<Movie>,
    pub loading: bool,
    /// Most recent failure only.
    pub error: Option<String>,
    pub form: MovieForm,
    pub form_errors: ValidationErrors,
    pub saving: HashSet<SavingKey>,
    pub filter: Filter,
    pub show_stats: bool,
}

#[derive(Clone, Debug)]
pub enum Action {
    LoadStarted,
    LoadSucceeded(Vec<Movie>),
    LoadFailed(String),
    FormRejected { form: MovieForm, errors: ValidationErrors },
    CreateStarted(MovieForm),
    CreateSucceeded(Movie),
    CreateFailed(String),
    ToggleStarted(MovieId),
    ToggleSucceeded(Movie),
    ToggleFailed { id: MovieId, message: String },
    DeleteStarted(MovieId),
    DeleteSucceeded(MovieId),
    DeleteFailed { id: MovieId, message: String },
    FilterChanged(Filter),
    StatsToggled,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    pub total: usize,
    pub watched: usize,
    pub backlog: usize,
    /// Mean over movies that carry a rating.
    pub average_rating: Option<f64>,
}

impl ClientState {
    pub fn reduce(mut self, action: Action) -> Self {
        match action {
            Action::LoadStarted => {
                self.loading = true;
                self.error = None;
            },
            Action::LoadSucceeded(movies) => {
                self.movies = movies;
                self.loading = false;
            },
            Action::LoadFailed(message) => {
                self.error = Some(message);
                self.loading = false;
            },
            Action::FormRejected { form, errors } => {
                self.error = Some(if errors.has_missing() {
                    MISSING_FIELDS_MESSAGE.to_string()
                } else {
                    errors.first().map(|e| e.message.clone()).unwrap_or_default()
                });
                self.form = form;
                self.form_errors = errors;
            },
            Action::CreateStarted(form) => {
                self.form = form;
                self.form_errors = ValidationErrors::default();
                self.error = None;
                self.saving.insert(SavingKey::New);
            },
            Action::CreateSucceeded(movie) => {
                self.movies.insert(0, movie);
                self.form = MovieForm::default();
                self.saving.remove(&SavingKey::New);
            },
            Action::CreateFailed(message) => {
                self.error = Some(message);
                self.saving.remove(&SavingKey::New);
            },
            Action::ToggleStarted(id) | Action::DeleteStarted(id) => {
                self.error = None;
                self.saving.insert(SavingKey::Movie(id));
            },
            Action::ToggleSucceeded(updated) => {
                self.saving.remove(&SavingKey::Movie(updated.id));
                if let Some(slot) = self.movies.iter_mut().find(|m| m.id == updated.id) {
                    *slot = updated;
                }
            },
            Action::DeleteSucceeded(id) => {
                self.saving.remove(&SavingKey::Movie(id));
                self.movies.retain(|m| m.id != id);
            },
            Action::ToggleFailed { id, message } | Action::DeleteFailed { id, message } => {
                self.saving.remove(&SavingKey::Movie(id));
                self.error = Some(message);
            },
            Action::FilterChanged(filter) => self.filter = filter,
            Action::StatsToggled => self.show_stats = !self.show_stats,
        }
        self
    }

    pub fn visible(&self) -> Vec<&Movie> {
        self.movies.iter().filter(|m| self.filter.matches(m)).collect()
    }

    pub fn is_saving(&self, key: SavingKey) -> bool {
        self.saving.contains(&key)
    }

    pub fn movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.iter().find(|m| m.id == id)
    }

    pub fn stats(&self) -> Stats {
        let watched = self.movies.iter().filter(|m| m.watched).count();
        let ratings: Vec<f64> = self.movies.iter().filter_map(|m| m.rating).collect();
        let average_rating =
            (!ratings.is_empty()).then(|| ratings.iter().sum::<f64>() / ratings.len() as f64);

        Stats {
            total: self.movies.len(),
            watched,
            backlog: self.movies.len() - watched,
            average_rating,
        }
    }
}

fn apply(state: &mut ClientState, action: Action) {
    *state = std::mem::take(state).reduce(action);
}

/// Client state shared by the UI handlers, kept in step with the API. The
/// lock is released while requests are in flight.
#[derive(Clone)]
pub struct Store {
    state: Arc<Mutex<ClientState>>,
    api: ApiClient,
}

impl Store {
    pub fn new(api: ApiClient) -> Self {
        Self { state: Arc::new(Mutex::new(ClientState::default())), api }
    }

    pub async fn snapshot(&self) -> ClientState {
        self.state.lock().await.clone()
    }

    async fn dispatch(&self, action: Action) {
        apply(&mut *self.state.lock().await, action);
    }

    pub async fn load(&self) {
        {
            let mut state = self.state.lock().await;
            if state.loading {
                return;
            }
            apply(&mut state, Action::LoadStarted);
        }

        match self.api.list().await {
            Ok(movies) => {
                debug!(count = movies.len(), "loaded movies");
                self.dispatch(Action::LoadSucceeded(movies)).await;
            },
            Err(err) => {
                warn!(error = %err, "failed to load movies");
                self.dispatch(Action::LoadFailed(err.to_string())).await;
            },
        }
    }

    pub async fn create(&self, form: MovieForm) {
        let input = match form.submit() {
            Ok(input) => input,
            Err(errors) => {
                debug!(errors = %errors, "rejected new movie form");
                self.dispatch(Action::FormRejected { form, errors }).await;
                return;
            },
        };

        {
            let mut state = self.state.lock().await;
            if state.is_saving(SavingKey::New) {
                return;
            }
            apply(&mut state, Action::CreateStarted(form));
        }

        match self.api.create(&input).await {
            Ok(movie) => {
                debug!(id = movie.id, "created movie");
                self.dispatch(Action::CreateSucceeded(movie)).await;
            },
            Err(err) => {
                warn!(error = %err, "failed to create movie");
                self.dispatch(Action::CreateFailed(err.to_string())).await;
            },
        }
    }

    pub async fn toggle_watched(&self, id: MovieId) {
        let input = {
            let mut state = self.state.lock().await;
            if state.is_saving(SavingKey::Movie(id)) {
                return;
            }
            let Some(movie) = state.movie(id) else {
                return;
            };
            let mut input = MovieInput::from(movie);
            input.watched = Some(!movie.watched);
            apply(&mut state, Action::ToggleStarted(id));
            input
        };

        match self.api.update(id, &input).await {
            Ok(movie) => {
                debug!(id = id, watched = movie.watched, "toggled watched");
                self.dispatch(Action::ToggleSucceeded(movie)).await;
            },
            Err(err) => {
                warn!(id = id, error = %err, "failed to toggle watched");
                self.dispatch(Action::ToggleFailed { id, message: err.to_string() }).await;
            },
        }
    }

    pub async fn delete(&self, id: MovieId) {
        {
            let mut state = self.state.lock().await;
            if state.is_saving(SavingKey::Movie(id)) || state.movie(id).is_none() {
                return;
            }
            apply(&mut state, Action::DeleteStarted(id));
        }

        match self.api.delete(id).await {
            Ok(()) => {
                debug!(id = id, "deleted movie");
                self.dispatch(Action::DeleteSucceeded(id)).await;
            },
            Err(err) => {
                warn!(id = id, error = %err, "failed to delete movie");
                self.dispatch(Action::DeleteFailed { id, message: err.to_string() }).await;
            },
        }
    }

    pub async fn set_filter(&self, filter: Filter) {
        self.dispatch(Action::FilterChanged(filter)).await;
    }

    pub async fn toggle_stats(&self) {
        self.dispatch(Action::StatsToggled).await;
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::api;

    fn movie(id: MovieId, watched: bool, rating: Option<f64>) -> Movie {
        Movie {
            id,
            title: format!("Movie {id}"),
            director: "Someone".to_string(),
            year: 2000,
            watched,
            review: None,
            rating,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    fn loaded(movies: Vec<Movie>) -> ClientState {
        ClientState::default().reduce(Action::LoadSucceeded(movies))
    }

    fn form(title: &str) -> MovieForm {
        MovieForm {
            title: title.to_string(),
            director: "Celine Song".to_string(),
            year: "2023".to_string(),
            ..Default::default()
        }
    }

    fn ids(movies: &[&Movie]) -> Vec<MovieId> {
        movies.iter().map(|m| m.id).collect()
    }

    #[test]
    fn filters_split_by_watched() {
        let state = loaded(vec![movie(1, false, None), movie(2, true, None), movie(3, false, None)]);

        assert_eq!(ids(&state.visible()), [1, 2, 3]);

        let state = state.reduce(Action::FilterChanged(Filter::Backlog));
        assert_eq!(ids(&state.visible()), [1, 3]);

        let state = state.reduce(Action::FilterChanged(Filter::Watched));
        assert_eq!(ids(&state.visible()), [2]);
        assert_eq!(state.movies.len(), 3);
    }

    #[test]
    fn load_lifecycle_tracks_loading_and_errors() {
        let state = ClientState::default().reduce(Action::LoadStarted);
        assert!(state.loading);

        let state = state.reduce(Action::LoadFailed("connection refused".to_string()));
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("connection refused"));

        let state = state.reduce(Action::LoadStarted);
        assert_eq!(state.error, None);
    }

    #[test]
    fn create_prepends_and_clears_the_form() {
        let state = loaded(vec![movie(1, false, None)])
            .reduce(Action::CreateStarted(form("Past Lives")));
        assert!(state.is_saving(SavingKey::New));
        assert_eq!(state.form.title, "Past Lives");

        let state = state.reduce(Action::CreateSucceeded(movie(2, false, None)));
        assert_eq!(ids(&state.visible()), [2, 1]);
        assert_eq!(state.form, MovieForm::default());
        assert!(!state.is_saving(SavingKey::New));
    }

    #[test]
    fn failed_create_keeps_the_form() {
        let state = ClientState::default()
            .reduce(Action::CreateStarted(form("Past Lives")))
            .reduce(Action::CreateFailed("Validation failed".to_string()));

        assert_eq!(state.form.title, "Past Lives");
        assert_eq!(state.error.as_deref(), Some("Validation failed"));
        assert!(state.saving.is_empty());
        assert!(state.movies.is_empty());
    }

    #[test]
    fn rejected_form_sets_inline_errors() {
        let bad = MovieForm { title: "Past Lives".to_string(), ..Default::default() };
        let errors = bad.submit().unwrap_err();
        let state = ClientState::default().reduce(Action::FormRejected { form: bad, errors });

        assert_eq!(state.error.as_deref(), Some(MISSING_FIELDS_MESSAGE));
        assert_eq!(state.form_errors.get("director"), Some("Director is required."));
        assert_eq!(state.form_errors.get("title"), None);
        assert_eq!(state.form.title, "Past Lives");

        let early = MovieForm { year: "1800".to_string(), ..form("Old") };
        let errors = early.submit().unwrap_err();
        let state = state.reduce(Action::FormRejected { form: early, errors });
        assert_eq!(state.error.as_deref(), Some("Year must be 1888 or later."));
    }

    #[test]
    fn saves_on_different_movies_are_tracked_separately() {
        let state = loaded(vec![movie(1, false, None), movie(2, false, None)])
            .reduce(Action::ToggleStarted(1))
            .reduce(Action::DeleteStarted(2));
        assert!(state.is_saving(SavingKey::Movie(1)));
        assert!(state.is_saving(SavingKey::Movie(2)));

        let state = state.reduce(Action::ToggleSucceeded(movie(1, true, None)));
        assert!(!state.is_saving(SavingKey::Movie(1)));
        assert!(state.is_saving(SavingKey::Movie(2)));
        assert!(state.movie(1).unwrap().watched);

        let state = state.reduce(Action::DeleteSucceeded(2));
        assert!(state.saving.is_empty());
        assert_eq!(ids(&state.visible()), [1]);
    }

    #[test]
    fn failures_leave_records_untouched_and_overwrite_the_error() {
        let state = loaded(vec![movie(1, false, None)])
            .reduce(Action::ToggleStarted(1))
            .reduce(Action::ToggleFailed { id: 1, message: "first".to_string() })
            .reduce(Action::DeleteStarted(1))
            .reduce(Action::DeleteFailed { id: 1, message: "second".to_string() });

        assert_eq!(state.error.as_deref(), Some("second"));
        assert!(!state.movie(1).unwrap().watched);
        assert!(state.saving.is_empty());
    }

    #[test]
    fn stats_average_only_rated_movies() {
        let state = loaded(vec![
            movie(1, true, Some(8.0)),
            movie(2, false, None),
            movie(3, true, Some(0.0)),
            movie(4, false, Some(7.0)),
        ]);

        let stats = state.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.watched, 2);
        assert_eq!(stats.backlog, 2);
        assert_eq!(stats.average_rating, Some(5.0));

        assert_eq!(loaded(vec![movie(1, false, None)]).stats().average_rating, None);
    }

    #[test]
    fn stats_visibility_toggles() {
        let state = ClientState::default().reduce(Action::StatsToggled);
        assert!(state.show_stats);
        assert!(!state.reduce(Action::StatsToggled).show_stats);
    }

    #[tokio::test]
    async fn store_stays_in_step_with_the_api() {
        let api = ApiClient::new(reqwest::Client::new(), api::spawn_test_server().await);
        let store = Store::new(api.clone());

        store.load().await;
        let state = store.snapshot().await;
        assert!(!state.loading);
        assert!(state.movies.is_empty());
        assert_eq!(state.error, None);

        store.create(form("Past Lives")).await;
        store.create(form("Aftersun")).await;
        let state = store.snapshot().await;
        let titles: Vec<_> = state.movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["Aftersun", "Past Lives"]);
        assert_eq!(state.form, MovieForm::default());

        let id = state.movies[1].id;
        store.toggle_watched(id).await;
        assert!(store.snapshot().await.movie(id).unwrap().watched);
        store.toggle_watched(id).await;
        assert!(!store.snapshot().await.movie(id).unwrap().watched);

        store.delete(id).await;
        assert!(store.snapshot().await.movie(id).is_none());

        store.load().await;
        let state = store.snapshot().await;
        assert_eq!(state.movies.len(), 1);
        assert_eq!(api.list().await.unwrap(), state.movies);
    }

    #[tokio::test]
    async fn server_failures_surface_without_changing_records() {
        let api = ApiClient::new(reqwest::Client::new(), api::spawn_test_server().await);
        let store = Store::new(api.clone());

        store.create(form("Heat")).await;
        let id = store.snapshot().await.movies[0].id;

        // removed behind the store's back
        api.delete(id).await.unwrap();

        store.toggle_watched(id).await;
        let state = store.snapshot().await;
        assert!(state.error.as_deref().unwrap().contains("Movie not found"));
        assert!(!state.movie(id).unwrap().watched);
        assert!(state.saving.is_empty());
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_the_network() {
        // a request would fail with a transport error
        let store = Store::new(ApiClient::new(reqwest::Client::new(), "http://127.0.0.1:9"));

        store.create(MovieForm::default()).await;
        let state = store.snapshot().await;
        assert_eq!(state.error.as_deref(), Some(MISSING_FIELDS_MESSAGE));
        assert!(state.form_errors.get("year").is_some());
        assert!(state.saving.is_empty());
    }

    #[tokio::test]
    async fn unreachable_api_is_reported_on_load() {
        let store = Store::new(ApiClient::new(reqwest::Client::new(), "http://127.0.0.1:9"));

        store.load().await;
        let state = store.snapshot().await;
        assert!(!state.loading);
        assert!(state.error.is_some());
    }
}
