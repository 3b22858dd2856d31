use serde::de::DeserializeOwned;

use crate::models::{Movie, MovieId, MovieInput};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// Non-success response; carries the raw response text.
    #[error("{0}")]
    Status(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// JSON client for the movie API.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub async fn list(&self) -> ClientResult<Vec<Movie>> {
        let resp = self.client.get(self.url("/api/movies")).send().await?;
        json(resp).await
    }

    pub async fn create(&self, input: &MovieInput) -> ClientResult<Movie> {
        let resp = self.client.post(self.url("/api/movies")).json(input).send().await?;
        json(resp).await
    }

    pub async fn update(&self, id: MovieId, input: &MovieInput) -> ClientResult<Movie> {
        let resp =
            self.client.put(self.url(&format!("/api/movies/{id}"))).json(input).send().await?;
        json(resp).await
    }

    pub async fn delete(&self, id: MovieId) -> ClientResult<()> {
        let resp = self.client.delete(self.url(&format!("/api/movies/{id}"))).send().await?;
        check(resp).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn check(resp: reqwest::Response) -> ClientResult<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }

    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    tracing::warn!(status = %status, body = %text, "api request failed");
    if text.trim().is_empty() {
        return Err(ClientError::Status("Unexpected error".to_string()));
    }
    Err(ClientError::Status(text))
}

async fn json<T: DeserializeOwned>(resp: reqwest::Response) -> ClientResult<T> {
    let resp = check(resp).await?;
    Ok(resp.json().await?)
}
