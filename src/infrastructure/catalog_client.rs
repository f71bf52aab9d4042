// HTTP client for the festival films API

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::traits::FilmCatalog;
use crate::models::{Film, ScheduleBlock};

/// `GET {base}/films` and `GET {base}/films/schedule?date=YYYY-MM-DD`.
#[derive(Debug, Clone)]
pub struct HttpFilmCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFilmCatalog {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn films_url(&self) -> String {
        format!("{}/films", self.base_url)
    }

    pub fn schedule_url(&self) -> String {
        format!("{}/films/schedule", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> AppResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Network(format!("request failed: {}", e)))?;

        let status = response.status();
        let url = response.url().clone();
        if !status.is_success() {
            warn!("GET {} returned {}", url, status);
            return Err(AppError::Network(format!("GET {} returned {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Network(format!("reading body of {} failed: {}", url, e)))?;

        serde_json::from_str(&body)
            .map_err(|e| AppError::Parse(format!("unexpected payload from {}: {}", url, e)))
    }
}

#[async_trait]
impl FilmCatalog for HttpFilmCatalog {
    #[instrument(skip(self))]
    async fn list_films(&self) -> AppResult<Vec<Film>> {
        let films: Vec<Film> = self.get_json(self.client.get(self.films_url())).await?;
        debug!("Fetched {} films", films.len());
        Ok(films)
    }

    #[instrument(skip(self))]
    async fn list_schedule(&self, date: Option<NaiveDate>) -> AppResult<Vec<ScheduleBlock>> {
        let mut request = self.client.get(self.schedule_url());
        if let Some(date) = date {
            request = request.query(&[("date", date.format("%Y-%m-%d").to_string())]);
        }
        let blocks: Vec<ScheduleBlock> = self.get_json(request).await?;
        debug!("Fetched {} schedule blocks", blocks.len());
        Ok(blocks)
    }
}
