use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub festival: FestivalConfig,
    pub consistency: ConsistencyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Films are served from `{base_url}/films`.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FestivalConfig {
    pub dates: Vec<NaiveDate>,
    pub friends_favorites_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyConfig {
    /// Maximum number of attempts to undo the first half of a friendship write
    pub max_compensation_attempts: u32,
    /// Base delay between compensation attempts (ms), grows linearly
    pub compensation_retry_delay_ms: u64,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            max_compensation_attempts: 3,
            compensation_retry_delay_ms: 200,
        }
    }
}

pub const DEFAULT_FESTIVAL_DATES: &str = "2025-05-05,2025-05-06,2025-05-07";

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let dates = env::var("FESTIVAL_DATES").unwrap_or_else(|_| DEFAULT_FESTIVAL_DATES.to_string());

        Ok(Self {
            api: ApiConfig {
                base_url: env::var("API_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8080/api".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string()),
            },
            auth: AuthConfig {
                bcrypt_cost: env::var("BCRYPT_COST")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(bcrypt::DEFAULT_COST),
            },
            festival: FestivalConfig {
                dates: parse_festival_dates(&dates)
                    .with_context(|| format!("invalid FESTIVAL_DATES: {}", dates))?,
                friends_favorites_limit: env::var("FRIENDS_FAVORITES_LIMIT")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            consistency: ConsistencyConfig {
                max_compensation_attempts: env::var("COMPENSATION_ATTEMPTS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .unwrap_or(3),
                compensation_retry_delay_ms: env::var("COMPENSATION_RETRY_DELAY_MS")
                    .unwrap_or_else(|_| "200".to_string())
                    .parse()
                    .unwrap_or(200),
            },
        })
    }
}

/// Parses a comma-separated list of `YYYY-MM-DD` dates, sorted and deduplicated.
pub fn parse_festival_dates(raw: &str) -> anyhow::Result<Vec<NaiveDate>> {
    let mut dates = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("bad date '{}'", s))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if dates.is_empty() {
        anyhow::bail!("at least one festival date is required");
    }

    dates.sort();
    dates.dedup();
    Ok(dates)
}
