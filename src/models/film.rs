// Catalog records as served by the films API (camelCase JSON)

use serde::{Deserialize, Serialize};

use crate::core::FilmId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: FilmId,
    pub title: String,
    pub description: String,
    pub director: String,
    /// Runtime in minutes
    pub duration: i64,
    pub poster_url: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Film {
    /// Minimal film, everything but id and title left blank.
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id: FilmId::new(id),
            title: title.into(),
            description: String::new(),
            director: String::new(),
            duration: 0,
            poster_url: None,
            year: None,
            country: None,
            tagline: None,
            category: None,
        }
    }

    /// "director / year / country / category", skipping whatever is missing.
    pub fn info_line(&self) -> Option<String> {
        let mut parts: Vec<String> = Vec::new();
        if !self.director.trim().is_empty() {
            parts.push(self.director.clone());
        }
        if let Some(year) = self.year {
            parts.push(year.to_string());
        }
        for part in [&self.country, &self.category].into_iter().flatten() {
            if !part.trim().is_empty() {
                parts.push(part.clone());
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" / "))
        }
    }

    pub fn description_or_default(&self) -> &str {
        if self.description.trim().is_empty() {
            "No description available"
        } else {
            &self.description
        }
    }
}

/// Screenings grouped under one display time slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub time: String,
    pub events: Vec<ScheduleEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub id: FilmId,
    pub title: String,
    pub cinema: String,
}
