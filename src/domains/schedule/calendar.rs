use chrono::NaiveDate;

use crate::config::FestivalConfig;
use crate::error::{AppError, AppResult};

/// The festival's days, in order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FestivalCalendar {
    dates: Vec<NaiveDate>,
}

impl FestivalCalendar {
    pub fn new(mut dates: Vec<NaiveDate>) -> AppResult<Self> {
        dates.sort();
        dates.dedup();
        if dates.is_empty() {
            return Err(AppError::Configuration("festival has no dates".to_string()));
        }
        Ok(Self { dates })
    }

    pub fn from_config(config: &FestivalConfig) -> AppResult<Self> {
        Self::new(config.dates.clone())
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn first(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.binary_search(&date).is_ok()
    }

    /// Today when the festival is running, otherwise its first day
    pub fn initial_date(&self, today: NaiveDate) -> NaiveDate {
        if self.contains(today) {
            today
        } else {
            self.first()
        }
    }

    pub fn previous(&self, date: NaiveDate) -> Option<NaiveDate> {
        let position = self.dates.binary_search(&date).ok()?;
        position.checked_sub(1).map(|i| self.dates[i])
    }

    pub fn next(&self, date: NaiveDate) -> Option<NaiveDate> {
        let position = self.dates.binary_search(&date).ok()?;
        self.dates.get(position + 1).copied()
    }

    /// ("MONDAY", "05 May 2025")
    pub fn day_heading(date: NaiveDate) -> (String, String) {
        (
            date.format("%A").to_string().to_uppercase(),
            date.format("%d %b %Y").to_string(),
        )
    }
}
