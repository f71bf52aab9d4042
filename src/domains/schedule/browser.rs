use chrono::NaiveDate;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error};

use crate::domains::schedule::calendar::FestivalCalendar;
use crate::framework::ScreenLifetime;
use crate::infrastructure::traits::FilmCatalog;
use crate::models::ScheduleBlock;

pub const SCHEDULE_LOAD_ERROR: &str = "Could not load schedule";

/// What the schedule screen renders for one day. Blocks keep the order the
/// server returned them in.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleView {
    pub date: NaiveDate,
    pub blocks: Vec<ScheduleBlock>,
    pub error: Option<String>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

struct BrowserState {
    current: NaiveDate,
    blocks: Vec<ScheduleBlock>,
    error: Option<String>,
}

/// Day-by-day schedule navigation over the festival calendar.
pub struct ScheduleBrowser {
    catalog: Arc<dyn FilmCatalog>,
    calendar: FestivalCalendar,
    lifetime: ScreenLifetime,
    state: RwLock<BrowserState>,
}

impl ScheduleBrowser {
    pub fn new(
        catalog: Arc<dyn FilmCatalog>,
        calendar: FestivalCalendar,
        today: NaiveDate,
        lifetime: ScreenLifetime,
    ) -> Self {
        let current = calendar.initial_date(today);
        Self {
            catalog,
            calendar,
            lifetime,
            state: RwLock::new(BrowserState {
                current,
                blocks: Vec::new(),
                error: None,
            }),
        }
    }

    pub fn current_date(&self) -> NaiveDate {
        self.state.read().unwrap_or_else(PoisonError::into_inner).current
    }

    pub fn view(&self) -> ScheduleView {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        ScheduleView {
            date: state.current,
            blocks: state.blocks.clone(),
            error: state.error.clone(),
            can_go_back: self.calendar.previous(state.current).is_some(),
            can_go_forward: self.calendar.next(state.current).is_some(),
        }
    }

    /// Loads the current day. Failures end up in `ScheduleView::error`.
    pub async fn load(&self) -> ScheduleView {
        let date = self.current_date();
        let result = self.catalog.list_schedule(Some(date)).await;

        if !self.lifetime.is_alive() {
            debug!("Schedule screen dismissed, dropping {} results", date);
            return self.view();
        }

        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            // The user moved on to another day while this one was loading
            if state.current != date {
                debug!("Discarding stale schedule for {}", date);
            } else {
                match result {
                    Ok(blocks) => {
                        state.blocks = blocks;
                        state.error = None;
                    }
                    Err(e) => {
                        error!("Schedule fetch error for {}: {}", date, e);
                        state.blocks.clear();
                        state.error = Some(SCHEDULE_LOAD_ERROR.to_string());
                    }
                }
            }
        }

        self.view()
    }

    /// Moves one festival day forward and loads it; `None` on the last day.
    pub async fn next_day(&self) -> Option<ScheduleView> {
        let next = self.calendar.next(self.current_date())?;
        self.go_to(next);
        Some(self.load().await)
    }

    /// Moves one festival day back and loads it; `None` on the first day.
    pub async fn previous_day(&self) -> Option<ScheduleView> {
        let previous = self.calendar.previous(self.current_date())?;
        self.go_to(previous);
        Some(self.load().await)
    }

    fn go_to(&self, date: NaiveDate) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.current = date;
        state.blocks.clear();
        state.error = None;
    }
}
