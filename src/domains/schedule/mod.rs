pub mod browser;
pub mod calendar;

pub use browser::{ScheduleBrowser, ScheduleView, SCHEDULE_LOAD_ERROR};
pub use calendar::FestivalCalendar;
