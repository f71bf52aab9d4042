// Framework - lifetime plumbing shared by screen-scoped components

pub mod lifetime;

pub use lifetime::{DismissGuard, ScreenLifetime};
