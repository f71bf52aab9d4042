// Festival companion - client-side core of the festival app
// Film catalog over HTTP, per-user favorites and friendships in a document
// store, and the reconciliation model screens render from.

// Core types and primitives
pub mod core;

// Catalog records and per-user documents
pub mod models;

// Remote clients, document-store backends, sessions and auth
pub mod infrastructure;

// Screen lifetime plumbing
pub mod framework;

// Reconciliation model and schedule browsing
pub mod domains;

// Common utilities
pub mod app_state;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-exports for convenience
pub use error::{AppError, AppResult};
pub use crate::core::{FilmId, UserId};
pub use models::{FavoriteRecord, Film, FriendFavoritesView, ScheduleBlock, ScheduleEvent, UserProfile};
pub use domains::favorites::{FavoritesModel, HydrateOptions, HydrateReport, HydrateSource};
pub use domains::schedule::{FestivalCalendar, ScheduleBrowser};
pub use framework::ScreenLifetime;
