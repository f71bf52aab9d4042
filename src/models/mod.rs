// Data model - catalog records and per-user documents

pub mod film;
pub mod social;

pub use film::{Film, ScheduleBlock, ScheduleEvent};
pub use social::{
    FavoriteRecord, FriendFavoritesView, UserCredentials, UserDocument, UserProfile,
};
