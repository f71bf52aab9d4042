// Seams between the reconciliation model and its remote collaborators

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::core::{FilmId, UserId};
use crate::error::AppResult;
use crate::models::{
    FavoriteRecord, Film, FriendFavoritesView, ScheduleBlock, UserCredentials, UserDocument,
    UserProfile,
};

/// Read-only film catalog. No retries happen behind this trait.
#[async_trait]
pub trait FilmCatalog: Send + Sync {
    async fn list_films(&self) -> AppResult<Vec<Film>>;
    async fn list_schedule(&self, date: Option<NaiveDate>) -> AppResult<Vec<ScheduleBlock>>;

    /// Film detail lookup. The catalog has no single-film endpoint, so this
    /// scans a fresh listing.
    async fn find_film(&self, id: FilmId) -> AppResult<Option<Film>> {
        Ok(self.list_films().await?.into_iter().find(|f| f.id == id))
    }
}

/// The signed-in user's favorites.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    async fn list_favorites(&self) -> AppResult<Vec<FavoriteRecord>>;
    /// Upsert keyed by film id.
    async fn add_favorite(&self, favorite: &FavoriteRecord) -> AppResult<()>;
    /// Removing an absent id succeeds.
    async fn remove_favorite(&self, id: FilmId) -> AppResult<()>;
}

/// Friendships of the signed-in user and what those friends favorite.
#[async_trait]
pub trait FriendsStore: Send + Sync {
    async fn current_profile(&self) -> AppResult<UserProfile>;
    async fn list_friends_favorites(&self) -> AppResult<Vec<FriendFavoritesView>>;
    async fn add_friend_by_username(&self, username: &str) -> AppResult<UserProfile>;
    async fn remove_friend(&self, uid: &UserId) -> AppResult<()>;
}

/// Hosted per-user document backend. Every method is a single remote write
/// or read; pairing writes into symmetric edges happens above this layer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_user(&self, doc: &UserDocument, credentials: &UserCredentials) -> AppResult<()>;
    async fn get_user(&self, uid: &UserId) -> AppResult<Option<UserDocument>>;
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserDocument>>;
    async fn find_credentials_by_email(&self, email: &str) -> AppResult<Option<UserCredentials>>;

    /// Array-union: adding an existing friend is a no-op.
    async fn add_friend_ref(&self, owner: &UserId, friend: &UserId) -> AppResult<()>;
    /// Array-remove: removing a missing friend is a no-op.
    async fn remove_friend_ref(&self, owner: &UserId, friend: &UserId) -> AppResult<()>;

    async fn list_favorites(&self, uid: &UserId) -> AppResult<Vec<FavoriteRecord>>;
    async fn upsert_favorite(&self, uid: &UserId, favorite: &FavoriteRecord) -> AppResult<()>;
    async fn delete_favorite(&self, uid: &UserId, id: FilmId) -> AppResult<()>;
}
