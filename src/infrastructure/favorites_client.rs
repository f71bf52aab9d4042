use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::FilmId;
use crate::error::AppResult;
use crate::infrastructure::session::SessionHandle;
use crate::infrastructure::traits::{DocumentStore, FavoritesStore};
use crate::models::FavoriteRecord;

/// Favorites of whoever is signed in on `session`.
#[derive(Clone)]
pub struct FavoritesClient {
    store: Arc<dyn DocumentStore>,
    session: SessionHandle,
}

impl FavoritesClient {
    pub fn new(store: Arc<dyn DocumentStore>, session: SessionHandle) -> Self {
        Self { store, session }
    }
}

#[async_trait]
impl FavoritesStore for FavoritesClient {
    #[instrument(skip(self))]
    async fn list_favorites(&self) -> AppResult<Vec<FavoriteRecord>> {
        let uid = self.session.current_uid().await?;
        let favorites = self.store.list_favorites(&uid).await?;
        debug!("{} has {} favorites", uid, favorites.len());
        Ok(favorites)
    }

    #[instrument(skip(self, favorite), fields(film_id = %favorite.id))]
    async fn add_favorite(&self, favorite: &FavoriteRecord) -> AppResult<()> {
        let uid = self.session.current_uid().await?;
        self.store.upsert_favorite(&uid, favorite).await
    }

    #[instrument(skip(self))]
    async fn remove_favorite(&self, id: FilmId) -> AppResult<()> {
        let uid = self.session.current_uid().await?;
        self.store.delete_favorite(&uid, id).await
    }
}
