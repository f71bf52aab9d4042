use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::core::{FilmId, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::traits::DocumentStore;
use crate::models::{FavoriteRecord, UserCredentials, UserDocument};

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, UserDocument>,
    credentials: HashMap<String, UserCredentials>,
    favorites: HashMap<UserId, Vec<FavoriteRecord>>,
}

/// In-process document store with the same semantics as the hosted one.
#[derive(Default)]
pub struct MemoryDocumentStore {
    state: RwLock<MemoryState>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn missing_user(uid: &UserId) -> AppError {
        AppError::NotFound(format!("user {}", uid))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create_user(&self, doc: &UserDocument, credentials: &UserCredentials) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.users.contains_key(&doc.uid) {
            return Err(AppError::Conflict(format!("user {} already exists", doc.uid)));
        }
        if state.users.values().any(|u| u.username == doc.username) {
            return Err(AppError::Conflict("username is already taken".to_string()));
        }
        if state.credentials.contains_key(&credentials.email) {
            return Err(AppError::Conflict("email is already registered".to_string()));
        }
        state.users.insert(doc.uid.clone(), doc.clone());
        state
            .credentials
            .insert(credentials.email.clone(), credentials.clone());
        Ok(())
    }

    async fn get_user(&self, uid: &UserId) -> AppResult<Option<UserDocument>> {
        Ok(self.state.read().await.users.get(uid).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserDocument>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_credentials_by_email(&self, email: &str) -> AppResult<Option<UserCredentials>> {
        Ok(self.state.read().await.credentials.get(email).cloned())
    }

    async fn add_friend_ref(&self, owner: &UserId, friend: &UserId) -> AppResult<()> {
        let mut state = self.state.write().await;
        let doc = state
            .users
            .get_mut(owner)
            .ok_or_else(|| Self::missing_user(owner))?;
        if !doc.friends.contains(friend) {
            doc.friends.push(friend.clone());
        }
        Ok(())
    }

    async fn remove_friend_ref(&self, owner: &UserId, friend: &UserId) -> AppResult<()> {
        let mut state = self.state.write().await;
        let doc = state
            .users
            .get_mut(owner)
            .ok_or_else(|| Self::missing_user(owner))?;
        doc.friends.retain(|f| f != friend);
        Ok(())
    }

    async fn list_favorites(&self, uid: &UserId) -> AppResult<Vec<FavoriteRecord>> {
        let state = self.state.read().await;
        Ok(state.favorites.get(uid).cloned().unwrap_or_default())
    }

    async fn upsert_favorite(&self, uid: &UserId, favorite: &FavoriteRecord) -> AppResult<()> {
        let mut state = self.state.write().await;
        let favorites = state.favorites.entry(uid.clone()).or_default();
        match favorites.iter_mut().find(|f| f.id == favorite.id) {
            Some(existing) => *existing = favorite.clone(),
            None => favorites.push(favorite.clone()),
        }
        Ok(())
    }

    async fn delete_favorite(&self, uid: &UserId, id: FilmId) -> AppResult<()> {
        let mut state = self.state.write().await;
        if let Some(favorites) = state.favorites.get_mut(uid) {
            favorites.retain(|f| f.id != id);
        }
        Ok(())
    }
}
