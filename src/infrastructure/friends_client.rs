use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::ConsistencyConfig;
use crate::core::UserId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::auth::normalize_username;
use crate::infrastructure::edge_consistency::{ConsistencyStats, SymmetricEdgeWriter};
use crate::infrastructure::session::SessionHandle;
use crate::infrastructure::traits::{DocumentStore, FriendsStore};
use crate::models::{FriendFavoritesView, UserDocument, UserProfile};

/// Friend graph of whoever is signed in on `session`.
pub struct FriendsClient {
    store: Arc<dyn DocumentStore>,
    session: SessionHandle,
    edges: SymmetricEdgeWriter,
}

impl FriendsClient {
    pub fn new(store: Arc<dyn DocumentStore>, session: SessionHandle, config: ConsistencyConfig) -> Self {
        let edges = SymmetricEdgeWriter::new(Arc::clone(&store), config);
        Self { store, session, edges }
    }

    pub async fn consistency_stats(&self) -> ConsistencyStats {
        self.edges.get_stats().await
    }

    async fn current_document(&self) -> AppResult<UserDocument> {
        let uid = self.session.current_uid().await?;
        self.store
            .get_user(&uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", uid)))
    }

    async fn friend_view(&self, uid: &UserId) -> AppResult<Option<FriendFavoritesView>> {
        let doc = match self.store.get_user(uid).await? {
            Some(doc) => doc,
            None => return Ok(None),
        };
        let favorites = self.store.list_favorites(uid).await?;

        Ok(Some(FriendFavoritesView {
            uid: doc.uid,
            full_name: doc.full_name,
            username: doc.username,
            film_ids: favorites.into_iter().map(|f| f.id).collect(),
        }))
    }
}

#[async_trait]
impl FriendsStore for FriendsClient {
    async fn current_profile(&self) -> AppResult<UserProfile> {
        Ok(self.current_document().await?.profile())
    }

    #[instrument(skip(self))]
    async fn list_friends_favorites(&self) -> AppResult<Vec<FriendFavoritesView>> {
        let me = self.current_document().await?;

        let lookups = me.friends.iter().map(|uid| self.friend_view(uid));
        let mut views = Vec::with_capacity(me.friends.len());
        for (uid, result) in me.friends.iter().zip(join_all(lookups).await) {
            match result? {
                Some(view) => views.push(view),
                None => warn!("Friend {} of {} has no user document, skipping", uid, me.uid),
            }
        }
        Ok(views)
    }

    #[instrument(skip(self))]
    async fn add_friend_by_username(&self, username: &str) -> AppResult<UserProfile> {
        let username = normalize_username(username);
        if username.is_empty() {
            return Err(AppError::Validation("username cannot be empty".to_string()));
        }

        let caller = self.current_document().await?;
        let friend = self
            .store
            .find_user_by_username(&username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("username {}", username)))?;

        if friend.uid == caller.uid {
            return Err(AppError::SelfReference);
        }

        let already_linked = caller.friends.contains(&friend.uid);
        self.edges.link(&caller.uid, &friend.uid, already_linked).await?;
        info!("{} added {} as friend", caller.uid, friend.uid);
        Ok(friend.profile())
    }

    #[instrument(skip(self))]
    async fn remove_friend(&self, uid: &UserId) -> AppResult<()> {
        let caller = self.current_document().await?;
        if *uid == caller.uid {
            return Err(AppError::SelfReference);
        }

        // A deleted peer has no side to unlink; just drop the dangling reference.
        if self.store.get_user(uid).await?.is_none() {
            warn!("Friend {} of {} no longer exists", uid, caller.uid);
            return self.store.remove_friend_ref(&caller.uid, uid).await;
        }

        let already_unlinked = !caller.friends.contains(uid);
        self.edges.unlink(&caller.uid, uid, already_unlinked).await?;
        info!("{} removed friend {}", caller.uid, uid);
        Ok(())
    }
}
