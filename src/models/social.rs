// Per-user documents held by the document store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{FilmId, UserId};
use crate::models::film::Film;

/// A favorite is a presence fact keyed by film id. Title and poster are
/// copied at favorite time and may drift from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    pub id: FilmId,
    pub title: String,
    pub poster_url: Option<String>,
}

impl From<&Film> for FavoriteRecord {
    fn from(film: &Film) -> Self {
        Self {
            id: film.id,
            title: film.title.clone(),
            poster_url: film.poster_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub uid: UserId,
    pub username: String,
    pub full_name: String,
    /// Peer uids, in the order they were added
    pub friends: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl UserDocument {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            uid: self.uid.clone(),
            full_name: self.full_name.clone(),
            username: self.username.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub uid: UserId,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: UserId,
    pub full_name: String,
    pub username: String,
}

/// What one friend has favorited. Refreshed wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendFavoritesView {
    pub uid: UserId,
    pub full_name: String,
    pub username: String,
    pub film_ids: Vec<FilmId>,
}
