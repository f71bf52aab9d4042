#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use festival_companion::config::ConsistencyConfig;
use festival_companion::infrastructure::{
    DocumentStore, FavoritesClient, FilmCatalog, FriendsClient, MemoryDocumentStore, Session,
    SessionHandle,
};
use festival_companion::models::{UserCredentials, UserDocument};
use festival_companion::{AppError, AppResult, FavoriteRecord, Film, FilmId, ScheduleBlock, UserId};

pub fn init() {
    festival_companion::telemetry::init_tracing();
}

pub fn films(titles: &[(i64, &str)]) -> Vec<Film> {
    titles.iter().map(|(id, title)| Film::new(*id, *title)).collect()
}

/// Catalog backed by fixed data. Can be told to fail, or to hold every
/// response until its gate semaphore hands out a permit.
#[derive(Default)]
pub struct StaticCatalog {
    films: Mutex<Vec<Film>>,
    schedules: Mutex<HashMap<NaiveDate, Vec<ScheduleBlock>>>,
    fail: Mutex<bool>,
    gate: Option<Arc<Semaphore>>,
    pub films_requested: AtomicUsize,
    pub requested_dates: Mutex<Vec<Option<NaiveDate>>>,
}

impl StaticCatalog {
    pub fn new(films: Vec<Film>) -> Self {
        Self {
            films: Mutex::new(films),
            ..Self::default()
        }
    }

    pub fn gated(films: Vec<Film>, gate: Arc<Semaphore>) -> Self {
        Self {
            films: Mutex::new(films),
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn with_schedule(self, date: NaiveDate, blocks: Vec<ScheduleBlock>) -> Self {
        self.schedules.lock().unwrap().insert(date, blocks);
        self
    }

    pub fn set_films(&self, films: Vec<Film>) {
        *self.films.lock().unwrap() = films;
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl FilmCatalog for StaticCatalog {
    async fn list_films(&self) -> AppResult<Vec<Film>> {
        self.films_requested.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        if *self.fail.lock().unwrap() {
            return Err(AppError::Network("catalog unreachable".to_string()));
        }
        Ok(self.films.lock().unwrap().clone())
    }

    async fn list_schedule(&self, date: Option<NaiveDate>) -> AppResult<Vec<ScheduleBlock>> {
        self.requested_dates.lock().unwrap().push(date);
        self.wait_for_gate().await;
        if *self.fail.lock().unwrap() {
            return Err(AppError::Network("catalog unreachable".to_string()));
        }
        let schedules = self.schedules.lock().unwrap();
        Ok(date.and_then(|d| schedules.get(&d).cloned()).unwrap_or_default())
    }
}

/// Faults a `FlakyStore` injects
#[derive(Default)]
pub struct Faults {
    /// Further friend-ref writes allowed on an owner's document; 0 means every
    /// write on that owner fails. Owners not listed never fail.
    pub friend_write_budget: HashMap<UserId, usize>,
    pub fail_favorite_reads: bool,
    pub fail_favorite_writes: bool,
}

/// Wraps a real store, counts writes and injects failures.
pub struct FlakyStore {
    inner: Arc<dyn DocumentStore>,
    pub faults: Mutex<Faults>,
    writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            faults: Mutex::new(Faults::default()),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_friend_writes_after(&self, owner: &UserId, allowed: usize) {
        self.faults
            .lock()
            .unwrap()
            .friend_write_budget
            .insert(owner.clone(), allowed);
    }

    fn check_friend_write(&self, owner: &UserId) -> AppResult<()> {
        let mut faults = self.faults.lock().unwrap();
        match faults.friend_write_budget.get_mut(owner) {
            Some(0) => Err(AppError::Network(format!("write on {} rejected", owner))),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn check_favorite_write(&self) -> AppResult<()> {
        if self.faults.lock().unwrap().fail_favorite_writes {
            Err(AppError::Network("favorites write rejected".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn create_user(&self, doc: &UserDocument, credentials: &UserCredentials) -> AppResult<()> {
        self.inner.create_user(doc, credentials).await
    }

    async fn get_user(&self, uid: &UserId) -> AppResult<Option<UserDocument>> {
        self.inner.get_user(uid).await
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserDocument>> {
        self.inner.find_user_by_username(username).await
    }

    async fn find_credentials_by_email(&self, email: &str) -> AppResult<Option<UserCredentials>> {
        self.inner.find_credentials_by_email(email).await
    }

    async fn add_friend_ref(&self, owner: &UserId, friend: &UserId) -> AppResult<()> {
        self.check_friend_write(owner)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.add_friend_ref(owner, friend).await
    }

    async fn remove_friend_ref(&self, owner: &UserId, friend: &UserId) -> AppResult<()> {
        self.check_friend_write(owner)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_friend_ref(owner, friend).await
    }

    async fn list_favorites(&self, uid: &UserId) -> AppResult<Vec<FavoriteRecord>> {
        if self.faults.lock().unwrap().fail_favorite_reads {
            return Err(AppError::Network("favorites unreachable".to_string()));
        }
        self.inner.list_favorites(uid).await
    }

    async fn upsert_favorite(&self, uid: &UserId, favorite: &FavoriteRecord) -> AppResult<()> {
        self.check_favorite_write()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert_favorite(uid, favorite).await
    }

    async fn delete_favorite(&self, uid: &UserId, id: FilmId) -> AppResult<()> {
        self.check_favorite_write()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_favorite(uid, id).await
    }
}

pub async fn seed_user(store: &dyn DocumentStore, uid: &str, username: &str) -> UserId {
    let uid = UserId::new(uid);
    let doc = UserDocument {
        uid: uid.clone(),
        username: username.to_string(),
        full_name: format!("{} Tester", username),
        friends: Vec::new(),
        created_at: Utc::now(),
    };
    let credentials = UserCredentials {
        uid: uid.clone(),
        email: format!("{}@example.com", username),
        password_hash: "not-a-real-hash".to_string(),
    };
    store.create_user(&doc, &credentials).await.unwrap();
    uid
}

pub fn session_for(uid: &UserId) -> SessionHandle {
    SessionHandle::signed_in(Session::new(uid.clone(), format!("{}@example.com", uid)))
}

pub fn fast_consistency() -> ConsistencyConfig {
    ConsistencyConfig {
        max_compensation_attempts: 2,
        compensation_retry_delay_ms: 1,
    }
}

/// A memory store behind a `FlakyStore`, plus clients for `uid`.
pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub favorites: Arc<FavoritesClient>,
    pub friends: Arc<FriendsClient>,
    pub session: SessionHandle,
}

impl Harness {
    pub fn new(store: Arc<FlakyStore>, uid: &UserId) -> Self {
        let session = session_for(uid);
        let dyn_store: Arc<dyn DocumentStore> = store.clone();
        Self {
            favorites: Arc::new(FavoritesClient::new(Arc::clone(&dyn_store), session.clone())),
            friends: Arc::new(FriendsClient::new(dyn_store, session.clone(), fast_consistency())),
            store,
            session,
        }
    }
}

pub fn flaky_memory_store() -> Arc<FlakyStore> {
    Arc::new(FlakyStore::new(Arc::new(MemoryDocumentStore::new())))
}
