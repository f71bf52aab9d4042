// Favorites reconciliation model
// Local cache of the catalog, own favorites and friends' favorites, with the
// derived lists screens render. Remote confirmation gates every local mutation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::core::{FilmId, UserId};
use crate::error::{AppError, AppResult};
use crate::framework::ScreenLifetime;
use crate::infrastructure::traits::{FavoritesStore, FilmCatalog, FriendsStore};
use crate::models::{FavoriteRecord, Film, FriendFavoritesView, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrateSource {
    Catalog,
    Favorites,
    Friends,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HydrateOptions {
    pub include_friends: bool,
}

impl HydrateOptions {
    pub fn with_friends() -> Self {
        Self { include_friends: true }
    }
}

/// Outcome of a hydrate that did not fail outright. A source listed in
/// `failures` kept whatever the model held before the call.
#[derive(Debug, Default)]
pub struct HydrateReport {
    pub refreshed: Vec<HydrateSource>,
    pub failures: Vec<(HydrateSource, AppError)>,
    /// Set when the screen was dismissed before the fetches resolved
    pub discarded: bool,
}

impl HydrateReport {
    pub fn is_complete(&self) -> bool {
        !self.discarded && self.failures.is_empty()
    }

    pub fn failed(&self, source: HydrateSource) -> bool {
        self.failures.iter().any(|(s, _)| *s == source)
    }
}

/// A catalog film joined with the caller's favorite flag
#[derive(Debug, Clone, PartialEq)]
pub struct FilmCard {
    pub film: Film,
    pub is_favorite: bool,
}

/// One of the caller's favorites, whether or not the catalog still knows it
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteEntry {
    pub id: FilmId,
    pub label: String,
    pub poster_url: Option<String>,
    pub film: Option<Film>,
}

#[derive(Default)]
struct ModelState {
    films: Vec<Film>,
    film_index: HashMap<FilmId, usize>,
    favorites: HashMap<FilmId, FavoriteRecord>,
    /// Bumped by every confirmed toggle applied locally
    favorites_generation: u64,
    friend_favorites: Vec<FriendFavoritesView>,
}

impl ModelState {
    fn replace_films(&mut self, films: Vec<Film>) {
        let mut index = HashMap::with_capacity(films.len());
        let mut unique = Vec::with_capacity(films.len());
        for film in films {
            if index.contains_key(&film.id) {
                warn!("Catalog returned film {} twice, keeping the first", film.id);
                continue;
            }
            index.insert(film.id, unique.len());
            unique.push(film);
        }
        self.films = unique;
        self.film_index = index;
    }

    fn replace_favorites(&mut self, records: Vec<FavoriteRecord>) {
        self.favorites = records.into_iter().map(|r| (r.id, r)).collect();
    }

    fn film(&self, id: FilmId) -> Option<&Film> {
        self.film_index.get(&id).map(|&i| &self.films[i])
    }
}

pub struct FavoritesModel {
    catalog: Arc<dyn FilmCatalog>,
    favorites: Arc<dyn FavoritesStore>,
    friends: Arc<dyn FriendsStore>,
    lifetime: ScreenLifetime,
    state: RwLock<ModelState>,
    toggle_locks: Mutex<HashMap<FilmId, Arc<Mutex<()>>>>,
}

impl FavoritesModel {
    pub fn new(
        catalog: Arc<dyn FilmCatalog>,
        favorites: Arc<dyn FavoritesStore>,
        friends: Arc<dyn FriendsStore>,
        lifetime: ScreenLifetime,
    ) -> Self {
        Self {
            catalog,
            favorites,
            friends,
            lifetime,
            state: RwLock::new(ModelState::default()),
            toggle_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn lifetime(&self) -> &ScreenLifetime {
        &self.lifetime
    }

    // Guards are only ever held for synchronous sections, never across an await.
    fn read_state(&self) -> RwLockReadGuard<'_, ModelState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ModelState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches catalog and favorites (and friends' favorites when asked)
    /// concurrently. Each source is applied independently; only when both the
    /// catalog and the favorites fail does the call fail.
    #[instrument(skip(self))]
    pub async fn hydrate(&self, options: HydrateOptions) -> AppResult<HydrateReport> {
        let generation = self.read_state().favorites_generation;
        let friends = async {
            if options.include_friends {
                Some(self.friends.list_friends_favorites().await)
            } else {
                None
            }
        };

        let (films, favorites, friends) = tokio::join!(
            self.catalog.list_films(),
            self.favorites.list_favorites(),
            friends
        );

        if !self.lifetime.is_alive() {
            debug!("Screen dismissed before hydrate resolved, dropping results");
            return Ok(HydrateReport {
                discarded: true,
                ..HydrateReport::default()
            });
        }

        let (films, favorites) = match (films, favorites) {
            (Err(catalog), Err(favorites)) => {
                warn!("Hydrate failed: catalog ({}), favorites ({})", catalog, favorites);
                return Err(AppError::HydrateFailed {
                    catalog: Box::new(catalog),
                    favorites: Box::new(favorites),
                });
            }
            other => other,
        };

        Ok(self.apply_hydrate(generation, films, favorites, friends))
    }

    fn apply_hydrate(
        &self,
        generation: u64,
        films: AppResult<Vec<Film>>,
        favorites: AppResult<Vec<FavoriteRecord>>,
        friends: Option<AppResult<Vec<FriendFavoritesView>>>,
    ) -> HydrateReport {
        let mut report = HydrateReport::default();
        let mut state = self.write_state();

        match films {
            Ok(films) => {
                state.replace_films(films);
                report.refreshed.push(HydrateSource::Catalog);
            }
            Err(e) => {
                warn!("Catalog fetch failed, keeping {} cached films: {}", state.films.len(), e);
                report.failures.push((HydrateSource::Catalog, e));
            }
        }

        match favorites {
            // A toggle confirmed while this list was in flight is newer than it
            Ok(_) if state.favorites_generation != generation => {
                debug!("Favorites toggled during hydrate, keeping the local set");
            }
            Ok(records) => {
                state.replace_favorites(records);
                report.refreshed.push(HydrateSource::Favorites);
            }
            Err(e) => {
                warn!(
                    "Favorites fetch failed, keeping {} cached favorites: {}",
                    state.favorites.len(),
                    e
                );
                report.failures.push((HydrateSource::Favorites, e));
            }
        }

        match friends {
            Some(Ok(views)) => {
                state.friend_favorites = views;
                report.refreshed.push(HydrateSource::Friends);
            }
            Some(Err(e)) => {
                warn!("Friends' favorites fetch failed: {}", e);
                report.failures.push((HydrateSource::Friends, e));
            }
            None => {}
        }

        info!(
            "Hydrated: {} films, {} favorites, {} friends",
            state.films.len(),
            state.favorites.len(),
            state.friend_favorites.len()
        );
        report
    }

    pub fn is_favorite(&self, id: FilmId) -> bool {
        self.read_state().favorites.contains_key(&id)
    }

    pub fn favorite_count(&self) -> usize {
        self.read_state().favorites.len()
    }

    async fn toggle_lock(&self, id: FilmId) -> Arc<Mutex<()>> {
        let mut locks = self.toggle_locks.lock().await;
        Arc::clone(locks.entry(id).or_default())
    }

    /// Flips the favorite state of `film` and returns the new state. The local
    /// set changes only after the store confirms; toggles of the same film run
    /// one at a time.
    #[instrument(skip(self, film), fields(film_id = %film.id))]
    pub async fn toggle_favorite(&self, film: &Film) -> AppResult<bool> {
        let lock = self.toggle_lock(film.id).await;
        let result = {
            let _serialized = lock.lock().await;
            self.toggle_serialized(film).await
        };
        self.release_toggle_lock(film.id, lock).await;
        result
    }

    async fn release_toggle_lock(&self, id: FilmId, lock: Arc<Mutex<()>>) {
        let mut locks = self.toggle_locks.lock().await;
        // Nobody but the map and this caller holds it, so no toggle is queued
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&id);
        }
    }

    async fn toggle_serialized(&self, film: &Film) -> AppResult<bool> {
        let was_favorite = self.is_favorite(film.id);
        let record = FavoriteRecord::from(film);
        let result = if was_favorite {
            self.favorites.remove_favorite(film.id).await
        } else {
            self.favorites.add_favorite(&record).await
        };

        if let Err(e) = result {
            warn!("Toggling favorite {} failed, local state unchanged: {}", film.id, e);
            return Err(e);
        }

        if !self.lifetime.is_alive() {
            debug!("Screen dismissed, skipping local update for {}", film.id);
            return Ok(!was_favorite);
        }

        let mut state = self.write_state();
        if was_favorite {
            state.favorites.remove(&film.id);
        } else {
            state.favorites.insert(film.id, record);
        }
        state.favorites_generation += 1;
        Ok(!was_favorite)
    }

    /// Own favorites present in the catalog, in catalog order
    pub fn derived_own_favorites(&self) -> Vec<Film> {
        let state = self.read_state();
        state
            .films
            .iter()
            .filter(|f| state.favorites.contains_key(&f.id))
            .cloned()
            .collect()
    }

    /// Every own favorite, with a display label even when the catalog no
    /// longer has the film. Catalog order first, then unknown ids ascending.
    pub fn own_favorite_entries(&self) -> Vec<FavoriteEntry> {
        let state = self.read_state();
        let mut known = Vec::new();
        let mut unknown = Vec::new();

        for record in state.favorites.values() {
            match state.film_index.get(&record.id) {
                Some(&position) => {
                    let film = state.films[position].clone();
                    known.push((
                        position,
                        FavoriteEntry {
                            id: record.id,
                            label: film.title.clone(),
                            poster_url: film.poster_url.clone().or_else(|| record.poster_url.clone()),
                            film: Some(film),
                        },
                    ));
                }
                None => unknown.push(FavoriteEntry {
                    id: record.id,
                    label: fallback_label(record),
                    poster_url: record.poster_url.clone(),
                    film: None,
                }),
            }
        }

        known.sort_by_key(|(position, _)| *position);
        unknown.sort_by_key(|entry| entry.id);
        known.into_iter().map(|(_, e)| e).chain(unknown).collect()
    }

    /// Friends' favorites flattened in friend order, then each friend's own
    /// favorite order; first occurrence wins, unknown films are dropped, and
    /// the result is cut to `limit`.
    pub fn derived_friends_favorites(&self, limit: usize) -> Vec<Film> {
        let state = self.read_state();
        let mut seen = HashSet::new();

        state
            .friend_favorites
            .iter()
            .flat_map(|view| view.film_ids.iter().copied())
            .filter(|id| seen.insert(*id))
            .filter_map(|id| state.film(id).cloned())
            .take(limit)
            .collect()
    }

    /// All catalog films with the favorite flag, in catalog order
    pub fn film_cards(&self) -> Vec<FilmCard> {
        let state = self.read_state();
        state
            .films
            .iter()
            .map(|film| FilmCard {
                film: film.clone(),
                is_favorite: state.favorites.contains_key(&film.id),
            })
            .collect()
    }

    pub fn film(&self, id: FilmId) -> Option<Film> {
        self.read_state().film(id).cloned()
    }

    pub fn friends(&self) -> Vec<FriendFavoritesView> {
        self.read_state().friend_favorites.clone()
    }

    /// One friend's favorites in their own order, unknown films dropped
    pub fn favorites_of_friend(&self, uid: &UserId) -> Vec<Film> {
        let state = self.read_state();
        state
            .friend_favorites
            .iter()
            .find(|view| &view.uid == uid)
            .map(|view| {
                view.film_ids
                    .iter()
                    .filter_map(|id| state.film(*id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Re-fetches friends' favorites wholesale
    pub async fn refresh_friends(&self) -> AppResult<()> {
        let views = self.friends.list_friends_favorites().await?;
        if !self.lifetime.is_alive() {
            debug!("Screen dismissed, dropping friends refresh");
            return Ok(());
        }
        self.write_state().friend_favorites = views;
        Ok(())
    }

    /// Adds a friend, then refreshes friends' favorites. A failed refresh
    /// leaves the previous friends view in place and does not fail the add.
    pub async fn add_friend(&self, username: &str) -> AppResult<UserProfile> {
        let profile = self.friends.add_friend_by_username(username).await?;
        if let Err(e) = self.refresh_friends().await {
            warn!("Added {} but refreshing friends failed: {}", profile.uid, e);
        }
        Ok(profile)
    }

    pub async fn remove_friend(&self, uid: &UserId) -> AppResult<()> {
        self.friends.remove_friend(uid).await?;
        if let Err(e) = self.refresh_friends().await {
            warn!("Removed {} but refreshing friends failed: {}", uid, e);
        }
        Ok(())
    }
}

fn fallback_label(record: &FavoriteRecord) -> String {
    if record.title.trim().is_empty() {
        format!("Unknown film #{}", record.id)
    } else {
        record.title.clone()
    }
}
