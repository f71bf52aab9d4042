mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::Semaphore;

use common::{films, flaky_memory_store, seed_user, Harness, StaticCatalog};
use festival_companion::infrastructure::{DocumentStore, FavoritesStore};
use festival_companion::{
    AppError, FavoriteRecord, FavoritesModel, Film, FilmId, HydrateOptions, HydrateSource,
    ScreenLifetime,
};

struct Fixture {
    harness: Harness,
    catalog: Arc<StaticCatalog>,
    model: Arc<FavoritesModel>,
}

async fn fixture(catalog: StaticCatalog) -> Fixture {
    common::init();
    let store = flaky_memory_store();
    let me = seed_user(&*store, "me", "me").await;
    let harness = Harness::new(store, &me);
    let catalog = Arc::new(catalog);
    let model = Arc::new(FavoritesModel::new(
        catalog.clone(),
        harness.favorites.clone(),
        harness.friends.clone(),
        ScreenLifetime::new(),
    ));
    Fixture {
        harness,
        catalog,
        model,
    }
}

fn ids(films: &[Film]) -> Vec<i64> {
    films.iter().map(|f| f.id.value()).collect()
}

#[tokio::test]
async fn toggle_on_absent_film_then_back() {
    let fx = fixture(StaticCatalog::new(films(&[(1, "A"), (2, "B")]))).await;
    fx.model.hydrate(HydrateOptions::default()).await.unwrap();
    assert!(!fx.model.is_favorite(FilmId::new(1)));

    let film = Film::new(1, "A");
    assert!(fx.model.toggle_favorite(&film).await.unwrap());
    assert!(fx.model.is_favorite(FilmId::new(1)));
    assert_eq!(ids(&fx.model.derived_own_favorites()), vec![1]);

    assert!(!fx.model.toggle_favorite(&film).await.unwrap());
    assert!(!fx.model.is_favorite(FilmId::new(1)));
    assert!(fx.model.derived_own_favorites().is_empty());
    assert!(fx.harness.favorites.list_favorites().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_remote_write_leaves_local_state_untouched() {
    let fx = fixture(StaticCatalog::new(films(&[(1, "A")]))).await;
    fx.model.hydrate(HydrateOptions::default()).await.unwrap();

    fx.harness.store.faults.lock().unwrap().fail_favorite_writes = true;
    let err = fx.model.toggle_favorite(&Film::new(1, "A")).await.unwrap_err();
    assert!(matches!(err, AppError::Network(_)));
    assert!(!fx.model.is_favorite(FilmId::new(1)));

    fx.harness.store.faults.lock().unwrap().fail_favorite_writes = false;
    fx.model.toggle_favorite(&Film::new(1, "A")).await.unwrap();

    fx.harness.store.faults.lock().unwrap().fail_favorite_writes = true;
    assert!(fx.model.toggle_favorite(&Film::new(1, "A")).await.is_err());
    assert!(fx.model.is_favorite(FilmId::new(1)));
}

#[tokio::test]
async fn concurrent_toggles_of_one_film_are_serialized() {
    let fx = fixture(StaticCatalog::new(films(&[(1, "A")]))).await;
    fx.model.hydrate(HydrateOptions::default()).await.unwrap();

    let film = Film::new(1, "A");
    let (a, b) = tokio::join!(fx.model.toggle_favorite(&film), fx.model.toggle_favorite(&film));
    let mut outcomes = vec![a.unwrap(), b.unwrap()];
    outcomes.sort();
    assert_eq!(outcomes, vec![false, true]);

    assert!(!fx.model.is_favorite(FilmId::new(1)));
    assert!(fx.harness.favorites.list_favorites().await.unwrap().is_empty());
}

#[tokio::test]
async fn own_favorites_never_include_films_missing_from_catalog() {
    let fx = fixture(StaticCatalog::new(films(&[(1, "A"), (2, "B"), (3, "C")]))).await;
    for record in [
        FavoriteRecord { id: FilmId::new(3), title: "C".to_string(), poster_url: None },
        FavoriteRecord { id: FilmId::new(99), title: "Withdrawn".to_string(), poster_url: None },
        FavoriteRecord { id: FilmId::new(1), title: "A".to_string(), poster_url: None },
        FavoriteRecord { id: FilmId::new(98), title: String::new(), poster_url: None },
    ] {
        fx.harness.favorites.add_favorite(&record).await.unwrap();
    }

    fx.model.hydrate(HydrateOptions::default()).await.unwrap();

    // catalog order, unknown ids dropped
    assert_eq!(ids(&fx.model.derived_own_favorites()), vec![1, 3]);

    let entries = fx.model.own_favorite_entries();
    let labels: Vec<_> = entries.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["A", "C", "Unknown film #98", "Withdrawn"]);
    assert!(entries[2].film.is_none());
}

#[tokio::test]
async fn friends_favorites_are_deduplicated_in_first_seen_order() {
    let fx = fixture(StaticCatalog::new(films(&[(1, "A"), (2, "B"), (3, "C")]))).await;
    let store: &dyn DocumentStore = &*fx.harness.store;
    let me = fx.harness.session.current_uid().await.unwrap();
    let f1 = seed_user(store, "f1", "friend_one").await;
    let f2 = seed_user(store, "f2", "friend_two").await;

    for (friend, films) in [(&f1, [1, 2]), (&f2, [2, 3])] {
        store.add_friend_ref(&me, friend).await.unwrap();
        store.add_friend_ref(friend, &me).await.unwrap();
        for id in films {
            let record = FavoriteRecord { id: FilmId::new(id), title: format!("#{}", id), poster_url: None };
            store.upsert_favorite(friend, &record).await.unwrap();
        }
    }
    // a friend favorite the catalog does not know about
    let unknown = FavoriteRecord { id: FilmId::new(50), title: "?".to_string(), poster_url: None };
    store.upsert_favorite(&f2, &unknown).await.unwrap();

    let report = fx.model.hydrate(HydrateOptions::with_friends()).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.refreshed.len(), 3);

    assert_eq!(ids(&fx.model.derived_friends_favorites(10)), vec![1, 2, 3]);
    assert_eq!(ids(&fx.model.derived_friends_favorites(2)), vec![1, 2]);
    assert!(fx.model.derived_friends_favorites(0).is_empty());

    assert_eq!(ids(&fx.model.favorites_of_friend(&f2)), vec![2, 3]);
    let usernames: Vec<_> = fx.model.friends().into_iter().map(|v| v.username).collect();
    assert_eq!(usernames, vec!["friend_one", "friend_two"]);
}

#[tokio::test]
async fn favorites_failure_keeps_prior_cached_favorites() {
    let fx = fixture(StaticCatalog::new(films(&[(1, "A"), (2, "B")]))).await;

    // Fresh model: nothing cached yet, so the derived list is simply empty
    fx.harness.store.faults.lock().unwrap().fail_favorite_reads = true;
    let report = fx.model.hydrate(HydrateOptions::default()).await.unwrap();
    assert!(report.failed(HydrateSource::Favorites));
    assert!(!report.failed(HydrateSource::Catalog));
    assert!(fx.model.derived_own_favorites().is_empty());
    assert_eq!(fx.model.film_cards().len(), 2);

    fx.harness.store.faults.lock().unwrap().fail_favorite_reads = false;
    fx.model.toggle_favorite(&Film::new(1, "A")).await.unwrap();

    // Catalog changes, favorites fetch fails again: prior favorites survive
    fx.catalog.set_films(films(&[(1, "A"), (2, "B"), (3, "C")]));
    fx.harness.store.faults.lock().unwrap().fail_favorite_reads = true;
    let report = fx.model.hydrate(HydrateOptions::default()).await.unwrap();
    assert!(report.failed(HydrateSource::Favorites));
    assert_eq!(ids(&fx.model.derived_own_favorites()), vec![1]);
    assert_eq!(fx.model.film_cards().len(), 3);
}

#[tokio::test]
async fn catalog_failure_keeps_prior_films() {
    let fx = fixture(StaticCatalog::new(films(&[(1, "A"), (2, "B")]))).await;
    fx.model.hydrate(HydrateOptions::default()).await.unwrap();
    fx.harness
        .favorites
        .add_favorite(&FavoriteRecord::from(&Film::new(2, "B")))
        .await
        .unwrap();

    fx.catalog.set_failing(true);
    let report = fx.model.hydrate(HydrateOptions::default()).await.unwrap();
    assert!(report.failed(HydrateSource::Catalog));
    assert!(report.refreshed.contains(&HydrateSource::Favorites));
    assert_eq!(ids(&fx.model.derived_own_favorites()), vec![2]);
}

#[tokio::test]
async fn hydrate_fails_only_when_catalog_and_favorites_both_fail() {
    let fx = fixture(StaticCatalog::new(films(&[(1, "A")]))).await;
    fx.model.hydrate(HydrateOptions::default()).await.unwrap();

    fx.catalog.set_failing(true);
    fx.harness.store.faults.lock().unwrap().fail_favorite_reads = true;
    let err = fx.model.hydrate(HydrateOptions::default()).await.unwrap_err();
    assert!(matches!(err, AppError::HydrateFailed { .. }));

    assert_eq!(fx.model.film_cards().len(), 1);
}

#[tokio::test]
async fn results_after_dismissal_are_dropped() {
    common::init();
    let gate = Arc::new(Semaphore::new(0));
    let fx = fixture(StaticCatalog::gated(films(&[(1, "A")]), gate.clone())).await;

    let model = fx.model.clone();
    let pending = tokio::spawn(async move { model.hydrate(HydrateOptions::default()).await });

    fx.model.lifetime().dismiss();
    gate.add_permits(10);

    let report = pending.await.unwrap().unwrap();
    assert!(report.discarded);
    assert!(fx.model.film_cards().is_empty());

    // the remote write still happens, the local set does not change
    assert!(fx.model.toggle_favorite(&Film::new(1, "A")).await.unwrap());
    assert!(!fx.model.is_favorite(FilmId::new(1)));
    assert_eq!(fx.harness.favorites.list_favorites().await.unwrap().len(), 1);
}

#[tokio::test]
async fn toggle_confirmed_during_hydrate_is_not_overwritten() {
    common::init();
    let gate = Arc::new(Semaphore::new(0));
    let fx = fixture(StaticCatalog::gated(films(&[(1, "A")]), gate.clone())).await;

    let model = fx.model.clone();
    let pending = tokio::spawn(async move { model.hydrate(HydrateOptions::default()).await });
    // the favorites fetch resolves empty while the catalog is held
    while fx.catalog.films_requested.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    assert!(fx.model.toggle_favorite(&Film::new(1, "A")).await.unwrap());
    assert!(fx.model.is_favorite(FilmId::new(1)));

    gate.add_permits(1);
    let report = pending.await.unwrap().unwrap();
    assert!(!report.discarded);
    assert_eq!(fx.model.film_cards().len(), 1);
    assert!(fx.model.is_favorite(FilmId::new(1)));
    assert_eq!(fx.harness.favorites.list_favorites().await.unwrap().len(), 1);

    // with nothing toggled in between, the next hydrate applies the fetched list
    fx.harness.favorites.remove_favorite(FilmId::new(1)).await.unwrap();
    gate.add_permits(1);
    fx.model.hydrate(HydrateOptions::default()).await.unwrap();
    assert!(!fx.model.is_favorite(FilmId::new(1)));
}

#[tokio::test]
async fn film_cards_carry_favorite_flag_in_catalog_order() {
    let fx = fixture(StaticCatalog::new(films(&[(3, "C"), (1, "A"), (2, "B")]))).await;
    fx.harness
        .favorites
        .add_favorite(&FavoriteRecord::from(&Film::new(1, "A")))
        .await
        .unwrap();
    fx.model.hydrate(HydrateOptions::default()).await.unwrap();

    let cards: Vec<_> = fx
        .model
        .film_cards()
        .into_iter()
        .map(|c| (c.film.id.value(), c.is_favorite))
        .collect();
    assert_eq!(cards, vec![(3, false), (1, true), (2, false)]);
    assert_eq!(fx.model.film(FilmId::new(2)).map(|f| f.title), Some("B".to_string()));
    assert_eq!(fx.model.film(FilmId::new(9)), None);
}

#[tokio::test]
async fn add_and_remove_friend_refresh_friends_view() {
    let fx = fixture(StaticCatalog::new(films(&[(1, "A")]))).await;
    let store: &dyn DocumentStore = &*fx.harness.store;
    let pal = seed_user(store, "pal", "pal").await;
    store
        .upsert_favorite(&pal, &FavoriteRecord::from(&Film::new(1, "A")))
        .await
        .unwrap();
    fx.model.hydrate(HydrateOptions::with_friends()).await.unwrap();
    assert!(fx.model.friends().is_empty());

    let profile = fx.model.add_friend("  pal ").await.unwrap();
    assert_eq!(profile.uid, pal);
    assert_eq!(ids(&fx.model.derived_friends_favorites(10)), vec![1]);

    fx.model.remove_friend(&pal).await.unwrap();
    assert!(fx.model.friends().is_empty());
    assert!(fx.model.derived_friends_favorites(10).is_empty());
}
