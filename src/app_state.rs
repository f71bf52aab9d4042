use chrono::{Local, NaiveDate};
use std::sync::Arc;

use crate::{
    config::Config,
    domains::favorites::FavoritesModel,
    domains::schedule::{FestivalCalendar, ScheduleBrowser},
    framework::ScreenLifetime,
    infrastructure::{
        AuthService, DocumentStore, FavoritesClient, FavoritesStore, FilmCatalog, FriendsClient,
        FriendsStore, HttpFilmCatalog, SessionHandle, SqliteDocumentStore,
    },
};

/// Long-lived collaborators shared by every screen of one app session.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: SessionHandle,
    pub catalog: Arc<dyn FilmCatalog>,
    pub favorites: Arc<dyn FavoritesStore>,
    pub friends: Arc<dyn FriendsStore>,
    pub auth: Arc<AuthService>,
    pub calendar: FestivalCalendar,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = SqliteDocumentStore::connect(&config.database.url).await?;
        let catalog = HttpFilmCatalog::new(config.api.base_url.clone());
        Self::with_backends(config, Arc::new(catalog), Arc::new(store))
    }

    /// Wires the clients around an existing catalog and document store
    pub fn with_backends(
        config: Config,
        catalog: Arc<dyn FilmCatalog>,
        store: Arc<dyn DocumentStore>,
    ) -> anyhow::Result<Self> {
        let session = SessionHandle::anonymous();
        let calendar = FestivalCalendar::from_config(&config.festival)?;

        let favorites = FavoritesClient::new(Arc::clone(&store), session.clone());
        let friends = FriendsClient::new(
            Arc::clone(&store),
            session.clone(),
            config.consistency.clone(),
        );
        let auth = AuthService::new(store, session.clone(), config.auth.bcrypt_cost);

        Ok(Self {
            config,
            session,
            catalog,
            favorites: Arc::new(favorites),
            friends: Arc::new(friends),
            auth: Arc::new(auth),
            calendar,
        })
    }

    /// Model for a screen showing favorites; dismiss `lifetime` when it unmounts
    pub fn favorites_model(&self, lifetime: ScreenLifetime) -> FavoritesModel {
        FavoritesModel::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.favorites),
            Arc::clone(&self.friends),
            lifetime,
        )
    }

    pub fn schedule_browser(&self, lifetime: ScreenLifetime) -> ScheduleBrowser {
        self.schedule_browser_on(Local::now().date_naive(), lifetime)
    }

    pub fn schedule_browser_on(&self, today: NaiveDate, lifetime: ScreenLifetime) -> ScheduleBrowser {
        ScheduleBrowser::new(Arc::clone(&self.catalog), self.calendar.clone(), today, lifetime)
    }
}
