pub mod model;

pub use model::{
    FavoriteEntry, FavoritesModel, FilmCard, HydrateOptions, HydrateReport, HydrateSource,
};
