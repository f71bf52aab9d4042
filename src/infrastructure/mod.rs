// Infrastructure - remote collaborators, document-store backends and identity
pub mod traits;                // Collaborator seams
pub mod session;               // Explicit session context
pub mod catalog_client;        // Films API over HTTP
pub mod sqlite_store;          // SQLite document store
pub mod memory_store;          // In-process document store
pub mod edge_consistency;      // Symmetric friendship writes with compensation
pub mod favorites_client;      // Per-user favorites
pub mod friends_client;        // Friend graph and friends' favorites
pub mod auth;                  // Sign up / sign in / sign out

pub use traits::{DocumentStore, FavoritesStore, FilmCatalog, FriendsStore};
pub use session::{Session, SessionHandle};
pub use catalog_client::HttpFilmCatalog;
pub use sqlite_store::SqliteDocumentStore;
pub use memory_store::MemoryDocumentStore;
pub use edge_consistency::{ConsistencyStats, EdgeOperation, SymmetricEdgeWriter};
pub use favorites_client::FavoritesClient;
pub use friends_client::FriendsClient;
pub use auth::{normalize_username, AuthService, SignUp};
