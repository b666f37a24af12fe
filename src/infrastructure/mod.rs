// Infrastructure - store, identity and request plumbing
pub mod auth_tokens; // Opaque auth token issue/resolve
pub mod cache; // LRU cache
pub mod database; // SQLite relation store
pub mod id_generator; // Time-ordered ID generation
pub mod middleware; // ViewerContext middleware and extractor
pub mod viewer; // Viewer context

pub use auth_tokens::{SqliteTokenIssuer, TokenIssuer};
pub use cache::Cache;
pub use database::SocialDatabase;
pub use id_generator::SnowflakeIdGenerator;
pub use viewer::ViewerContext;
