use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    infrastructure::{
        auth_tokens::{SqliteTokenIssuer, TokenIssuer},
        database::SocialDatabase,
        middleware::HasTokenIssuer,
    },
    services::{build_interactions, Interactions},
};

#[derive(Clone)]
pub struct AppState {
    pub interactions: Interactions,
    pub tokens: Arc<dyn TokenIssuer>,
    pub database: Arc<SocialDatabase>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let database = Arc::new(SocialDatabase::connect(&config.database).await?);
        Ok(Self::with_database(database, config))
    }

    pub fn with_database(database: Arc<SocialDatabase>, config: Config) -> Self {
        let tokens: Arc<dyn TokenIssuer> = Arc::new(SqliteTokenIssuer::new(
            database.clone(),
            config.cache.token_capacity,
        ));
        let interactions = build_interactions(database.clone(), config.feed);

        Self {
            interactions,
            tokens,
            database,
            config,
        }
    }
}

impl HasTokenIssuer for AppState {
    fn token_issuer(&self) -> &Arc<dyn TokenIssuer> {
        &self.tokens
    }
}
