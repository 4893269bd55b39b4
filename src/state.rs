use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, create_orm_conn},
    security::JwtKeys,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub keys: JwtKeys,
}

impl AppState {
    /// Takes ownership of the migrated pool; handlers only see the ORM handle.
    pub fn new(pool: DbPool, config: &AppConfig) -> Self {
        Self {
            orm: create_orm_conn(pool),
            keys: JwtKeys::new(&config.jwt_secret, config.access_token_ttl),
        }
    }
}
