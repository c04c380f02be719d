use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

pub use sea_orm::{ConnectionTrait, DbErr, TransactionTrait};

pub mod entities;
pub mod models;
pub mod types;

/// Shared handle to the relational store. Cloned into every request handler;
/// all coordination happens through the datastore's transactions.
#[derive(Clone)]
pub struct DbService {
    pub conn: DatabaseConnection,
}

impl DbService {
    /// Connects and brings the schema up to date. The URL is injected by the
    /// caller so tests can point at `sqlite::memory:`.
    pub async fn connect(database_url: &str) -> Result<DbService, DbErr> {
        let conn = Database::connect(database_url).await?;
        db_migration::Migrator::up(&conn, None).await?;
        Ok(DbService { conn })
    }
}
