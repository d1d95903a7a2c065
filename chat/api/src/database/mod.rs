use std::str::FromStr;

use common::database::Ulid;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::config::DatabaseConfig;

mod message;
mod room;
mod room_member;
mod session;
mod user;

pub use message::*;
pub use room::*;
pub use room_member::*;
pub use session::*;
pub use user::*;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
	let options = SqliteConnectOptions::from_str(&config.uri)?
		.create_if_missing(true)
		.foreign_keys(true)
		.journal_mode(SqliteJournalMode::Wal);

	let pool = SqlitePoolOptions::new()
		.max_connections(config.max_connections)
		.connect_with(options)
		.await?;

	MIGRATOR.run(&pool).await?;

	Ok(pool)
}

/// Builds `{select} WHERE {column} IN (...) {suffix}` with one bind per key.
pub fn select_in(select: &str, column: &str, keys: &[Ulid], suffix: &str) -> QueryBuilder<'static, Sqlite> {
	let mut query = QueryBuilder::new(format!("{select} WHERE {column} IN ("));

	let mut separated = query.separated(", ");
	for key in keys {
		separated.push_bind(*key);
	}
	separated.push_unseparated(") ");

	query.push(suffix);
	query
}

/// Whether the error is a violated `UNIQUE` constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
	matches!(err, sqlx::Error::Database(err) if err.is_unique_violation())
}
