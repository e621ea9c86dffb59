//! Database access using SeaORM.

pub mod entities;
pub mod migration;

use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::info;

/// Thin wrapper around a SeaORM connection pool, tuned the way the rest of the corpus tunes its
/// embedded SQLite connections (WAL mode, bounded pool, no sqlx-native logging since `tracing`
/// covers it).
pub struct Database {
	conn: DatabaseConnection,
}

impl Database {
	/// Connect to `database_url` (e.g. `sqlite://path/to/patchbay.db?mode=rwc` or
	/// `sqlite::memory:` for tests) and run pending migrations.
	pub async fn connect(database_url: &str) -> Result<Self, DbErr> {
		let mut opt = ConnectOptions::new(database_url);
		opt.max_connections(10)
			.min_connections(1)
			.connect_timeout(Duration::from_secs(8))
			.idle_timeout(Duration::from_secs(8))
			.sqlx_logging(false);

		let conn = SeaDatabase::connect(opt).await?;
		let db = Self { conn };
		db.apply_pragmas().await;
		db.migrate().await?;
		Ok(db)
	}

	async fn apply_pragmas(&self) {
		use sea_orm::{ConnectionTrait, Statement};
		for pragma in [
			"PRAGMA journal_mode=WAL",
			"PRAGMA synchronous=NORMAL",
			"PRAGMA foreign_keys=ON",
		] {
			let _ = self
				.conn
				.execute(Statement::from_string(
					sea_orm::DatabaseBackend::Sqlite,
					pragma,
				))
				.await;
		}
	}

	async fn migrate(&self) -> Result<(), DbErr> {
		migration::Migrator::up(&self.conn, None).await?;
		info!("database migrations applied");
		Ok(())
	}

	pub fn conn(&self) -> &DatabaseConnection {
		&self.conn
	}
}
