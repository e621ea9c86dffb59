//! Shared context wiring the Image Store, Cache Index, Pipeline Evaluator, Thumbnail Service,
//! and Invalidation Controller together behind one cheaply-cloneable handle.

use crate::cache::CacheIndex;
use crate::config::CoreConfig;
use crate::db::Database;
use crate::evaluator::Evaluator;
use crate::invalidate::InvalidationController;
use crate::store::ImageStore;
use crate::thumbnail::ThumbnailService;
use sea_orm::DbErr;

#[derive(Clone)]
pub struct CoreContext {
	pub store: ImageStore,
	pub evaluator: Evaluator,
	pub thumbnails: ThumbnailService,
	pub invalidation: InvalidationController,
	pub cache: CacheIndex,
	conn: sea_orm::DatabaseConnection,
}

impl CoreContext {
	pub async fn bootstrap(config: &CoreConfig) -> Result<Self, DbErr> {
		let db = Database::connect(&config.database_url).await?;
		let store = ImageStore::new(config.data_dir.clone());
		store
			.bootstrap()
			.await
			.map_err(|err| DbErr::Custom(err.to_string()))?;

		let cache = CacheIndex::new(db.conn().clone());
		let evaluator = Evaluator::new(db.conn().clone(), store.clone(), cache.clone());
		let thumbnails = ThumbnailService::new(store.clone(), config.thumbnailer_command.clone());
		let invalidation =
			InvalidationController::new(db.conn().clone(), cache.clone(), store.clone());

		Ok(Self {
			store,
			evaluator,
			thumbnails,
			invalidation,
			cache,
			conn: db.conn().clone(),
		})
	}

	pub fn conn(&self) -> &sea_orm::DatabaseConnection {
		&self.conn
	}
}
