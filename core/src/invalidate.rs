//! Invalidation Controller (IC): toggles a block's enabled flag and, on disabling,
//! deletes the physical files referenced by any cache row for its downstream closure.

use crate::cache::CacheIndex;
use crate::catalogue::fetch_project_blocks;
use crate::db::entities::block_instance::{self, ActiveModel, Entity};
use crate::error::InvalidationError;
use crate::store::ImageStore;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use std::collections::{HashSet, VecDeque};
use tracing::info;

#[derive(Clone)]
pub struct InvalidationController {
	conn: DatabaseConnection,
	cache: CacheIndex,
	store: ImageStore,
}

impl InvalidationController {
	pub fn new(conn: DatabaseConnection, cache: CacheIndex, store: ImageStore) -> Self {
		Self { conn, cache, store }
	}

	/// `toggleEnabled(blockId)`: flips absent/true → false or false → true, invalidating the
	/// downstream closure only on the former transition. Returns the new enabled state.
	pub async fn toggle_enabled(&self, block_id: i32) -> Result<bool, InvalidationError> {
		let instance = Entity::find_by_id(block_id)
			.one(&self.conn)
			.await?
			.ok_or(InvalidationError::BlockNotFound(block_id))?;

		let new_enabled = !instance.is_enabled();

		let mut active: ActiveModel = instance.clone().into();
		active.enabled = Set(Some(new_enabled));
		active.update(&self.conn).await?;

		if !new_enabled {
			self.invalidate_downstream(instance.idproject, block_id).await?;
		}

		Ok(new_enabled)
	}

	/// BFS over "B depends on A" starting at `block_id` inclusive, deleting every file any CI
	/// row for a block in the closure resolves to. CI rows are deleted eagerly rather than left
	/// to self-heal, for a tidier index; either is correct.
	async fn invalidate_downstream(
		&self,
		idproject: i32,
		block_id: i32,
	) -> Result<(), InvalidationError> {
		let all_blocks = fetch_project_blocks(&self.conn, idproject).await?;

		let mut closure = HashSet::new();
		closure.insert(block_id);
		let mut frontier = VecDeque::from([block_id]);
		while let Some(current) = frontier.pop_front() {
			for block in &all_blocks {
				if closure.contains(&block.id) {
					continue;
				}
				let depends_on_current = block.connections_map().values().any(|&up| up == current);
				if depends_on_current {
					closure.insert(block.id);
					frontier.push_back(block.id);
				}
			}
		}

		let idblocks: Vec<i32> = closure.into_iter().collect();
		let rows = self.cache.list_for_blocks(&idblocks).await?;
		let removed = rows.len();
		for row in rows {
			// A file already missing here is not an error: it is exactly the orphan self-heal
			// would have cleaned up on the next lookup anyway.
			let _ = self.store.delete(row.uuid).await;
			self.cache.delete_by_uuid(row.uuid).await?;
		}
		info!(block_id, removed, "invalidated downstream cache entries");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::db::entities::block_catalogue;
	use crate::db::Database;
	use sea_orm::{ActiveModelTrait, ActiveValue::Set};
	use serde_json::json;

	async fn setup() -> (Database, tempfile::TempDir, ImageStore, CacheIndex) {
		let db = Database::connect("sqlite::memory:").await.unwrap();
		let dir = tempfile::tempdir().unwrap();
		let store = ImageStore::new(dir.path().to_path_buf());
		store.bootstrap().await.unwrap();
		let cache = CacheIndex::new(db.conn().clone());
		(db, dir, store, cache)
	}

	async fn insert_general_type(conn: &sea_orm::DatabaseConnection, id: i32) {
		block_catalogue::ActiveModel {
			id: Set(id),
			name: Set("Invert".into()),
			command: Set("true".into()),
			parameter_template: Set(String::new()),
			parameter_mappings: Set(json!({})),
			gui_fields: Set(json!([])),
			outputs: Set(Some(json!({}))),
		}
		.insert(conn)
		.await
		.unwrap();
	}

	#[tokio::test]
	async fn toggling_disabled_invalidates_downstream_files() {
		let (db, _dir, store, cache) = setup().await;
		let conn = db.conn();

		insert_general_type(conn, 1).await;

		block_instance::ActiveModel {
			id: Set(10),
			idproject: Set(1),
			idblock: Set(1),
			connections: Set(json!({})),
			output_value: Set(json!({})),
			enabled: Set(None),
		}
		.insert(conn)
		.await
		.unwrap();
		block_instance::ActiveModel {
			id: Set(11),
			idproject: Set(1),
			idblock: Set(1),
			connections: Set(json!({ "a": 10 })),
			output_value: Set(json!({})),
			enabled: Set(None),
		}
		.insert(conn)
		.await
		.unwrap();

		let (uuid_10, path_10) = store.allocate_derived_path();
		tokio::fs::write(&path_10, b"x").await.unwrap();
		let (uuid_11, path_11) = store.allocate_derived_path();
		tokio::fs::write(&path_11, b"y").await.unwrap();

		cache.insert(uuid_10, 10, "{}".into(), "[]".into()).await.unwrap();
		cache
			.insert(uuid_11, 11, "{}".into(), format!("[\"{uuid_10}\"]"))
			.await
			.unwrap();

		let ic = InvalidationController::new(conn.clone(), cache.clone(), store.clone());
		let new_state = ic.toggle_enabled(10).await.unwrap();
		assert!(!new_state);

		assert!(tokio::fs::metadata(&path_10).await.is_err());
		assert!(tokio::fs::metadata(&path_11).await.is_err());
	}
}
