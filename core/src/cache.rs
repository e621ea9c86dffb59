//! Cache Index (CI): the durable memoization table the evaluator consults on every
//! general-block visit.

use crate::db::entities::image_cache::{ActiveModel, Column, Entity, Model};
use chrono::Utc;
use sea_orm::{
	ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct CacheIndex {
	conn: DatabaseConnection,
}

impl CacheIndex {
	pub fn new(conn: DatabaseConnection) -> Self {
		Self { conn }
	}

	/// The consult step of the general-block pipeline: does a row exist for this exact cache key?
	pub async fn lookup(
		&self,
		idblock: i32,
		parameters_json: &str,
		input_uuids_json: &str,
	) -> Result<Option<Model>, DbErr> {
		Entity::find()
			.filter(Column::Idblock.eq(idblock))
			.filter(Column::ParametersJson.eq(parameters_json))
			.filter(Column::InputUuidsJson.eq(input_uuids_json))
			.one(&self.conn)
			.await
	}

	/// The insert step of the general-block pipeline, run only after a successful execution.
	pub async fn insert(
		&self,
		uuid: Uuid,
		idblock: i32,
		parameters_json: String,
		input_uuids_json: String,
	) -> Result<(), DbErr> {
		let row = ActiveModel {
			uuid: Set(uuid),
			idblock: Set(idblock),
			parameters_json: Set(parameters_json),
			input_uuids_json: Set(input_uuids_json),
			creation_timestamp: Set(Utc::now()),
		};
		Entity::insert(row).exec(&self.conn).await?;
		Ok(())
	}

	/// Self-heal: an orphaned row — file missing — is deleted unconditionally.
	/// Double-deletion is idempotent.
	pub async fn delete_by_uuid(&self, uuid: Uuid) -> Result<(), DbErr> {
		Entity::delete_by_id(uuid).exec(&self.conn).await?;
		Ok(())
	}

	/// All cache rows belonging to any of `idblocks`, used by the Invalidation Controller to
	/// enumerate files to delete for a downstream closure and by the "most recent output
	/// for a block" read path.
	pub async fn list_for_blocks(&self, idblocks: &[i32]) -> Result<Vec<Model>, DbErr> {
		Entity::find()
			.filter(Column::Idblock.is_in(idblocks.iter().copied()))
			.all(&self.conn)
			.await
	}

	/// Most recently created cache row for a single block, used by `GET
	/// /VIPS/block/:block_id/image`.
	pub async fn most_recent_for_block(&self, idblock: i32) -> Result<Option<Model>, DbErr> {
		use sea_orm::QueryOrder;
		Entity::find()
			.filter(Column::Idblock.eq(idblock))
			.order_by_desc(Column::CreationTimestamp)
			.one(&self.conn)
			.await
	}
}
