//! Block Catalogue / Block Graph (BG) reads. Kept as plain query helpers rather than a
//! persistent graph structure: each evaluator recursion fetches only the row it visits, so the
//! whole project graph is never loaded into memory at once.

use crate::db::entities::{block_catalogue, block_instance, input_image};
use crate::error::EvaluatorError;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

pub async fn fetch_block_instance(
	conn: &DatabaseConnection,
	id: i32,
) -> Result<block_instance::Model, EvaluatorError> {
	block_instance::Entity::find_by_id(id)
		.one(conn)
		.await?
		.ok_or(EvaluatorError::BlockNotFound(id))
}

pub async fn fetch_block_type(
	conn: &DatabaseConnection,
	idblock: i32,
) -> Result<block_catalogue::Model, EvaluatorError> {
	block_catalogue::Entity::find_by_id(idblock)
		.one(conn)
		.await?
		.ok_or(EvaluatorError::BlockNotFound(idblock))
}

pub async fn fetch_input_image_by_filename(
	conn: &DatabaseConnection,
	filename: &str,
) -> Result<Option<input_image::Model>, sea_orm::DbErr> {
	input_image::Entity::find()
		.filter(input_image::Column::OriginalFilename.eq(filename))
		.one(conn)
		.await
}

/// The unique terminal block of a project: the block instance whose catalogue row has
/// `outputs IS NULL`.
pub async fn fetch_terminal_block(
	conn: &DatabaseConnection,
	idproject: i32,
) -> Result<Option<block_instance::Model>, sea_orm::DbErr> {
	let instances = block_instance::Entity::find()
		.filter(block_instance::Column::Idproject.eq(idproject))
		.all(conn)
		.await?;

	for instance in instances {
		let block_type = block_catalogue::Entity::find_by_id(instance.idblock)
			.one(conn)
			.await?;
		if block_type.is_some_and(|t| t.is_terminal()) {
			return Ok(Some(instance));
		}
	}
	Ok(None)
}

/// All block instances in a project, for the Invalidation Controller's single batched fetch.
pub async fn fetch_project_blocks(
	conn: &DatabaseConnection,
	idproject: i32,
) -> Result<Vec<block_instance::Model>, sea_orm::DbErr> {
	block_instance::Entity::find()
		.filter(block_instance::Column::Idproject.eq(idproject))
		.all(conn)
		.await
}
