//! The Cache Index (CI): memoizes a block's output UUID for a given cache key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image_cache")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub uuid: Uuid,
	pub idblock: i32,
	pub parameters_json: String,
	pub input_uuids_json: String,
	pub creation_timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
