//! An originally-uploaded image, named by its content handle.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "input_images")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub uuid: Uuid,
	pub original_filename: String,
	pub upload_timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
