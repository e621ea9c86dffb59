//! A block *type*: the catalogue entry shared by every instance of that type.
//!
//! `outputs` mirrors the original schema's `outputs IS NULL` convention for marking the
//! terminal block of a pipeline: a catalogue row with no declared outputs is the sink.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blocks_catalogue")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i32,
	pub name: String,
	pub command: String,
	pub parameter_template: String,
	/// JSON: `{ field_name: { raw_value: substituted_value } }`
	pub parameter_mappings: Json,
	/// JSON array of field names, in declared order.
	pub gui_fields: Json,
	/// `None` marks this type as a terminal (sink) block.
	pub outputs: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(has_many = "super::block_instance::Entity")]
	BlockInstance,
}

impl Related<super::block_instance::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::BlockInstance.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}

/// The three block-type names that the evaluator special-cases. Anything else dispatches
/// to the general cache-consult/execute/cache-insert pipeline.
pub const INPUT_BLOCK_NAME: &str = "Input";
pub const LOAD_IMAGE_BLOCK_NAME: &str = "Load Image";
pub const IMAGE_PREVIEW_BLOCK_NAME: &str = "Image Preview";

impl Model {
	pub fn is_terminal(&self) -> bool {
		self.outputs.is_none()
	}

	pub fn gui_field_names(&self) -> Vec<String> {
		serde_json::from_value(self.gui_fields.clone()).unwrap_or_default()
	}
}
