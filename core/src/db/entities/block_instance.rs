//! A block *instance*: one node placed in a project's pipeline graph.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blocks")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i32,
	pub idproject: i32,
	pub idblock: i32,
	/// JSON: `{ input_port_name: upstream_block_instance_id }`
	pub connections: Json,
	/// JSON object of the frontend-supplied settings for this instance.
	pub output_value: Json,
	/// Absent/NULL is treated as enabled.
	pub enabled: Option<bool>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::block_catalogue::Entity",
		from = "Column::Idblock",
		to = "super::block_catalogue::Column::Id"
	)]
	BlockCatalogue,
}

impl Related<super::block_catalogue::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::BlockCatalogue.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
	/// Absent `enabled` counts as enabled; only an explicit `false` disables a block.
	pub fn is_enabled(&self) -> bool {
		self.enabled != Some(false)
	}

	/// Input-port name → upstream block instance id, in the order the DB returned them.
	pub fn connections_map(&self) -> BTreeMap<String, i32> {
		serde_json::from_value(self.connections.clone()).unwrap_or_default()
	}

	pub fn settings(&self) -> serde_json::Map<String, serde_json::Value> {
		match &self.output_value {
			serde_json::Value::Object(map) => map.clone(),
			_ => serde_json::Map::new(),
		}
	}
}
