//! Pipeline Evaluator (PE): the recursive DAG walker that materializes a block's output image.

use crate::cache::CacheIndex;
use crate::catalogue::{fetch_block_instance, fetch_block_type, fetch_input_image_by_filename};
use crate::db::entities::block_catalogue::{
	IMAGE_PREVIEW_BLOCK_NAME, INPUT_BLOCK_NAME, LOAD_IMAGE_BLOCK_NAME,
};
use crate::error::EvaluatorError;
use crate::executor;
use crate::store::ImageStore;
use crate::template::{apply_parameter_mappings, build_parameter_argv};
use sea_orm::DatabaseConnection;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

/// Request-scoped evaluation state: the memoization map keyed by `(block id, initial input)`,
/// plus the in-flight visitation set used to fail fast on cycles. Exposed so a single shared
/// instance can back multiple inputs in one batch request (`/VIPS/project/:projectid/outputs`),
/// so diamond dependencies across inputs are not recomputed.
#[derive(Default)]
pub struct EvalState {
	memo: HashMap<(i32, Uuid), Uuid>,
	visiting: HashSet<(i32, Uuid)>,
}

impl EvalState {
	pub fn new() -> Self {
		Self::default()
	}
}

#[derive(Clone)]
pub struct Evaluator {
	conn: DatabaseConnection,
	store: ImageStore,
	cache: CacheIndex,
}

impl Evaluator {
	pub fn new(conn: DatabaseConnection, store: ImageStore, cache: CacheIndex) -> Self {
		Self { conn, store, cache }
	}

	/// Public entry point: `resultOf(blockId, initialInputUuid) → outputUuid | failure`.
	pub async fn result_of(
		&self,
		block_id: i32,
		initial_input: Uuid,
	) -> Result<Uuid, EvaluatorError> {
		let mut state = EvalState::new();
		self.eval_block(&mut state, block_id, initial_input).await
	}

	/// Same as [`Self::result_of`] but reuses an externally-owned [`EvalState`], so a batch of
	/// inputs against the same project shares one memoization map.
	pub async fn result_of_with_state<'a>(
		&'a self,
		state: &'a mut EvalState,
		block_id: i32,
		initial_input: Uuid,
	) -> Result<Uuid, EvaluatorError> {
		self.eval_block(state, block_id, initial_input).await
	}

	fn eval_block<'a>(
		&'a self,
		state: &'a mut EvalState,
		block_id: i32,
		initial_input: Uuid,
	) -> Pin<Box<dyn Future<Output = Result<Uuid, EvaluatorError>> + Send + 'a>> {
		Box::pin(async move {
			let key = (block_id, initial_input);
			if let Some(uuid) = state.memo.get(&key) {
				return Ok(*uuid);
			}
			if !state.visiting.insert(key) {
				return Err(EvaluatorError::Cycle(block_id));
			}

			let result = self.eval_block_uncached(state, block_id, initial_input).await;

			state.visiting.remove(&key);
			if let Ok(uuid) = result {
				state.memo.insert(key, uuid);
			}
			result
		})
	}

	async fn eval_block_uncached(
		&self,
		state: &mut EvalState,
		block_id: i32,
		initial_input: Uuid,
	) -> Result<Uuid, EvaluatorError> {
		let instance = fetch_block_instance(&self.conn, block_id).await?;
		let block_type = fetch_block_type(&self.conn, instance.idblock).await?;

		// 1. Disabled block: pass through its lexicographically-first input. Never touches CI.
		if !instance.is_enabled() {
			let connections = instance.connections_map();
			let (_, &upstream_id) = connections
				.iter()
				.next()
				.ok_or(EvaluatorError::DisabledWithoutInput(block_id))?;
			return self.eval_block(state, upstream_id, initial_input).await;
		}

		// 2. `Input` block: returns the initial input unchanged.
		if block_type.name == INPUT_BLOCK_NAME {
			return Ok(initial_input);
		}

		// 3. `Load Image` block: looks up `input_images` by the `filename` setting.
		if block_type.name == LOAD_IMAGE_BLOCK_NAME {
			let settings = instance.settings();
			let filename = settings
				.get("filename")
				.and_then(|v| v.as_str())
				.unwrap_or_default()
				.to_string();
			let row = fetch_input_image_by_filename(&self.conn, &filename).await?;
			return row
				.map(|r| r.uuid)
				.ok_or(EvaluatorError::LoadImageNotFound(filename));
		}

		// 4. `Image Preview` block: must have exactly one input.
		if block_type.name == IMAGE_PREVIEW_BLOCK_NAME {
			let connections = instance.connections_map();
			if connections.len() != 1 {
				return Err(EvaluatorError::ImagePreviewArity(block_id, connections.len()));
			}
			let (_, &upstream_id) = connections.iter().next().expect("checked len == 1");
			return self.eval_block(state, upstream_id, initial_input).await;
		}

		// 5. General block: cache-consult -> execute -> cache-insert.
		self.eval_general_block(state, &instance, &block_type, initial_input)
			.await
	}

	async fn eval_general_block(
		&self,
		state: &mut EvalState,
		instance: &crate::db::entities::block_instance::Model,
		block_type: &crate::db::entities::block_catalogue::Model,
		initial_input: Uuid,
	) -> Result<Uuid, EvaluatorError> {
		// a. Resolve inputs in lexicographic port-name order.
		let connections = instance.connections_map();
		let mut input_uuids = Vec::with_capacity(connections.len());
		for (_, &upstream_id) in connections.iter() {
			let upstream_uuid = self.eval_block(state, upstream_id, initial_input).await?;
			input_uuids.push(upstream_uuid);
		}

		// b. Compute the cache key.
		let settings = instance.settings();
		let parameters_json = serde_json::to_string(&settings)?;
		let input_uuids_json = serde_json::to_string(&input_uuids)?;

		// c. Cache consult, with self-heal on an orphaned row.
		if let Some(row) = self
			.cache
			.lookup(instance.id, &parameters_json, &input_uuids_json)
			.await?
		{
			match self.store.resolve(row.uuid).await {
				Ok(_) => return Ok(row.uuid),
				Err(_) => {
					self.cache.delete_by_uuid(row.uuid).await?;
				}
			}
		}

		// d. Parameter assembly.
		let gui_fields = block_type.gui_field_names();
		let mapped = apply_parameter_mappings(&settings, &gui_fields, &block_type.parameter_mappings);
		let params = build_parameter_argv(
			instance.id,
			&block_type.parameter_template,
			&gui_fields,
			&mapped,
		)?;

		// e. Resolve input paths.
		let mut input_paths = Vec::with_capacity(input_uuids.len());
		for uuid in &input_uuids {
			input_paths.push(self.store.resolve(*uuid).await?);
		}

		// f. Allocate the output path.
		let (output_uuid, output_path) = self.store.allocate_derived_path();

		// g. Execute.
		let (command, argv) =
			executor::build_argv(&block_type.command, &block_type.name, &input_paths, &output_path, &params);
		executor::run(&command, &argv, &output_path).await?;

		// h. Cache insert.
		self.cache
			.insert(output_uuid, instance.id, parameters_json, input_uuids_json)
			.await?;

		Ok(output_uuid)
	}
}
