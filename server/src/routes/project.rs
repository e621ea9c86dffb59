//! `GET /VIPS/project/:projectid/image/:input_uuid` and `POST /VIPS/project/:projectid/outputs`.

use super::transcode::serve_as_png;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use patchbay_core::catalogue::fetch_terminal_block;
use patchbay_core::error::EvaluatorError;
use patchbay_core::evaluator::EvalState;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

pub async fn image_for_input(
	State(state): State<AppState>,
	Path((project_id, input_uuid)): Path<(i32, Uuid)>,
) -> Result<Response, ApiError> {
	let terminal = fetch_terminal_block(state.core.conn(), project_id)
		.await?
		.ok_or(EvaluatorError::BlockNotFound(project_id))?;
	let output_uuid = state
		.core
		.evaluator
		.result_of(terminal.id, input_uuid)
		.await?;
	let path = state.core.store.resolve(output_uuid).await?;
	Ok(serve_as_png(&path).await?)
}

#[derive(Deserialize)]
pub struct OutputsRequest {
	input_uuids: Vec<Uuid>,
}

/// Evaluates the project's terminal block against every input in one request, sharing a single
/// [`EvalState`] memoization map across the whole batch so diamond-shaped dependencies between
/// inputs are not recomputed.
pub async fn outputs(
	State(state): State<AppState>,
	Path(project_id): Path<i32>,
	Json(request): Json<OutputsRequest>,
) -> Result<Json<Value>, ApiError> {
	let terminal = fetch_terminal_block(state.core.conn(), project_id)
		.await?
		.ok_or(EvaluatorError::BlockNotFound(project_id))?;

	let mut state_map = EvalState::new();
	let mut results = Vec::with_capacity(request.input_uuids.len());

	for input_uuid in request.input_uuids {
		match state
			.core
			.evaluator
			.result_of_with_state(&mut state_map, terminal.id, input_uuid)
			.await
		{
			Ok(output_uuid) => results.push(json!({
				"input_uuid": input_uuid,
				"output_uuid": output_uuid,
				"url": format!("/VIPS/preview/{output_uuid}"),
			})),
			Err(err) => results.push(json!({
				"input_uuid": input_uuid,
				"error": err.to_string(),
			})),
		}
	}

	Ok(Json(json!(results)))
}
