//! `GET /VIPS/block/:block_id/image[/:input_uuid]` and `ANY /VIPS/block/:block_id/toggle_enabled`.

use super::transcode::serve_as_png;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use patchbay_core::error::EvaluatorError;
use patchbay_core::CoreError;
use serde_json::{json, Value};
use uuid::Uuid;

/// Most recently produced output for a block, without evaluating anything.
pub async fn latest_image(
	State(state): State<AppState>,
	Path(block_id): Path<i32>,
) -> Result<Response, ApiError> {
	let row = state
		.core
		.cache
		.most_recent_for_block(block_id)
		.await?
		.ok_or(EvaluatorError::BlockNotFound(block_id))?;
	let path = state.core.store.resolve(row.uuid).await?;
	Ok(serve_as_png(&path).await?)
}

/// Evaluate `block_id` against `input_uuid` and serve the result, transcoded to PNG the same
/// way `project`'s equivalent route is (the resolved file may be an original in its own format
/// when the block is a pass-through, not just a derived `.png`). Per the external-interfaces
/// table this route answers 404 on *any* evaluation failure — a cycle, a misconfigured
/// template, a missing `Load Image` row, a failed executor run, or an unresolvable output are
/// all "failure" here, not the 500s the generic `ApiError` mapping would otherwise give most of
/// them — so evaluation and resolution errors are caught and flattened to 404 directly rather
/// than going through `ApiError`.
pub async fn image_for_input(
	State(state): State<AppState>,
	Path((block_id, input_uuid)): Path<(i32, Uuid)>,
) -> Response {
	match evaluate_and_serve(&state, block_id, input_uuid).await {
		Ok(response) => response,
		Err(err) => not_found(&err),
	}
}

async fn evaluate_and_serve(
	state: &AppState,
	block_id: i32,
	input_uuid: Uuid,
) -> Result<Response, CoreError> {
	let output_uuid = state.core.evaluator.result_of(block_id, input_uuid).await?;
	let path = state.core.store.resolve(output_uuid).await?;
	Ok(serve_as_png(&path).await?)
}

fn not_found(err: &CoreError) -> Response {
	(StatusCode::NOT_FOUND, Json(json!({ "error": err.to_string() }))).into_response()
}

pub async fn toggle_enabled(
	State(state): State<AppState>,
	Path(block_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
	let new_state = state.core.invalidation.toggle_enabled(block_id).await?;
	Ok(Json(json!({
		"success": 1,
		"newState": if new_state { 1 } else { 0 },
	})))
}
