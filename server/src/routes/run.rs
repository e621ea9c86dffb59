//! `POST /VIPS/run`: evaluate a project's terminal block against a single input.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use patchbay_core::catalogue::fetch_terminal_block;
use patchbay_core::error::EvaluatorError;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct RunRequest {
	idproject: i32,
	input_uuid: Uuid,
}

pub async fn run(
	State(state): State<AppState>,
	Json(request): Json<RunRequest>,
) -> Result<Json<Value>, ApiError> {
	let terminal = fetch_terminal_block(state.core.conn(), request.idproject)
		.await?
		.ok_or(EvaluatorError::BlockNotFound(request.idproject))?;

	let result_uuid = state
		.core
		.evaluator
		.result_of(terminal.id, request.input_uuid)
		.await?;

	Ok(Json(json!({
		"result_uuid": result_uuid,
		"url": format!("/VIPS/preview/{result_uuid}"),
	})))
}
