//! `POST /VIPS/upload`: multipart upload of one or more input images.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use patchbay_core::db::entities::input_image;
use patchbay_core::error::StoreError;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde_json::{json, Value};
use std::io;
use tracing::info;

pub async fn upload(
	State(state): State<AppState>,
	mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
	let mut stored = 0usize;

	while let Some(field) = multipart.next_field().await.map_err(multipart_io_error)? {
		let original_filename = field.file_name().unwrap_or("upload.bin").to_string();
		let bytes = field.bytes().await.map_err(multipart_io_error)?;

		let uuid = state
			.core
			.store
			.store_upload(&bytes, &original_filename)
			.await?;

		input_image::ActiveModel {
			uuid: Set(uuid),
			original_filename: Set(original_filename),
			upload_timestamp: Set(Utc::now()),
		}
		.insert(state.core.conn())
		.await?;

		stored += 1;
		info!(%uuid, "stored uploaded image");
	}

	Ok(Json(json!({ "message": "Upload complete.", "stored": stored })))
}

fn multipart_io_error(err: axum::extract::multipart::MultipartError) -> StoreError {
	StoreError::Io(io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
}
