//! `GET /VIPS/preview/:uuid[?w=<width>]`: serves a stored image, or — when `w` is given — an
//! on-demand thumbnail at that width.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use patchbay_core::error::StoreError;
use patchbay_core::store::parse_canonical_uuid;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct PreviewQuery {
	w: Option<u32>,
}

pub async fn preview(
	State(state): State<AppState>,
	Path(raw_uuid): Path<String>,
	Query(query): Query<PreviewQuery>,
) -> Result<Response, ApiError> {
	let uuid = parse_canonical_uuid(&raw_uuid).map_err(patchbay_core::CoreError::from)?;

	let path = match query.w {
		Some(width) => state.core.thumbnails.thumbnail(uuid, width).await?,
		None => state.core.store.resolve(uuid).await?,
	};

	let bytes = tokio::fs::read(&path)
		.await
		.map_err(|err| patchbay_core::CoreError::from(StoreError::Io(err)))?;
	let content_type = guess_content_type(&path);

	Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

fn guess_content_type(path: &std::path::Path) -> &'static str {
	match path.extension().and_then(|ext| ext.to_str()) {
		Some("png") => "image/png",
		Some("jpg") | Some("jpeg") => "image/jpeg",
		Some("gif") => "image/gif",
		Some("webp") => "image/webp",
		Some("tif") | Some("tiff") => "image/tiff",
		_ => "application/octet-stream",
	}
}
