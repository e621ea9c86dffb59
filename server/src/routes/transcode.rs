//! Shared helper for the routes that must serve a stored image "transcoded to PNG": `block`'s
//! `image`/`image/:input_uuid` and `project`'s `image/:input_uuid`.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use image::ImageFormat;
use patchbay_core::error::StoreError;
use std::io::Cursor;
use std::path::Path;

pub async fn serve_as_png(path: &Path) -> Result<Response, StoreError> {
	let bytes = tokio::fs::read(path).await?;
	let decoded = image::load_from_memory(&bytes)
		.map_err(|err| StoreError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string())))?;

	let mut encoded = Cursor::new(Vec::new());
	decoded
		.write_to(&mut encoded, ImageFormat::Png)
		.map_err(|err| StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, err.to_string())))?;

	Ok(([(header::CONTENT_TYPE, "image/png")], encoded.into_inner()).into_response())
}
