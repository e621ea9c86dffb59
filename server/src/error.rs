//! Maps [`patchbay_core::CoreError`] onto HTTP status codes.

use axum::{http::StatusCode, response::IntoResponse, Json};
use patchbay_core::error::{CoreError, EvaluatorError, StoreError, ThumbnailError};
use serde_json::json;

pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
	fn from(err: CoreError) -> Self {
		Self(err)
	}
}

macro_rules! impl_from_leaf {
	($leaf:ty) => {
		impl From<$leaf> for ApiError {
			fn from(err: $leaf) -> Self {
				Self(CoreError::from(err))
			}
		}
	};
}

impl_from_leaf!(patchbay_core::error::ExecutorError);
impl_from_leaf!(EvaluatorError);
impl_from_leaf!(ThumbnailError);
impl_from_leaf!(StoreError);
impl_from_leaf!(patchbay_core::error::InvalidationError);
impl_from_leaf!(sea_orm::DbErr);

impl IntoResponse for ApiError {
	fn into_response(self) -> axum::response::Response {
		let (status, message) = status_for(&self.0);
		(status, Json(json!({ "error": message }))).into_response()
	}
}

fn status_for(err: &CoreError) -> (StatusCode, String) {
	match err {
		CoreError::Store(inner) => status_for_store(inner),
		CoreError::Thumbnail(ThumbnailError::InvalidWidth(width)) => {
			(StatusCode::BAD_REQUEST, format!("width {width} out of range"))
		}
		CoreError::Thumbnail(ThumbnailError::Store(inner)) => status_for_store(inner),
		CoreError::Evaluator(EvaluatorError::BlockNotFound(id)) => {
			(StatusCode::NOT_FOUND, format!("block {id} not found"))
		}
		CoreError::Evaluator(EvaluatorError::Store(inner)) => status_for_store(inner),
		other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
	}
}

fn status_for_store(err: &StoreError) -> (StatusCode, String) {
	match err {
		StoreError::NotFound(uuid) => (StatusCode::NOT_FOUND, format!("no such image {uuid}")),
		StoreError::InvalidUuid(raw) => {
			(StatusCode::BAD_REQUEST, format!("invalid uuid {raw:?}"))
		}
		StoreError::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
	}
}
