//! Error types for the core, one `thiserror` enum per module boundary, composed into a
//! crate-wide [`CoreError`] at the edge the HTTP layer sees.

use thiserror::Error;
use uuid::Uuid;

/// Errors from the Image Store / Path Resolver.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("no file found for uuid {0}")]
	NotFound(Uuid),
	#[error("uuid {0} is not in canonical form")]
	InvalidUuid(String),
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Errors from the Executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
	#[error("command exited with status {0}")]
	NonZeroExit(i32),
	#[error("command terminated by signal")]
	Terminated,
	#[error("command did not produce an output file")]
	MissingOutput,
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Errors from the Pipeline Evaluator.
#[derive(Debug, Error)]
pub enum EvaluatorError {
	#[error("block {0} not found")]
	BlockNotFound(i32),
	#[error("cycle detected while evaluating block {0}")]
	Cycle(i32),
	#[error("disabled block {0} has no inputs to pass through")]
	DisabledWithoutInput(i32),
	#[error("'Image Preview' block {0} must have exactly one input, found {1}")]
	ImagePreviewArity(i32, usize),
	#[error("no input_images row for filename {0:?}")]
	LoadImageNotFound(String),
	#[error("parameter_template for block {idblock} has {placeholders} placeholders but gui_fields only has {fields} entries")]
	TemplateOverflow {
		idblock: i32,
		placeholders: usize,
		fields: usize,
	},
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Executor(#[from] ExecutorError),
	#[error(transparent)]
	Db(#[from] sea_orm::DbErr),
	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

/// Errors from the Thumbnail Service.
#[derive(Debug, Error)]
pub enum ThumbnailError {
	#[error("width {0} out of range 1..=4096")]
	InvalidWidth(u32),
	#[error("thumbnailer exited with status {0:?} or produced no output")]
	GenerationFailed(Option<i32>),
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Errors from the Invalidation Controller.
#[derive(Debug, Error)]
pub enum InvalidationError {
	#[error("block {0} not found")]
	BlockNotFound(i32),
	#[error(transparent)]
	Db(#[from] sea_orm::DbErr),
}

/// Crate-wide error, the one the HTTP layer matches on.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Executor(#[from] ExecutorError),
	#[error(transparent)]
	Evaluator(#[from] EvaluatorError),
	#[error(transparent)]
	Thumbnail(#[from] ThumbnailError),
	#[error(transparent)]
	Invalidation(#[from] InvalidationError),
	#[error(transparent)]
	Db(#[from] sea_orm::DbErr),
	#[error(transparent)]
	Io(#[from] std::io::Error),
}
