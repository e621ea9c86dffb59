//! Thumbnail Service (TS): on-demand thumbnail generation with exclusive single-writer semantics
//! per `(uuid, width)`.

use crate::error::ThumbnailError;
use crate::store::ImageStore;
use fd_lock::RwLock as FileLock;
use std::path::{Path, PathBuf};
use std::process::Command as BlockingCommand;
use tokio::fs;
use tokio::task::spawn_blocking;
use tracing::{debug, warn};
use uuid::Uuid;

pub const MIN_WIDTH: u32 = 1;
pub const MAX_WIDTH: u32 = 4096;

/// A generous height ceiling passed to the thumbnailer alongside the width constraint, so the
/// output is scaled by width while preserving aspect ratio.
const HEIGHT_CEILING: &str = "100000";

#[derive(Clone)]
pub struct ThumbnailService {
	store: ImageStore,
	thumbnailer_command: String,
}

impl ThumbnailService {
	pub fn new(store: ImageStore, thumbnailer_command: impl Into<String>) -> Self {
		Self {
			store,
			thumbnailer_command: thumbnailer_command.into(),
		}
	}

	pub fn target_path(&self, uuid: Uuid, width: u32) -> PathBuf {
		self.store
			.thumbnails_dir()
			.join(format!("{uuid}_w{width}.jpg"))
	}

	/// `thumbnail(uuid, width) → jpeg path | failure`.
	pub async fn thumbnail(&self, uuid: Uuid, width: u32) -> Result<PathBuf, ThumbnailError> {
		if !(MIN_WIDTH..=MAX_WIDTH).contains(&width) {
			return Err(ThumbnailError::InvalidWidth(width));
		}

		let target = self.target_path(uuid, width);
		if fs::metadata(&target).await.is_ok() {
			return Ok(target);
		}

		let source = self.store.resolve(uuid).await?;
		let lock_path = lock_sentinel_path(&target);
		let thumbnailer = self.thumbnailer_command.clone();

		spawn_blocking(move || generate_locked(lock_path, target, source, thumbnailer, width))
			.await
			.expect("thumbnail generation task panicked")
	}
}

fn lock_sentinel_path(target: &Path) -> PathBuf {
	let mut path = target.as_os_str().to_owned();
	path.push(".lock");
	PathBuf::from(path)
}

/// Check-lock-check, run entirely inside a blocking task: `fd-lock`'s acquisition and
/// `std::process::Command`'s spawn are both synchronous, so they share one `spawn_blocking`
/// call rather than alternating with async I/O and risking the reactor stalling on either.
fn generate_locked(
	lock_path: PathBuf,
	target: PathBuf,
	source: PathBuf,
	thumbnailer_command: String,
	width: u32,
) -> Result<PathBuf, ThumbnailError> {
	let lock_file = std::fs::OpenOptions::new()
		.create(true)
		.write(true)
		.open(&lock_path)?;
	let mut lock = FileLock::new(lock_file);
	let guard = lock.write()?;

	// Re-check: another worker may have produced the file while we waited for the lock.
	if target.exists() {
		drop(guard);
		let _ = std::fs::remove_file(&lock_path);
		return Ok(target);
	}

	debug!(?source, ?target, width, "invoking external thumbnailer");
	let result = BlockingCommand::new(&thumbnailer_command)
		.arg(&source)
		.arg(&target)
		.arg(width.to_string())
		.arg(HEIGHT_CEILING)
		.output();

	let outcome = match result {
		Ok(output) if output.status.success() && target.exists() => Ok(target.clone()),
		Ok(output) => Err(ThumbnailError::GenerationFailed(output.status.code())),
		Err(err) => Err(err.into()),
	};

	drop(guard);
	if let Err(err) = std::fs::remove_file(&lock_path) {
		warn!(?err, "failed to remove thumbnail lock sentinel");
	}

	outcome
}
