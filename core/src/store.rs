//! Image Store (IS) and Path Resolver (PR).
//!
//! The store is a flat on-disk directory tree: originals live directly under its root,
//! `cached_images/` holds derived pipeline outputs, and `thumbnails/` holds on-demand previews.
//! Every file is named `<uuid>[.ext]`; the resolver's job is turning a bare UUID back into a path
//! without ever loading a directory listing into a persistent index.

use crate::error::StoreError;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

pub const CACHED_IMAGES_DIR: &str = "cached_images";
pub const THUMBNAILS_DIR: &str = "thumbnails";

#[derive(Clone)]
pub struct ImageStore {
	root: PathBuf,
}

impl ImageStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn cached_images_dir(&self) -> PathBuf {
		self.root.join(CACHED_IMAGES_DIR)
	}

	pub fn thumbnails_dir(&self) -> PathBuf {
		self.root.join(THUMBNAILS_DIR)
	}

	/// Create the three subtrees if they don't already exist. Safe to call on every startup.
	pub async fn bootstrap(&self) -> Result<(), StoreError> {
		fs::create_dir_all(&self.root).await?;
		fs::create_dir_all(self.cached_images_dir()).await?;
		fs::create_dir_all(self.thumbnails_dir()).await?;
		Ok(())
	}

	/// Persist an uploaded file's bytes under a freshly minted UUID, preserving the original
	/// extension, and return that UUID. The caller is responsible for recording the
	/// corresponding `input_images` row.
	pub async fn store_upload(
		&self,
		bytes: &[u8],
		original_filename: &str,
	) -> Result<Uuid, StoreError> {
		let uuid = Uuid::new_v4();
		let extension = Path::new(original_filename)
			.extension()
			.and_then(|ext| ext.to_str());
		let file_name = match extension {
			Some(ext) => format!("{uuid}.{ext}"),
			None => uuid.to_string(),
		};
		fs::write(self.root.join(file_name), bytes).await?;
		Ok(uuid)
	}

	/// The fresh output path a general block's executor writes to: always PNG, always
	/// under `cached_images/`.
	pub fn allocate_derived_path(&self) -> (Uuid, PathBuf) {
		let uuid = Uuid::new_v4();
		(uuid, self.cached_images_dir().join(format!("{uuid}.png")))
	}

	/// Resolve a UUID to a filesystem path: originals first, then derived outputs. Non-recursive;
	/// takes no lock, so callers racing a concurrent delete must re-check existence at point of
	/// use.
	pub async fn resolve(&self, uuid: Uuid) -> Result<PathBuf, StoreError> {
		for dir in [self.root.clone(), self.cached_images_dir()] {
			if let Some(path) = find_by_uuid(&dir, uuid).await? {
				return Ok(path);
			}
		}
		Err(StoreError::NotFound(uuid))
	}

	/// `Ok(true)` if a file was present and removed, `Ok(false)` if nothing matched.
	pub async fn delete(&self, uuid: Uuid) -> Result<bool, StoreError> {
		match self.resolve(uuid).await {
			Ok(path) => {
				fs::remove_file(path).await?;
				Ok(true)
			}
			Err(StoreError::NotFound(_)) => Ok(false),
			Err(other) => Err(other),
		}
	}
}

/// Parse the canonical `[0-9a-f-]{36}` hyphenated text form. `Uuid::parse_str` also accepts
/// braced/simple forms that are rejected here, so the length and charset are checked explicitly
/// first.
pub fn parse_canonical_uuid(raw: &str) -> Result<Uuid, StoreError> {
	let is_canonical = raw.len() == 36
		&& raw
			.bytes()
			.all(|b| b.is_ascii_hexdigit() || b == b'-');
	if !is_canonical {
		return Err(StoreError::InvalidUuid(raw.to_string()));
	}
	Uuid::parse_str(raw).map_err(|_| StoreError::InvalidUuid(raw.to_string()))
}

async fn find_by_uuid(dir: &Path, uuid: Uuid) -> Result<Option<PathBuf>, StoreError> {
	let mut entries = match fs::read_dir(dir).await {
		Ok(entries) => entries,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
		Err(err) => return Err(err.into()),
	};
	let target = uuid.to_string();
	while let Some(entry) = entries.next_entry().await? {
		let file_name = entry.file_name();
		let Some(name) = file_name.to_str() else {
			continue;
		};
		if name == target || name.strip_prefix(&target).is_some_and(|rest| rest.starts_with('.')) {
			return Ok(Some(entry.path()));
		}
	}
	Ok(None)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn resolves_original_before_derived() {
		let dir = tempfile::tempdir().unwrap();
		let store = ImageStore::new(dir.path());
		store.bootstrap().await.unwrap();

		let uuid = Uuid::new_v4();
		fs::write(dir.path().join(format!("{uuid}.png")), b"original")
			.await
			.unwrap();
		fs::write(store.cached_images_dir().join(format!("{uuid}.png")), b"derived")
			.await
			.unwrap();

		let resolved = store.resolve(uuid).await.unwrap();
		assert_eq!(resolved, dir.path().join(format!("{uuid}.png")));
	}

	#[tokio::test]
	async fn missing_uuid_is_not_found() {
		let dir = tempfile::tempdir().unwrap();
		let store = ImageStore::new(dir.path());
		store.bootstrap().await.unwrap();

		let err = store.resolve(Uuid::new_v4()).await.unwrap_err();
		assert!(matches!(err, StoreError::NotFound(_)));
	}

	#[test]
	fn rejects_non_canonical_uuid() {
		assert!(parse_canonical_uuid("not-a-uuid").is_err());
		assert!(parse_canonical_uuid("").is_err());
	}

	#[test]
	fn accepts_canonical_uuid() {
		let uuid = Uuid::new_v4();
		assert_eq!(parse_canonical_uuid(&uuid.to_string()).unwrap(), uuid);
	}
}
