//! Application configuration: CLI flags with environment-variable fallbacks resolve the data
//! directory, bind port, database location, and thumbnailer command; any of the latter two left
//! unset falls back to a small JSON file persisted under `data_dir`, created with hardcoded
//! defaults on first run and read back on every run after.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "patchbay.json";
pub const DEFAULT_THUMBNAILER_COMMAND: &str = "vipsthumbnail";

/// Fully resolved runtime configuration, independent of how it was sourced (CLI, env, the
/// on-disk default file, or a hardcoded fallback).
#[derive(Debug, Clone)]
pub struct CoreConfig {
	/// Root of the image store (originals, `cached_images/`, `thumbnails/`).
	pub data_dir: PathBuf,
	/// SeaORM connection string. Defaults to a SQLite file under `data_dir`.
	pub database_url: String,
	/// Path to the thumbnailer binary invoked by the Thumbnail Service.
	pub thumbnailer_command: String,
}

/// The subset of configuration persisted to `<data_dir>/patchbay.json`. Only consulted for a
/// field the caller left unset on the CLI/environment; explicit overrides always win.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileDefaults {
	database_url: Option<String>,
	thumbnailer_command: String,
}

impl FileDefaults {
	fn load_or_create(data_dir: &Path, thumbnailer_command_override: Option<&str>) -> Self {
		let path = data_dir.join(CONFIG_FILE_NAME);
		match std::fs::read_to_string(&path) {
			Ok(contents) => match serde_json::from_str::<Self>(&contents) {
				Ok(parsed) => {
					info!(?path, "loaded config defaults from disk");
					parsed
				}
				Err(err) => {
					warn!(?path, %err, "ignoring unparsable config file, using hardcoded defaults");
					Self {
						database_url: None,
						thumbnailer_command: thumbnailer_command_override
							.unwrap_or(DEFAULT_THUMBNAILER_COMMAND)
							.to_string(),
					}
				}
			},
			Err(_) => {
				let defaults = Self {
					database_url: None,
					thumbnailer_command: thumbnailer_command_override
						.unwrap_or(DEFAULT_THUMBNAILER_COMMAND)
						.to_string(),
				};
				if let Err(err) = std::fs::create_dir_all(data_dir).and_then(|_| {
					std::fs::write(
						&path,
						serde_json::to_string_pretty(&defaults).expect("FileDefaults always serializes"),
					)
				}) {
					warn!(?path, %err, "failed to persist default config file, continuing with defaults in memory");
				} else {
					info!(?path, "created default config file");
				}
				defaults
			}
		}
	}
}

impl CoreConfig {
	/// Resolve a fully-formed [`CoreConfig`] from explicit CLI/env overrides layered over
	/// `<data_dir>/patchbay.json`'s persisted defaults (created on first run if absent). An
	/// explicit override always wins over the file; the file wins over the hardcoded fallback.
	pub fn resolve(
		data_dir: PathBuf,
		database_url_override: Option<String>,
		thumbnailer_command_override: Option<String>,
	) -> Self {
		let file =
			FileDefaults::load_or_create(&data_dir, thumbnailer_command_override.as_deref());

		let database_url = database_url_override.or(file.database_url).unwrap_or_else(|| {
			format!("sqlite://{}?mode=rwc", data_dir.join("patchbay.db").display())
		});
		let thumbnailer_command = thumbnailer_command_override.unwrap_or(file.thumbnailer_command);

		Self {
			data_dir,
			database_url,
			thumbnailer_command,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn explicit_overrides_win_over_file_and_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let config = CoreConfig::resolve(
			dir.path().to_path_buf(),
			Some("sqlite://explicit.db".to_string()),
			Some("my-thumbnailer".to_string()),
		);
		assert_eq!(config.database_url, "sqlite://explicit.db");
		assert_eq!(config.thumbnailer_command, "my-thumbnailer");
	}

	#[test]
	fn unset_fields_persist_and_reload_from_file() {
		let dir = tempfile::tempdir().unwrap();

		let first = CoreConfig::resolve(dir.path().to_path_buf(), None, None);
		assert_eq!(first.thumbnailer_command, DEFAULT_THUMBNAILER_COMMAND);
		assert!(dir.path().join(CONFIG_FILE_NAME).exists());

		// A second process with no overrides reads back what the first one persisted.
		let second = CoreConfig::resolve(dir.path().to_path_buf(), None, None);
		assert_eq!(second.thumbnailer_command, first.thumbnailer_command);
	}

	#[test]
	fn database_url_defaults_under_data_dir_when_never_configured() {
		let dir = tempfile::tempdir().unwrap();
		let config = CoreConfig::resolve(dir.path().to_path_buf(), None, None);
		assert!(config.database_url.contains("patchbay.db"));
	}
}
