//! Executor (EX): runs a block's external command over resolved input paths and a
//! freshly allocated output path, never through a shell.

use crate::error::ExecutorError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};

/// Output of a completed subprocess run, kept around for diagnostics even on failure.
pub struct ExecutionLog {
	pub combined_output: String,
}

/// Build the argv vector: `[command, block_name, input_paths…, output_path,
/// positional_values…, templated_tokens…]`, dropping empty elements.
pub fn build_argv(
	command: &str,
	block_name: &str,
	input_paths: &[PathBuf],
	output_path: &Path,
	params: &[String],
) -> (String, Vec<String>) {
	let mut argv = Vec::with_capacity(2 + input_paths.len() + 1 + params.len());
	argv.push(block_name.to_string());
	argv.extend(
		input_paths
			.iter()
			.map(|p| p.to_string_lossy().to_string())
			.filter(|s| !s.is_empty()),
	);
	argv.push(output_path.to_string_lossy().to_string());
	argv.extend(params.iter().filter(|s| !s.is_empty()).cloned());
	(command.to_string(), argv)
}

/// Spawn `command` with `args` as a plain argv vector, never shell-interpolated. Merge
/// stdout and stderr for diagnostics, and require both a zero exit status and the presence of
/// `output_path` on disk for success. On either failure mode, any partial output is removed.
pub async fn run(
	command: &str,
	args: &[String],
	output_path: &Path,
) -> Result<ExecutionLog, ExecutorError> {
	debug!(command, ?args, "spawning block executor");

	let output = Command::new(command)
		.args(args)
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.output()
		.await?;

	let combined_output = merge_streams(&output.stdout, &output.stderr);

	let output_exists = fs::metadata(output_path).await.is_ok();

	if !output.status.success() || !output_exists {
		if output_exists {
			if let Err(err) = fs::remove_file(output_path).await {
				warn!(?err, "failed to remove partial executor output");
			}
		}
		return Err(match output.status.code() {
			Some(code) if code != 0 => ExecutorError::NonZeroExit(code),
			Some(_) if !output_exists => ExecutorError::MissingOutput,
			_ => ExecutorError::Terminated,
		});
	}

	Ok(ExecutionLog { combined_output })
}

fn merge_streams(stdout: &[u8], stderr: &[u8]) -> String {
	let mut combined = String::from_utf8_lossy(stdout).into_owned();
	combined.push_str(&String::from_utf8_lossy(stderr));
	combined
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn argv_drops_empty_elements() {
		let (command, argv) = build_argv(
			"/usr/bin/convert",
			"Invert",
			&[PathBuf::from("/tmp/a.png"), PathBuf::new()],
			Path::new("/tmp/out.png"),
			&["--flag".to_string(), "".to_string()],
		);
		assert_eq!(command, "/usr/bin/convert");
		assert_eq!(
			argv,
			vec!["Invert", "/tmp/a.png", "/tmp/out.png", "--flag"]
		);
	}

	#[tokio::test]
	async fn nonzero_exit_is_reported_and_output_is_cleaned_up() {
		let dir = tempfile::tempdir().unwrap();
		let output_path = dir.path().join("out.png");
		fs::write(&output_path, b"partial").await.unwrap();

		let err = run("false", &[], &output_path).await.unwrap_err();
		assert!(matches!(err, ExecutorError::NonZeroExit(_)));
		assert!(fs::metadata(&output_path).await.is_err());
	}

	#[tokio::test]
	async fn missing_output_after_success_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let output_path = dir.path().join("out.png");

		let err = run("true", &[], &output_path).await.unwrap_err();
		assert!(matches!(err, ExecutorError::MissingOutput));
	}
}
