//! End-to-end scenarios against a throwaway in-memory SQLite database and a `tempfile` image
//! store, exercising the evaluator, cache index, and invalidation controller together the way
//! a real upload-then-run request sequence would.

use patchbay_core::cache::CacheIndex;
use patchbay_core::db::entities::{block_catalogue, block_instance, input_image};
use patchbay_core::db::Database;
use patchbay_core::error::EvaluatorError;
use patchbay_core::evaluator::Evaluator;
use patchbay_core::invalidate::InvalidationController;
use patchbay_core::store::ImageStore;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use serde_json::json;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;
use uuid::Uuid;

const INPUT_BLOCK: i32 = 1;
const IMAGE_PREVIEW_BLOCK: i32 = 2;
const INVERT_BLOCK: i32 = 3;

struct Harness {
	store_dir: TempDir,
	conn: DatabaseConnection,
	store: ImageStore,
	cache: CacheIndex,
	evaluator: Evaluator,
	invalidation: InvalidationController,
	counter_path: PathBuf,
}

async fn setup() -> Harness {
	let db = Database::connect("sqlite::memory:").await.unwrap();
	let store_dir = tempfile::tempdir().unwrap();
	let store = ImageStore::new(store_dir.path().to_path_buf());
	store.bootstrap().await.unwrap();
	let conn = db.conn().clone();
	let cache = CacheIndex::new(conn.clone());
	let evaluator = Evaluator::new(conn.clone(), store.clone(), cache.clone());
	let invalidation = InvalidationController::new(conn.clone(), cache.clone(), store.clone());

	block_catalogue::ActiveModel {
		id: Set(INPUT_BLOCK),
		name: Set("Input".into()),
		command: Set(String::new()),
		parameter_template: Set(String::new()),
		parameter_mappings: Set(json!({})),
		gui_fields: Set(json!([])),
		outputs: Set(Some(json!({}))),
	}
	.insert(&conn)
	.await
	.unwrap();

	block_catalogue::ActiveModel {
		id: Set(IMAGE_PREVIEW_BLOCK),
		name: Set("Image Preview".into()),
		command: Set(String::new()),
		parameter_template: Set(String::new()),
		parameter_mappings: Set(json!({})),
		gui_fields: Set(json!([])),
		outputs: Set(None),
	}
	.insert(&conn)
	.await
	.unwrap();

	let (script_path, counter_path) = write_copy_script(store_dir.path());
	block_catalogue::ActiveModel {
		id: Set(INVERT_BLOCK),
		name: Set("Invert".into()),
		command: Set(script_path),
		parameter_template: Set(String::new()),
		parameter_mappings: Set(json!({})),
		gui_fields: Set(json!(["counter_path"])),
		outputs: Set(Some(json!({}))),
	}
	.insert(&conn)
	.await
	.unwrap();

	Harness {
		store_dir,
		conn,
		store,
		cache,
		evaluator,
		invalidation,
		counter_path,
	}
}

/// A stand-in "image processing" binary: a shell script invoked as
/// `[block_name, input_path, output_path, counter_path]`, which appends a line to
/// `counter_path` (so tests can observe how many times it actually ran) and copies the input
/// bytes to the output path.
fn write_copy_script(dir: &std::path::Path) -> (String, PathBuf) {
	let script_path = dir.join("invert.sh");
	let counter_path = dir.join("invert_invocations.log");
	std::fs::write(
		&script_path,
		"#!/bin/sh\necho invoked >> \"$4\"\ncp \"$2\" \"$3\"\n",
	)
	.unwrap();
	let mut perms = std::fs::metadata(&script_path).unwrap().permissions();
	perms.set_mode(0o755);
	std::fs::set_permissions(&script_path, perms).unwrap();
	(script_path.to_string_lossy().to_string(), counter_path)
}

async fn invocation_count(harness: &Harness) -> usize {
	match tokio::fs::read_to_string(&harness.counter_path).await {
		Ok(contents) => contents.lines().count(),
		Err(_) => 0,
	}
}

async fn insert_instance(
	conn: &DatabaseConnection,
	id: i32,
	idproject: i32,
	idblock: i32,
	connections: serde_json::Value,
	settings: serde_json::Value,
) {
	block_instance::ActiveModel {
		id: Set(id),
		idproject: Set(idproject),
		idblock: Set(idblock),
		connections: Set(connections),
		output_value: Set(settings),
		enabled: Set(None),
	}
	.insert(conn)
	.await
	.unwrap();
}

async fn upload(harness: &Harness, filename: &str, bytes: &[u8]) -> Uuid {
	let uuid = harness.store.store_upload(bytes, filename).await.unwrap();
	input_image::ActiveModel {
		uuid: Set(uuid),
		original_filename: Set(filename.to_string()),
		upload_timestamp: Set(chrono::Utc::now()),
	}
	.insert(&harness.conn)
	.await
	.unwrap();
	uuid
}

/// Scenario 1: `Input -> Image Preview`, a pure pass-through pipeline.
#[tokio::test]
async fn upload_then_run_identity_pipeline() {
	let harness = setup().await;
	let input_uuid = upload(&harness, "a.png", b"original bytes").await;

	insert_instance(&harness.conn, 10, 1, INPUT_BLOCK, json!({}), json!({})).await;
	insert_instance(
		&harness.conn,
		11,
		1,
		IMAGE_PREVIEW_BLOCK,
		json!({ "a": 10 }),
		json!({}),
	)
	.await;

	let result = harness.evaluator.result_of(11, input_uuid).await.unwrap();
	assert_eq!(result, input_uuid);
}

/// Scenario 2 + 3: a general block executes on first run and is served from cache on the
/// second, without spawning the external command again.
#[tokio::test]
async fn general_block_cache_miss_then_hit() {
	let harness = setup().await;
	let input_uuid = upload(&harness, "a.png", b"original bytes").await;

	insert_instance(&harness.conn, 10, 1, INPUT_BLOCK, json!({}), json!({})).await;
	insert_instance(
		&harness.conn,
		11,
		1,
		INVERT_BLOCK,
		json!({ "a": 10 }),
		json!({ "counter_path": harness.counter_path.to_string_lossy() }),
	)
	.await;
	insert_instance(
		&harness.conn,
		12,
		1,
		IMAGE_PREVIEW_BLOCK,
		json!({ "a": 11 }),
		json!({}),
	)
	.await;

	let first = harness.evaluator.result_of(12, input_uuid).await.unwrap();
	assert_eq!(invocation_count(&harness).await, 1);
	assert_ne!(first, input_uuid);

	let second = harness.evaluator.result_of(12, input_uuid).await.unwrap();
	assert_eq!(second, first);
	assert_eq!(invocation_count(&harness).await, 1, "cache hit must not re-invoke the executor");

	let row = harness
		.cache
		.most_recent_for_block(11)
		.await
		.unwrap()
		.unwrap();
	assert_eq!(row.uuid, first);
}

/// Scenario 4: the cached file is deleted out from under the cache row; the next evaluation
/// self-heals by deleting the orphaned row and re-executing.
#[tokio::test]
async fn self_heal_on_deleted_output() {
	let harness = setup().await;
	let input_uuid = upload(&harness, "a.png", b"original bytes").await;

	insert_instance(&harness.conn, 10, 1, INPUT_BLOCK, json!({}), json!({})).await;
	insert_instance(
		&harness.conn,
		11,
		1,
		INVERT_BLOCK,
		json!({ "a": 10 }),
		json!({ "counter_path": harness.counter_path.to_string_lossy() }),
	)
	.await;

	let first = harness.evaluator.result_of(11, input_uuid).await.unwrap();
	assert_eq!(invocation_count(&harness).await, 1);

	let path = harness.store.resolve(first).await.unwrap();
	tokio::fs::remove_file(&path).await.unwrap();

	let second = harness.evaluator.result_of(11, input_uuid).await.unwrap();
	assert_ne!(second, first, "self-heal must mint a fresh output uuid");
	assert_eq!(invocation_count(&harness).await, 2, "self-heal must re-invoke the executor");

	let rows = harness.cache.list_for_blocks(&[11]).await.unwrap();
	assert_eq!(rows.len(), 1, "the orphaned row must be replaced, not duplicated");
	assert_eq!(rows[0].uuid, second);
}

/// Scenario 5: disabling a non-leaf general block invalidates every downstream cache row's
/// file, and a subsequent run treats the disabled block as a pass-through.
#[tokio::test]
async fn toggling_disabled_invalidates_downstream_and_becomes_pass_through() {
	let harness = setup().await;
	let input_uuid = upload(&harness, "a.png", b"original bytes").await;

	insert_instance(&harness.conn, 10, 1, INPUT_BLOCK, json!({}), json!({})).await;
	insert_instance(
		&harness.conn,
		11,
		1,
		INVERT_BLOCK,
		json!({ "a": 10 }),
		json!({ "counter_path": harness.counter_path.to_string_lossy() }),
	)
	.await;
	insert_instance(
		&harness.conn,
		12,
		1,
		IMAGE_PREVIEW_BLOCK,
		json!({ "a": 11 }),
		json!({}),
	)
	.await;

	let produced = harness.evaluator.result_of(12, input_uuid).await.unwrap();
	let produced_path = harness.store.resolve(produced).await.unwrap();
	assert!(tokio::fs::metadata(&produced_path).await.is_ok());

	let new_state = harness.invalidation.toggle_enabled(11).await.unwrap();
	assert!(!new_state);
	assert!(tokio::fs::metadata(&produced_path).await.is_err());

	let pass_through = harness.evaluator.result_of(12, input_uuid).await.unwrap();
	assert_eq!(pass_through, input_uuid, "a disabled Invert must pass its input through");
}

/// Scenario 6: a catalogue row whose `parameter_template` has more placeholders than declared
/// `gui_fields` is a configuration error — evaluation fails, no file is written, no cache row
/// is inserted.
#[tokio::test]
async fn misconfigured_template_is_rejected_before_execution() {
	let harness = setup().await;
	let input_uuid = upload(&harness, "a.png", b"original bytes").await;

	block_catalogue::ActiveModel {
		id: Set(99),
		name: Set("Broken".into()),
		command: Set("true".into()),
		parameter_template: Set("%s %s".into()),
		parameter_mappings: Set(json!({})),
		gui_fields: Set(json!(["only_one"])),
		outputs: Set(Some(json!({}))),
	}
	.insert(&harness.conn)
	.await
	.unwrap();

	insert_instance(&harness.conn, 10, 1, INPUT_BLOCK, json!({}), json!({})).await;
	insert_instance(&harness.conn, 20, 1, 99, json!({ "a": 10 }), json!({ "only_one": "x" })).await;

	let err = harness.evaluator.result_of(20, input_uuid).await.unwrap_err();
	assert!(matches!(err, EvaluatorError::TemplateOverflow { idblock: 20, .. }));
	assert!(harness.cache.list_for_blocks(&[20]).await.unwrap().is_empty());
}
