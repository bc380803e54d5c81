//! End-to-end setup and update runs against on-disk schema directories.
//!
//! The schema sources live in a temporary directory read through `LocalFs`;
//! statements execute against the in-memory client.

use ksm_core::{KeyspaceName, SetupConfig, UpdateConfig, Version};
use ksm_db::{MemoryClient, SchemaClient};
use ksm_migrate::{ErrorKind, LocalFs, Migrator};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Helpers ────────────────────────────────────────────────────────────

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Base schema plus steps 0.2 and 0.3 under `<tmp>/schema`.
fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("base.cql"),
        "CREATE TYPE IF NOT EXISTS address (street text, zip text);\n\
         // accounts keyed by id\n\
         CREATE TABLE IF NOT EXISTS accounts (id uuid PRIMARY KEY, addr frozen<address>);\n",
    );
    write(
        &dir.path().join("schema/v0.2/schema.cql"),
        "/* sessions */\nCREATE TABLE IF NOT EXISTS sessions (id uuid PRIMARY KEY, note text);\n",
    );
    write(
        &dir.path().join("schema/v0.2/manifest.yml"),
        "upgrades_from: \"0.1\"\ndescription: session tracking\n",
    );
    write(
        &dir.path().join("schema/v0.3/schema.cql"),
        "ALTER TABLE sessions ADD expires_at timestamp;\n\
         INSERT INTO sessions (id, note) VALUES (uuid(), 'semi;colon');\n",
    );
    write(&dir.path().join("schema/README.md"), "not a step");
    dir
}

fn setup_config(root: &Path, version: &str) -> SetupConfig {
    SetupConfig {
        keyspace: "shop".to_string(),
        schema_file: Some(root.join("base.cql")),
        initial_version: Some(version.to_string()),
        overwrite: false,
        disable_versioning: false,
    }
}

fn update_config(root: &Path, target: Option<&str>, dry_run: bool) -> UpdateConfig {
    UpdateConfig {
        keyspace: "shop".to_string(),
        schema_dir: root.join("schema"),
        target_version: target.map(String::from),
        dry_run,
    }
}

fn client() -> MemoryClient {
    MemoryClient::new(KeyspaceName::parse("shop").unwrap())
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[tokio::test]
async fn setup_then_update_chains_the_log() {
    let dir = fixture();
    let db = client();
    let migrator = Migrator::new(&db, &LocalFs);

    migrator
        .setup(&setup_config(dir.path(), "0.1"))
        .await
        .unwrap();
    let store = migrator.store();
    assert_eq!(store.current_version().await.unwrap(), v("0.1"));
    let log = store.update_log().await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].old_version, "0.1");
    assert_eq!(log[0].new_version, "0.1");

    let report = migrator
        .update(&update_config(dir.path(), Some("0.3"), false))
        .await
        .unwrap();
    assert_eq!(report.steps.len(), 2);
    assert_eq!(store.current_version().await.unwrap(), v("0.3"));

    let log = store.update_log().await.unwrap();
    let chain: Vec<(&str, &str)> = log
        .iter()
        .map(|e| (e.old_version.as_str(), e.new_version.as_str()))
        .collect();
    assert_eq!(chain, vec![("0.1", "0.1"), ("0.1", "0.2"), ("0.2", "0.3")]);
    assert_eq!(log[1].description, "session tracking");

    let executed = db.executed();
    assert!(executed
        .iter()
        .any(|s| s == "INSERT INTO sessions (id, note) VALUES (uuid(), 'semi;colon')"));
}

#[tokio::test]
async fn dry_run_leaves_keyspace_untouched() {
    let dir = fixture();
    let db = client();
    let migrator = Migrator::new(&db, &LocalFs);
    migrator
        .setup(&setup_config(dir.path(), "0.1"))
        .await
        .unwrap();
    let before = db.executed();

    let report = migrator
        .update(&update_config(dir.path(), None, true))
        .await
        .unwrap();
    assert!(report.dry_run);
    assert_eq!(report.to, v("0.3"));
    assert_eq!(db.executed(), before);
    assert_eq!(migrator.store().current_version().await.unwrap(), v("0.1"));
}

#[tokio::test]
async fn gap_in_directory_chain_is_reported_before_execution() {
    let dir = fixture();
    write(
        &dir.path().join("schema/v1.0/schema.cql"),
        "CREATE TABLE IF NOT EXISTS audit (id uuid PRIMARY KEY);",
    );
    write(
        &dir.path().join("schema/v1.0/manifest.yml"),
        "upgrades_from: \"0.5\"\n",
    );

    let db = client();
    let migrator = Migrator::new(&db, &LocalFs);
    migrator
        .setup(&setup_config(dir.path(), "0.1"))
        .await
        .unwrap();
    let before = db.executed().len();

    let err = migrator
        .update(&update_config(dir.path(), Some("1.0"), false))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GapInPath);
    assert!(!err.mutated());
    assert_eq!(db.executed().len(), before);
}

#[tokio::test]
async fn update_before_setup_fails() {
    let dir = fixture();
    let db = client();
    let err = Migrator::new(&db, &LocalFs)
        .update(&update_config(dir.path(), None, false))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotSetUp);
}

#[tokio::test]
async fn missing_schema_dir_is_a_path_error() {
    let dir = fixture();
    let db = client();
    let migrator = Migrator::new(&db, &LocalFs);
    migrator
        .setup(&setup_config(dir.path(), "0.1"))
        .await
        .unwrap();

    let config = UpdateConfig {
        schema_dir: PathBuf::from(dir.path()).join("nope"),
        ..update_config(dir.path(), None, false)
    };
    let err = migrator.update(&config).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Path);
    db.close().await.unwrap();
}
