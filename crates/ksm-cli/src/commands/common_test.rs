use super::*;
use crate::cli::Cli;
use clap::Parser;
use ksm_core::Version;
use ksm_db::MemoryClient;

fn global(args: &[&str]) -> GlobalArgs {
    let mut argv = vec!["ksm"];
    argv.extend_from_slice(args);
    argv.push("status");
    Cli::try_parse_from(argv).unwrap().global
}

#[test]
fn test_exit_code_passthrough() {
    let err: anyhow::Error = ExitCode(3).into();
    assert_eq!(exit_code_for(&err), 3);
}

#[test]
fn test_exit_code_from_migrate_error_behind_context() {
    let err = anyhow::Error::from(MigrateError::NotSetUp {
        keyspace: "app".to_string(),
    })
    .context("update-schema failed");
    assert_eq!(exit_code_for(&err), 6);

    let err: anyhow::Error = MigrateError::GapInPath {
        expected: Version::parse("1.2").unwrap(),
        declared: Version::parse("1.3").unwrap(),
        to: Version::parse("2.0").unwrap(),
    }
    .into();
    assert_eq!(exit_code_for(&err), 4);
}

#[test]
fn test_exit_code_config_and_unknown() {
    let err: anyhow::Error = CoreError::ConfigInvalid {
        message: "bad".to_string(),
    }
    .into();
    assert_eq!(exit_code_for(&err), 2);
    assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), 1);
}

#[test]
fn test_kind_codes_are_distinct_for_mutation() {
    assert_ne!(
        exit_code_for_kind(ErrorKind::PartialApplication),
        exit_code_for_kind(ErrorKind::Execution)
    );
    assert_eq!(exit_code_for_kind(ErrorKind::NotInitialized), 6);
}

#[test]
fn test_connection_config_profile_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("ksm.yml"),
        "hosts: cass1,cass2:9043\nkeyspace: from_file\nconsistency: one\n",
    )
    .unwrap();
    let dir_arg = dir.path().to_str().unwrap();

    let config = connection_config(&global(&["--config-dir", dir_arg])).unwrap();
    assert_eq!(config.hosts, "cass1,cass2:9043");
    assert_eq!(target_keyspace(&config).unwrap(), "from_file");
    assert_eq!(config.consistency.as_deref(), Some("one"));

    let config = connection_config(&global(&[
        "--config-dir",
        dir_arg,
        "-k",
        "from_flag",
        "--port",
        "9999",
        "--timeout",
        "3",
    ]))
    .unwrap();
    assert_eq!(target_keyspace(&config).unwrap(), "from_flag");
    assert_eq!(config.port, 9999);
    assert_eq!(config.timeout_secs, 3);
    assert_eq!(
        config.contact_points().unwrap(),
        vec!["cass1:9999", "cass2:9043"]
    );
}

#[test]
fn test_connection_config_requires_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let err = connection_config(&global(&["--config-dir", dir.path().to_str().unwrap()]))
        .unwrap_err();
    assert_eq!(exit_code_for(&err), 2);
}

#[test]
fn test_missing_keyspace() {
    let dir = tempfile::tempdir().unwrap();
    let config = connection_config(&global(&[
        "--config-dir",
        dir.path().to_str().unwrap(),
        "-e",
        "localhost",
    ]))
    .unwrap();
    let err = target_keyspace(&config).unwrap_err();
    assert_eq!(exit_code_for(&err), 2);
}

#[tokio::test]
async fn test_close_after_success_and_failure() {
    let db = MemoryClient::new(KeyspaceName::parse("app").unwrap());
    let value = close_after(&db, Ok::<_, MigrateError>(7)).await.unwrap();
    assert_eq!(value, 7);
    assert!(db.is_closed());

    let db = MemoryClient::new(KeyspaceName::parse("app").unwrap());
    let err = close_after::<(), _>(&db, Err(MigrateError::NotInitialized))
        .await
        .unwrap_err();
    assert!(db.is_closed());
    assert_eq!(exit_code_for(&err), 6);
}
