use super::*;

fn setup(version: Option<&str>, disable: bool, file: Option<&str>) -> SetupConfig {
    SetupConfig {
        keyspace: "cadence".to_string(),
        schema_file: file.map(PathBuf::from),
        initial_version: version.map(String::from),
        overwrite: false,
        disable_versioning: disable,
    }
}

#[test]
fn test_setup_with_version() {
    let task = setup(Some("0.1"), false, Some("schema.cql"))
        .validate()
        .unwrap();
    assert_eq!(task.keyspace, "cadence");
    assert_eq!(
        task.versioning,
        Versioning::Enabled(Version::parse("0.1").unwrap())
    );
}

#[test]
fn test_setup_version_without_schema_file() {
    let task = setup(Some("v1.0"), false, None).validate().unwrap();
    assert!(task.schema_file.is_none());
    assert!(matches!(task.versioning, Versioning::Enabled(_)));
}

#[test]
fn test_setup_disabled_versioning() {
    let task = setup(None, true, Some("schema.cql")).validate().unwrap();
    assert_eq!(task.versioning, Versioning::Disabled);
}

#[test]
fn test_setup_version_and_disabled_is_rejected() {
    let err = setup(Some("0.1"), true, Some("schema.cql"))
        .validate()
        .unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_setup_neither_is_rejected() {
    let err = setup(None, false, Some("schema.cql")).validate().unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));

    // a blank version counts as absent
    let err = setup(Some("  "), false, Some("schema.cql"))
        .validate()
        .unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_setup_disabled_requires_schema_file() {
    let err = setup(None, true, None).validate().unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_setup_bad_version() {
    let err = setup(Some("1.x"), false, None).validate().unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_setup_empty_keyspace() {
    let mut config = setup(Some("0.1"), false, None);
    config.keyspace = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_update_validate() {
    let config = UpdateConfig {
        keyspace: "cadence".to_string(),
        schema_dir: PathBuf::from("schema/versioned"),
        target_version: Some("v0.3".to_string()),
        dry_run: true,
    };
    let task = config.validate().unwrap();
    assert_eq!(task.target_version, Some(Version::parse("0.3").unwrap()));
    assert!(task.dry_run);
}

#[test]
fn test_update_without_target() {
    let config = UpdateConfig {
        keyspace: "cadence".to_string(),
        schema_dir: PathBuf::from("schema"),
        target_version: None,
        dry_run: false,
    };
    assert!(config.validate().unwrap().target_version.is_none());
}

#[test]
fn test_update_requires_schema_dir() {
    let config = UpdateConfig {
        keyspace: "cadence".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        config.validate().unwrap_err(),
        CoreError::ConfigInvalid { .. }
    ));
}

#[test]
fn test_create_keyspace_validate() {
    let config = CreateKeyspaceConfig {
        keyspace: "cadence".to_string(),
        replication_factor: 3,
    };
    let (ks, rf) = config.validate().unwrap();
    assert_eq!(ks, "cadence");
    assert_eq!(rf, 3);

    let zero = CreateKeyspaceConfig {
        keyspace: "cadence".to_string(),
        replication_factor: 0,
    };
    assert!(zero.validate().is_err());
}

#[test]
fn test_parse_connection_profile() {
    let yaml = r#"
hosts: "10.0.0.1, 10.0.0.2:9142"
user: cassandra
password: secret
keyspace: cadence
consistency: local_quorum
datacenter: dc1
"#;
    let config: ConnectionConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert_eq!(config.keyspace.as_deref(), Some("cadence"));
    assert_eq!(
        config.contact_points().unwrap(),
        vec!["10.0.0.1:9042".to_string(), "10.0.0.2:9142".to_string()]
    );
}

#[test]
fn test_connection_profile_rejects_unknown_fields() {
    let result: Result<ConnectionConfig, _> = serde_yaml::from_str("hosts: a\nbogus: 1\n");
    assert!(result.is_err());
}

#[test]
fn test_contact_points_require_hosts() {
    let config = ConnectionConfig::default();
    assert!(config.contact_points().is_err());
}

#[test]
fn test_load_from_dir() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ConnectionConfig::load_from_dir(dir.path()).unwrap().is_none());

    std::fs::write(dir.path().join("ksm.yaml"), "hosts: 127.0.0.1\nport: 9043\n").unwrap();
    let config = ConnectionConfig::load_from_dir(dir.path()).unwrap().unwrap();
    assert_eq!(config.contact_points().unwrap(), vec!["127.0.0.1:9043"]);
}

#[test]
fn test_load_malformed_profile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ksm.yml");
    std::fs::write(&path, "hosts: [unclosed\n").unwrap();
    assert!(matches!(
        ConnectionConfig::load(&path).unwrap_err(),
        CoreError::ConfigParseError { .. }
    ));
}
