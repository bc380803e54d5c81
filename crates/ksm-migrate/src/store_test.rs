use super::*;
use crate::error::ErrorKind;
use ksm_core::KeyspaceName;
use ksm_db::MemoryClient;

fn client() -> MemoryClient {
    MemoryClient::new(KeyspaceName::parse("ks").unwrap())
}

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    let db = client();
    let store = VersionStore::new(&db);
    store.initialize().await.unwrap();
    store.initialize().await.unwrap();
    assert_eq!(db.tables(), vec!["schema_version", "schema_update_history"]);
}

#[tokio::test]
async fn test_initialize_unreachable() {
    let db = client();
    db.set_unreachable(true);
    let err = VersionStore::new(&db).initialize().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
}

#[tokio::test]
async fn test_current_version_not_initialized() {
    let db = client();
    let store = VersionStore::new(&db);
    let err = store.current_version().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialized);

    store.initialize().await.unwrap();
    let err = store.current_version().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialized);
}

#[tokio::test]
async fn test_record_and_read() {
    let db = client();
    let store = VersionStore::new(&db);
    store.initialize().await.unwrap();
    store
        .record_version(&v("0.1"), &v("0.1"), "abc", "initial version")
        .await
        .unwrap();
    store
        .record_version(&v("0.1"), &v("v0.2"), "def", "add users")
        .await
        .unwrap();

    assert_eq!(store.current_version().await.unwrap(), v("0.2"));
    let log = store.update_log().await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].old_version, "0.1");
    assert_eq!(log[1].new_version, "0.2");
    assert_eq!(log[1].manifest_ref, "def");
}

#[tokio::test]
async fn test_log_wins_when_row_write_fails() {
    let db = client();
    let store = VersionStore::new(&db);
    store.initialize().await.unwrap();
    store
        .record_version(&v("0.1"), &v("0.1"), "", "initial version")
        .await
        .unwrap();

    db.fail_version_row_writes(true);
    assert!(store
        .record_version(&v("0.1"), &v("0.2"), "", "")
        .await
        .is_err());
    db.clear_failures();

    let status = store.status().await.unwrap();
    assert_eq!(status.row.as_deref(), Some("0.1"));
    assert!(!status.is_consistent());
    assert_eq!(store.current_version().await.unwrap(), v("0.2"));
}

#[tokio::test]
async fn test_repair_rewrites_row() {
    let db = client();
    let store = VersionStore::new(&db);
    store.initialize().await.unwrap();
    store
        .record_version(&v("0.1"), &v("0.2"), "", "")
        .await
        .unwrap();
    assert_eq!(store.repair().await.unwrap(), None);

    db.force_current_version(Some("0.1"));
    assert_eq!(store.repair().await.unwrap(), Some(v("0.2")));
    assert!(store.status().await.unwrap().is_consistent());
}

#[tokio::test]
async fn test_repair_without_any_record() {
    let db = client();
    let store = VersionStore::new(&db);
    store.initialize().await.unwrap();
    assert_eq!(
        store.repair().await.unwrap_err().kind(),
        ErrorKind::NotInitialized
    );
}

#[tokio::test]
async fn test_corrupt_row() {
    let db = client();
    let store = VersionStore::new(&db);
    store.initialize().await.unwrap();
    db.force_current_version(Some("banana"));
    assert_eq!(
        store.current_version().await.unwrap_err().kind(),
        ErrorKind::StoreCorrupt
    );
}

#[tokio::test]
async fn test_drop_all_tables_before_types() {
    let db = client();
    let store = VersionStore::new(&db);
    store.initialize().await.unwrap();
    db.exec("CREATE TYPE addr (street text)").await.unwrap();
    db.exec("CREATE TABLE users (id int PRIMARY KEY, a frozen<addr>)")
        .await
        .unwrap();

    let dropped = store.drop_all().await.unwrap();
    assert_eq!(
        dropped,
        vec!["schema_version", "schema_update_history", "users", "addr"]
    );
    assert!(db.tables().is_empty());
    assert!(db.types().is_empty());
}

#[tokio::test]
async fn test_drop_all_type_without_progress() {
    let db = client();
    let store = VersionStore::new(&db);
    db.exec("CREATE TABLE t (id int PRIMARY KEY)").await.unwrap();
    db.exec("CREATE TYPE stuck (a int)").await.unwrap();
    db.fail_on("DROP TYPE");

    let err = store.drop_all().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PartialApplication);
    assert!(db.tables().is_empty());
    assert_eq!(db.types(), vec!["stuck"]);
}

#[tokio::test]
async fn test_drop_all_connection_loss_after_tables_dropped() {
    let db = client();
    let store = VersionStore::new(&db);
    db.exec("CREATE TABLE x (id int PRIMARY KEY)").await.unwrap();
    db.exec("CREATE TYPE t (a int)").await.unwrap();
    db.disconnect_on("DROP TYPE");

    let err = store.drop_all().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PartialApplication);
    assert!(err.mutated());
    assert!(db.tables().is_empty());
    assert_eq!(db.types(), vec!["t"]);
}

#[tokio::test]
async fn test_drop_all_connection_loss_before_anything_dropped() {
    let db = client();
    let store = VersionStore::new(&db);
    db.exec("CREATE TYPE t (a int)").await.unwrap();
    db.disconnect_on("DROP TYPE");

    let err = store.drop_all().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    assert!(!err.mutated());
}
