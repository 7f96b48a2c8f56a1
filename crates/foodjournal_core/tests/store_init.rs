use foodjournal_core::db::schema::{current_user_version, SCHEMA_VERSION, TABLES};
use foodjournal_core::{
    QueryExecutionError, SqlValue, Store, StoreConfig, StoreInitializationError,
};
use rusqlite::Connection;

#[test]
fn ensure_ready_creates_schema_and_enables_wal() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(StoreConfig::in_dir(dir.path()));
    assert!(!store.is_ready());

    store.ensure_ready().unwrap();
    assert!(store.is_ready());

    let conn = Connection::open(dir.path().join("FoodJournal.db")).unwrap();
    for table in TABLES {
        assert_table_exists(&conn, table);
    }
    assert_eq!(current_user_version(&conn).unwrap(), SCHEMA_VERSION);

    let mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_ascii_lowercase(), "wal");
}

#[test]
fn repeated_initialization_produces_identical_schema() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::in_dir(dir.path());

    let first = Store::new(config.clone());
    first.ensure_ready().unwrap();
    first.ensure_ready().unwrap();
    first
        .execute(
            "INSERT INTO users (email, password) VALUES (?1, ?2);",
            &["a@example.com".into(), "pw".into()],
        )
        .unwrap();
    let schema_before = schema_sql(&dir.path().join("FoodJournal.db"));
    drop(first);

    // A second store on the same file models an app restart.
    let second = Store::new(config);
    for _ in 0..3 {
        second.ensure_ready().unwrap();
    }
    assert_eq!(schema_sql(&dir.path().join("FoodJournal.db")), schema_before);

    let users = second.execute("SELECT email FROM users;", &[]).unwrap();
    assert_eq!(users.rows.len(), 1);
    assert_eq!(users.rows[0].get_str("email"), Some("a@example.com"));
}

#[test]
fn ensure_ready_adopts_unversioned_file_with_existing_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("FoodJournal.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, email TEXT UNIQUE, password TEXT);
         CREATE TABLE journals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            userId INTEGER,
            image TEXT,
            description TEXT,
            date TEXT,
            category TEXT,
            FOREIGN KEY(userId) REFERENCES users(id)
         );
         INSERT INTO users (email, password) VALUES ('old@example.com', 'pw');
         INSERT INTO journals (userId, image, description, date, category)
            VALUES (1, 'img://old', 'Toast', '2023-05-01T07:30:00.000Z', 'Breakfast');",
    )
    .unwrap();
    drop(conn);

    let store = Store::new(StoreConfig::at_path(&path));
    let result = store
        .execute("SELECT description FROM journals WHERE userId = ?1;", &[SqlValue::from(1_i64)])
        .unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get_str("description"), Some("Toast"));

    let conn = Connection::open(&path).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), SCHEMA_VERSION);
}

#[test]
fn failed_initialization_leaves_store_unset_and_later_call_retries() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("not-created-yet");
    let store = Store::new(StoreConfig::in_dir(&data_dir));

    let err = store.ensure_ready().unwrap_err();
    assert!(matches!(
        err,
        StoreInitializationError::Open(_) | StoreInitializationError::Configure(_)
    ));
    assert!(!store.is_ready());

    let exec_err = store.execute("SELECT 1;", &[]).unwrap_err();
    assert!(matches!(exec_err, QueryExecutionError::StoreUnavailable(_)));

    std::fs::create_dir_all(&data_dir).unwrap();
    store.ensure_ready().unwrap();
    assert!(store.is_ready());
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("FoodJournal.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let store = Store::new(StoreConfig::at_path(&path));
    match store.ensure_ready().unwrap_err() {
        StoreInitializationError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!store.is_ready());
}

#[test]
fn failing_schema_statement_rolls_back_every_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("FoodJournal.db");
    let conn = Connection::open(&path).unwrap();
    // An index already owns the `journals` name, so only that table fails.
    conn.execute_batch(
        "CREATE TABLE photos (uri TEXT);
         CREATE INDEX journals ON photos(uri);",
    )
    .unwrap();
    drop(conn);

    let store = Store::new(StoreConfig::at_path(&path));
    let err = store.ensure_ready().unwrap_err();
    assert!(
        matches!(err, StoreInitializationError::Schema(_)),
        "unexpected error: {err}"
    );
    assert_eq!(err.code(), "store_schema_failed");
    assert!(!store.is_ready());

    let conn = Connection::open(&path).unwrap();
    let users: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(users, 0);
    assert_eq!(current_user_version(&conn).unwrap(), 0);

    conn.execute_batch("DROP INDEX journals;").unwrap();
    drop(conn);
    store.ensure_ready().unwrap();
    assert!(store.is_ready());
}

#[test]
fn concurrent_first_calls_initialize_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(StoreConfig::in_dir(dir.path()));

    std::thread::scope(|scope| {
        for index in 0..8 {
            let store = &store;
            scope.spawn(move || {
                store
                    .execute(
                        "INSERT INTO users (email, password) VALUES (?1, ?2);",
                        &[
                            SqlValue::from(format!("user{index}@example.com")),
                            SqlValue::from("pw"),
                        ],
                    )
                    .unwrap();
            });
        }
    });

    let count = store
        .execute("SELECT COUNT(*) AS total FROM users;", &[])
        .unwrap();
    assert_eq!(count.rows[0].get_i64("total"), Some(8));
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

fn schema_sql(path: &std::path::Path) -> Vec<String> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare("SELECT sql FROM sqlite_master WHERE type = 'table' ORDER BY name;")
        .unwrap();
    let rows = stmt.query_map([], |row| row.get(0)).unwrap();
    rows.map(|row| row.unwrap()).collect()
}
