use super::*;

const TEST_SECRET_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

fn test_cipher() -> SecretCipher {
    SecretCipher::from_base64_key(TEST_SECRET_KEY).expect("cipher")
}

async fn temp_db_without_cipher() -> DbClient {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let db_path = tempdir.path().join("hub.db");
    // Leak the tempdir so the file outlives any pooled connections in the test.
    std::mem::forget(tempdir);

    DbClient::initialize(&db_path.to_string_lossy())
        .await
        .expect("db init")
}

async fn temp_db() -> DbClient {
    temp_db_without_cipher()
        .await
        .with_secret_cipher(test_cipher())
}

async fn insert_identity(db: &DbClient, name: &str) -> i64 {
    db.insert_identity(&NewIdentity {
        name: name.to_string(),
        kind: "basic-auth".to_string(),
        user: "jira-bot".to_string(),
        password: "secret".to_string(),
        create_user: "admin".to_string(),
    })
    .await
    .expect("insert identity")
}

fn new_tracker(name: &str, kind: TrackerKind, identity_id: i64) -> NewTracker {
    NewTracker {
        name: name.to_string(),
        url: format!("https://{name}.atlassian.net"),
        kind,
        identity_id,
        create_user: "admin".to_string(),
    }
}

#[tokio::test]
async fn initialize_runs_migrations_and_enables_wal() {
    let db = temp_db().await;
    db.ensure_wal_mode().await.expect("wal mode");
}

#[tokio::test]
async fn users_insert_count_and_lookup() {
    let db = temp_db().await;
    assert_eq!(db.users_count().await.expect("users_count"), 0);

    let user = NewUser {
        id: "user-1".to_string(),
        username: "admin".to_string(),
        password_hash: "hash".to_string(),
        scopes: "*".to_string(),
    };
    db.insert_user(&user).await.expect("insert user");
    assert_eq!(db.users_count().await.expect("users_count"), 1);

    let found = db
        .find_user_by_username("admin")
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(found.id, "user-1");
    assert_eq!(found.scopes, "*");
    assert!(db
        .find_user_by_username("missing")
        .await
        .expect("find")
        .is_none());
}

#[tokio::test]
async fn trackers_insert_get_and_join_identity_name() {
    let db = temp_db().await;
    let identity_id = insert_identity(&db, "jira-creds").await;

    let id = db
        .insert_tracker(&new_tracker("acme", TrackerKind::JiraCloud, identity_id))
        .await
        .expect("insert tracker");
    assert!(id > 0);

    let record = db
        .get_tracker_by_id(id)
        .await
        .expect("get tracker")
        .expect("exists");
    assert_eq!(record.name, "acme");
    assert_eq!(record.kind, TrackerKind::JiraCloud);
    assert_eq!(record.identity_name.as_deref(), Some("jira-creds"));
    assert_eq!(record.metadata, "{}");
    assert!(!record.connected);
    assert!(record.last_updated.is_none());
    assert_eq!(record.create_user, "admin");

    assert!(db.get_tracker_by_id(id + 100).await.expect("get").is_none());
}

#[tokio::test]
async fn trackers_insert_rejects_unknown_identity_and_duplicate_name() {
    let db = temp_db().await;
    let identity_id = insert_identity(&db, "jira-creds").await;

    let missing_identity = db
        .insert_tracker(&new_tracker("acme", TrackerKind::JiraCloud, identity_id + 1))
        .await;
    assert!(matches!(missing_identity, Err(StoreError::Conflict(_))));

    db.insert_tracker(&new_tracker("acme", TrackerKind::JiraCloud, identity_id))
        .await
        .expect("insert tracker");
    let duplicate = db
        .insert_tracker(&new_tracker("acme", TrackerKind::JiraServer, identity_id))
        .await;
    assert!(matches!(duplicate, Err(StoreError::Conflict(_))));
}

#[tokio::test]
async fn trackers_list_applies_kind_and_connected_filters() {
    let db = temp_db().await;
    let identity_id = insert_identity(&db, "jira-creds").await;

    let cloud = db
        .insert_tracker(&new_tracker("cloud", TrackerKind::JiraCloud, identity_id))
        .await
        .expect("insert");
    db.insert_tracker(&new_tracker("server", TrackerKind::JiraServer, identity_id))
        .await
        .expect("insert");
    db.insert_tracker(&new_tracker("dc", TrackerKind::JiraDatacenter, identity_id))
        .await
        .expect("insert");

    sqlx::query("UPDATE trackers SET connected = 1 WHERE id = ?1")
        .bind(cloud)
        .execute(&db.pool())
        .await
        .expect("mark connected");

    let all = db
        .list_trackers(&TrackerFilter::default())
        .await
        .expect("list");
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|pair| pair[0].id < pair[1].id));

    let by_kind = db
        .list_trackers(&TrackerFilter {
            kind: Some("jira-server".to_string()),
            connected: None,
        })
        .await
        .expect("list by kind");
    assert_eq!(by_kind.len(), 1);
    assert_eq!(by_kind[0].name, "server");

    let connected = db
        .list_trackers(&TrackerFilter {
            kind: None,
            connected: Some(true),
        })
        .await
        .expect("list connected");
    assert_eq!(connected.len(), 1);
    assert_eq!(connected[0].id, cloud);

    let disconnected_cloud = db
        .list_trackers(&TrackerFilter {
            kind: Some("jira-cloud".to_string()),
            connected: Some(false),
        })
        .await
        .expect("list combined");
    assert!(disconnected_cloud.is_empty());
}

#[tokio::test]
async fn trackers_update_resets_connection_status() {
    let db = temp_db().await;
    let first_identity = insert_identity(&db, "first").await;
    let second_identity = insert_identity(&db, "second").await;
    let id = db
        .insert_tracker(&new_tracker("acme", TrackerKind::JiraCloud, first_identity))
        .await
        .expect("insert");

    sqlx::query("UPDATE trackers SET connected = 1, message = 'ok', metadata = '{\"projects\":[]}' WHERE id = ?1")
        .bind(id)
        .execute(&db.pool())
        .await
        .expect("seed status");

    db.update_tracker(&TrackerUpdate {
        id,
        name: "acme-renamed".to_string(),
        url: "https://jira.acme.internal".to_string(),
        kind: TrackerKind::JiraDatacenter,
        identity_id: second_identity,
        update_user: "editor".to_string(),
    })
    .await
    .expect("update");

    let record = db
        .get_tracker_by_id(id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(record.name, "acme-renamed");
    assert_eq!(record.kind, TrackerKind::JiraDatacenter);
    assert_eq!(record.identity_name.as_deref(), Some("second"));
    assert_eq!(record.update_user, "editor");
    assert_eq!(record.create_user, "admin");
    assert!(!record.connected);
    assert_eq!(record.message, "");
    assert_eq!(record.metadata, "{\"projects\":[]}");
}

#[tokio::test]
async fn trackers_update_and_delete_report_missing_rows() {
    let db = temp_db().await;
    let identity_id = insert_identity(&db, "jira-creds").await;

    let missing = db
        .update_tracker(&TrackerUpdate {
            id: 42,
            name: "ghost".to_string(),
            url: "https://ghost".to_string(),
            kind: TrackerKind::JiraCloud,
            identity_id,
            update_user: "admin".to_string(),
        })
        .await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));

    let id = db
        .insert_tracker(&new_tracker("acme", TrackerKind::JiraCloud, identity_id))
        .await
        .expect("insert");
    db.delete_tracker_by_id(id).await.expect("delete");
    assert!(db.get_tracker_by_id(id).await.expect("get").is_none());
    assert!(matches!(
        db.delete_tracker_by_id(id).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn identities_crud_and_restricted_delete() {
    let db = temp_db().await;
    let identity_id = insert_identity(&db, "jira-creds").await;

    let listed = db.list_identities().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].user, "jira-bot");

    let duplicate = db
        .insert_identity(&NewIdentity {
            name: "jira-creds".to_string(),
            kind: "basic-auth".to_string(),
            user: String::new(),
            password: String::new(),
            create_user: String::new(),
        })
        .await;
    assert!(matches!(duplicate, Err(StoreError::Conflict(_))));

    let tracker_id = db
        .insert_tracker(&new_tracker("acme", TrackerKind::JiraCloud, identity_id))
        .await
        .expect("insert tracker");
    assert!(matches!(
        db.delete_identity_by_id(identity_id).await,
        Err(StoreError::Conflict(_))
    ));

    db.delete_tracker_by_id(tracker_id).await.expect("delete tracker");
    db.delete_identity_by_id(identity_id)
        .await
        .expect("delete identity");
    assert!(db
        .get_identity_by_id(identity_id)
        .await
        .expect("get")
        .is_none());
}

#[tokio::test]
async fn identities_store_password_encrypted() {
    let db = temp_db().await;
    let identity_id = insert_identity(&db, "jira-creds").await;

    let (stored,): (String,) =
        sqlx::query_as("SELECT password_encrypted FROM identities WHERE id = ?1")
            .bind(identity_id)
            .fetch_one(&db.pool())
            .await
            .expect("stored password");
    assert_ne!(stored, "secret");
    assert!(!stored.contains("secret"));
    assert_eq!(test_cipher().decrypt(&stored).expect("decrypt"), "secret");
}

#[tokio::test]
async fn identities_with_password_require_secret_key() {
    let db = temp_db_without_cipher().await;
    let result = db
        .insert_identity(&NewIdentity {
            name: "jira-creds".to_string(),
            kind: "basic-auth".to_string(),
            user: "jira-bot".to_string(),
            password: "secret".to_string(),
            create_user: "admin".to_string(),
        })
        .await;
    assert!(matches!(result, Err(StoreError::Unexpected(_))));
    assert!(db.list_identities().await.expect("list").is_empty());
}

#[tokio::test]
async fn users_first_insert_only_succeeds_once() {
    let db = temp_db().await;
    let user = |id: &str, username: &str| NewUser {
        id: id.to_string(),
        username: username.to_string(),
        password_hash: "hash".to_string(),
        scopes: "*".to_string(),
    };

    assert!(db
        .insert_first_user(&user("u1", "admin"))
        .await
        .expect("first insert"));
    assert!(!db
        .insert_first_user(&user("u2", "second"))
        .await
        .expect("second insert"));
    assert_eq!(db.users_count().await.expect("users_count"), 1);
    assert!(db
        .find_user_by_username("second")
        .await
        .expect("lookup")
        .is_none());
}

#[test]
fn tracker_kind_parses_known_values_only() {
    for kind in TrackerKind::ALL {
        assert_eq!(kind.as_str().parse::<TrackerKind>(), Ok(kind));
    }
    assert_eq!(
        "invalid-value".parse::<TrackerKind>(),
        Err(UnknownTrackerKind("invalid-value".to_string()))
    );
}
