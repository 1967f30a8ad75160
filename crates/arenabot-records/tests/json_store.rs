//! File-backed record store tests.

use arenabot_records::{JsonRecordStore, Preferences, RecordError, RecordStore};

#[tokio::test]
async fn test_json_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");

    {
        let store = JsonRecordStore::open(&path).await.unwrap();
        let mut user = store.get_or_create_user("Rival").await.unwrap();
        user.banned = true;
        store.save_user(&user).await.unwrap();

        let mut record = store
            .get_or_create_format_record(&user, "gen9ou")
            .await
            .unwrap();
        record.preferences = Preferences {
            use_team: true,
            team: Some("https://pokepast.es/abc".into()),
            use_factory: false,
        };
        store.record_win(&mut record).await.unwrap();
    }

    let store = JsonRecordStore::open(&path).await.unwrap();
    let user = store.get_or_create_user("rival").await.unwrap();
    let record = store
        .get_or_create_format_record(&user, "gen9ou")
        .await
        .unwrap();

    assert!(user.banned);
    assert_eq!(record.wins, 1);
    assert_eq!(record.win_streak, 1);
    assert!(record.preferences.use_team);
    assert_eq!(record.preferences.team.as_deref(), Some("https://pokepast.es/abc"));
}

#[tokio::test]
async fn test_json_store_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nothing-here.json");

    let store = JsonRecordStore::open(&path).await.unwrap();
    let user = store.get_or_create_user("newcomer").await.unwrap();

    assert!(!user.banned);
    // Creating the account wrote the file.
    assert!(path.exists());
}

#[tokio::test]
async fn test_json_store_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    std::fs::write(&path, "{not json").unwrap();

    let result = JsonRecordStore::open(&path).await;

    assert!(matches!(result, Err(RecordError::Decode(_))));
}
