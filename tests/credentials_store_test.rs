use electrocars::credentials::{CredentialSink, FileCredentialStore, StoredCredential};

#[test]
fn missing_file_loads_empty_credential() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let store = FileCredentialStore::new(tmp_dir.path().join("credentials.json"));
    let loaded = store.load().unwrap();
    assert_eq!(loaded, StoredCredential::default());
    assert!(!loaded.has_refresh_token());
}

#[test]
fn load_save_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("nested").join("credentials.json");
    let store = FileCredentialStore::new(&path);

    let credential = StoredCredential::new(Some("+79990000000".into()), Some("rt-1".into()));
    store.save(&credential).unwrap();
    assert!(path.exists());

    let reopened = FileCredentialStore::new(&path);
    assert_eq!(reopened.load().unwrap(), credential);
}

#[test]
fn sink_overwrites_previous_token() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    let store = FileCredentialStore::new(tmp.path());

    store
        .store(&StoredCredential::new(Some("+7".into()), Some("rt-1".into())))
        .unwrap();
    store
        .store(&StoredCredential::new(Some("+7".into()), Some("rt-2".into())))
        .unwrap();

    assert_eq!(store.load().unwrap().refresh_token.as_deref(), Some("rt-2"));
}

#[test]
fn corrupt_file_is_reported() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(tmp.path(), b"{not json").unwrap();
    let store = FileCredentialStore::new(tmp.path());
    let err = store.load().unwrap_err();
    assert!(format!("{}", err).contains("Serialization error"));
}

#[test]
fn concurrent_writers_leave_a_whole_record() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let store = std::sync::Arc::new(FileCredentialStore::new(
        tmp_dir.path().join("credentials.json"),
    ));

    let writers: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            std::thread::spawn(move || {
                store.store(&StoredCredential::new(Some("+7".into()), Some(format!("rt-{i}"))))
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap().unwrap();
    }

    let loaded = store.load().unwrap();
    assert!(loaded.refresh_token.unwrap().starts_with("rt-"));
    assert!(!tmp_dir.path().join("credentials.json.tmp").exists());
}
