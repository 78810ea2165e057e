use chrono::NaiveDate;
use companion_core::model::{Label, MarkPolicy, ProgressStore};
use storage::repository::{ProgressRepository, StorageError};
use storage::JsonFileRepository;

fn stamp(day: u32, hour: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn two_surahs() -> ProgressStore {
    let mut store = ProgressStore::new();
    store.mark(Label::parse("Al-Fatiha").unwrap(), stamp(1, 4), MarkPolicy::Idempotent);
    store.mark(Label::parse("Al-Ikhlas").unwrap(), stamp(2, 21), MarkPolicy::Idempotent);
    store
}

#[tokio::test]
async fn missing_file_reads_none() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRepository::new(dir.path().join("progress.json"));
    assert!(repo.read_store().await.unwrap().is_none());
}

#[tokio::test]
async fn write_then_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRepository::new(dir.path().join("progress.json"));
    let store = two_surahs();

    repo.write_store(&store).await.unwrap();
    let loaded = repo.read_store().await.unwrap().unwrap();

    assert_eq!(loaded, store);
    assert_eq!(loaded.labels(), vec!["Al-Fatiha", "Al-Ikhlas"]);
}

#[tokio::test]
async fn writes_documented_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.json");
    let repo = JsonFileRepository::new(&path);
    repo.write_store(&two_surahs()).await.unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["Al-Fatiha"], "2025-03-01 04:00");
    assert_eq!(value["Al-Ikhlas"], "2025-03-02 21:00");
}

#[tokio::test]
async fn garbage_is_reported_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.json");
    std::fs::write(&path, b"\x00\x13garbage{{").unwrap();

    let err = JsonFileRepository::new(&path).read_store().await.unwrap_err();
    assert!(err.is_corrupt(), "unexpected error: {err}");
}

#[tokio::test]
async fn read_surahs_layout_is_imported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.json");
    std::fs::write(&path, r#"{"read_surahs": ["Al-Fatiha", "Al-Ikhlas"]}"#).unwrap();
    let repo = JsonFileRepository::new(&path);

    let store = repo.read_store().await.unwrap().unwrap();
    assert_eq!(store.labels(), vec!["Al-Fatiha", "Al-Ikhlas"]);

    repo.write_store(&store).await.unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(value.get("read_surahs").is_none());
    assert!(value["Al-Fatiha"].is_string());
}

#[tokio::test]
async fn creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("progress.json");
    let repo = JsonFileRepository::new(&path);

    repo.write_store(&two_surahs()).await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn overwrites_previous_content() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRepository::new(dir.path().join("progress.json"));
    repo.write_store(&two_surahs()).await.unwrap();
    repo.write_store(&ProgressStore::new()).await.unwrap();

    assert!(repo.read_store().await.unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn directory_in_place_of_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRepository::new(dir.path());

    let err = repo.write_store(&two_surahs()).await.unwrap_err();
    assert!(matches!(err, StorageError::Io { .. }));
    let err = repo.read_store().await.unwrap_err();
    assert!(matches!(err, StorageError::Io { .. }));
}
