use super::*;

fn temp_storage() -> (FileStorage, PathBuf) {
    let dir = std::env::temp_dir().join(format!("eightbit-storage-{}", uuid::Uuid::new_v4()));
    (FileStorage::new(&dir), dir)
}

// =============================================================================
// StorageKey
// =============================================================================

#[test]
fn key_under_images_is_accepted() {
    let key = StorageKey::parse("images/pacman/cabinet.png").unwrap();
    assert_eq!(key.as_str(), "images/pacman/cabinet.png");
}

#[test]
fn key_outside_images_is_forbidden() {
    assert!(matches!(StorageKey::parse("private/notes.txt"), Err(StorageError::Forbidden(_))));
    assert!(matches!(StorageKey::parse("imagesx/a.png"), Err(StorageError::Forbidden(_))));
}

#[test]
fn traversal_and_malformed_keys_are_invalid() {
    for raw in ["", "/images/a.png", "images/../secret", "images//a.png", "images/./a.png", "images\\a.png", "images/"] {
        assert!(matches!(StorageKey::parse(raw), Err(StorageError::InvalidKey(_))), "{raw:?} should be invalid");
    }
}

#[test]
fn error_codes() {
    assert_eq!(StorageError::Forbidden("x".into()).error_code(), "E_FORBIDDEN");
    assert_eq!(StorageError::InvalidKey("x".into()).error_code(), "E_INVALID_KEY");
    assert_eq!(StorageError::NotFound("x".into()).error_code(), "E_NOT_FOUND");
}

// =============================================================================
// FileStorage
// =============================================================================

#[tokio::test]
async fn write_then_delete_object() {
    let (storage, dir) = temp_storage();
    let key = StorageKey::parse("images/galaga.png").unwrap();

    storage.write(&key, b"png-bytes").await.unwrap();
    let path = storage.path_for(&key);
    assert_eq!(path, dir.join(STORAGE_NAME).join("images/galaga.png"));
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"png-bytes");

    storage.write(&key, b"v2").await.unwrap();
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"v2");

    storage.delete(&key).await.unwrap();
    assert!(!path.exists());

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn delete_missing_object_is_not_found() {
    let (storage, _dir) = temp_storage();
    let key = StorageKey::parse("images/missing.png").unwrap();
    assert!(matches!(storage.delete(&key).await, Err(StorageError::NotFound(_))));
}
