use super::*;
use crate::net::types::Role;
use crate::state::test_helpers::{temp_path, user};

fn stored_user_json(id: i64) -> String {
    serde_json::to_string(&user(id, Some(Role::Patient), true)).unwrap()
}

// =============================================================================
// MemoryStore
// =============================================================================

#[test]
fn memory_store_set_get_remove() {
    let store = MemoryStore::new();
    store.set_all(&[("a", "1"), ("b", "2")]).unwrap();
    assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    assert_eq!(store.len(), 2);
    store.remove_all(&["a", "missing"]).unwrap();
    assert_eq!(store.get("a").unwrap(), None);
    assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
}

// =============================================================================
// FileStore
// =============================================================================

#[test]
fn file_store_missing_file_reads_empty() {
    let store = FileStore::new(temp_path("missing"));
    assert_eq!(store.get(TOKEN_STORAGE_KEY).unwrap(), None);
}

#[test]
fn file_store_persists_across_instances() {
    let path = temp_path("persist");
    FileStore::new(&path).set_all(&[("accessToken", "tok"), ("user", "{}")]).unwrap();

    let reopened = FileStore::new(&path);
    assert_eq!(reopened.get("accessToken").unwrap().as_deref(), Some("tok"));
    reopened.remove_all(&["accessToken"]).unwrap();
    assert_eq!(FileStore::new(&path).get("accessToken").unwrap(), None);
    assert_eq!(FileStore::new(&path).get("user").unwrap().as_deref(), Some("{}"));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn file_store_corrupt_file_is_an_error_then_clearable() {
    let path = temp_path("corrupt");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "not json").unwrap();

    let store = FileStore::new(&path);
    assert!(matches!(store.get("user"), Err(StorageError::Serde(_))));
    store.remove_all(&[TOKEN_STORAGE_KEY, USER_STORAGE_KEY]).unwrap();
    assert_eq!(store.get("user").unwrap(), None);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn file_store_write_over_corrupt_file_fails_and_keeps_it() {
    let path = temp_path("corrupt-write");
    let store = FileStore::new(&path);
    save_credentials(&store, "tok", &user(1, Some(Role::Patient), true)).unwrap();
    std::fs::write(&path, "{not json").unwrap();

    assert!(matches!(save_user(&store, &user(1, Some(Role::Doctor), true)), Err(StorageError::Serde(_))));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");

    let _ = std::fs::remove_file(&path);
}

// =============================================================================
// load_credentials
// =============================================================================

#[test]
fn load_credentials_empty() {
    assert_eq!(load_credentials(&MemoryStore::new()), Hydration::Empty);
}

#[test]
fn load_credentials_valid_pair() {
    let store = MemoryStore::with_entries(&[(TOKEN_STORAGE_KEY, "tok"), (USER_STORAGE_KEY, &stored_user_json(4))]);
    assert_eq!(
        load_credentials(&store),
        Hydration::Valid { token: "tok".into(), user: user(4, Some(Role::Patient), true) }
    );
}

#[test]
fn load_credentials_malformed_payloads() {
    let cases: [&[(&str, &str)]; 6] = [
        &[(TOKEN_STORAGE_KEY, "tok")],
        &[(USER_STORAGE_KEY, r#"{"id":1,"email":"a@b.com"}"#)],
        &[(TOKEN_STORAGE_KEY, "tok"), (USER_STORAGE_KEY, "{not json")],
        &[(TOKEN_STORAGE_KEY, "tok"), (USER_STORAGE_KEY, r#"{"email":"a@b.com"}"#)],
        &[(TOKEN_STORAGE_KEY, "tok"), (USER_STORAGE_KEY, r#"{"id":1,"email":""}"#)],
        &[(TOKEN_STORAGE_KEY, ""), (USER_STORAGE_KEY, r#"{"id":1,"email":"a@b.com"}"#)],
    ];
    for entries in cases {
        let store = MemoryStore::with_entries(entries);
        assert_eq!(load_credentials(&store), Hydration::Malformed, "entries: {entries:?}");
    }
}

#[test]
fn save_then_clear_credentials() {
    let store = MemoryStore::new();
    let u = user(9, Some(Role::Doctor), true);
    save_credentials(&store, "tok-9", &u).unwrap();
    assert_eq!(load_credentials(&store), Hydration::Valid { token: "tok-9".into(), user: u });

    clear_credentials(&store).unwrap();
    assert!(store.is_empty());
}

#[test]
fn save_user_keeps_token() {
    let store = MemoryStore::new();
    save_credentials(&store, "tok", &user(1, None, false)).unwrap();
    save_user(&store, &user(1, Some(Role::Patient), true)).unwrap();
    assert_eq!(store.get(TOKEN_STORAGE_KEY).unwrap().as_deref(), Some("tok"));
    assert_eq!(
        load_credentials(&store),
        Hydration::Valid { token: "tok".into(), user: user(1, Some(Role::Patient), true) }
    );
}
