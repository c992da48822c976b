use super::*;

fn uri(path: &str) -> Url {
    Url::from_file_path(path).expect("valid file path")
}

#[test]
fn open_and_get_roundtrip() {
    let store = DocumentStore::new();
    store.open(uri("/app/src/main.cr"), "puts 1\n".to_string(), 1);

    let document = store.get(&uri("/app/src/main.cr")).expect("tracked document");
    assert_eq!(document.text, "puts 1\n");
    assert_eq!(document.version, 1);
    assert!(store.contains(&uri("/app/src/main.cr")));
    assert_eq!(store.len(), 1);
}

#[test]
fn update_replaces_content_and_version() {
    let store = DocumentStore::new();
    store.open(uri("/app/src/main.cr"), "puts 1\n".to_string(), 1);
    store.update(uri("/app/src/main.cr"), "puts 2\n".to_string(), 2);

    let document = store.get(&uri("/app/src/main.cr")).expect("tracked document");
    assert_eq!(document.text, "puts 2\n");
    assert_eq!(document.version, 2);
}

#[test]
fn update_tracks_documents_the_editor_never_opened() {
    let store = DocumentStore::new();
    store.update(uri("/app/src/other.cr"), "x = 1\n".to_string(), 7);
    assert!(store.contains(&uri("/app/src/other.cr")));
}

#[test]
fn close_forgets_the_document() {
    let store = DocumentStore::new();
    store.open(uri("/app/src/main.cr"), "puts 1\n".to_string(), 1);
    store.close(&uri("/app/src/main.cr"));

    assert!(store.get(&uri("/app/src/main.cr")).is_none());
    assert!(store.is_empty());
}
