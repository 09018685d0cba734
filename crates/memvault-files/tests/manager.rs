//! Filesystem memory manager integration tests.

use memvault_files::{FileMemoryManager, FilesError, MemoryFiles, MemoryLoad};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

/// Loading an absent memory yields a message instead of an error.
#[test]
fn missing_memory_loads_as_not_found() {
    let temp = tempdir().expect("tempdir");
    let manager = FileMemoryManager::new(temp.path().join("memory")).expect("manager");

    assert_eq!(
        manager.load("ghost").expect("load"),
        MemoryLoad::NotFound {
            message: "memory 'ghost' not found".to_string()
        }
    );
}

/// Saved memories survive a fresh manager over the same root.
#[test]
fn memories_persist_across_managers() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("memory");
    FileMemoryManager::new(&root)
        .expect("manager")
        .save("architecture", "# Decisions\n- use sqlite\n")
        .expect("save");

    let reopened = FileMemoryManager::new(&root).expect("reopen");
    assert_eq!(reopened.list().expect("list"), vec!["architecture"]);
    assert_eq!(
        reopened.load("architecture").expect("load").content(),
        Some("# Decisions\n- use sqlite\n")
    );
}

/// Deleting twice ends in the same state as deleting once.
#[test]
fn delete_is_idempotent() {
    let temp = tempdir().expect("tempdir");
    let manager = FileMemoryManager::new(temp.path()).expect("manager");
    manager.save("scratch", "tmp").expect("save");

    assert!(manager.delete("scratch").expect("first delete"));
    assert!(!manager.delete("scratch").expect("second delete"));
    assert!(manager.list().expect("list").is_empty());
}

/// A custom extension changes the on-disk file name.
#[test]
fn custom_extension_is_used_for_files() {
    let temp = tempdir().expect("tempdir");
    let manager = FileMemoryManager::with_extension(temp.path(), "txt").expect("manager");
    manager.save("log", "entry").expect("save");

    assert!(temp.path().join("log.txt").exists());
    assert_eq!(manager.list().expect("list"), vec!["log"]);
}

/// Path-like names are refused on every operation.
#[test]
fn path_like_names_are_refused() {
    let temp = tempdir().expect("tempdir");
    let manager = FileMemoryManager::new(temp.path()).expect("manager");

    assert!(matches!(
        manager.save("../escape", "x"),
        Err(FilesError::InvalidName(_))
    ));
    assert!(matches!(
        manager.load("C:\\proj\\file"),
        Err(FilesError::InvalidName(_))
    ));
    assert!(matches!(manager.delete(".."), Err(FilesError::InvalidName(_))));
}

/// Concurrent saves of one name all succeed and leave one intact file.
#[test]
fn concurrent_saves_of_one_name_succeed() {
    let temp = tempdir().expect("tempdir");
    let manager = Arc::new(FileMemoryManager::new(temp.path()).expect("manager"));

    let writers: Vec<_> = (0..4)
        .map(|writer| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for round in 0..100 {
                    manager
                        .save("notes", &format!("writer {writer} round {round}"))
                        .expect("concurrent save");
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer thread");
    }

    assert_eq!(manager.list().expect("list"), vec!["notes"]);
    let content = manager.load("notes").expect("load");
    assert!(
        content
            .content()
            .is_some_and(|text| text.starts_with("writer ") && text.ends_with(" round 99")),
        "unexpected content {content:?}"
    );
    assert_eq!(
        std::fs::read_dir(temp.path()).expect("read dir").count(),
        1,
        "temp files left behind"
    );
}
