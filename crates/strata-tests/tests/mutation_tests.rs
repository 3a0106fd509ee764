//! Mutation-engine coverage: rewrites, replaces, hard links, recursive
//! removal and the error contract.

use std::time::{Duration, SystemTime};

use strata_core::DiskError;
use strata_disk::{Disk, WriteMode};
use strata_tests::{append_file, read_file, sorted_list, write_file, TestBed};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("strata_overlay=debug")
        .with_test_writer()
        .try_init();
}

#[test]
fn test_rewrite_replaces_base_content() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.base, "f", b"original");
    write_file(&*bed.overlay, "f", b"new");

    assert_eq!(read_file(&*bed.overlay, "f"), b"new");
    assert_eq!(bed.overlay.file_size("f").unwrap(), 3);
    assert!(bed.overlay.is_tracked("f").unwrap());
    assert_eq!(read_file(&*bed.base, "f"), b"original");
}

#[test]
fn test_rewrite_after_append_discards_base_portion() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.base, "f", b"hello");
    append_file(&*bed.overlay, "f", b"_world");
    assert_eq!(read_file(&*bed.overlay, "f"), b"hello_world");

    write_file(&*bed.overlay, "f", b"fresh");
    assert_eq!(read_file(&*bed.overlay, "f"), b"fresh");
    assert_eq!(bed.overlay.file_size("f").unwrap(), 5);
}

#[test]
fn test_append_does_not_track() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.base, "f", b"abc");
    append_file(&*bed.overlay, "f", b"def");

    // The diff holds only a suffix; the base copy must stay visible.
    assert!(!bed.overlay.is_tracked("f").unwrap());
    assert_eq!(read_file(&*bed.overlay, "f"), b"abcdef");
}

#[test]
fn test_move_appended_file_keeps_both_parts() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.base, "f", b"base");
    append_file(&*bed.overlay, "f", b"+diff");

    bed.overlay.move_file("f", "g").unwrap();
    assert!(!bed.overlay.exists("f").unwrap());
    assert_eq!(read_file(&*bed.overlay, "g"), b"base+diff");
    assert_eq!(bed.overlay.file_size("g").unwrap(), 9);
}

#[test]
fn test_move_chain_collapses_alias() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.base, "a", b"payload");
    bed.overlay.move_file("a", "b").unwrap();
    bed.overlay.move_file("b", "c").unwrap();

    assert_eq!(sorted_list(&*bed.overlay, ""), vec!["c"]);
    assert_eq!(read_file(&*bed.overlay, "c"), b"payload");
    assert!(!bed.overlay.exists("a").unwrap());
    assert!(!bed.overlay.exists("b").unwrap());
}

#[test]
fn test_replace_file() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.base, "old", b"old-content");
    write_file(&*bed.overlay, "new", b"new-content");

    bed.overlay.replace_file("new", "old").unwrap();
    assert_eq!(read_file(&*bed.overlay, "old"), b"new-content");
    assert!(!bed.overlay.exists("new").unwrap());
    assert_eq!(read_file(&*bed.base, "old"), b"old-content");
}

#[test]
fn test_hard_link_to_base_only_file() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.base, "src", b"shared");
    bed.overlay.create_hard_link("src", "dst").unwrap();

    assert_eq!(read_file(&*bed.overlay, "dst"), b"shared");
    assert_eq!(sorted_list(&*bed.overlay, ""), vec!["dst", "src"]);
    assert!(bed.overlay.is_tracked("dst").unwrap());
}

#[test]
fn test_hard_link_to_diff_file_shares_writes() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.overlay, "src", b"v1");
    bed.overlay.create_hard_link("src", "dst").unwrap();

    append_file(&*bed.overlay, "src", b"+more");
    assert_eq!(read_file(&*bed.overlay, "dst"), b"v1+more");
}

#[test]
fn test_clear_directory_spans_both_disks() {
    init_tracing();
    let bed = TestBed::new();

    bed.base.create_directory("d").unwrap();
    bed.base.create_file("d/base.txt").unwrap();
    bed.overlay.create_file("d/diff.txt").unwrap();

    bed.overlay.clear_directory("d").unwrap();
    assert!(bed.overlay.exists("d").unwrap());
    assert_eq!(sorted_list(&*bed.overlay, "d"), Vec::<String>::new());
    assert!(bed.base.exists("d/base.txt").unwrap());
}

#[test]
fn test_remove_recursive_mixed_tree() {
    init_tracing();
    let bed = TestBed::new();

    bed.base.create_directory("tree").unwrap();
    bed.base.create_directory("tree/sub").unwrap();
    bed.base.create_file("tree/sub/deep.txt").unwrap();
    bed.overlay.create_file("tree/added.txt").unwrap();

    bed.overlay.remove_recursive("tree").unwrap();
    assert!(!bed.overlay.exists("tree").unwrap());
    assert!(!bed.overlay.exists("tree/sub/deep.txt").unwrap());
    assert!(bed.base.exists("tree/sub/deep.txt").unwrap());
}

#[test]
fn test_remove_directory_requires_empty() {
    init_tracing();
    let bed = TestBed::new();

    bed.base.create_directory("d").unwrap();
    bed.base.create_file("d/f").unwrap();

    assert!(matches!(
        bed.overlay.remove_directory("d"),
        Err(DiskError::DirectoryNotEmpty(_))
    ));

    bed.overlay.remove_file("d/f").unwrap();
    bed.overlay.remove_directory("d").unwrap();
    assert!(!bed.overlay.exists("d").unwrap());
}

#[test]
fn test_create_directories_through_tombstoned_chain() {
    init_tracing();
    let bed = TestBed::new();

    bed.base.create_directory("a").unwrap();
    bed.base.create_directory("a/b").unwrap();
    bed.overlay.remove_recursive("a").unwrap();

    bed.overlay.create_directories("a/b/c").unwrap();
    assert!(bed.overlay.is_directory("a/b/c").unwrap());
    assert!(bed.overlay.exists("a/b").unwrap());
}

#[test]
fn test_create_errors() {
    init_tracing();
    let bed = TestBed::new();

    bed.base.create_file("f").unwrap();
    assert!(matches!(
        bed.overlay.create_file("f"),
        Err(DiskError::AlreadyExists(_))
    ));
    assert!(matches!(
        bed.overlay.create_file("missing-dir/f"),
        Err(DiskError::NotFound(_))
    ));
    assert!(matches!(
        bed.overlay.remove_file("ghost"),
        Err(DiskError::NotFound(_))
    ));
    assert!(matches!(
        bed.overlay.remove_file("f").and(bed.overlay.remove_file("f")),
        Err(DiskError::NotFound(_))
    ));
    bed.overlay.remove_file_if_exists("f").unwrap();
}

#[test]
fn test_remove_file_rejects_directory() {
    init_tracing();
    let bed = TestBed::new();

    bed.base.create_directory("d").unwrap();
    assert!(matches!(
        bed.overlay.remove_file("d"),
        Err(DiskError::IsADirectory(_))
    ));
}

#[test]
fn test_blob_operations_unsupported() {
    init_tracing();
    let bed = TestBed::new();

    bed.base.create_file("f").unwrap();
    assert!(matches!(
        bed.overlay.blob_path("f"),
        Err(DiskError::Unsupported(_))
    ));
    assert!(matches!(
        bed.overlay
            .write_file_using_blob_function("f", WriteMode::Rewrite, &mut |_| Ok(())),
        Err(DiskError::Unsupported(_))
    ));
}

#[test]
fn test_set_last_modified_on_base_only_file() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.base, "f", b"content");
    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);

    bed.overlay.set_last_modified("f", stamp).unwrap();
    assert_eq!(bed.overlay.get_last_modified("f").unwrap(), stamp);

    // Stamping materialized an empty suffix, nothing more.
    assert_eq!(read_file(&*bed.overlay, "f"), b"content");
    assert_eq!(bed.overlay.file_size("f").unwrap(), 7);
}
