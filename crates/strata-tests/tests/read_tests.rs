//! Read-path coverage: concatenated streams through the overlay surface,
//! seeking, and position reporting.

use std::io::{Read, Seek, SeekFrom};

use strata_disk::{Disk, ReadSettings, ReadStream};
use strata_tests::{append_file, read_file, write_file, TestBed};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("strata_overlay=debug")
        .with_test_writer()
        .try_init();
}

#[test]
fn test_seek_within_concatenated_file() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.base, "f", b"0123456789");
    append_file(&*bed.overlay, "f", b"abcdefghij");

    let mut stream = bed
        .overlay
        .read_file("f", ReadSettings::default(), None, None)
        .unwrap();
    assert_eq!(stream.len(), 20);

    stream.seek(SeekFrom::Start(8)).unwrap();
    let mut buf = [0u8; 4];
    stream.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"89ab");

    stream.seek(SeekFrom::End(-3)).unwrap();
    let mut tail = String::new();
    stream.read_to_string(&mut tail).unwrap();
    assert_eq!(tail, "hij");

    stream.seek(SeekFrom::Start(2)).unwrap();
    assert_eq!(stream.position().unwrap(), 2);
}

#[test]
fn test_read_base_only_and_diff_only() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.base, "base.txt", b"from base");
    write_file(&*bed.overlay, "diff.txt", b"from diff");

    assert_eq!(read_file(&*bed.overlay, "base.txt"), b"from base");
    assert_eq!(read_file(&*bed.overlay, "diff.txt"), b"from diff");
}

#[test]
fn test_read_aliased_file_after_move() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.base, "orig", b"aliased content");
    bed.overlay.move_file("orig", "moved").unwrap();

    let mut stream = bed
        .overlay
        .read_file("moved", ReadSettings::default(), None, None)
        .unwrap();
    assert_eq!(stream.len(), 15);
    let mut out = String::new();
    stream.read_to_string(&mut out).unwrap();
    assert_eq!(out, "aliased content");
}

#[test]
fn test_append_to_moved_alias_then_read() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.base, "orig", b"head");
    bed.overlay.move_file("orig", "moved").unwrap();
    append_file(&*bed.overlay, "moved", b"+tail");

    assert_eq!(read_file(&*bed.overlay, "moved"), b"head+tail");
    assert_eq!(bed.overlay.file_size("moved").unwrap(), 9);
}

#[test]
fn test_read_missing_file() {
    init_tracing();
    let bed = TestBed::new();

    assert!(bed
        .overlay
        .read_file("ghost", ReadSettings::default(), None, None)
        .is_err());
}

#[test]
fn test_size_tracks_appends() {
    init_tracing();
    let bed = TestBed::new();

    write_file(&*bed.base, "f", b"xx");
    assert_eq!(bed.overlay.file_size("f").unwrap(), 2);

    append_file(&*bed.overlay, "f", b"yyy");
    assert_eq!(bed.overlay.file_size("f").unwrap(), 5);

    write_file(&*bed.overlay, "f", b"z");
    assert_eq!(bed.overlay.file_size("f").unwrap(), 1);
}
