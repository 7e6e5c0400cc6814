use std::fs;

use lector_engine::{ensure_destination_dir, SequentialTextWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_destination_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_destination_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn rejects_a_destination_that_is_a_file() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();
    assert!(ensure_destination_dir(&file_path).is_err());
}

#[test]
fn writes_sequential_files_without_clobbering() {
    let temp = TempDir::new().unwrap();
    let writer = SequentialTextWriter::new(temp.path().to_path_buf());

    let first = writer.write("scan", "hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "scan_001.txt");
    assert_eq!(fs::read_to_string(&first).unwrap(), "hello");

    let second = writer.write("scan", "world").unwrap();
    assert_eq!(second.file_name().unwrap(), "scan_002.txt");
    assert_eq!(fs::read_to_string(&second).unwrap(), "world");
    // The first result is untouched.
    assert_eq!(fs::read_to_string(&first).unwrap(), "hello");

    // A different stem starts its own sequence.
    let other = writer.write("photo", "img").unwrap();
    assert_eq!(other.file_name().unwrap(), "photo_001.txt");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = SequentialTextWriter::new(file_path.clone());
    let result = writer.write("scan", "data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("scan_001.txt").exists());
}
