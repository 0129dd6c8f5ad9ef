// maskcut-core/tests/discovery_tests.rs

use std::fs::{self, File};
use std::path::PathBuf;

use maskcut_core::config::CoreConfig;
use maskcut_core::discovery::find_processable_files;
use maskcut_core::error::CoreError;
use tempfile::tempdir;

fn extensions() -> Vec<String> {
    CoreConfig::default().video_extensions
}

#[test]
fn finds_supported_extensions_case_insensitively() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input_dir = dir.path();

    File::create(input_dir.join("match1.mp4"))?;
    File::create(input_dir.join("match2.MOV"))?;
    File::create(input_dir.join("notes.txt"))?;
    File::create(input_dir.join("poster.jpg"))?;
    fs::create_dir(input_dir.join("subdir"))?;
    File::create(input_dir.join("subdir").join("nested.mp4"))?; // top level only

    let mut files = find_processable_files(input_dir, &extensions())?;
    files.sort();

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].file_name().unwrap(), "match1.mp4");
    assert_eq!(files[1].file_name().unwrap(), "match2.MOV");

    dir.close()?;
    Ok(())
}

#[test]
fn results_are_sorted_by_name() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    File::create(dir.path().join("b.mkv"))?;
    File::create(dir.path().join("a.avi"))?;
    File::create(dir.path().join("c.mp4"))?;

    let files = find_processable_files(dir.path(), &extensions())?;
    let names: Vec<_> = files
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.avi", "b.mkv", "c.mp4"]);

    dir.close()?;
    Ok(())
}

#[test]
fn empty_directory_reports_no_files_found() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    File::create(dir.path().join("notes.txt"))?;

    let result = find_processable_files(dir.path(), &extensions());
    match result {
        Err(CoreError::NoFilesFound) => {}
        other => panic!("unexpected result: {other:?}"),
    }

    dir.close()?;
    Ok(())
}

#[test]
fn nonexistent_directory_is_an_io_error() {
    let missing = PathBuf::from("surely_this_does_not_exist_42_integration");
    let result = find_processable_files(&missing, &extensions());
    match result {
        Err(CoreError::Io(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn custom_extension_list_is_honored() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    File::create(dir.path().join("clip.webm"))?;
    File::create(dir.path().join("clip.mp4"))?;

    let files = find_processable_files(dir.path(), &["webm".to_string()])?;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name().unwrap(), "clip.webm");

    dir.close()?;
    Ok(())
}
