/*!
 * Tests for file utilities
 */

use anyhow::Result;
use std::path::PathBuf;
use kanasub::file_utils::{FileManager, FileType};
use kanasub::subtitle_processor::TrackFormat;
use crate::common;

#[test]
fn test_generate_markup_output_path_withInputExtension_shouldKeepIt() {
    let path = FileManager::generate_markup_output_path("/videos/ep 1.ass", None, 1_700_000_000);
    assert_eq!(path, PathBuf::from("/videos/ep 1_markup_1700000000.ass"));
}

#[test]
fn test_generate_markup_output_path_withExtensionOverride_shouldUseIt() {
    let path = FileManager::generate_markup_output_path("/videos/ep1.srt", Some(".ass"), 42);
    assert_eq!(path, PathBuf::from("/videos/ep1_markup_42.ass"));
}

#[test]
fn test_is_generated_markup_withGeneratedName_shouldBeTrue() {
    assert!(FileManager::is_generated_markup("/videos/ep1_markup_42.ass"));
    assert!(!FileManager::is_generated_markup("/videos/ep1.ass"));
}

#[test]
fn test_find_subtitle_files_withMixedDirectory_shouldSkipOutputAndOtherFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "b.ass", common::SAMPLE_ASS)?;
    common::create_test_file(root, "a.srt", common::SAMPLE_SRT)?;
    common::create_test_file(root, "a_markup_1.srt", common::SAMPLE_SRT)?;
    common::create_test_file(root, "notes.txt", "hello")?;
    FileManager::ensure_dir(root.join("season2"))?;
    common::create_test_file(&root.join("season2"), "c.ssa", common::SAMPLE_ASS)?;

    let found = FileManager::find_subtitle_files(root)?;
    let names: Vec<String> = found
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.srt", "b.ass", "c.ssa"]);
    Ok(())
}

#[test]
fn test_detect_file_type_withExtensionAndContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let ass = common::create_test_ass(temp_dir.path(), "episode.ass")?;
    let sniffed = common::create_test_file(temp_dir.path(), "episode.sub", common::SAMPLE_SRT)?;
    let text = common::create_test_file(temp_dir.path(), "notes.txt", "just some notes")?;

    assert_eq!(FileManager::detect_file_type(&ass)?, FileType::Subtitle(TrackFormat::Ass));
    assert_eq!(FileManager::detect_file_type(&sniffed)?, FileType::Subtitle(TrackFormat::Srt));
    assert_eq!(FileManager::detect_file_type(&text)?, FileType::Unknown);
    assert!(FileManager::detect_file_type(temp_dir.path().join("missing.srt")).is_err());
    Ok(())
}

#[test]
fn test_ensure_dir_withNestedPath_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;
    assert!(FileManager::dir_exists(&nested));
    assert!(!FileManager::file_exists(&nested));
    Ok(())
}
