use anyhow::{Result, Context, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::subtitle_processor::{self, TrackFormat, TextEncoding};

// @module: File and directory utilities

// @const: Marker inserted in generated file names
pub const MARKUP_SUFFIX: &str = "_markup_";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }
    
    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }
    
    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }
    
    // @generates: Output path next to the input, `<stem>_markup_<timestamp>.<ext>`
    // @params: input_file, extension override, unix timestamp
    pub fn generate_markup_output_path<P: AsRef<Path>>(
        input_file: P,
        extension: Option<&str>,
        timestamp: i64,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        let extension = extension
            .map(|ext| ext.trim_start_matches('.').to_string())
            .or_else(|| input_file.extension().map(|ext| ext.to_string_lossy().to_string()))
            .unwrap_or_else(|| TrackFormat::Ass.extension().to_string());
        
        let output_filename = format!("{}{}{}.{}", stem, MARKUP_SUFFIX, timestamp, extension);
        match input_file.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        }
    }
    
    /// Whether a file name looks like one this tool generated
    pub fn is_generated_markup<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .file_stem()
            .is_some_and(|stem| stem.to_string_lossy().contains(MARKUP_SUFFIX))
    }
    
    /// Find subtitle files below `dir`, skipping previously generated output
    pub fn find_subtitle_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        
        for entry in WalkDir::new(dir.as_ref()).follow_links(true).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            
            if path.is_file() && TrackFormat::from_path(path).is_some() && !Self::is_generated_markup(path) {
                result.push(path.to_path_buf());
            }
        }
        
        Ok(result)
    }

    /// Detect whether a file is a subtitle track, by extension and then by content
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();
        
        if !path.exists() {
            return Err(anyhow!("File does not exist: {:?}", path));
        }
        
        if let Some(format) = TrackFormat::from_path(path) {
            return Ok(FileType::Subtitle(format));
        }
        
        // Fall back to examining file contents
        if let Ok(bytes) = fs::read(path) {
            if let Ok(content) = TextEncoding::decode(&bytes) {
                if let Some(format) = subtitle_processor::sniff_format(&content) {
                    return Ok(FileType::Subtitle(format));
                }
            }
        }
        
        Ok(FileType::Unknown)
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Subtitle track in a supported format
    Subtitle(TrackFormat),
    /// Unknown file type
    Unknown,
}
