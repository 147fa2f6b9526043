use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::anyhow;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;

// @module: Subtitle track loading and saving (SRT, SSA, ASS)

// @const: SRT timestamp regex
static SRT_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2,}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

// @const: SSA/ASS timestamp regex (H:MM:SS.cc)
static ASS_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2})[.,](\d{2,3})$").unwrap()
});

// @const: SSA/ASS override block, e.g. {\i1}
static OVERRIDE_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^}]*\}").unwrap()
});

// @const: Event columns assumed when an [Events] section has no Format line
const DEFAULT_EVENT_FORMAT: &[&str] = &[
    "Layer", "Start", "End", "Style", "Name", "MarginL", "MarginR", "MarginV", "Effect", "Text",
];

// @struct: Single timed cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    // @field: Position in the owning track, 1-based
    pub index: usize,
    
    // @field: Start time in ms
    pub start_time_ms: u64,
    
    // @field: Duration in ms
    pub duration_ms: u64,
    
    // @field: Cue text, lines separated by \N or newline
    pub text: String,
}

impl Cue {
    pub fn new(index: usize, start_time_ms: u64, duration_ms: u64, text: impl Into<String>) -> Self {
        Cue {
            index,
            start_time_ms,
            duration_ms,
            text: text.into(),
        }
    }
    
    /// Same cue with its text replaced; timing is kept as is
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Cue {
            text: text.into(),
            ..self.clone()
        }
    }
    
    pub fn end_time_ms(&self) -> u64 {
        self.start_time_ms + self.duration_ms
    }
    
    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_srt_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;
        
        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
    
    /// Format a timestamp in milliseconds to SSA/ASS format (H:MM:SS.cc).
    /// The format only has centiseconds, so the last millisecond digit is
    /// truncated, never rounded.
    pub fn format_ass_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let centis = (ms % 1_000) / 10;
        
        format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
    }
    
    /// Parse an SSA/ASS timestamp to milliseconds
    pub fn parse_ass_timestamp(timestamp: &str) -> anyhow::Result<u64> {
        let caps = ASS_TIMESTAMP_REGEX.captures(timestamp.trim())
            .ok_or_else(|| anyhow!("Invalid timestamp format: {}", timestamp))?;
        
        let hours: u64 = caps[1].parse()?;
        let minutes: u64 = caps[2].parse()?;
        let seconds: u64 = caps[3].parse()?;
        let fraction = &caps[4];
        let millis: u64 = if fraction.len() == 2 { fraction.parse::<u64>()? * 10 } else { fraction.parse()? };
        
        if minutes >= 60 || seconds >= 60 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }
        
        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", Self::format_srt_timestamp(self.start_time_ms), Self::format_srt_timestamp(self.end_time_ms()))?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// On-disk subtitle format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFormat {
    Srt,
    Ssa,
    Ass,
}

impl TrackFormat {
    /// Format for a file extension (case-insensitive, without the dot)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "srt" => Some(Self::Srt),
            "ssa" => Some(Self::Ssa),
            "ass" => Some(Self::Ass),
            _ => None,
        }
    }
    
    /// Format for a path, from its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
    
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Ssa => "ssa",
            Self::Ass => "ass",
        }
    }
}

/// Text encoding used when writing a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-8-bom")]
    Utf8Bom,
    #[serde(rename = "utf-16le")]
    Utf16Le,
    #[serde(rename = "utf-16be")]
    Utf16Be,
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

impl TextEncoding {
    /// Encode text; UTF-16 output always starts with a byte order mark
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf8Bom => [UTF8_BOM, text.as_bytes()].concat(),
            Self::Utf16Le => {
                let mut bytes = UTF16LE_BOM.to_vec();
                bytes.extend(text.encode_utf16().flat_map(|unit| unit.to_le_bytes()));
                bytes
            },
            Self::Utf16Be => {
                let mut bytes = UTF16BE_BOM.to_vec();
                bytes.extend(text.encode_utf16().flat_map(|unit| unit.to_be_bytes()));
                bytes
            },
        }
    }
    
    /// Encoding announced by a byte order mark, if any
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(UTF8_BOM) {
            Some(Self::Utf8Bom)
        } else if bytes.starts_with(UTF16LE_BOM) {
            Some(Self::Utf16Le)
        } else if bytes.starts_with(UTF16BE_BOM) {
            Some(Self::Utf16Be)
        } else {
            None
        }
    }
    
    /// Decode file content, honoring a byte order mark and assuming UTF-8 otherwise
    pub fn decode(bytes: &[u8]) -> anyhow::Result<String> {
        match Self::detect(bytes) {
            Some(Self::Utf8Bom) => Ok(String::from_utf8(bytes[UTF8_BOM.len()..].to_vec())?),
            Some(Self::Utf16Le) => decode_utf16(&bytes[UTF16LE_BOM.len()..], u16::from_le_bytes),
            Some(Self::Utf16Be) => decode_utf16(&bytes[UTF16BE_BOM.len()..], u16::from_be_bytes),
            _ => Ok(String::from_utf8(bytes.to_vec())?),
        }
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> anyhow::Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(anyhow!("Truncated UTF-16 content ({} bytes)", bytes.len()));
    }
    let units: Vec<u16> = bytes.chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16(&units)?)
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Bom => "utf-8-bom",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TextEncoding {
    type Err = anyhow::Error;
    
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "utf-8-bom" | "utf8-bom" => Ok(Self::Utf8Bom),
            "utf-16le" | "utf16le" => Ok(Self::Utf16Le),
            "utf-16be" | "utf16be" => Ok(Self::Utf16Be),
            _ => Err(anyhow!("Unsupported text encoding: {}", s)),
        }
    }
}

/// Default style written to SSA/ASS output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssStyle {
    pub font_name: String,
    pub font_size: u32,
}

impl Default for AssStyle {
    fn default() -> Self {
        Self {
            font_name: "Noto Sans JP".to_string(),
            font_size: 20,
        }
    }
}

/// Ordered collection of cues with the file they came from
#[derive(Debug, Clone)]
pub struct Track {
    /// Source filename
    pub source_file: PathBuf,
    
    /// Format the track was read as
    pub format: TrackFormat,
    
    /// Cues in file order
    pub cues: Vec<Cue>,
}

impl Track {
    /// Create an empty track
    pub fn new(source_file: PathBuf, format: TrackFormat) -> Self {
        Track {
            source_file,
            format,
            cues: Vec::new(),
        }
    }
    
    pub fn len(&self) -> usize {
        self.cues.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
    
    /// Load a track from disk. Any failure is reported as an unreadable track.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let unreadable = |reason: String| SubtitleError::UnreadableTrack {
            path: path.to_path_buf(),
            reason,
        };
        
        let bytes = fs::read(path).map_err(|e| unreadable(e.to_string()))?;
        let content = TextEncoding::decode(&bytes).map_err(|e| unreadable(e.to_string()))?;
        let format = TrackFormat::from_path(path)
            .or_else(|| sniff_format(&content))
            .ok_or_else(|| unreadable("unknown subtitle format".to_string()))?;
        
        let cues = Self::parse_str(&content, format).map_err(|e| unreadable(e.to_string()))?;
        debug!("Loaded {} cues from {:?} as {:?}", cues.len(), path, format);
        
        Ok(Track {
            source_file: path.to_path_buf(),
            format,
            cues,
        })
    }
    
    /// Parse content in the given format
    pub fn parse_str(content: &str, format: TrackFormat) -> Result<Vec<Cue>, SubtitleError> {
        match format {
            TrackFormat::Srt => Self::parse_srt_string(content),
            TrackFormat::Ssa | TrackFormat::Ass => Self::parse_ssa_string(content),
        }
    }
    
    /// Parse SRT content into cues, keeping file order
    pub fn parse_srt_string(content: &str) -> Result<Vec<Cue>, SubtitleError> {
        let mut cues = Vec::new();
        
        // State variables for parsing
        let mut current_seq_num: Option<usize> = None;
        let mut current_times: Option<(u64, u64)> = None;
        let mut current_text = String::new();
        
        let mut finish_entry = |seq_num: usize, (start_ms, end_ms): (u64, u64), text: &str| {
            if end_ms < start_ms {
                warn!("Skipping subtitle entry {}: end time {} < start time {}", seq_num, end_ms, start_ms);
            } else if text.trim().is_empty() {
                warn!("Skipping empty subtitle entry {}", seq_num);
            } else {
                let index = cues.len() + 1;
                cues.push(Cue::new(index, start_ms, end_ms - start_ms, text.trim()));
            }
        };
        
        for (line_index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            
            // Blank lines end the current entry
            if trimmed.is_empty() {
                if let (Some(seq_num), Some(times)) = (current_seq_num, current_times) {
                    if !current_text.is_empty() {
                        finish_entry(seq_num, times, &current_text);
                        current_seq_num = None;
                        current_times = None;
                        current_text.clear();
                    }
                }
                continue;
            }
            
            // Sequence number (only when starting a new entry)
            if current_seq_num.is_none() && current_text.is_empty() {
                if let Ok(num) = trimmed.parse::<usize>() {
                    current_seq_num = Some(num);
                    continue;
                }
            }
            
            if current_seq_num.is_some() && current_times.is_none() {
                if let Some(caps) = SRT_TIMESTAMP_REGEX.captures(trimmed) {
                    current_times = Some((srt_capture_ms(&caps, 1), srt_capture_ms(&caps, 5)));
                    continue;
                }
            }
            
            if current_seq_num.is_some() && current_times.is_some() {
                if !current_text.is_empty() {
                    current_text.push('\n');
                }
                current_text.push_str(trimmed);
            } else {
                warn!("Unexpected text at line {} before sequence number or timestamp: {}", line_index + 1, trimmed);
            }
        }
        
        if let (Some(seq_num), Some(times)) = (current_seq_num, current_times) {
            if !current_text.is_empty() {
                finish_entry(seq_num, times, &current_text);
            }
        }
        
        if cues.is_empty() {
            return Err(SubtitleError::Parse {
                line: 0,
                message: "No valid subtitle entries were found in the SRT content".to_string(),
            });
        }
        
        Ok(cues)
    }
    
    /// Parse the [Events] section of SSA/ASS content into cues.
    /// Override blocks are stripped; `\N` and `\n` break markers are kept.
    pub fn parse_ssa_string(content: &str) -> Result<Vec<Cue>, SubtitleError> {
        let mut cues = Vec::new();
        let mut in_events = false;
        let mut format: Vec<String> = DEFAULT_EVENT_FORMAT.iter().map(|s| s.to_string()).collect();
        
        for (line_index, line) in content.lines().enumerate() {
            let line_number = line_index + 1;
            let trimmed = line.trim();
            
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                in_events = trimmed.eq_ignore_ascii_case("[events]");
                continue;
            }
            if !in_events {
                continue;
            }
            
            if let Some(columns) = trimmed.strip_prefix("Format:") {
                format = columns.split(',').map(|c| c.trim().to_string()).collect();
                continue;
            }
            
            let Some(fields) = trimmed.strip_prefix("Dialogue:") else {
                continue;
            };
            
            let column = |name: &str| format.iter().position(|c| c.eq_ignore_ascii_case(name));
            let (Some(start_col), Some(end_col), Some(text_col)) = (column("Start"), column("End"), column("Text")) else {
                return Err(SubtitleError::Parse {
                    line: line_number,
                    message: "Event format lacks Start, End or Text".to_string(),
                });
            };
            
            // Text is the last column and may itself contain commas
            let values: Vec<&str> = fields.trim_start().splitn(format.len(), ',').collect();
            if values.len() != format.len() {
                warn!("Skipping malformed dialogue at line {}: {}", line_number, trimmed);
                continue;
            }
            
            let times = Cue::parse_ass_timestamp(values[start_col])
                .and_then(|start| Ok((start, Cue::parse_ass_timestamp(values[end_col])?)));
            let (start_ms, end_ms) = match times {
                Ok(times) => times,
                Err(e) => {
                    warn!("Skipping dialogue at line {}: {}", line_number, e);
                    continue;
                }
            };
            
            let text = OVERRIDE_BLOCK_REGEX.replace_all(values[text_col], "");
            if end_ms < start_ms {
                warn!("Skipping dialogue at line {}: end time before start time", line_number);
            } else if text.trim().is_empty() {
                warn!("Skipping empty dialogue at line {}", line_number);
            } else {
                let index = cues.len() + 1;
                cues.push(Cue::new(index, start_ms, end_ms - start_ms, text.trim()));
            }
        }
        
        if cues.is_empty() {
            return Err(SubtitleError::Parse {
                line: 0,
                message: "No dialogue events were found in the SSA/ASS content".to_string(),
            });
        }
        
        Ok(cues)
    }
    
    /// Render as SRT
    pub fn to_srt_string(&self) -> String {
        self.cues.iter()
            .enumerate()
            .map(|(i, cue)| Cue { index: i + 1, ..cue.clone() }.to_string())
            .collect()
    }
    
    /// Render as an ASS (v4.00+) script with a single Default style
    pub fn to_ass_string(&self, style: &AssStyle) -> String {
        let mut script = String::new();
        script.push_str("[Script Info]\n");
        script.push_str("ScriptType: v4.00+\n");
        script.push_str("WrapStyle: 0\n");
        script.push_str("ScaledBorderAndShadow: yes\n");
        script.push_str("PlayResX: 384\n");
        script.push_str("PlayResY: 288\n\n");
        
        script.push_str("[V4+ Styles]\n");
        script.push_str("Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n");
        script.push_str(&format!(
            "Style: Default,{},{},&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,2,2,10,10,10,1\n\n",
            style.font_name, style.font_size
        ));
        
        script.push_str("[Events]\n");
        script.push_str(&format!("Format: {}\n", DEFAULT_EVENT_FORMAT.join(", ")));
        for cue in &self.cues {
            // A dialogue event is a single physical line
            let text = cue.text.replace("\r\n", "\n").replace('\n', "\\N");
            script.push_str(&format!(
                "Dialogue: 0,{},{},Default,,0,0,0,,{}\n",
                Cue::format_ass_timestamp(cue.start_time_ms),
                Cue::format_ass_timestamp(cue.end_time_ms()),
                text
            ));
        }
        script
    }
    
    /// Render in `format`
    pub fn render(&self, format: TrackFormat, style: &AssStyle) -> String {
        match format {
            TrackFormat::Srt => self.to_srt_string(),
            TrackFormat::Ssa | TrackFormat::Ass => self.to_ass_string(style),
        }
    }
    
    /// Write the track; the format follows the extension of `path`, falling
    /// back to the format the track was loaded as.
    ///
    /// Timing is millisecond exact in memory and in SRT output. SSA/ASS
    /// output truncates start and end to centiseconds, so a track saved as
    /// ASS and loaded again may start up to 9 ms earlier.
    pub fn save<P: AsRef<Path>>(&self, path: P, encoding: TextEncoding, style: &AssStyle) -> Result<(), SubtitleError> {
        let path = path.as_ref();
        let format = TrackFormat::from_path(path).unwrap_or(self.format);
        
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        
        fs::write(path, encoding.encode(&self.render(format, style)))?;
        debug!("Wrote {} cues to {:?} ({:?}, {})", self.cues.len(), path, format, encoding);
        Ok(())
    }
}

/// Milliseconds of the SRT timestamp whose hour group is `start_idx`
fn srt_capture_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
    let part = |offset: usize| caps[start_idx + offset].parse::<u64>().unwrap_or(0);
    part(0) * 3_600_000 + part(1) * 60_000 + part(2) * 1_000 + part(3)
}

/// Guess the format of content from a file without a known extension
pub fn sniff_format(content: &str) -> Option<TrackFormat> {
    let head = content.trim_start_matches('\u{feff}').trim_start();
    if head.starts_with("[Script Info]") {
        if head.contains("[V4+ Styles]") {
            Some(TrackFormat::Ass)
        } else {
            Some(TrackFormat::Ssa)
        }
    } else if SRT_TIMESTAMP_REGEX.is_match(content) {
        Some(TrackFormat::Srt)
    } else {
        None
    }
}
