/*!
 * Tests for subtitle track loading and saving
 */

use anyhow::Result;
use kanasub::errors::SubtitleError;
use kanasub::subtitle_processor::{self, AssStyle, Cue, TextEncoding, Track, TrackFormat};
use crate::common;

#[test]
fn test_load_withSrtFile_shouldReadCuesInOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;

    let track = Track::load(&path)?;
    assert_eq!(track.format, TrackFormat::Srt);
    assert_eq!(track.len(), 3);

    let timings: Vec<(u64, u64)> = track.cues.iter().map(|c| (c.start_time_ms, c.duration_ms)).collect();
    assert_eq!(timings, vec![(1000, 3000), (5000, 4500), (10000, 4250)]);
    assert_eq!(track.cues[1].text, "漢字\nテスト");
    Ok(())
}

#[test]
fn test_load_withAssFile_shouldStripOverridesAndKeepBreaks() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_ass(temp_dir.path(), "episode.ass")?;

    let track = Track::load(&path)?;
    assert_eq!(track.format, TrackFormat::Ass);
    assert_eq!(track.cues[0].text, "猫です");
    assert_eq!(track.cues[0].start_time_ms, 1000);
    assert_eq!(track.cues[0].duration_ms, 2500);
    assert_eq!(track.cues[1].text, "漢字\\Nテスト");
    Ok(())
}

#[test]
fn test_load_withMissingFile_shouldReportUnreadableTrack() {
    let result = Track::load("/nonexistent/episode.srt");
    assert!(matches!(result, Err(SubtitleError::UnreadableTrack { .. })));
}

#[test]
fn test_load_withGarbageContent_shouldReportUnreadableTrack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.srt", "not a subtitle at all")?;

    match Track::load(&path) {
        Err(SubtitleError::UnreadableTrack { path: failed, .. }) => assert_eq!(failed, path),
        other => panic!("Expected UnreadableTrack, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_load_withUnknownExtension_shouldSniffFormat() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "episode.txt", common::SAMPLE_ASS)?;

    let track = Track::load(&path)?;
    assert_eq!(track.format, TrackFormat::Ass);
    Ok(())
}

#[test]
fn test_parse_srt_string_withInvalidEntries_shouldSkipThem() -> Result<()> {
    let content = "1\n00:00:05,000 --> 00:00:04,000\n逆\n\n2\n00:00:06,000 --> 00:00:07,000\n正\n";
    let cues = Track::parse_srt_string(content)?;
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].text, "正");
    assert_eq!(cues[0].index, 1);
    Ok(())
}

#[test]
fn test_save_withAssExtension_shouldPreserveTiming() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    let output = temp_dir.path().join("out").join("episode.ass");

    let track = Track::load(&input)?;
    track.save(&output, TextEncoding::Utf8, &AssStyle::default())?;

    let reloaded = Track::load(&output)?;
    assert_eq!(reloaded.format, TrackFormat::Ass);
    for (before, after) in track.cues.iter().zip(&reloaded.cues) {
        assert_eq!(before.start_time_ms, after.start_time_ms);
        assert_eq!(before.duration_ms, after.duration_ms);
    }
    // Multi-line SRT text becomes a single dialogue line
    assert_eq!(reloaded.cues[1].text, "漢字\\Nテスト");
    Ok(())
}

#[test]
fn test_save_withMillisecondTiming_shouldTruncateOnlyInAss() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut track = Track::new(temp_dir.path().join("timing.srt"), TrackFormat::Srt);
    track.cues.push(Cue::new(1, 1_234, 2_345, "猫"));

    let srt = temp_dir.path().join("timing_out.srt");
    track.save(&srt, TextEncoding::Utf8, &AssStyle::default())?;
    let from_srt = Track::load(&srt)?;
    assert_eq!(from_srt.cues[0].start_time_ms, 1_234);
    assert_eq!(from_srt.cues[0].duration_ms, 2_345);

    let ass = temp_dir.path().join("timing_out.ass");
    track.save(&ass, TextEncoding::Utf8, &AssStyle::default())?;
    let from_ass = Track::load(&ass)?;
    assert_eq!(from_ass.cues[0].start_time_ms, 1_230);
    assert_eq!(from_ass.cues[0].duration_ms, 2_340);
    assert_eq!(Cue::format_ass_timestamp(3_579), "0:00:03.57");
    Ok(())
}

#[test]
fn test_save_withUtf16Be_shouldWriteBomAndReload() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    let output = temp_dir.path().join("episode_utf16.srt");

    let track = Track::load(&input)?;
    track.save(&output, TextEncoding::Utf16Be, &AssStyle::default())?;

    let bytes = std::fs::read(&output)?;
    assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
    let reloaded = Track::load(&output)?;
    assert_eq!(reloaded.cues, track.cues);
    Ok(())
}

#[test]
fn test_to_ass_string_withStyle_shouldWriteDefaultStyle() {
    let mut track = Track::new("episode.srt".into(), TrackFormat::Srt);
    track.cues.push(Cue::new(1, 61_230, 2_000, "猫"));
    let style = AssStyle { font_name: "IPAGothic".to_string(), font_size: 24 };

    let script = track.to_ass_string(&style);
    assert!(script.contains("Style: Default,IPAGothic,24,"));
    assert!(script.contains("Dialogue: 0,0:01:01.23,0:01:03.23,Default,,0,0,0,,猫"));
}

#[test]
fn test_to_srt_string_withCues_shouldRenumber() {
    let mut track = Track::new("episode.srt".into(), TrackFormat::Srt);
    track.cues.push(Cue::new(7, 1_000, 500, "一"));
    track.cues.push(Cue::new(9, 2_000, 500, "二"));

    let srt = track.to_srt_string();
    assert!(srt.starts_with("1\n00:00:01,000 --> 00:00:01,500\n一\n"));
    assert!(srt.contains("2\n00:00:02,000 --> 00:00:02,500\n二\n"));
}

#[test]
fn test_parse_ass_timestamp_withValidAndInvalidInput() {
    assert_eq!(Cue::parse_ass_timestamp("0:01:02.34").unwrap(), 62_340);
    assert_eq!(Cue::parse_ass_timestamp("1:00:00.00").unwrap(), 3_600_000);
    assert!(Cue::parse_ass_timestamp("0:61:00.00").is_err());
    assert!(Cue::parse_ass_timestamp("nonsense").is_err());
}

#[test]
fn test_text_encoding_withNames_shouldParseAndSerialize() {
    assert_eq!("UTF-16LE".parse::<TextEncoding>().unwrap(), TextEncoding::Utf16Le);
    assert_eq!("utf8_bom".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8Bom);
    assert!("latin1".parse::<TextEncoding>().is_err());
    assert_eq!(serde_json::to_string(&TextEncoding::Utf16Be).unwrap(), "\"utf-16be\"");
    assert_eq!(TextEncoding::Utf8.to_string(), "utf-8");
}

#[test]
fn test_text_encoding_decode_withUtf8Bom_shouldStripBom() {
    let bytes = TextEncoding::Utf8Bom.encode("猫");
    assert_eq!(TextEncoding::detect(&bytes), Some(TextEncoding::Utf8Bom));
    assert_eq!(TextEncoding::decode(&bytes).unwrap(), "猫");
}

#[test]
fn test_sniff_format_withEachFormat() {
    assert_eq!(subtitle_processor::sniff_format(common::SAMPLE_SRT), Some(TrackFormat::Srt));
    assert_eq!(subtitle_processor::sniff_format(common::SAMPLE_ASS), Some(TrackFormat::Ass));
    assert_eq!(subtitle_processor::sniff_format("[Script Info]\n[Events]\n"), Some(TrackFormat::Ssa));
    assert_eq!(subtitle_processor::sniff_format("hello"), None);
}
