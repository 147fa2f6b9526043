/*!
 * End-to-end tests: load a subtitle file, mark it up and write it back
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;
use kanasub::app_config::{Config, TranslationProvider};
use kanasub::app_controller::{Controller, Progress};
use kanasub::subtitle_processor::{TextEncoding, Track, TrackFormat};
use kanasub::translation::Translator;
use crate::common::{self, mock_collaborators::{MockTranslator, ScriptedRetryPrompt}};

fn full_markup_config() -> Config {
    let mut config = Config::default();
    config.markup.romaji = true;
    config.markup.translation = true;
    config
}

fn controller_with(config: Config, translator: Arc<MockTranslator>) -> Controller {
    let translator: Arc<dyn Translator> = translator;
    Controller::with_components(config, common::sample_tokenizer(), Some(translator))
}

#[tokio::test]
async fn test_run_with_withAssInput_shouldWriteAllBlocks() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_ass(temp_dir.path(), "episode.ass")?;
    let output = temp_dir.path().join("episode_marked.ass");
    let translator = Arc::new(MockTranslator::new([("猫です", "It's a cat"), ("漢字", "Kanji")]));
    let controller = controller_with(full_markup_config(), translator.clone());

    let mut prompt = ScriptedRetryPrompt::default();
    controller
        .run_with(&input, Some(output.clone()), false, &mut prompt, &mut |_: Progress| {})
        .await?;

    let script = fs::read_to_string(&output)?;
    assert!(script.contains("Style: Default,Noto Sans JP,20,"));
    assert!(script.contains(
        "Dialogue: 0,0:00:01.00,0:00:03.50,Default,,0,0,0,,\
         {\\fnNoto Sans JP}{\\fs13}It's a cat\\N{\\fs13}neko desu\\N\
         {\\fs10}ねこ\u{3000}\u{3000}\u{3000}\u{3000}\\N{\\fs20}猫です\n"
    ));
    // "テスト" has no translation, so its slot stays empty
    assert!(script.contains(
        "Dialogue: 0,0:00:04.00,0:00:06.00,Default,,0,0,0,,\
         {\\fnNoto Sans JP}{\\fs13}Kanji\\n\\N{\\fs13}kanji  tesuto\\N\
         {\\fs10}かんじ\\N{\\fs20}漢字\\N{\\fs10}\\N{\\fs20}テスト\n"
    ));
    assert_eq!(translator.call_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_run_with_withSrtInputAndUtf16Output_shouldKeepTiming() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    let mut config = Config::default();
    config.output.encoding = TextEncoding::Utf16Le;
    let controller = controller_with(config, Arc::new(MockTranslator::default()));

    let mut prompt = ScriptedRetryPrompt::default();
    let written = controller
        .run_with(&input, None, false, &mut prompt, &mut |_: Progress| {})
        .await?
        .expect("output should be written");

    assert_eq!(TextEncoding::detect(&fs::read(&written)?), Some(TextEncoding::Utf16Le));

    let original = Track::load(&input)?;
    let marked = Track::load(&written)?;
    assert_eq!(marked.format, TrackFormat::Srt);
    let timings = |track: &Track| -> Vec<(u64, u64)> {
        track.cues.iter().map(|c| (c.start_time_ms, c.duration_ms)).collect()
    };
    assert_eq!(timings(&marked), timings(&original));
    assert_eq!(
        marked.cues[2].text,
        "{\\fnNoto Sans JP}{\\fs10}\u{3000}にほんご\u{3000}\\N{\\fs20}日本語"
    );
    Ok(())
}

#[tokio::test]
async fn test_run_with_withExtensionOverride_shouldConvertSrtToAss() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    let mut config = Config::default();
    config.output.extension = Some("ass".to_string());
    config.markup.base_font_size = 24;
    let controller = controller_with(config, Arc::new(MockTranslator::default()));

    let mut prompt = ScriptedRetryPrompt::default();
    let written = controller
        .run_with(&input, None, false, &mut prompt, &mut |_: Progress| {})
        .await?
        .expect("output should be written");

    assert_eq!(written.extension().and_then(|e| e.to_str()), Some("ass"));
    let script = fs::read_to_string(&written)?;
    assert!(script.starts_with("[Script Info]"));
    assert!(script.contains("Style: Default,Noto Sans JP,24,"));
    assert!(script.contains("{\\fs12}かんじ\\N{\\fs24}漢字\\N{\\fs12}\\N{\\fs24}テスト"));
    Ok(())
}

#[tokio::test]
async fn test_run_with_withSameSourceAndTarget_shouldSkipTranslation() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    let mut config = full_markup_config();
    config.target_language = "jpn".to_string();
    let translator = Arc::new(MockTranslator::new([("猫です", "猫です")]));
    let controller = controller_with(config, translator.clone());

    assert!(!controller.markup_options().include_translation);
    let mut prompt = ScriptedRetryPrompt::default();
    controller
        .run_with(&input, None, false, &mut prompt, &mut |_: Progress| {})
        .await?;
    assert_eq!(translator.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_run_with_withConfiguredProvider_shouldTranslateWithIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    let mut config = full_markup_config();
    config.translation.provider = TranslationProvider::LMStudio;
    let translator = Arc::new(MockTranslator::new([("日本語", "Japanese")]));
    let controller = controller_with(config, translator.clone());

    let mut prompt = ScriptedRetryPrompt::default();
    controller
        .run_with(&input, None, false, &mut prompt, &mut |_: Progress| {})
        .await?;

    let calls = translator.calls.lock().unwrap();
    assert!(!calls.is_empty());
    assert!(calls.iter().all(|(_, service)| *service == TranslationProvider::LMStudio));
    Ok(())
}

#[test]
fn test_with_config_withLexiconFile_shouldUseIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let lexicon = common::create_test_file(temp_dir.path(), "lexicon.tsv", "猫\tねこ\n")?;
    let mut config = Config::default();
    config.tokenizer.lexicon_path = Some(lexicon);

    let controller = Controller::with_config(config)?;
    assert!(controller.markup_options().include_furigana);
    assert!(controller.config().tokenizer.lexicon_path.is_some());
    Ok(())
}

#[test]
fn test_with_config_withMissingLexicon_shouldFail() {
    let mut config = Config::default();
    config.tokenizer.lexicon_path = Some("/nonexistent/lexicon.tsv".into());
    assert!(Controller::with_config(config).is_err());
}

#[test]
fn test_with_config_withLocalTranslationProvider_shouldBuildService() -> Result<()> {
    let controller = Controller::with_config(full_markup_config())?;
    assert!(controller.markup_options().include_translation);
    assert_eq!(controller.ass_style().font_size, 20);
    Ok(())
}

#[tokio::test]
async fn test_process_track_withDefaultConfig_shouldReadKanjiFromDictionary() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let srt = common::create_test_file(
        temp_dir.path(),
        "kanji.srt",
        "1\n00:00:01,000 --> 00:00:02,000\n日本語の漢字\n",
    )?;
    let track = Track::load(&srt)?;

    let controller = Controller::with_config(Config::default())?;
    let annotated = controller.process_track(&track, &mut |_: Progress| {}).await?;

    let text = &annotated.cues[0].text;
    let (furigana, line) = text.rsplit_once("\\N{\\fs20}").unwrap();
    assert_eq!(line, "日本語の漢字");
    assert!(furigana.contains("かんじ"), "no reading above 漢字: {}", text);
    Ok(())
}
