use anyhow::{Result, anyhow};
use log::{error, warn, info, debug};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle, MultiProgress};

use crate::annotation::{MarkupAssembler, MarkupOptions, ReadingResolver};
use crate::app_config::Config;
use crate::errors::{AppError, SubtitleError};
use crate::file_utils::{FileManager, FileType};
use crate::language_utils;
use crate::subtitle_processor::{AssStyle, Track};
use crate::tokenizer::{LexiconTokenizer, MorphologicalTokenizer, Tokenizer};
use crate::translation::{TranslationService, Translator};

// @module: Cue track driver

/// Cues finished out of the cues in the track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Completion in [0, 1]; an empty track counts as complete
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
    
    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }
}

/// Receives progress after every processed cue
pub trait ProgressObserver {
    fn on_progress(&mut self, progress: Progress);
}

impl<F: FnMut(Progress)> ProgressObserver for F {
    fn on_progress(&mut self, progress: Progress) {
        self(progress)
    }
}

/// Shared flag checked between cues
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }
    
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Operator answer after a failed save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Abort,
}

/// Asks whether a failed save should be attempted again
pub trait RetryPrompt {
    fn ask(&mut self, path: &Path, error: &SubtitleError) -> RetryDecision;
}

/// Interactive yes/no prompt on the terminal
#[derive(Debug, Default)]
pub struct ConfirmRetryPrompt;

impl RetryPrompt for ConfirmRetryPrompt {
    fn ask(&mut self, path: &Path, error: &SubtitleError) -> RetryDecision {
        let answer = Confirm::new()
            .with_prompt(format!("Could not save {:?} ({}). Fix the problem and retry?", path, error))
            .default(true)
            .interact();
        
        match answer {
            Ok(true) => RetryDecision::Retry,
            Ok(false) => RetryDecision::Abort,
            Err(e) => {
                warn!("Cannot ask for confirmation: {}", e);
                RetryDecision::Abort
            }
        }
    }
}

/// Main application controller for subtitle markup
pub struct Controller {
    // @field: App configuration
    config: Config,
    
    // @field: Builds the text of every cue
    assembler: MarkupAssembler,
    
    // @field: Set to stop before the next cue
    cancellation: CancellationFlag,
}

impl Controller {
    // @method: Create a controller from configuration, loading the dictionary,
    // the lexicon overlay and the translation backends it names
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        
        let mut analyzer = MorphologicalTokenizer::new()?;
        if let Some(path) = &config.tokenizer.lexicon_path {
            analyzer = analyzer.with_overlay(LexiconTokenizer::load(path)?);
        }
        let tokenizer: Arc<dyn Tokenizer> = Arc::new(analyzer);
        
        let translator: Option<Arc<dyn Translator>> = if Self::translation_wanted(&config) {
            Some(Arc::new(TranslationService::new(&config.translation)?))
        } else {
            None
        };
        
        Ok(Self::with_components(config, tokenizer, translator))
    }
    
    // @method: Create a controller with injected collaborators
    pub fn with_components(config: Config, tokenizer: Arc<dyn Tokenizer>, translator: Option<Arc<dyn Translator>>) -> Self {
        Self {
            assembler: MarkupAssembler::new(ReadingResolver::new(tokenizer), translator),
            config,
            cancellation: CancellationFlag::new(),
        }
    }
    
    pub fn config(&self) -> &Config {
        &self.config
    }
    
    /// Handle for cancelling a running job from elsewhere
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancellation.clone()
    }
    
    /// Translating into the source language is a no-op, so the block is dropped
    fn translation_wanted(config: &Config) -> bool {
        if !config.markup.translation {
            return false;
        }
        if language_utils::language_codes_match(&config.source_language, &config.target_language) {
            warn!("Source and target language are both '{}', skipping translation", config.source_language);
            return false;
        }
        true
    }
    
    /// Options passed to the assembler for every cue
    pub fn markup_options(&self) -> MarkupOptions {
        let markup = &self.config.markup;
        MarkupOptions {
            include_furigana: markup.furigana,
            include_romaji: markup.romaji,
            include_translation: markup.translation
                && !language_utils::language_codes_match(&self.config.source_language, &self.config.target_language),
            base_font_size: markup.base_font_size,
            font_name: markup.font_name.clone(),
            translation_service: self.config.translation.provider.clone(),
            source_language: self.config.source_language.clone(),
            target_language: self.config.target_language.clone(),
        }
    }
    
    /// Style of the written SSA/ASS script
    pub fn ass_style(&self) -> AssStyle {
        AssStyle {
            font_name: self.config.markup.font_name.clone(),
            font_size: self.config.markup.base_font_size,
        }
    }
    
    /// Build the annotated track, one cue at a time in file order. Timing of
    /// every cue is copied unchanged.
    pub async fn process_track<O: ProgressObserver + ?Sized>(&self, track: &Track, observer: &mut O) -> Result<Track, AppError> {
        let options = self.markup_options();
        let total = track.cues.len();
        let mut annotated = Track::new(track.source_file.clone(), track.format);
        annotated.cues.reserve(total);
        
        for (i, cue) in track.cues.iter().enumerate() {
            if self.cancellation.is_cancelled() {
                warn!("Cancelled after {} of {} cues", i, total);
                return Err(AppError::Cancelled { completed: i, total });
            }
            
            let text = self.assembler.assemble(&cue.text, &options).await;
            annotated.cues.push(cue.with_text(text));
            observer.on_progress(Progress { completed: i + 1, total });
        }
        
        Ok(annotated)
    }
    
    /// Save `track`, asking `prompt` whether to try again after every failure
    pub fn persist_with_retry<R: RetryPrompt + ?Sized>(&self, track: &Track, path: &Path, prompt: &mut R) -> Result<(), SubtitleError> {
        let style = self.ass_style();
        let mut attempt = 1;
        
        loop {
            match track.save(path, self.config.output.encoding, &style) {
                Ok(()) => {
                    if attempt > 1 {
                        info!("Saved {:?} on attempt {}", path, attempt);
                    }
                    return Ok(());
                },
                Err(e) => {
                    error!("Failed to save {:?}: {}", path, e);
                    match prompt.ask(path, &e) {
                        RetryDecision::Retry => attempt += 1,
                        RetryDecision::Abort => return Err(SubtitleError::PersistAborted { path: path.to_path_buf() }),
                    }
                },
            }
        }
    }
    
    /// Process one subtitle file. Returns the written path, or `None` when
    /// the output already exists and overwriting was not forced.
    pub async fn run_with<R, O>(
        &self,
        input_file: &Path,
        output_file: Option<PathBuf>,
        force_overwrite: bool,
        prompt: &mut R,
        observer: &mut O,
    ) -> Result<Option<PathBuf>, AppError>
    where
        R: RetryPrompt + ?Sized,
        O: ProgressObserver + ?Sized,
    {
        if !input_file.exists() {
            return Err(AppError::File(format!("Input file does not exist: {:?}", input_file)));
        }
        
        if FileManager::detect_file_type(input_file)? == FileType::Unknown {
            return Err(SubtitleError::UnsupportedFormat(input_file.display().to_string()).into());
        }
        
        let output_path = output_file.unwrap_or_else(|| {
            FileManager::generate_markup_output_path(
                input_file,
                self.config.output.extension.as_deref(),
                chrono::Utc::now().timestamp(),
            )
        });
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, output already exists (use -f to force overwrite)", output_path);
            return Ok(None);
        }
        
        let start_time = Instant::now();
        let track = Track::load(input_file)?;
        info!("Processing {} cues from {:?}", track.len(), input_file);
        
        let annotated = self.process_track(&track, observer).await?;
        self.persist_with_retry(&annotated, &output_path, prompt)?;
        
        info!("Wrote {:?} in {}", output_path, Self::format_duration(start_time.elapsed()));
        Ok(Some(output_path))
    }
    
    fn progress_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!("{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}", unit))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }
    
    /// Run the workflow for one file with a terminal progress bar
    pub async fn run(&self, input_file: PathBuf, output_file: Option<PathBuf>, force_overwrite: bool) -> Result<()> {
        let progress_bar = ProgressBar::new(0);
        progress_bar.set_style(Self::progress_style("cues"));
        
        let mut observer = |progress: Progress| {
            progress_bar.set_length(progress.total as u64);
            progress_bar.set_position(progress.completed as u64);
            if progress.completed == progress.total {
                progress_bar.finish();
            }
        };
        
        let result = self.run_with(&input_file, output_file, force_overwrite, &mut ConfirmRetryPrompt, &mut observer).await;
        progress_bar.finish_and_clear();
        
        match result? {
            Some(path) => info!("Markup written to {:?}", path),
            None => debug!("Nothing written for {:?}", input_file),
        }
        Ok(())
    }
    
    /// Run the workflow in folder mode, processing every subtitle file below
    /// `input_dir`. Failures are logged per file and do not stop the folder.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        let start_time = Instant::now();
        
        if !input_dir.is_dir() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }
        
        let files = FileManager::find_subtitle_files(&input_dir)?;
        if files.is_empty() {
            return Err(anyhow!("No subtitle files found in directory: {:?}", input_dir));
        }
        
        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
        folder_pb.set_style(Self::progress_style("files"));
        
        let mut success_count = 0;
        let mut error_count = 0;
        let mut skip_count = 0;
        
        for file in &files {
            let file_name = file.file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));
            
            let cue_pb = multi_progress.add(ProgressBar::new(0));
            cue_pb.set_style(Self::progress_style("cues"));
            let mut observer = |progress: Progress| {
                cue_pb.set_length(progress.total as u64);
                cue_pb.set_position(progress.completed as u64);
            };
            
            let result = self.run_with(file, None, force_overwrite, &mut ConfirmRetryPrompt, &mut observer).await;
            cue_pb.finish_and_clear();
            multi_progress.remove(&cue_pb);
            
            match result {
                Ok(Some(_)) => success_count += 1,
                Ok(None) => skip_count += 1,
                Err(AppError::Cancelled { completed, total }) => {
                    folder_pb.abandon_with_message("Cancelled");
                    return Err(anyhow!("Cancelled in {:?} after {} of {} cues", file, completed, total));
                },
                Err(e) => {
                    error!("Failed to process {:?}: {}", file, e);
                    error_count += 1;
                },
            }
            folder_pb.inc(1);
        }
        
        folder_pb.finish_with_message("Done");
        info!(
            "Processed {} files ({} written, {} skipped, {} failed) in {}",
            files.len(), success_count, skip_count, error_count,
            Self::format_duration(start_time.elapsed())
        );
        Ok(())
    }
    
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        
        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
