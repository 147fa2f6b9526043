// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand, Args};
use clap_complete::{generate, Shell};

use kanasub::app_config::{self, Config, TranslationProvider};
use kanasub::app_controller::Controller;
use kanasub::subtitle_processor::TextEncoding;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for TextEncoding to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEncoding {
    #[value(name = "utf-8")]
    Utf8,
    #[value(name = "utf-8-bom")]
    Utf8Bom,
    #[value(name = "utf-16le")]
    Utf16Le,
    #[value(name = "utf-16be")]
    Utf16Be,
}

impl From<CliEncoding> for TextEncoding {
    fn from(cli_encoding: CliEncoding) -> Self {
        match cli_encoding {
            CliEncoding::Utf8 => TextEncoding::Utf8,
            CliEncoding::Utf8Bom => TextEncoding::Utf8Bom,
            CliEncoding::Utf16Le => TextEncoding::Utf16Le,
            CliEncoding::Utf16Be => TextEncoding::Utf16Be,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for kanasub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct MarkupArgs {
    /// Input subtitle file (.srt, .ssa, .ass) or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output file (single file input only; defaults to <name>_markup_<time>.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Do not emit furigana above the text
    #[arg(long)]
    no_furigana: bool,

    /// Emit a romaji line
    #[arg(short, long)]
    romaji: bool,

    /// Emit a translated line
    #[arg(short = 'T', long)]
    translation: bool,

    /// Base font size of the original text
    #[arg(long)]
    font_size: Option<u32>,

    /// Font family for the markup
    #[arg(long)]
    font: Option<String>,

    /// Reading lexicon (surface<TAB>reading per line)
    #[arg(long)]
    lexicon: Option<PathBuf>,

    /// Text encoding of the written file
    #[arg(short, long, value_enum)]
    encoding: Option<CliEncoding>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'ja')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// kanasub - furigana, romaji and translation markup for Japanese subtitles
#[derive(Parser, Debug)]
#[command(name = "kanasub")]
#[command(version = "0.1.0")]
#[command(about = "Furigana, romaji and translation markup for Japanese subtitles")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "kanasub rewrites every cue of a Japanese subtitle track as SSA/ASS markup with
furigana above the kanji, an optional romaji line and an optional translated line.

EXAMPLES:
    kanasub episode.ass                          # Furigana only, default config
    kanasub -r episode.srt                       # Furigana and romaji
    kanasub -r -T -p openai episode.ass          # Add a translation via OpenAI
    kanasub --lexicon readings.tsv episode.ass   # Override readings with a lexicon
    kanasub -o out.ass -f episode.ass            # Explicit output, overwrite
    kanasub /subs/                               # Process a whole directory
    kanasub completions bash > kanasub.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,
    
    #[command(flatten)]
    markup: MarkupArgs,
}

// @struct: Custom logger implementation, filtered by the global max level
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }
    
    // @returns: ANSI color and marker for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "❌ "),
            Level::Warn => ("\x1B[1;33m", "🚧 "),
            Level::Info => ("\x1B[1;32m", " "),
            Level::Debug => ("\x1B[1;36m", "🔍 "),
            Level::Trace => ("\x1B[1;35m", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let (color, marker) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                color, now, marker, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config says otherwise
    CustomLogger::init(LevelFilter::Info)?;
    
    let cli = CommandLineOptions::parse();
    
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "kanasub", &mut std::io::stdout());
            Ok(())
        }
        None => run_markup(cli.markup).await,
    }
}

/// Load the config file, or write and use the default one
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;
        Ok(config)
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        
        Ok(config)
    }
}

/// Override config fields with the flags given on the command line
fn apply_cli_overrides(config: &mut Config, options: &MarkupArgs) {
    if options.no_furigana {
        config.markup.furigana = false;
    }
    if options.romaji {
        config.markup.romaji = true;
    }
    if options.translation {
        config.markup.translation = true;
    }
    if let Some(size) = options.font_size {
        config.markup.base_font_size = size;
    }
    if let Some(font) = &options.font {
        config.markup.font_name = font.clone();
    }
    if let Some(lexicon) = &options.lexicon {
        config.tokenizer.lexicon_path = Some(lexicon.clone());
    }
    if let Some(encoding) = &options.encoding {
        config.output.encoding = encoding.clone().into();
    }
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        // Find the provider config and update the model
        let provider_str = config.translation.provider.to_lowercase_string();
        if let Some(provider_config) = config.translation.available_providers.iter_mut()
            .find(|p| p.provider_type == provider_str) {
            provider_config.model = model.clone();
        }
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_markup(options: MarkupArgs) -> Result<()> {
    let input_path = options.input_path.clone().ok_or_else(|| {
        anyhow!("INPUT_PATH is required when no subcommand is specified")
    })?;
    
    // A command line level applies before the config is even read
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }
    
    let mut config = load_or_create_config(&options.config_path)?;
    apply_cli_overrides(&mut config, &options);
    log::set_max_level(level_filter(&config.log_level));
    
    config.validate()
        .context("Configuration validation failed")?;
    
    let controller = Controller::with_config(config)?;
    
    // Stop between cues on Ctrl-C
    let cancellation = controller.cancellation_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current cue");
            cancellation.cancel();
        }
    });
    
    if input_path.is_file() {
        controller.run(
            input_path,
            options.output.clone(),
            options.force_overwrite
        ).await?;
    } else if input_path.is_dir() {
        if options.output.is_some() {
            warn!("--output is ignored for directory input");
        }
        controller.run_folder(
            input_path,
            options.force_overwrite
        ).await?;
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }
    
    Ok(())
}
