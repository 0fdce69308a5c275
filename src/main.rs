//! Paper Narrator - listen to academic papers one highlighted sentence at a time.
//!
//! Imports a PDF, has Gemini strip everything that is not body text, saves the
//! result in a local library and narrates it sentence by sentence with Kokoro
//! TTS in a full-screen terminal reading view.

mod app;
mod audio;
mod config;
mod display;
mod error;
mod ingest;
mod library;
mod llm;
mod narration;
mod pdf;
mod segment;
mod setup;
mod tts;

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::LocalTime;

use app::Session;
use audio::Player;
use config::{AppConfig, Command, ordered_voices, select_default};
use display::{TerminalDisplay, TerminalGuard};
use ingest::UploadedFile;
use library::{FileStorage, Paper, PaperLibrary};
use llm::GeminiClient;
use narration::Narrator;
use pdf::PdfTextExtractor;
use tts::{KokoroSpeech, Synthesizer};

/// Log sink that moves from stderr to the log file while the reading view owns the terminal.
#[derive(Clone)]
struct LogTarget {
    file: Option<Arc<File>>,
    redirect: Arc<AtomicBool>,
}

impl LogTarget {
    fn to_file(&self) {
        self.redirect.store(self.file.is_some(), Ordering::SeqCst);
    }

    fn to_stderr(&self) {
        self.redirect.store(false, Ordering::SeqCst);
    }
}

impl<'a> MakeWriter<'a> for LogTarget {
    type Writer = Box<dyn Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        match &self.file {
            Some(file) if self.redirect.load(Ordering::Relaxed) => Box::new(file.as_ref()),
            _ => Box::new(io::stderr()),
        }
    }
}

/// Set up tracing. Interactive commands also get a log file for the reading view.
fn init_logging(config: &AppConfig, interactive: bool) -> Result<LogTarget> {
    // Respect RUST_LOG env var, fallback to verbose flag, default to info
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| if config.verbose { EnvFilter::try_new("debug") } else { EnvFilter::try_new("info") })
        .context("Invalid log filter")?;

    let file = if interactive {
        fs::create_dir_all(&config.data_dir).with_context(|| format!("Failed to create {}", config.data_dir.display()))?;
        let path = config.log_path();
        let file = OpenOptions::new().create(true).append(true).open(&path).with_context(|| format!("Failed to open log file {}", path.display()))?;
        Some(Arc::new(file))
    } else {
        None
    };
    let target = LogTarget { file, redirect: Arc::new(AtomicBool::new(false)) };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!interactive)
        .with_writer(target.clone())
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    Ok(target)
}

fn open_library(config: &AppConfig) -> PaperLibrary<FileStorage> {
    PaperLibrary::open(FileStorage::new(config.library_dir()))
}

fn list_papers(config: &AppConfig) {
    let library = open_library(config);
    if library.list().is_empty() {
        println!("No saved papers yet. Import one with: paper-narrator import <file.pdf>");
        return;
    }

    println!("Saved papers:");
    for paper in library.list() {
        let date = paper.date.get(..10).unwrap_or(&paper.date);
        println!("  {}  {}  {}", paper.id, date, paper.title);
    }
}

async fn list_models(config: &AppConfig) -> Result<()> {
    if config.api_key.trim().is_empty() {
        bail!(error::InputError::MissingApiKey);
    }
    let client = GeminiClient::new(&config.api_key, &config.api_url)?;
    let models = client.list_models().await?;

    println!("Cleanup models:");
    for model in &models {
        let marker = if model.is_default() { " -- DEFAULT" } else { "" };
        println!("  {:<36} {}{}", model.id(), model.display_name, marker);
    }
    Ok(())
}

async fn import_paper(config: &AppConfig, path: &std::path::Path) -> Result<Paper> {
    let file = UploadedFile::from_path(path)?;
    let client = GeminiClient::new(&config.api_key, &config.api_url)?;
    let mut library = open_library(config);

    let id = ingest::import(&file, &config.api_key, &config.model, &PdfTextExtractor, &client, &mut library).await?;
    let paper = library.load(&id).cloned().context("Imported paper is missing from the library")?;
    info!("✅ Imported \"{}\" ({})", paper.title, paper.id);
    Ok(paper)
}

/// Narrate a paper in the full-screen reading view until the user quits.
async fn narrate(config: &AppConfig, paper: &Paper, logs: &LogTarget) -> Result<()> {
    if let Err(e) = config.validate() {
        error!("❌ Configuration error: {}", e);
        bail!("TTS models are not installed. Run 'paper-narrator fetch-models' first.");
    }

    let sentences = segment::segment(&paper.content);
    if sentences.is_empty() {
        bail!("\"{}\" has no readable sentences", paper.title);
    }

    let voices = ordered_voices();
    let voice = select_default(&voices, Some(&config.voice)).context("No TTS voices available")?;

    let synthesizer = Synthesizer::new(config, voice)?;
    let player = Player::new(synthesizer.sample_rate())?;
    let (speech_tx, speech_rx) = mpsc::unbounded_channel();
    let driver = KokoroSpeech::new(synthesizer, player, speech_tx);

    let mut narrator = Narrator::new(driver, config.rate, Some(voice));
    narrator.load(sentences);

    info!("🔊 Narrating \"{}\" (log: {})", paper.title, config.log_path().display());
    logs.to_file();
    let result = run_reading_view(narrator, voices, &paper.title, speech_rx).await;
    logs.to_stderr();
    result
}

async fn run_reading_view(
    narrator: Narrator<KokoroSpeech>,
    voices: Vec<&'static config::Voice>,
    title: &str,
    speech_rx: mpsc::UnboundedReceiver<tts::SpeechEvent>,
) -> Result<()> {
    let _terminal = TerminalGuard::enter()?;
    let display = TerminalDisplay::stdout(title)?;

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let stop = CancellationToken::new();
    let input = app::spawn_input_reader(command_tx, stop.clone());

    let mut session = Session::new(narrator, display, voices);
    let result = session.run(speech_rx, command_rx, true).await;

    stop.cancel();
    if !matches!(tokio::task::spawn_blocking(move || input.join()).await, Ok(Ok(()))) {
        warn!("Input reader did not shut down cleanly");
    }
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let config = AppConfig::from_args();

    let interactive = matches!(config.command, Some(Command::Play { .. }) | Some(Command::Import { no_play: false, .. }));
    let logs = init_logging(&config, interactive)?;

    match config.command.clone() {
        None | Some(Command::List) => list_papers(&config),
        Some(Command::Models) => list_models(&config).await?,
        Some(Command::FetchModels) => {
            let config = config.clone();
            tokio::task::spawn_blocking(move || setup::fetch_tts_models(&config)).await.context("Model download task failed")??;
        }
        Some(Command::Rename { id, title }) => {
            if !open_library(&config).rename(&id, &title) {
                bail!("Could not rename {}: unknown id or empty title", id);
            }
            println!("Renamed {} to \"{}\"", id, title.trim());
        }
        Some(Command::Delete { id }) => {
            if !open_library(&config).delete(&id) {
                bail!("No saved paper with id {}", id);
            }
            println!("Deleted {}", id);
        }
        Some(Command::Import { file, no_play }) => {
            info!("📚 Paper Narrator v{}", env!("CARGO_PKG_VERSION"));
            config.log_config();
            let paper = import_paper(&config, &file).await?;
            if no_play {
                println!("Saved \"{}\" as {}", paper.title, paper.id);
            } else {
                narrate(&config, &paper, &logs).await?;
            }
        }
        Some(Command::Play { id }) => {
            info!("📚 Paper Narrator v{}", env!("CARGO_PKG_VERSION"));
            config.log_config();
            let paper = open_library(&config).load(&id).cloned().with_context(|| format!("No saved paper with id {}", id))?;
            narrate(&config, &paper, &logs).await?;
        }
    }

    Ok(())
}
