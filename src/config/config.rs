//! Application configuration and CLI argument parsing.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::voices;

/// Speech-rate multipliers offered by the rate selector.
pub const SPEECH_RATES: &[f32] = &[0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// Cleanup model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Directory name of the Kokoro model bundle inside `<model_dir>/tts`.
pub const KOKORO_BUNDLE: &str = "kokoro-multi-lang-v1_0";

/// Hardware acceleration provider for ONNX models.
/// Auto-detected based on platform if not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// CPU inference (default fallback, always available)
    #[default]
    Cpu,
    /// NVIDIA CUDA acceleration (Linux only, requires CUDA toolkit)
    Cuda,
    /// Apple CoreML acceleration (macOS only, uses Neural Engine)
    #[value(name = "coreml")]
    CoreMl,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sherpa_provider())
    }
}

impl Provider {
    /// Convert to sherpa-rs provider string.
    pub fn as_sherpa_provider(&self) -> &'static str {
        match self {
            Provider::Cpu => "cpu",
            Provider::Cuda => "cuda",
            Provider::CoreMl => "coreml",
        }
    }
}

/// What to do.
#[derive(Subcommand, Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    /// Extract, clean up and save a PDF, then start narrating it
    Import {
        /// Path to the PDF file
        file: PathBuf,
        /// Save the paper without opening the reading view
        #[arg(long)]
        no_play: bool,
    },
    /// List saved papers
    List,
    /// Narrate a saved paper
    Play {
        /// Paper id (see `list`)
        id: String,
    },
    /// Rename a saved paper
    Rename {
        /// Paper id (see `list`)
        id: String,
        /// New title
        title: String,
    },
    /// Delete a saved paper
    Delete {
        /// Paper id (see `list`)
        id: String,
    },
    /// List cleanup models available for the API key
    Models,
    /// Download the Kokoro TTS model bundle into the model directory
    FetchModels,
}

/// Paper narrator application configuration.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "paper-narrator")]
#[command(author, version, about = "Listen to academic papers, one highlighted sentence at a time", long_about = None)]
pub struct AppConfig {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// List all available TTS voices and exit
    #[arg(long)]
    pub list_voices: bool,

    /// Show detailed information about a specific voice and exit
    #[arg(long)]
    pub voice_info: Option<String>,

    /// Gemini API key used for text cleanup
    #[arg(long, env = "GEMINI_API_KEY", default_value = "", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Gemini model used for text cleanup
    #[arg(long, short = 'm', env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the Gemini REST API
    #[arg(long, env = "GEMINI_API_URL", default_value = "https://generativelanguage.googleapis.com/v1beta")]
    pub api_url: String,

    /// Directory holding saved papers and the narration log
    #[arg(long, env = "NARRATOR_DATA_DIR", default_value_os_t = default_data_dir())]
    pub data_dir: PathBuf,

    /// Directory containing the TTS model files
    #[arg(long, short = 'd', env = "MODEL_DIR", default_value_os_t = default_data_dir().join("models"))]
    pub model_dir: PathBuf,

    /// Preferred narration voice (substring of a Kokoro voice name)
    #[arg(long, default_value = "af_heart")]
    pub voice: String,

    /// Initial speech-rate multiplier
    #[arg(long, default_value = "1.0", value_parser = parse_rate)]
    pub rate: f32,

    /// Hardware acceleration provider (auto-detected if not specified)
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// TTS threads (0 = auto-detect based on CPU cores)
    #[arg(long, default_value = "0")]
    pub tts_threads: usize,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl AppConfig {
    /// Parse configuration from command line arguments.
    pub fn from_args() -> Self {
        let mut config = Self::parse();

        // Handle voice listing commands
        if config.list_voices {
            voices::print_voices();
            std::process::exit(0);
        }

        if let Some(ref voice_name) = config.voice_info {
            match voices::print_voice_info(voice_name) {
                Ok(_) => std::process::exit(0),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        config.normalize_thread_counts();
        config
    }

    /// Auto-detect the TTS thread count.
    ///
    /// With CUDA the GPU handles parallelism, so one CPU thread is enough.
    /// On CPU, use half the cores, leaving headroom for playback and the UI.
    fn normalize_thread_counts(&mut self) {
        if self.tts_threads == 0 {
            self.tts_threads = if self.effective_tts_provider() == Provider::Cuda { 1 } else { (num_cpus::get() / 2).max(1) };
        }
    }

    /// Get the effective TTS provider.
    pub fn effective_tts_provider(&self) -> Provider {
        self.provider.unwrap_or_else(detect_provider)
    }

    /// Directory of the Kokoro model bundle.
    pub fn tts_dir(&self) -> PathBuf {
        self.model_dir.join("tts").join(KOKORO_BUNDLE)
    }

    /// Get the path to the Kokoro TTS model.
    pub fn tts_model_path(&self) -> PathBuf {
        self.tts_dir().join("model.onnx")
    }

    /// Get the path to the Kokoro TTS voices.bin file.
    pub fn tts_voices_path(&self) -> PathBuf {
        self.tts_dir().join("voices.bin")
    }

    /// Get the path to the TTS tokens file.
    pub fn tts_tokens_path(&self) -> PathBuf {
        self.tts_dir().join("tokens.txt")
    }

    /// Get the path to the TTS data directory.
    pub fn tts_data_dir(&self) -> PathBuf {
        self.tts_dir().join("espeak-ng-data")
    }

    /// Get the path to the TTS dict directory (for Chinese segmentation).
    pub fn tts_dict_dir(&self) -> PathBuf {
        self.tts_dir().join("dict")
    }

    /// Lexicon files for a voice.
    /// The model includes lexicon-us-en.txt (American), lexicon-gb-en.txt (British), lexicon-zh.txt (Chinese).
    /// Other languages return empty and rely on `tts_language` instead.
    pub fn tts_lexicon(&self, voice: &str) -> String {
        let tts_dir = self.tts_dir();
        let lexicon = |file: &str| tts_dir.join(file).to_string_lossy().to_string();
        match voice.get(..2) {
            Some("af" | "am") | None => lexicon("lexicon-us-en.txt"),
            Some("bf" | "bm") => lexicon("lexicon-gb-en.txt"),
            // Chinese with English fallback
            Some("zf" | "zm") => format!("{},{}", lexicon("lexicon-us-en.txt"), lexicon("lexicon-zh.txt")),
            Some(_) => String::new(),
        }
    }

    /// Language code for voices that need espeak-ng instead of a lexicon.
    /// Reference: <https://github.com/k2-fsa/sherpa-onnx/blob/master/sherpa-onnx/csrc/offline-tts-kokoro-model-config.cc>
    pub fn tts_language(voice: &str) -> &'static str {
        match voice.get(..2) {
            Some("ef" | "em") => "es",
            Some("ff") => "fr",
            Some("hf" | "hm") => "hi",
            Some("if" | "im") => "it",
            Some("jf" | "jm") => "ja",
            Some("pf" | "pm") => "pt-br",
            _ => "", // English/Chinese use lexicon files
        }
    }

    /// Location of the saved-paper store.
    pub fn library_dir(&self) -> PathBuf {
        self.data_dir.join("library")
    }

    /// File the reading view logs to while it owns the terminal.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("narrator.log")
    }

    /// Validate that the TTS model files are in place.
    pub fn validate(&self) -> Result<()> {
        if !self.model_dir.exists() {
            anyhow::bail!("Model directory does not exist: {}", self.model_dir.display());
        }

        let required_files = [self.tts_model_path(), self.tts_voices_path(), self.tts_tokens_path()];
        for path in &required_files {
            if !path.exists() {
                anyhow::bail!("Required model file not found: {}", path.display());
            }
        }

        if self.rate <= 0.0 {
            anyhow::bail!("Speech rate must be positive");
        }

        Ok(())
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!("Configuration:");
        info!("  Data directory: {}", self.data_dir.display());
        info!("  Model directory: {}", self.model_dir.display());
        info!("  Cleanup model: {}", self.model);
        info!("  API key: {}", if self.api_key.trim().is_empty() { "not set" } else { "set" });
        info!("  Preferred voice: {}", self.voice);
        info!("  Speech rate: {}x", self.rate);
        info!("  TTS provider: {}", self.effective_tts_provider());
        info!("  TTS threads: {}", self.tts_threads);
    }
}

/// Get the default data directory (~/.paper-narrator).
fn default_data_dir() -> PathBuf {
    if let Some(home_dir) = dirs::home_dir() {
        home_dir.join(".paper-narrator")
    } else {
        PathBuf::from(".paper-narrator")
    }
}

/// Auto-detect the best hardware acceleration provider.
fn detect_provider() -> Provider {
    #[cfg(target_os = "macos")]
    {
        info!("Detected macOS, using CoreML provider");
        Provider::CoreMl
    }

    #[cfg(target_os = "linux")]
    {
        if has_nvidia_gpu() {
            info!("Detected NVIDIA GPU, using CUDA provider");
            Provider::Cuda
        } else {
            info!("No GPU detected, using CPU provider");
            Provider::Cpu
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        info!("Using CPU provider");
        Provider::Cpu
    }
}

/// Check if an NVIDIA GPU is available (Linux only).
#[cfg(target_os = "linux")]
fn has_nvidia_gpu() -> bool {
    use std::path::Path;

    let nvidia_paths = ["/dev/nvidia0", "/dev/nvidiactl", "/dev/nvidia-uvm", "/dev/nvhost-ctrl", "/dev/nvhost-ctrl-gpu", "/etc/nv_tegra_release"];
    nvidia_paths.iter().any(|path| Path::new(path).exists())
}

/// Parse a speech rate and make sure it is one of the selector's multipliers.
fn parse_rate(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{}' is not a valid rate", s))?;
    SPEECH_RATES
        .iter()
        .copied()
        .find(|rate| (rate - value).abs() < f32::EPSILON)
        .ok_or_else(|| format!("rate must be one of {:?}, got {}", SPEECH_RATES, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        AppConfig::try_parse_from(std::iter::once("paper-narrator").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_rate_must_be_offered_multiplier() {
        assert_eq!(parse_rate("1.25"), Ok(1.25));
        assert!(parse_rate("1.1").is_err());
        assert!(parse_rate("fast").is_err());
    }

    #[test]
    fn test_subcommands_parse() {
        let config = parse(&["--api-key", "k", "rename", "170", "New title"]);
        assert_eq!(config.api_key, "k");
        match config.command {
            Some(Command::Rename { id, title }) => {
                assert_eq!(id, "170");
                assert_eq!(title, "New title");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_lexicon_follows_voice_language() {
        let config = parse(&["--model-dir", "/models"]);
        assert!(config.tts_lexicon("af_heart").ends_with("lexicon-us-en.txt"));
        assert!(config.tts_lexicon("bf_emma").ends_with("lexicon-gb-en.txt"));
        assert!(config.tts_lexicon("zf_xiaobei").contains(','));
        assert!(config.tts_lexicon("ff_siwis").is_empty());
    }

    #[test]
    fn test_validate_reports_missing_models() {
        let dir = tempfile::tempdir().unwrap();
        let config = parse(&["--model-dir", dir.path().to_str().unwrap()]);
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("model.onnx"), "{}", err);
    }
}
