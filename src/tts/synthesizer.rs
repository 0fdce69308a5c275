//! Text-to-speech synthesizer using Kokoro models.

use anyhow::Result;
use sherpa_rs::OnnxConfig;
use sherpa_rs::tts::{CommonTtsConfig, KokoroTts, KokoroTtsConfig};
use tracing::{debug, info};

use crate::config::{AppConfig, Voice};

/// Kokoro output sample rate.
pub const KOKORO_SAMPLE_RATE: u32 = 24000;

/// Text-to-speech synthesizer using Kokoro models.
///
/// The engine is built for one language group (lexicon or espeak language);
/// switching to a voice from another group rebuilds it.
pub struct Synthesizer {
    tts: KokoroTts,          // Kokoro TTS engine
    config: AppConfig,       // Model paths and provider settings
    lexicon: String,         // Lexicon the engine was built with
    language: &'static str,  // espeak language the engine was built with
    speaker_id: i32,         // Speaker used when an utterance names no voice
}

impl Synthesizer {
    /// Create a new TTS synthesizer for the initial narration voice.
    ///
    /// # Errors
    /// Returns an error if TTS initialization fails (e.g., missing model files).
    pub fn new(config: &AppConfig, voice: &Voice) -> Result<Self> {
        info!("Initializing Kokoro TTS synthesizer with {} provider", config.effective_tts_provider());
        info!("TTS voice: {} (speaker ID: {})", voice.name, voice.speaker_id);

        let lexicon = config.tts_lexicon(voice.name);
        let language = AppConfig::tts_language(voice.name);
        let tts = build_engine(config, &lexicon, language);

        info!("TTS sample rate: {} Hz", KOKORO_SAMPLE_RATE);

        Ok(Self { tts, config: config.clone(), lexicon, language, speaker_id: voice.speaker_id })
    }

    /// Synthesize a single sentence.
    ///
    /// # Arguments
    /// * `sentence` - The sentence to synthesize
    /// * `rate` - Speech-rate multiplier
    /// * `voice` - Voice to speak with, or `None` for the current one
    ///
    /// # Errors
    /// Returns an error if TTS generation fails.
    pub fn synthesize(&mut self, sentence: &str, rate: f32, voice: Option<&Voice>) -> Result<Vec<f32>> {
        if let Some(voice) = voice {
            self.use_voice(voice);
        }

        if sentence.trim().is_empty() {
            return Ok(Vec::new());
        }

        debug!("Synthesizing sentence: \"{}\"", sentence);

        let audio = self.tts.create(sentence, self.speaker_id, rate).map_err(|e| anyhow::anyhow!("TTS generation failed: {}", e))?;

        debug!("🎵 Generated speech ({} samples)", audio.samples.len());
        Ok(audio.samples)
    }

    /// Sample rate of the synthesized audio.
    pub fn sample_rate(&self) -> u32 {
        KOKORO_SAMPLE_RATE
    }

    fn use_voice(&mut self, voice: &Voice) {
        self.speaker_id = voice.speaker_id;

        let lexicon = self.config.tts_lexicon(voice.name);
        let language = AppConfig::tts_language(voice.name);
        if lexicon != self.lexicon || language != self.language {
            info!("Rebuilding Kokoro engine for {} ({})", voice.name, voice.language);
            self.tts = build_engine(&self.config, &lexicon, language);
            self.lexicon = lexicon;
            self.language = language;
        }
    }
}

fn build_engine(config: &AppConfig, lexicon: &str, language: &str) -> KokoroTts {
    let tts_config = KokoroTtsConfig {
        model: config.tts_model_path().to_string_lossy().to_string(),
        voices: config.tts_voices_path().to_string_lossy().to_string(),
        tokens: config.tts_tokens_path().to_string_lossy().to_string(),
        data_dir: config.tts_data_dir().to_string_lossy().to_string(),
        dict_dir: config.tts_dict_dir().to_string_lossy().to_string(),
        lexicon: lexicon.to_string(),
        lang: language.to_string(),
        length_scale: 1.0, // rate is applied per utterance
        onnx_config: OnnxConfig {
            provider: config.effective_tts_provider().as_sherpa_provider().to_string(),
            num_threads: config.tts_threads.try_into().unwrap_or(2),
            debug: config.verbose,
        },
        common_config: CommonTtsConfig { max_num_sentences: 1, ..Default::default() }, // Kokoro only supports 1
    };

    KokoroTts::new(tts_config)
}
