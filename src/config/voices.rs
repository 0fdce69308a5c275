//! Kokoro voice catalog.
//!
//! The model ships 53 speakers across 9 languages. Narration lists English
//! voices first and picks a default the same way every time: the preferred
//! voice if present, else the model default, else the first voice.

/// Voice used when the preferred voice is not in the catalog.
pub const DEFAULT_VOICE: &str = "af_bella";

/// Essential metadata for a TTS voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    pub name: &'static str,
    pub speaker_id: i32,
    pub espeak_code: &'static str,
    pub language: &'static str,
}

impl Voice {
    /// English voices are narrated with the lexicon files and listed first.
    pub fn is_english(&self) -> bool {
        self.espeak_code.starts_with("en")
    }
}

/// All voices, sorted by name for binary search.
const VOICES: &[Voice] = &[
    Voice { name: "af_alloy", speaker_id: 0, espeak_code: "en-us", language: "American English" },
    Voice { name: "af_aoede", speaker_id: 1, espeak_code: "en-us", language: "American English" },
    Voice { name: "af_bella", speaker_id: 2, espeak_code: "en-us", language: "American English" },
    Voice { name: "af_heart", speaker_id: 3, espeak_code: "en-us", language: "American English" },
    Voice { name: "af_jessica", speaker_id: 4, espeak_code: "en-us", language: "American English" },
    Voice { name: "af_kore", speaker_id: 5, espeak_code: "en-us", language: "American English" },
    Voice { name: "af_nicole", speaker_id: 6, espeak_code: "en-us", language: "American English" },
    Voice { name: "af_nova", speaker_id: 7, espeak_code: "en-us", language: "American English" },
    Voice { name: "af_river", speaker_id: 8, espeak_code: "en-us", language: "American English" },
    Voice { name: "af_sarah", speaker_id: 9, espeak_code: "en-us", language: "American English" },
    Voice { name: "af_sky", speaker_id: 10, espeak_code: "en-us", language: "American English" },
    Voice { name: "am_adam", speaker_id: 11, espeak_code: "en-us", language: "American English" },
    Voice { name: "am_echo", speaker_id: 12, espeak_code: "en-us", language: "American English" },
    Voice { name: "am_eric", speaker_id: 13, espeak_code: "en-us", language: "American English" },
    Voice { name: "am_fenrir", speaker_id: 14, espeak_code: "en-us", language: "American English" },
    Voice { name: "am_liam", speaker_id: 15, espeak_code: "en-us", language: "American English" },
    Voice { name: "am_michael", speaker_id: 16, espeak_code: "en-us", language: "American English" },
    Voice { name: "am_onyx", speaker_id: 17, espeak_code: "en-us", language: "American English" },
    Voice { name: "am_puck", speaker_id: 18, espeak_code: "en-us", language: "American English" },
    Voice { name: "am_santa", speaker_id: 19, espeak_code: "en-us", language: "American English" },
    Voice { name: "bf_alice", speaker_id: 20, espeak_code: "en-gb", language: "British English" },
    Voice { name: "bf_emma", speaker_id: 21, espeak_code: "en-gb", language: "British English" },
    Voice { name: "bf_isabella", speaker_id: 22, espeak_code: "en-gb", language: "British English" },
    Voice { name: "bf_lily", speaker_id: 23, espeak_code: "en-gb", language: "British English" },
    Voice { name: "bm_daniel", speaker_id: 24, espeak_code: "en-gb", language: "British English" },
    Voice { name: "bm_fable", speaker_id: 25, espeak_code: "en-gb", language: "British English" },
    Voice { name: "bm_george", speaker_id: 26, espeak_code: "en-gb", language: "British English" },
    Voice { name: "bm_lewis", speaker_id: 27, espeak_code: "en-gb", language: "British English" },
    Voice { name: "ef_dora", speaker_id: 28, espeak_code: "es", language: "Spanish" },
    Voice { name: "em_alex", speaker_id: 29, espeak_code: "es", language: "Spanish" },
    Voice { name: "ff_siwis", speaker_id: 30, espeak_code: "fr-fr", language: "French" },
    Voice { name: "hf_alpha", speaker_id: 31, espeak_code: "hi", language: "Hindi" },
    Voice { name: "hf_beta", speaker_id: 32, espeak_code: "hi", language: "Hindi" },
    Voice { name: "hm_omega", speaker_id: 33, espeak_code: "hi", language: "Hindi" },
    Voice { name: "hm_psi", speaker_id: 34, espeak_code: "hi", language: "Hindi" },
    Voice { name: "if_sara", speaker_id: 35, espeak_code: "it", language: "Italian" },
    Voice { name: "im_nicola", speaker_id: 36, espeak_code: "it", language: "Italian" },
    Voice { name: "jf_alpha", speaker_id: 37, espeak_code: "ja", language: "Japanese" },
    Voice { name: "jf_gongitsune", speaker_id: 38, espeak_code: "ja", language: "Japanese" },
    Voice { name: "jf_nezumi", speaker_id: 39, espeak_code: "ja", language: "Japanese" },
    Voice { name: "jf_tebukuro", speaker_id: 40, espeak_code: "ja", language: "Japanese" },
    Voice { name: "jm_kumo", speaker_id: 41, espeak_code: "ja", language: "Japanese" },
    Voice { name: "pf_dora", speaker_id: 42, espeak_code: "pt-br", language: "Portuguese BR" },
    Voice { name: "pm_alex", speaker_id: 43, espeak_code: "pt-br", language: "Portuguese BR" },
    Voice { name: "pm_santa", speaker_id: 44, espeak_code: "pt-br", language: "Portuguese BR" },
    Voice { name: "zf_xiaobei", speaker_id: 45, espeak_code: "cmn", language: "Mandarin Chinese" },
    Voice { name: "zf_xiaoni", speaker_id: 46, espeak_code: "cmn", language: "Mandarin Chinese" },
    Voice { name: "zf_xiaoxiao", speaker_id: 47, espeak_code: "cmn", language: "Mandarin Chinese" },
    Voice { name: "zf_xiaoyi", speaker_id: 48, espeak_code: "cmn", language: "Mandarin Chinese" },
    Voice { name: "zm_yunjian", speaker_id: 49, espeak_code: "cmn", language: "Mandarin Chinese" },
    Voice { name: "zm_yunxi", speaker_id: 50, espeak_code: "cmn", language: "Mandarin Chinese" },
    Voice { name: "zm_yunxia", speaker_id: 51, espeak_code: "cmn", language: "Mandarin Chinese" },
    Voice { name: "zm_yunyang", speaker_id: 52, espeak_code: "cmn", language: "Mandarin Chinese" },
];

/// Get voice metadata by name.
pub fn get_voice(name: &str) -> Option<&'static Voice> {
    VOICES.binary_search_by_key(&name, |v| v.name).ok().map(|idx| &VOICES[idx])
}

/// Voices in selector order: English first, then alphabetical by name.
pub fn ordered_voices() -> Vec<&'static Voice> {
    let mut voices: Vec<&'static Voice> = VOICES.iter().collect();
    voices.sort_by(|a, b| b.is_english().cmp(&a.is_english()).then_with(|| a.name.cmp(b.name)));
    voices
}

/// Pick the initial narration voice from `voices`.
///
/// `preferred` matches case-insensitively as a substring of the voice name.
pub fn select_default(voices: &[&'static Voice], preferred: Option<&str>) -> Option<&'static Voice> {
    let preferred = preferred.map(str::trim).filter(|p| !p.is_empty()).map(str::to_lowercase);

    preferred
        .and_then(|p| voices.iter().find(|v| v.name.to_lowercase().contains(&p)))
        .or_else(|| voices.iter().find(|v| v.name == DEFAULT_VOICE))
        .or_else(|| voices.first())
        .copied()
}

/// Print all available voices grouped by language.
pub fn print_voices() {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  Kokoro TTS v1.0 - {} Voices", VOICES.len());
    println!("═══════════════════════════════════════════════════════════════════");

    let mut languages: Vec<&str> = Vec::new();
    for voice in ordered_voices() {
        if !languages.contains(&voice.language) {
            languages.push(voice.language);
        }
    }

    for lang in languages {
        let lang_voices: Vec<_> = ordered_voices().into_iter().filter(|v| v.language == lang).collect();

        println!("\n── {} ({} voices) ──", lang, lang_voices.len());
        println!("{:<15} {:<4} ESPEAK", "VOICE", "ID");
        println!("{}", "─".repeat(50));

        for voice in lang_voices {
            println!("{:<15} {:<4} {}", voice.name, voice.speaker_id, voice.espeak_code);
        }
    }

    println!("\n{}\n", "─".repeat(70));
    println!("Default: {}", DEFAULT_VOICE);
    println!();
    println!("Usage:");
    println!("  paper-narrator --voice af_heart play <paper-id>");
    println!();
    println!("Press 'v' during narration to cycle voices.");
}

/// Print detailed information about a specific voice.
pub fn print_voice_info(name: &str) -> anyhow::Result<()> {
    let voice = get_voice(name).ok_or_else(|| anyhow::anyhow!("Voice '{}' not found. Run with --list-voices to see available voices", name))?;

    println!();
    println!("Voice: {}", voice.name);
    println!("{}", "─".repeat(40));
    println!("Speaker ID:    {}", voice.speaker_id);
    println!("Language:      {}", voice.language);
    println!("espeak code:   {}", voice.espeak_code);
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_sorted_for_lookup() {
        assert!(VOICES.windows(2).all(|w| w[0].name < w[1].name));
        assert_eq!(get_voice("bf_emma").map(|v| v.speaker_id), Some(21));
        assert!(get_voice("nope").is_none());
    }

    #[test]
    fn test_english_voices_listed_first() {
        let voices = ordered_voices();
        let first_other = voices.iter().position(|v| !v.is_english()).unwrap();
        assert!(voices[..first_other].iter().all(|v| v.is_english()));
        assert!(voices[first_other..].iter().all(|v| !v.is_english()));
        assert!(voices[first_other..].windows(2).all(|w| w[0].name < w[1].name));
    }

    #[test]
    fn test_preferred_voice_wins() {
        let voices = ordered_voices();
        assert_eq!(select_default(&voices, Some("HEART")).map(|v| v.name), Some("af_heart"));
    }

    #[test]
    fn test_falls_back_to_model_default_then_first() {
        let voices = ordered_voices();
        assert_eq!(select_default(&voices, Some("clara canada")).map(|v| v.name), Some(DEFAULT_VOICE));
        assert_eq!(select_default(&voices, None).map(|v| v.name), Some(DEFAULT_VOICE));

        let without_default: Vec<_> = voices.iter().copied().filter(|v| v.name != DEFAULT_VOICE).collect();
        assert_eq!(select_default(&without_default, None), without_default.first().copied());
        assert_eq!(select_default(&[], Some("af_heart")), None);
    }
}
