//! Speech driver: one utterance at a time, with silent cancellation.
//!
//! The narrator talks to speech engines only through [`SpeechDriver`]. Outcomes
//! come back as [`SpeechEvent`]s on an mpsc channel, tagged with the utterance
//! id so that anything belonging to a canceled utterance can be dropped.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::synthesizer::Synthesizer;
use crate::audio::{PlaybackOutcome, Player};
use crate::config::Voice;
use crate::error::NarratorError;

/// Identifier of a single speech request.
pub type UtteranceId = u64;

/// A sentence queued for synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    pub rate: f32,
    pub voice: Option<&'static Voice>,
}

/// Notification sent when an utterance finishes.
///
/// Canceled utterances never produce one.
#[derive(Debug)]
pub struct SpeechEvent {
    pub id: UtteranceId,
    pub outcome: Result<(), NarratorError>,
}

impl SpeechEvent {
    pub fn completed(id: UtteranceId) -> Self {
        Self { id, outcome: Ok(()) }
    }

    pub fn failed(id: UtteranceId, error: NarratorError) -> Self {
        Self { id, outcome: Err(error) }
    }
}

/// Abstraction over a text-to-speech engine.
pub trait SpeechDriver {
    /// Start speaking. Any utterance still in flight is canceled first.
    fn speak(&mut self, utterance: Utterance);

    /// Stop the current utterance without reporting completion or failure.
    fn cancel(&mut self);

    /// Whether the engine is holding a paused utterance that can be resumed.
    fn is_paused(&self) -> bool {
        false
    }

    /// Continue a paused utterance.
    fn resume(&mut self) {}
}

/// Speech driver backed by Kokoro synthesis and the cpal output player.
pub struct KokoroSpeech {
    synthesizer: Arc<Mutex<Synthesizer>>,   // Kokoro engine (one synthesis at a time)
    player: Arc<Player>,                    // Audio output
    playback_lock: Arc<Mutex<()>>,          // Serializes playback between utterances
    events: mpsc::UnboundedSender<SpeechEvent>,
    current: Option<CancellationToken>,     // Token of the utterance in flight
}

impl KokoroSpeech {
    /// Create a driver that reports outcomes on `events`.
    pub fn new(synthesizer: Synthesizer, player: Player, events: mpsc::UnboundedSender<SpeechEvent>) -> Self {
        Self {
            synthesizer: Arc::new(Mutex::new(synthesizer)),
            player: Arc::new(player),
            playback_lock: Arc::new(Mutex::new(())),
            events,
            current: None,
        }
    }
}

impl SpeechDriver for KokoroSpeech {
    fn speak(&mut self, utterance: Utterance) {
        self.cancel();

        let token = CancellationToken::new();
        self.current = Some(token.clone());

        let synthesizer = self.synthesizer.clone();
        let player = self.player.clone();
        let playback_lock = self.playback_lock.clone();
        let events = self.events.clone();

        tokio::task::spawn_blocking(move || {
            let id = utterance.id;
            let samples = {
                let mut synth = synthesizer.lock();
                if token.is_cancelled() {
                    return;
                }
                synth.synthesize(&utterance.text, utterance.rate, utterance.voice)
            };

            let samples = match samples {
                Ok(samples) => samples,
                Err(e) => {
                    if !token.is_cancelled() {
                        error!("❌ TTS error for utterance {}: {:#}", id, e);
                        let _ = events.send(SpeechEvent::failed(id, NarratorError::Speech(format!("{e:#}"))));
                    }
                    return;
                }
            };

            // Wait for the previous utterance to drain out of the speaker
            let _playing = playback_lock.lock();
            if token.is_cancelled() {
                debug!("Utterance {} canceled before playback", id);
                return;
            }

            let outcome = player.play(&samples);
            if token.is_cancelled() {
                debug!("Utterance {} canceled during playback", id);
                return;
            }

            let event = match outcome {
                PlaybackOutcome::Completed => SpeechEvent::completed(id),
                PlaybackOutcome::Interrupted => return,
                PlaybackOutcome::TimedOut => SpeechEvent::failed(id, NarratorError::Speech("playback timed out".to_string())),
            };
            if events.send(event).is_err() {
                debug!("Speech event channel closed");
            }
        });
    }

    fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
            self.player.interrupt();
        }
    }
}

impl Drop for KokoroSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Driver that records requests instead of producing sound.
    #[derive(Default)]
    pub struct RecordingDriver {
        pub spoken: Vec<Utterance>,
        pub cancels: usize,
        pub paused: bool,
        pub resumes: usize,
    }

    impl RecordingDriver {
        pub fn last(&self) -> &Utterance {
            self.spoken.last().expect("nothing was spoken")
        }
    }

    impl SpeechDriver for RecordingDriver {
        fn speak(&mut self, utterance: Utterance) {
            self.spoken.push(utterance);
        }

        fn cancel(&mut self) {
            self.cancels += 1;
        }

        fn is_paused(&self) -> bool {
            self.paused
        }

        fn resume(&mut self) {
            self.paused = false;
            self.resumes += 1;
        }
    }
}
