//! Narration transitions: play, pause, advance, seek, rate and voice changes.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::state::{Cursor, NarrationSnapshot};
use crate::config::Voice;
use crate::tts::{SpeechDriver, SpeechEvent, Utterance, UtteranceId};

/// Narration session for the currently loaded paper.
///
/// Every mutation goes through here. Subscribers receive a snapshot before the
/// matching speech request is issued, so the highlighted sentence never trails
/// the audible one.
pub struct Narrator<D: SpeechDriver> {
    driver: D,
    sentences: Vec<String>,
    cursor: Cursor,
    in_flight: Option<UtteranceId>, // Utterance whose completion we are waiting for
    next_utterance: UtteranceId,
    generation: u64,
    snapshots: watch::Sender<NarrationSnapshot>,
}

impl<D: SpeechDriver> Narrator<D> {
    /// Create a stopped narrator with an empty sentence sequence.
    pub fn new(driver: D, rate: f32, voice: Option<&'static Voice>) -> Self {
        let cursor = Cursor::new(rate, voice);
        let (snapshots, _) = watch::channel(NarrationSnapshot { cursor, len: 0, generation: 0 });
        Self { driver, sentences: Vec::new(), cursor, in_flight: None, next_utterance: 0, generation: 0, snapshots }
    }

    /// Receive a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<NarrationSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    #[cfg(test)]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[cfg(test)]
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Replace the sentence sequence and rewind to a stopped cursor at 0.
    pub fn load(&mut self, sentences: Vec<String>) {
        self.stop_speech();
        info!("📄 Loaded {} sentences", sentences.len());
        self.sentences = sentences;
        self.cursor.index = 0;
        self.cursor.is_playing = false;
        self.generation += 1;
        self.publish();
    }

    /// Start (or resume) narration at the cursor.
    pub fn play(&mut self) {
        if self.cursor.is_playing {
            return;
        }
        self.cursor.is_playing = true;

        if self.driver.is_paused() {
            debug!("Resuming paused speech engine");
            self.driver.resume();
            self.publish();
        } else {
            self.speak_current();
        }
    }

    /// Stop narration, keeping the current sentence index.
    pub fn pause(&mut self) {
        if !self.cursor.is_playing {
            return;
        }
        self.cursor.is_playing = false;
        self.stop_speech();
        self.publish();
    }

    pub fn toggle(&mut self) {
        if self.cursor.is_playing { self.pause() } else { self.play() }
    }

    /// Jump to sentence `index` (clamped to the sequence), restarting speech when playing.
    pub fn seek(&mut self, index: usize) {
        let index = index.min(self.sentences.len().saturating_sub(1));
        self.cursor.index = index;
        self.restart_or_publish();
    }

    /// Move one sentence forward. No-op on the last sentence.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) {
        if self.cursor.index + 1 < self.sentences.len() {
            self.seek(self.cursor.index + 1);
        }
    }

    /// Move one sentence back. No-op on the first sentence.
    pub fn previous(&mut self) {
        if self.cursor.index > 0 {
            self.seek(self.cursor.index - 1);
        }
    }

    /// Change the speech-rate multiplier; takes effect immediately when playing.
    pub fn set_rate(&mut self, rate: f32) {
        self.cursor.rate = rate;
        self.restart_or_publish();
    }

    /// Change the narration voice; takes effect immediately when playing.
    pub fn set_voice(&mut self, voice: Option<&'static Voice>) {
        self.cursor.voice = voice;
        self.restart_or_publish();
    }

    /// Apply a completion or failure reported by the speech driver.
    ///
    /// Events for anything other than the utterance in flight are stale and ignored.
    pub fn handle_speech_event(&mut self, event: SpeechEvent) {
        if self.in_flight != Some(event.id) {
            debug!("Ignoring stale speech event for utterance {}", event.id);
            return;
        }
        self.in_flight = None;

        match event.outcome {
            Ok(()) => {
                if !self.cursor.is_playing {
                    return;
                }
                self.cursor.index += 1;
                self.speak_current();
            }
            Err(e) => {
                warn!("❌ Speech error on sentence {}: {}", self.cursor.index + 1, e);
                self.cursor.is_playing = false;
                self.publish();
            }
        }
    }

    /// Speak `sentences[index]`, or stop at the end sentinel.
    fn speak_current(&mut self) {
        let Some(text) = self.sentences.get(self.cursor.index) else {
            self.cursor.index = self.sentences.len();
            self.cursor.is_playing = false;
            info!("✅ Reached the end of the paper");
            self.publish();
            return;
        };

        let utterance = Utterance { id: self.next_utterance, text: text.clone(), rate: self.cursor.rate, voice: self.cursor.voice };
        self.next_utterance += 1;
        self.in_flight = Some(utterance.id);

        self.publish();
        debug!("🔊 Speaking sentence {}/{}", self.cursor.index + 1, self.sentences.len());
        self.driver.speak(utterance);
    }

    fn restart_or_publish(&mut self) {
        if self.cursor.is_playing {
            self.stop_speech();
            self.speak_current();
        } else {
            self.publish();
        }
    }

    fn stop_speech(&mut self) {
        self.in_flight = None;
        self.driver.cancel();
    }

    fn publish(&self) {
        self.snapshots.send_replace(NarrationSnapshot { cursor: self.cursor, len: self.sentences.len(), generation: self.generation });
    }
}
