//! Interactive narration session: one event loop over speech, input and state changes.

use std::ops::ControlFlow;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::UserCommand;
use crate::config::{SPEECH_RATES, Voice};
use crate::display::Display;
use crate::narration::{NarrationSnapshot, Narrator};
use crate::tts::{SpeechDriver, SpeechEvent};

/// Couples a narrator with a display and routes user commands to it.
pub struct Session<D: SpeechDriver, V: Display> {
    narrator: Narrator<D>,
    display: V,
    voices: Vec<&'static Voice>,
    rendered_generation: Option<u64>,
}

impl<D: SpeechDriver, V: Display> Session<D, V> {
    /// `voices` is the cycling order for voice changes.
    pub fn new(narrator: Narrator<D>, display: V, voices: Vec<&'static Voice>) -> Self {
        Self { narrator, display, voices, rendered_generation: None }
    }

    /// Run until the user quits or Ctrl+C is received. Speech is canceled on exit.
    pub async fn run(
        &mut self,
        mut speech_events: mpsc::UnboundedReceiver<SpeechEvent>,
        mut commands: mpsc::UnboundedReceiver<UserCommand>,
        autoplay: bool,
    ) -> Result<()> {
        let mut snapshots = self.narrator.subscribe();
        let initial = *snapshots.borrow_and_update();
        self.refresh(initial)?;

        if autoplay {
            self.narrator.play();
        }

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                Some(event) = speech_events.recv() => {
                    self.narrator.handle_speech_event(event);
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("Input channel closed");
                        break;
                    };
                    if self.apply(command)?.is_break() {
                        break;
                    }
                }
                Ok(()) = snapshots.changed() => {
                    let snapshot = *snapshots.borrow_and_update();
                    self.refresh(snapshot)?;
                }
                _ = &mut ctrl_c => {
                    info!("Received Ctrl+C, stopping narration");
                    break;
                }
            }
        }

        self.narrator.pause();
        Ok(())
    }

    /// Apply one user command to the narration.
    pub fn apply(&mut self, command: UserCommand) -> Result<ControlFlow<()>> {
        let cursor = self.narrator.cursor();
        match command {
            UserCommand::TogglePlay => self.narrator.toggle(),
            UserCommand::Next => self.narrator.next(),
            UserCommand::Previous => self.narrator.previous(),
            UserCommand::Jump(delta) => self.narrator.seek(cursor.index.saturating_add_signed(delta)),
            UserCommand::First => self.narrator.seek(0),
            UserCommand::Last => self.narrator.seek(usize::MAX),
            UserCommand::FasterRate => self.step_rate(1),
            UserCommand::SlowerRate => self.step_rate(-1),
            UserCommand::NextVoice => self.step_voice(1),
            UserCommand::PreviousVoice => self.step_voice(-1),
            UserCommand::Click { column, row } => {
                if let Some(index) = self.display.sentence_at(column, row).or_else(|| self.display.progress_at(column, row)) {
                    self.narrator.seek(index);
                }
            }
            UserCommand::Resize { columns, rows } => self.display.resize(columns, rows)?,
            UserCommand::Quit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Bring the display in line with a snapshot.
    fn refresh(&mut self, snapshot: NarrationSnapshot) -> Result<()> {
        if self.rendered_generation != Some(snapshot.generation) {
            self.display.render(self.narrator.sentences())?;
            self.rendered_generation = Some(snapshot.generation);
        }
        self.display.highlight(snapshot.cursor.index)?;
        self.display.update_progress(snapshot.cursor.index, snapshot.len)?;
        self.display.update_status(&snapshot.cursor)
    }

    /// Move along the rate selector, stopping at either end.
    fn step_rate(&mut self, step: isize) {
        let current = self.narrator.cursor().rate;
        let position = SPEECH_RATES.iter().position(|rate| (rate - current).abs() < 1e-3).unwrap_or(SPEECH_RATES.len() / 2);
        let target = position.saturating_add_signed(step).min(SPEECH_RATES.len() - 1);
        if target != position {
            info!("Speech rate {}x", SPEECH_RATES[target]);
            self.narrator.set_rate(SPEECH_RATES[target]);
        }
    }

    /// Cycle through the voice list, wrapping around.
    fn step_voice(&mut self, step: isize) {
        if self.voices.is_empty() {
            return;
        }
        let current = self.narrator.cursor().voice;
        let position = current.and_then(|voice| self.voices.iter().position(|v| v.name == voice.name)).unwrap_or(0);
        let target = (position as isize + step).rem_euclid(self.voices.len() as isize) as usize;
        let voice = self.voices[target];
        info!("🗣️ Voice {}", voice.name);
        self.narrator.set_voice(Some(voice));
    }

    #[cfg(test)]
    fn narrator(&self) -> &Narrator<D> {
        &self.narrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ordered_voices;
    use crate::narration::Cursor;
    use crate::tts::testing::RecordingDriver;

    /// Display that records calls; row `r` shows sentence `r`, row 99 is the progress bar.
    #[derive(Default)]
    struct FakeDisplay {
        renders: usize,
        highlighted: Option<usize>,
        progress: Option<(usize, usize)>,
        playing: bool,
        size: Option<(u16, u16)>,
    }

    impl Display for FakeDisplay {
        fn render(&mut self, _sentences: &[String]) -> Result<()> {
            self.renders += 1;
            Ok(())
        }

        fn highlight(&mut self, index: usize) -> Result<()> {
            self.highlighted = Some(index);
            Ok(())
        }

        fn update_progress(&mut self, index: usize, len: usize) -> Result<()> {
            self.progress = Some((index, len));
            Ok(())
        }

        fn update_status(&mut self, cursor: &Cursor) -> Result<()> {
            self.playing = cursor.is_playing;
            Ok(())
        }

        fn resize(&mut self, columns: u16, rows: u16) -> Result<()> {
            self.size = Some((columns, rows));
            Ok(())
        }

        fn sentence_at(&self, _column: u16, row: u16) -> Option<usize> {
            (row < 50).then_some(row as usize)
        }

        fn progress_at(&self, column: u16, row: u16) -> Option<usize> {
            (row == 99).then_some(column as usize)
        }
    }

    fn session(count: usize) -> Session<RecordingDriver, FakeDisplay> {
        let voices = ordered_voices();
        let mut narrator = Narrator::new(RecordingDriver::default(), 1.0, Some(voices[0]));
        narrator.load((0..count).map(|i| format!("Sentence {i}.")).collect());
        Session::new(narrator, FakeDisplay::default(), voices)
    }

    #[test]
    fn test_page_jumps_clamp_to_sequence() {
        let mut session = session(25);

        session.apply(UserCommand::Jump(10)).unwrap();
        assert_eq!(session.narrator().cursor().index, 10);
        session.apply(UserCommand::Jump(10)).unwrap();
        session.apply(UserCommand::Jump(10)).unwrap();
        assert_eq!(session.narrator().cursor().index, 24);
        session.apply(UserCommand::Jump(-30)).unwrap();
        assert_eq!(session.narrator().cursor().index, 0);

        session.apply(UserCommand::Last).unwrap();
        assert_eq!(session.narrator().cursor().index, 24);
        session.apply(UserCommand::First).unwrap();
        assert_eq!(session.narrator().cursor().index, 0);
    }

    #[test]
    fn test_clicks_seek() {
        let mut session = session(40);

        session.apply(UserCommand::Click { column: 3, row: 7 }).unwrap();
        assert_eq!(session.narrator().cursor().index, 7);

        session.apply(UserCommand::Click { column: 30, row: 99 }).unwrap();
        assert_eq!(session.narrator().cursor().index, 30);

        // Neither text nor progress bar
        session.apply(UserCommand::Click { column: 3, row: 70 }).unwrap();
        assert_eq!(session.narrator().cursor().index, 30);
    }

    #[test]
    fn test_click_while_playing_restarts_speech() {
        let mut session = session(10);
        session.apply(UserCommand::TogglePlay).unwrap();
        session.apply(UserCommand::Click { column: 0, row: 4 }).unwrap();

        let driver = session.narrator().driver();
        assert_eq!(driver.last().text, "Sentence 4.");
        assert!(session.narrator().cursor().is_playing);
    }

    #[test]
    fn test_rate_steps_stop_at_ends() {
        let mut session = session(3);

        session.apply(UserCommand::FasterRate).unwrap();
        assert_eq!(session.narrator().cursor().rate, 1.25);

        for _ in 0..10 {
            session.apply(UserCommand::FasterRate).unwrap();
        }
        assert_eq!(session.narrator().cursor().rate, 2.0);

        for _ in 0..10 {
            session.apply(UserCommand::SlowerRate).unwrap();
        }
        assert_eq!(session.narrator().cursor().rate, 0.5);
    }

    #[test]
    fn test_voice_cycling_wraps() {
        let mut session = session(3);
        let voices = ordered_voices();

        session.apply(UserCommand::PreviousVoice).unwrap();
        assert_eq!(session.narrator().cursor().voice.map(|v| v.name), voices.last().map(|v| v.name));

        session.apply(UserCommand::NextVoice).unwrap();
        session.apply(UserCommand::NextVoice).unwrap();
        assert_eq!(session.narrator().cursor().voice.map(|v| v.name), Some(voices[1].name));
    }

    #[test]
    fn test_quit_breaks_and_resize_reaches_display() {
        let mut session = session(3);
        assert!(session.apply(UserCommand::Resize { columns: 80, rows: 24 }).unwrap().is_continue());
        assert_eq!(session.display.size, Some((80, 24)));
        assert!(session.apply(UserCommand::Quit).unwrap().is_break());
    }

    #[tokio::test]
    async fn test_run_processes_commands_until_quit() {
        let mut session = session(5);
        let (_speech_tx, speech_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        command_tx.send(UserCommand::Next).unwrap();
        command_tx.send(UserCommand::Next).unwrap();
        command_tx.send(UserCommand::Quit).unwrap();

        session.run(speech_rx, command_rx, true).await.unwrap();

        let narrator = session.narrator();
        assert_eq!(narrator.cursor().index, 2);
        assert!(!narrator.cursor().is_playing);
        let spoken: Vec<_> = narrator.driver().spoken.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(spoken, ["Sentence 0.", "Sentence 1.", "Sentence 2."]);
        assert_eq!(session.display.renders, 1);
    }

    #[tokio::test]
    async fn test_run_follows_speech_completions() {
        let mut session = session(2);
        let (speech_tx, speech_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        // Utterance ids start at 0 and increase by one per request
        speech_tx.send(SpeechEvent::completed(0)).unwrap();
        speech_tx.send(SpeechEvent::completed(1)).unwrap();

        let run = session.run(speech_rx, command_rx, true);
        let quit = async {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            command_tx.send(UserCommand::Quit).unwrap();
        };
        let (result, ()) = tokio::join!(run, quit);
        result.unwrap();

        assert_eq!(session.narrator().cursor().index, 2);
        assert!(!session.narrator().cursor().is_playing);
        assert_eq!(session.display.progress, Some((2, 2)));
        assert_eq!(session.display.highlighted, Some(2));
        assert!(!session.display.playing);
    }
}
