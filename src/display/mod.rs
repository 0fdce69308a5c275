//! Reading view: the sentence list, the highlighted sentence and progress.
//!
//! The session pushes narration snapshots into a [`Display`]; the display
//! answers hit tests so that clicks can be turned back into seeks.

mod layout;
mod terminal;

pub use terminal::{TerminalDisplay, TerminalGuard};

use anyhow::Result;

use crate::narration::Cursor;

/// Something that can show a narrated paper.
pub trait Display {
    /// Lay out a freshly loaded sentence sequence.
    fn render(&mut self, sentences: &[String]) -> Result<()>;

    /// Mark sentence `index` as the active one and scroll it into view.
    fn highlight(&mut self, index: usize) -> Result<()>;

    fn update_progress(&mut self, index: usize, len: usize) -> Result<()>;

    /// Show play state, rate and voice.
    fn update_status(&mut self, cursor: &Cursor) -> Result<()>;

    /// Viewport size changed.
    fn resize(&mut self, columns: u16, rows: u16) -> Result<()>;

    /// Sentence shown at a screen cell, if any.
    fn sentence_at(&self, column: u16, row: u16) -> Option<usize>;

    /// Sentence selected by a click on the progress bar, if the cell is on it.
    fn progress_at(&self, column: u16, row: u16) -> Option<usize>;
}
