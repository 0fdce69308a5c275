//! Full-screen crossterm reading view.
//!
//! Screen layout, top to bottom: title row, sentence text, progress bar, status
//! line. Every change redraws the whole screen; papers are short enough that
//! this stays cheap.

use std::io::{self, Write};

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use super::Display;
use super::layout::{Row, layout_sentences, progress_bar, progress_bar_width, progress_index, scroll_offset};
use crate::narration::Cursor;

/// Columns left blank on each side of the text.
const MARGIN: u16 = 2;

/// Rows taken by the title, progress bar and status line.
const CHROME_ROWS: u16 = 3;

const KEY_HINTS: &str = "space play/pause  ←/→ sentence  PgUp/PgDn ±10  +/- rate  v voice  q quit";

/// Puts the terminal in raw mode on an alternate screen with mouse capture,
/// and restores it when dropped.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw terminal mode")?;
        let guard = Self;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture, Hide).context("Failed to set up the terminal")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, DisableMouseCapture, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Terminal implementation of [`Display`].
pub struct TerminalDisplay<W: Write> {
    out: W,
    title: String,
    columns: u16,
    rows: u16,
    sentences: Vec<String>,
    layout: Vec<Row>,      // Wrapped text, recomputed on render and resize
    offset: usize,         // First layout row on screen
    active: usize,
    len: usize,
    status: String,
}

impl TerminalDisplay<io::Stdout> {
    /// Display on stdout, sized to the current terminal.
    pub fn stdout(title: &str) -> Result<Self> {
        let (columns, rows) = terminal::size().context("Failed to read terminal size")?;
        Ok(Self::new(io::stdout(), title, columns, rows))
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W, title: &str, columns: u16, rows: u16) -> Self {
        Self {
            out,
            title: title.to_string(),
            columns,
            rows,
            sentences: Vec::new(),
            layout: Vec::new(),
            offset: 0,
            active: 0,
            len: 0,
            status: String::new(),
        }
    }

    fn text_width(&self) -> usize {
        self.columns.saturating_sub(MARGIN * 2) as usize
    }

    fn text_height(&self) -> usize {
        self.rows.saturating_sub(CHROME_ROWS) as usize
    }

    fn progress_row(&self) -> u16 {
        self.rows.saturating_sub(2)
    }

    fn bar_width(&self) -> usize {
        progress_bar_width(self.len, self.columns.saturating_sub(MARGIN * 2) as usize)
    }

    fn relayout(&mut self) {
        self.layout = layout_sentences(&self.sentences, self.text_width());
        self.offset = scroll_offset(&self.layout, self.active, self.text_height());
    }

    fn draw(&mut self) -> Result<()> {
        let width = self.columns as usize;
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;

        let title: String = self.title.chars().take(width).collect();
        queue!(self.out, SetAttribute(Attribute::Bold), Print(title), SetAttribute(Attribute::Reset))?;

        for (screen_row, row) in self.layout.iter().skip(self.offset).take(self.text_height()).enumerate() {
            queue!(self.out, MoveTo(MARGIN, screen_row as u16 + 1))?;
            if row.sentence == self.active {
                queue!(self.out, SetAttribute(Attribute::Reverse), Print(&row.text), SetAttribute(Attribute::Reset))?;
            } else {
                queue!(self.out, Print(&row.text))?;
            }
        }

        let progress = progress_bar(self.active, self.len, self.columns.saturating_sub(MARGIN * 2) as usize);
        let progress_row = self.progress_row();
        queue!(
            self.out,
            MoveTo(MARGIN, progress_row),
            SetForegroundColor(Color::Green),
            Print(&progress.bar),
            ResetColor,
            Print(" "),
            Print(&progress.label)
        )?;

        let status: String = format!("{}  {}", self.status, KEY_HINTS).chars().take(width).collect();
        queue!(self.out, MoveTo(0, self.rows.saturating_sub(1)), SetForegroundColor(Color::DarkGrey), Print(status), ResetColor)?;

        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn render(&mut self, sentences: &[String]) -> Result<()> {
        self.sentences = sentences.to_vec();
        self.len = sentences.len();
        self.active = 0;
        self.relayout();
        self.draw()
    }

    fn highlight(&mut self, index: usize) -> Result<()> {
        if index == self.active {
            return Ok(());
        }
        self.active = index;
        self.offset = scroll_offset(&self.layout, self.active, self.text_height());
        self.draw()
    }

    fn update_progress(&mut self, index: usize, len: usize) -> Result<()> {
        self.active = index;
        self.len = len;
        self.draw()
    }

    fn update_status(&mut self, cursor: &Cursor) -> Result<()> {
        let state = if cursor.is_playing { "▶ Playing" } else { "⏸ Paused" };
        let voice = cursor.voice.map(|v| v.name).unwrap_or("default voice");
        let status = format!("{}  {}x  {}", state, cursor.rate, voice);
        if status == self.status {
            return Ok(());
        }
        self.status = status;
        self.draw()
    }

    fn resize(&mut self, columns: u16, rows: u16) -> Result<()> {
        self.columns = columns;
        self.rows = rows;
        self.relayout();
        self.draw()
    }

    fn sentence_at(&self, column: u16, row: u16) -> Option<usize> {
        if row == 0 || row as usize > self.text_height() || column < MARGIN {
            return None;
        }
        let line = self.layout.get(self.offset + row as usize - 1)?;
        let end = MARGIN as usize + line.text.chars().count();
        ((column as usize) < end).then_some(line.sentence)
    }

    fn progress_at(&self, column: u16, row: u16) -> Option<usize> {
        let bar_width = self.bar_width();
        if row != self.progress_row() || column < MARGIN || (column - MARGIN) as usize >= bar_width || self.len == 0 {
            return None;
        }
        Some(progress_index((column - MARGIN) as usize, bar_width, self.len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::get_voice;

    fn display(texts: &[&str]) -> TerminalDisplay<Vec<u8>> {
        let mut display = TerminalDisplay::new(Vec::new(), "A Paper", 24, 8);
        let sentences: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        display.render(&sentences).unwrap();
        display
    }

    #[test]
    fn test_click_on_text_maps_to_sentence() {
        // 20 text columns, 5 text rows
        let display = display(&["First sentence here.", "Second one is a bit longer.", "Third."]);

        assert_eq!(display.sentence_at(2, 1), Some(0));
        assert_eq!(display.sentence_at(2, 2), Some(1));
        assert_eq!(display.sentence_at(2, 3), Some(1));
        assert_eq!(display.sentence_at(2, 4), Some(2));
        // Past the end of a short row, in the margin, on the title and below the text
        assert_eq!(display.sentence_at(20, 4), None);
        assert_eq!(display.sentence_at(0, 1), None);
        assert_eq!(display.sentence_at(5, 0), None);
        assert_eq!(display.sentence_at(5, 5), None);
    }

    #[test]
    fn test_click_on_progress_bar_maps_proportionally() {
        let mut display = display(&["a.", "b.", "c.", "d.", "e."]);
        display.update_progress(0, 5).unwrap();
        let bar_width = display.bar_width();
        assert!(bar_width > 1);

        assert_eq!(display.progress_at(MARGIN, 6), Some(0));
        assert_eq!(display.progress_at(MARGIN + bar_width as u16 - 1, 6), Some(4));
        assert_eq!(display.progress_at(MARGIN, 5), None);
        assert_eq!(display.progress_at(MARGIN + bar_width as u16, 6), None);
    }

    #[test]
    fn test_highlight_scrolls_active_sentence_into_view() {
        let texts: Vec<String> = (0..30).map(|i| format!("S{i}.")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let mut display = display(&refs);

        display.highlight(20).unwrap();
        let visible: Vec<usize> = (1..=5).filter_map(|row| display.sentence_at(2, row)).collect();
        assert_eq!(visible, [18, 19, 20, 21, 22]);
    }

    #[test]
    fn test_output_contains_label_and_status() {
        let mut display = display(&["Only sentence."]);
        let cursor = Cursor { index: 0, is_playing: true, rate: 1.5, voice: get_voice("af_heart") };
        display.update_status(&cursor).unwrap();

        let output = String::from_utf8_lossy(&display.out).to_string();
        assert!(output.contains("1 / 1 sent"));
        assert!(output.contains("1.5x"));
        assert!(output.contains("af_heart"));
    }
}
