//! Terminal-independent layout: sentence wrapping, scrolling and the progress bar.

/// One wrapped screen row and the sentence it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub sentence: usize,
    pub text: String,
}

/// Wrap each sentence to `width` columns. Every sentence starts on a new row.
pub fn layout_sentences(sentences: &[String], width: usize) -> Vec<Row> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for (sentence, text) in sentences.iter().enumerate() {
        let mut line = String::new();
        let mut line_len = 0;

        for word in text.split_whitespace() {
            let word_len = word.chars().count();
            if line_len > 0 && line_len + 1 + word_len > width {
                rows.push(Row { sentence, text: std::mem::take(&mut line) });
                line_len = 0;
            }

            if word_len > width {
                // Hard-break words that cannot fit on any row
                let chars: Vec<char> = word.chars().collect();
                for chunk in chars.chunks(width) {
                    if line_len > 0 {
                        rows.push(Row { sentence, text: std::mem::take(&mut line) });
                    }
                    line = chunk.iter().collect();
                    line_len = chunk.len();
                }
                continue;
            }

            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.push_str(word);
            line_len += word_len;
        }

        if line_len > 0 {
            rows.push(Row { sentence, text: line });
        }
    }

    rows
}

/// First visible row so that sentence `active` sits in the middle of a `height`-row viewport.
///
/// Past the last sentence the view stays scrolled to the bottom.
pub fn scroll_offset(rows: &[Row], active: usize, height: usize) -> usize {
    let max_offset = rows.len().saturating_sub(height);
    let first = rows.iter().position(|r| r.sentence == active);
    let last = rows.iter().rposition(|r| r.sentence == active);

    match (first, last) {
        (Some(first), Some(last)) => ((first + last) / 2).saturating_sub(height / 2).min(max_offset),
        _ => max_offset,
    }
}

/// Rendered progress control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressBar {
    pub bar: String,
    pub label: String,
}

/// Progress over the discrete range `[0, len-1]`, labelled `"<i+1> / <n> sent"`.
pub fn progress_bar(index: usize, len: usize, width: usize) -> ProgressBar {
    let position = (index + 1).min(len);
    let label = format!("{} / {} sent", position, len);
    let bar_width = progress_bar_width(len, width);

    let head = head_column(index, len, bar_width);
    let bar = (0..bar_width)
        .map(|col| match head {
            Some(head) if col < head => '━',
            Some(head) if col == head => '⏺',
            _ => '─',
        })
        .collect();

    ProgressBar { bar, label }
}

/// Width of the bar part of [`progress_bar`], leaving room for the widest label.
pub fn progress_bar_width(len: usize, width: usize) -> usize {
    let widest_label = format!("{len} / {len} sent").chars().count();
    width.saturating_sub(widest_label + 1)
}

/// Sentence selected by clicking `offset` columns into a bar `bar_width` wide.
pub fn progress_index(offset: usize, bar_width: usize, len: usize) -> usize {
    if len <= 1 || bar_width <= 1 {
        return 0;
    }
    let offset = offset.min(bar_width - 1);
    let index = (offset * (len - 1) + (bar_width - 1) / 2) / (bar_width - 1);
    index.min(len - 1)
}

fn head_column(index: usize, len: usize, bar_width: usize) -> Option<usize> {
    if len == 0 || bar_width == 0 {
        return None;
    }
    if len == 1 {
        return Some(0);
    }
    let index = index.min(len - 1);
    Some(index * (bar_width - 1) / (len - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_each_sentence_starts_a_row() {
        let rows = layout_sentences(&sentences(&["One two.", "Three."]), 40);
        assert_eq!(rows, vec![Row { sentence: 0, text: "One two.".into() }, Row { sentence: 1, text: "Three.".into() }]);
    }

    #[test]
    fn test_wrapping_keeps_sentence_index() {
        let rows = layout_sentences(&sentences(&["alpha beta gamma delta", "end."]), 11);
        let texts: Vec<_> = rows.iter().map(|r| (r.sentence, r.text.as_str())).collect();
        assert_eq!(texts, [(0, "alpha beta"), (0, "gamma delta"), (1, "end.")]);
        assert!(rows.iter().all(|r| r.text.chars().count() <= 11));
    }

    #[test]
    fn test_long_words_are_hard_broken() {
        let rows = layout_sentences(&sentences(&["a abcdefghij"]), 4);
        let texts: Vec<_> = rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["a", "abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_scroll_centers_active_sentence() {
        let texts: Vec<String> = (0..20).map(|i| format!("Sentence {i}.")).collect();
        let rows = layout_sentences(&texts, 80);

        assert_eq!(scroll_offset(&rows, 0, 5), 0);
        assert_eq!(scroll_offset(&rows, 10, 5), 8);
        assert_eq!(scroll_offset(&rows, 19, 5), 15);
        // End sentinel stays at the bottom
        assert_eq!(scroll_offset(&rows, 20, 5), 15);
        // Everything fits
        assert_eq!(scroll_offset(&rows, 10, 50), 0);
    }

    #[test]
    fn test_progress_label_and_head() {
        let progress = progress_bar(0, 12, 30);
        assert_eq!(progress.label, "1 / 12 sent");
        assert!(progress.bar.starts_with('⏺'));

        let progress = progress_bar(11, 12, 30);
        assert_eq!(progress.label, "12 / 12 sent");
        assert!(progress.bar.ends_with('⏺'));

        // End sentinel reports the last sentence
        assert_eq!(progress_bar(12, 12, 30).label, "12 / 12 sent");
        assert_eq!(progress_bar(0, 0, 30).label, "0 / 0 sent");
    }

    #[test]
    fn test_progress_click_maps_proportionally() {
        assert_eq!(progress_index(0, 11, 101), 0);
        assert_eq!(progress_index(5, 11, 101), 50);
        assert_eq!(progress_index(10, 11, 101), 100);
        assert_eq!(progress_index(40, 11, 101), 100);
        assert_eq!(progress_index(3, 11, 1), 0);
    }

    #[test]
    fn test_progress_click_inverts_head_position() {
        let len = 7;
        let width = 40;
        let bar_width = progress_bar_width(len, width);
        for index in 0..len {
            let head = progress_bar(index, len, width).bar.chars().position(|c| c == '⏺').unwrap();
            assert_eq!(progress_index(head, bar_width, len), index);
        }
    }
}
