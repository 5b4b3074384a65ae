//! Geometry reconstructor: positioned words -> ordered logical lines.
//!
//! # Pipeline
//!
//! ```text
//! words (or glyphs) → rows by y → column split from date tokens
//!   → segments by x gap → left / right partition → left lines, then right lines
//! ```
//!
//! The statement prints two columns side by side, so raw reading order
//! interleaves them. Each page is emitted as its whole left column top to
//! bottom followed by its whole right column.

use fatura_core::{Column, LogicalLine, PageGeometry, ParserConfig, PositionedChar, PositionedWord};
use tracing::debug;

use crate::patterns::{date_token_re, leading_value_re, value_only_re};
use crate::text::{FoldedText, collapse_whitespace};

/// Words sharing approximately the same `y_top`, ordered by x.
#[derive(Debug, Clone)]
pub struct Row {
    pub words: Vec<PositionedWord>,
    pub y_top: f32,
}

impl Row {
    fn text(&self) -> String {
        join_words(&self.words)
    }
}

/// What the reconstructor decided for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub page_index: usize,
    pub split: Option<f32>,
    pub line_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Reconstruction {
    pub lines: Vec<LogicalLine>,
    pub pages: Vec<PageLayout>,
}

impl Reconstruction {
    pub fn has_split(&self) -> bool {
        self.pages.iter().any(|p| p.split.is_some())
    }

    pub fn split_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.split.is_some()).count()
    }
}

/// Rebuild the ordered line stream of a document, page by page.
pub fn reconstruct(pages: &[PageGeometry], config: &ParserConfig) -> Reconstruction {
    let mut ordered: Vec<&PageGeometry> = pages.iter().collect();
    ordered.sort_by_key(|p| p.page_index);

    let mut raw = Vec::new();
    let mut layouts = Vec::with_capacity(ordered.len());

    for page in ordered {
        let words = if page.words.is_empty() {
            words_from_chars(&page.chars, config)
        } else {
            page.words.clone()
        };

        let rows = group_rows(words, config.row_y_tolerance);
        let split = detect_column_split(&rows, config.column_gap_min);
        let lines = rows_to_lines(&rows, split, page.page_index, config);

        debug!(
            page = page.page_index,
            rows = rows.len(),
            lines = lines.len(),
            split = ?split,
            "reconstructed page"
        );

        layouts.push(PageLayout {
            page_index: page.page_index,
            split,
            line_count: lines.len(),
        });
        raw.extend(lines);
    }

    Reconstruction {
        lines: clean_lines(raw),
        pages: layouts,
    }
}

/// Group words into rows: a word joins the current row while its top stays
/// within `tolerance` of the row's first word.
pub fn group_rows(mut words: Vec<PositionedWord>, tolerance: f32) -> Vec<Row> {
    words.retain(|w| !w.text.trim().is_empty());
    words.sort_by(|a, b| a.y_top.total_cmp(&b.y_top).then(a.x_left.total_cmp(&b.x_left)));

    let mut rows = Vec::new();
    let mut current: Vec<PositionedWord> = Vec::new();
    let mut current_top: Option<f32> = None;

    for word in words {
        if let Some(top) = current_top {
            if (word.y_top - top).abs() > tolerance {
                rows.push(finish_row(std::mem::take(&mut current)));
                current_top = None;
            }
        }
        if current_top.is_none() {
            current_top = Some(word.y_top);
        }
        current.push(word);
    }
    if !current.is_empty() {
        rows.push(finish_row(current));
    }

    rows
}

fn finish_row(mut words: Vec<PositionedWord>) -> Row {
    words.sort_by(|a, b| a.x_left.total_cmp(&b.x_left));
    let y_top = words.iter().map(|w| w.y_top).fold(f32::INFINITY, f32::min);
    Row { words, y_top }
}

/// Split x for a two-column page, or `None` for a single column.
///
/// Collects the x of every row that starts with a `DD/MM` token; the widest
/// gap between consecutive positions splits the page when it is at least
/// `min_gap` wide.
pub fn detect_column_split(rows: &[Row], min_gap: f32) -> Option<f32> {
    let mut starts: Vec<f32> = rows
        .iter()
        .filter_map(|row| row.words.first())
        .filter(|w| date_token_re().is_match(&w.text))
        .map(|w| w.x_left)
        .collect();

    if starts.len() < 2 {
        return None;
    }
    starts.sort_by(f32::total_cmp);

    let mut largest_gap = 0.0_f32;
    let mut split = None;
    for pair in starts.windows(2) {
        let gap = pair[1] - pair[0];
        if gap > largest_gap {
            largest_gap = gap;
            split = Some((pair[0] + pair[1]) / 2.0);
        }
    }

    if largest_gap < min_gap {
        return None;
    }
    split
}

/// Turn rows into column-tagged lines, left column first.
pub fn rows_to_lines(rows: &[Row], split: Option<f32>, page_index: usize, config: &ParserConfig) -> Vec<LogicalLine> {
    let Some(split_x) = split else {
        return rows
            .iter()
            .map(|row| (row.y_top, row.text()))
            .filter(|(_, text)| !text.is_empty())
            .map(|(y, text)| LogicalLine::new(text, Column::Unknown, page_index, y))
            .collect();
    };

    let effective_split = split_x + config.column_margin;
    let mut left: Vec<(f32, String)> = Vec::new();
    let mut right: Vec<(f32, String)> = Vec::new();

    for row in rows {
        let segments = merge_value_segments(split_segments(&row.words, config.segment_gap));

        let mut left_parts: Vec<String> = Vec::new();
        let mut right_parts: Vec<String> = Vec::new();

        for segment in &segments {
            let text = join_words(segment);
            if text.is_empty() {
                continue;
            }
            let first_x = segment[0].x_left;

            if first_x >= effective_split {
                right_parts.push(text);
                continue;
            }

            // A value that opens a left segment closes the left column's line;
            // whatever follows it belongs to the right column.
            match leading_value_re().find(&text) {
                Some(m) => {
                    left_parts.push(m.as_str().trim().to_string());
                    let rest = text[m.end()..].trim();
                    if !rest.is_empty() {
                        right_parts.push(rest.to_string());
                    }
                }
                None => left_parts.push(text),
            }
        }

        if !left_parts.is_empty() {
            left.push((row.y_top, left_parts.join(" ")));
        }
        if !right_parts.is_empty() {
            right.push((row.y_top, right_parts.join(" ")));
        }
    }

    left.sort_by(|a, b| a.0.total_cmp(&b.0));
    right.sort_by(|a, b| a.0.total_cmp(&b.0));

    left.into_iter()
        .map(|(y, text)| LogicalLine::new(text, Column::Left, page_index, y))
        .chain(right.into_iter().map(|(y, text)| LogicalLine::new(text, Column::Right, page_index, y)))
        .collect()
}

/// Break a row wherever the horizontal gap between words exceeds `gap`.
fn split_segments(words: &[PositionedWord], gap: f32) -> Vec<Vec<PositionedWord>> {
    let mut segments = Vec::new();
    let mut current: Vec<PositionedWord> = Vec::new();
    let mut previous_right: Option<f32> = None;

    for word in words {
        if let Some(prev) = previous_right {
            if !current.is_empty() && word.x_left - prev > gap {
                segments.push(std::mem::take(&mut current));
            }
        }
        previous_right = Some(word.x_right);
        current.push(word.clone());
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Keep monetary values with the segment they terminate.
fn merge_value_segments(segments: Vec<Vec<PositionedWord>>) -> Vec<Vec<PositionedWord>> {
    let mut merged: Vec<Vec<PositionedWord>> = Vec::new();

    for mut segment in segments {
        // "150,00 12/03 LOJA": the value ends the previous segment
        if segment.len() > 1
            && value_only_re().is_match(&segment[0].text)
            && date_token_re().is_match(&segment[1].text)
        {
            if let Some(last) = merged.last_mut() {
                last.push(segment.remove(0));
            }
        }

        let text = join_words(&segment);
        if text.is_empty() {
            continue;
        }

        match merged.last_mut() {
            Some(last) if value_only_re().is_match(&text) => last.extend(segment),
            _ => merged.push(segment),
        }
    }

    merged
}

/// Collapse whitespace, drop pagination rows and glue wrapped values onto
/// the line they belong to.
pub fn clean_lines(lines: Vec<LogicalLine>) -> Vec<LogicalLine> {
    let mut cleaned: Vec<LogicalLine> = Vec::with_capacity(lines.len());

    for mut line in lines {
        let text = collapse_whitespace(&line.text);
        if text.is_empty() {
            continue;
        }
        if FoldedText::new(&text).starts_with("continua") {
            continue;
        }

        match cleaned.last_mut() {
            Some(previous) if value_only_re().is_match(&text) => {
                previous.text.push(' ');
                previous.text.push_str(&text);
            }
            _ => {
                line.text = text;
                cleaned.push(line);
            }
        }
    }

    cleaned
}

/// Rebuild word tokens from glyph boxes for pages without word extraction.
pub fn words_from_chars(chars: &[PositionedChar], config: &ParserConfig) -> Vec<PositionedWord> {
    let mut sorted: Vec<&PositionedChar> = chars.iter().collect();
    sorted.sort_by(|a, b| a.y_top.total_cmp(&b.y_top).then(a.x_left.total_cmp(&b.x_left)));

    let mut rows: Vec<Vec<&PositionedChar>> = Vec::new();
    let mut current_top: Option<f32> = None;
    for ch in sorted {
        match (current_top, rows.last_mut()) {
            (Some(top), Some(row)) if (ch.y_top - top).abs() <= config.row_y_tolerance => row.push(ch),
            _ => {
                current_top = Some(ch.y_top);
                rows.push(vec![ch]);
            }
        }
    }

    let mut words = Vec::new();
    for mut row in rows {
        row.sort_by(|a, b| a.x_left.total_cmp(&b.x_left));
        let mut pending: Option<PositionedWord> = None;

        for ch in row {
            if ch.ch.is_whitespace() {
                words.extend(pending.take());
                continue;
            }
            match pending.as_mut() {
                Some(word) if ch.x_left - word.x_right <= config.char_word_gap => {
                    word.text.push(ch.ch);
                    word.x_right = ch.x_right;
                    word.y_top = word.y_top.min(ch.y_top);
                }
                _ => {
                    words.extend(pending.take());
                    pending = Some(PositionedWord::new(
                        ch.ch.to_string(),
                        ch.x_left,
                        ch.x_right,
                        ch.y_top,
                        ch.page_index,
                    ));
                }
            }
        }
        words.extend(pending);
    }

    words
}

fn join_words(words: &[PositionedWord]) -> String {
    words
        .iter()
        .map(|w| w.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
