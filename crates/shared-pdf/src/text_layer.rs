//! Positioned text layer for one page
//!
//! Holds already-extracted words with their page-space bounding boxes and
//! answers phrase searches with one rectangle per line a match covers.

use serde::{Deserialize, Serialize};
use shared_types::{PageSearch, Rect, SearchError, SearchFlags};

/// A positioned word in page coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub bbox: Rect,
    /// Line number within the page, in reading order
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    pub spans: Vec<TextSpan>,
}

/// Fixed-grid layout used to build a layer from plain text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceLayout {
    pub left: f64,
    pub top: f64,
    pub char_width: f64,
    pub line_height: f64,
    pub font_size: f64,
}

impl Default for MonospaceLayout {
    fn default() -> Self {
        Self {
            left: 72.0,
            top: 72.0,
            char_width: 6.0,
            line_height: 14.0,
            font_size: 12.0,
        }
    }
}

/// One character of the searchable stream
#[derive(Debug, Clone, Copy)]
struct StreamChar {
    ch: char,
    /// Span index and character offset inside it; `None` for separators
    origin: Option<(usize, usize)>,
    /// Line-end hyphen that a needle may skip
    optional: bool,
}

impl TextLayer {
    pub fn new(spans: Vec<TextSpan>) -> Self {
        Self { spans }
    }

    /// Lay out `text` on a fixed grid: one span per word, one line per
    /// text line. Blank lines keep their vertical space.
    pub fn monospace(text: &str, layout: &MonospaceLayout) -> Self {
        let mut spans = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let y0 = layout.top + line_no as f64 * layout.line_height;
            let mut word_start: Option<usize> = None;
            let mut word = String::new();
            // Trailing sentinel space flushes the last word
            for (col, ch) in line.chars().chain(std::iter::once(' ')).enumerate() {
                if ch.is_whitespace() {
                    if let Some(start) = word_start.take() {
                        let len = word.chars().count();
                        let x0 = layout.left + start as f64 * layout.char_width;
                        spans.push(TextSpan {
                            text: std::mem::take(&mut word),
                            bbox: Rect::new(
                                x0,
                                y0,
                                x0 + len as f64 * layout.char_width,
                                y0 + layout.font_size,
                            ),
                            line: line_no,
                        });
                    }
                } else {
                    word_start.get_or_insert(col);
                    word.push(ch);
                }
            }
        }
        Self { spans }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Plain text of the page: words joined by spaces, lines by newlines
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut last_line = None;
        for span in self.ordered() {
            match last_line {
                Some(line) if line != span.line => out.push('\n'),
                Some(_) => out.push(' '),
                None => {}
            }
            out.push_str(&span.text);
            last_line = Some(span.line);
        }
        out
    }

    fn ordered(&self) -> Vec<&TextSpan> {
        let mut spans: Vec<&TextSpan> = self
            .spans
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .collect();
        spans.sort_by(|a, b| a.line.cmp(&b.line).then(a.bbox.x0.total_cmp(&b.bbox.x0)));
        spans
    }

    fn ordered_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.spans.len())
            .filter(|&i| !self.spans[i].text.trim().is_empty())
            .collect();
        indices.sort_by(|&a, &b| {
            let (a, b) = (&self.spans[a], &self.spans[b]);
            a.line.cmp(&b.line).then(a.bbox.x0.total_cmp(&b.bbox.x0))
        });
        indices
    }

    /// Build the character stream the needle is matched against
    fn stream(&self, flags: SearchFlags) -> Vec<StreamChar> {
        let order = self.ordered_indices();
        let mut stream = Vec::new();

        for (k, &si) in order.iter().enumerate() {
            let span = &self.spans[si];
            let chars: Vec<char> = span.text.trim().chars().collect();
            let next = order.get(k + 1).map(|&n| &self.spans[n]);
            let line_break = next.is_some_and(|n| n.line != span.line);
            let soft_hyphen =
                flags.hyphen_tolerant && line_break && chars.len() > 1 && chars.last() == Some(&'-');

            for (offset, &c) in chars.iter().enumerate() {
                let optional = soft_hyphen && offset == chars.len() - 1;
                push_char(&mut stream, c, Some((si, offset)), optional, flags);
            }
            if next.is_some() && !soft_hyphen {
                push_char(&mut stream, ' ', None, false, flags);
            }
        }
        stream
    }

    /// Per-line rectangles covering the matched stream characters
    fn rects_for(&self, matched: &[StreamChar]) -> Vec<Rect> {
        let mut rects: Vec<(usize, Rect)> = Vec::new();
        for sc in matched {
            let Some((si, offset)) = sc.origin else {
                continue;
            };
            let span = &self.spans[si];
            let char_rect = char_box(span, offset);
            match rects.last_mut() {
                Some((line, rect)) if *line == span.line => *rect = rect.union(&char_rect),
                _ => rects.push((span.line, char_rect)),
            }
        }
        rects.into_iter().map(|(_, rect)| rect).collect()
    }
}

fn push_char(
    stream: &mut Vec<StreamChar>,
    c: char,
    origin: Option<(usize, usize)>,
    optional: bool,
    flags: SearchFlags,
) {
    if flags.case_insensitive {
        for lc in c.to_lowercase() {
            stream.push(StreamChar {
                ch: lc,
                origin,
                optional,
            });
        }
    } else {
        stream.push(StreamChar {
            ch: c,
            origin,
            optional,
        });
    }
}

/// Horizontal slice of a word's box for one character, assuming even spacing
fn char_box(span: &TextSpan, offset: usize) -> Rect {
    let n = span.text.trim().chars().count().max(1) as f64;
    let width = span.bbox.width() / n;
    let x0 = span.bbox.x0 + width * offset as f64;
    Rect::new(x0, span.bbox.y0, x0 + width, span.bbox.y1)
}

/// Match `needle` at `start`; optional stream chars may be skipped.
/// Returns the end of the match (exclusive).
fn match_at(stream: &[StreamChar], start: usize, needle: &[char]) -> Option<usize> {
    let (mut i, mut j) = (start, 0);
    while j < needle.len() {
        let sc = stream.get(i)?;
        if sc.ch == needle[j] {
            j += 1;
        } else if !sc.optional {
            return None;
        }
        i += 1;
    }
    Some(i)
}

impl PageSearch for TextLayer {
    fn search(&self, needle: &str, flags: SearchFlags) -> Result<Vec<Rect>, SearchError> {
        if let Some(bad) = self.spans.iter().find(|s| !s.bbox.is_finite()) {
            return Err(SearchError::Malformed(format!(
                "span '{}' has a non-finite bounding box",
                bad.text
            )));
        }
        let needle: Vec<char> = if flags.case_insensitive {
            // Per char, as the page stream is lowered
            needle.chars().flat_map(char::to_lowercase).collect()
        } else {
            needle.chars().collect()
        };
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let stream = self.stream(flags);
        let mut rects = Vec::new();
        let mut start = 0;
        while start < stream.len() {
            if stream[start].optional {
                start += 1;
                continue;
            }
            match match_at(&stream, start, &needle) {
                Some(end) => {
                    rects.extend(self.rects_for(&stream[start..end]));
                    start = end;
                }
                None => start += 1,
            }
        }
        Ok(rects)
    }
}
