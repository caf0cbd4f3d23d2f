//! Write highlights and summary pages into PDF documents

use crate::coords::{page_to_pdf, quad_points, LETTER_MEDIA_BOX};
use crate::error::PdfAnnotateError;
use crate::operations::{AnnotationLog, AnnotationOp};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use shared_types::{AnnotationSink, HighlightAction, SinkError};
use tracing::{debug, warn};

const SUMMARY_FONT: &[u8] = b"F1";
const SUMMARY_FONT_SIZE: i64 = 11;
const SUMMARY_LEADING: i64 = 14;
const SUMMARY_MARGIN: f64 = 72.0;
/// Characters per summary line before wrapping
const SUMMARY_WRAP: usize = 90;

/// A loaded document that annotations are written into
pub struct PdfAnnotator {
    doc: Document,
    pages: Vec<ObjectId>,
}

impl PdfAnnotator {
    pub fn load(pdf_bytes: &[u8]) -> Result<Self, PdfAnnotateError> {
        let doc =
            Document::load_mem(pdf_bytes).map_err(|e| PdfAnnotateError::ParseError(e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: Document) -> Self {
        let pages = doc.get_pages().into_values().collect();
        Self { doc, pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn save(&mut self) -> Result<Vec<u8>, PdfAnnotateError> {
        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| PdfAnnotateError::OperationError(e.to_string()))?;
        Ok(output)
    }

    /// Add a Highlight annotation for `action` to its page
    pub fn add_highlight(&mut self, action: &HighlightAction) -> Result<ObjectId, PdfAnnotateError> {
        let page_id = *self
            .pages
            .get(action.page_index)
            .ok_or(PdfAnnotateError::PageNotFound(action.page_index))?;
        if !action.rect.is_finite() {
            return Err(PdfAnnotateError::OperationError(format!(
                "non-finite highlight rectangle for '{}'",
                action.request_id
            )));
        }

        let pdf_rect = page_to_pdf(&action.rect, self.media_box(page_id));
        let color = action.color;

        let mut annot = Dictionary::new();
        annot.set("Type", Object::Name(b"Annot".to_vec()));
        annot.set("Subtype", Object::Name(b"Highlight".to_vec()));
        annot.set("Rect", real_array(&pdf_rect));
        annot.set("QuadPoints", real_array(&quad_points(pdf_rect)));
        annot.set(
            "C",
            Object::Array(vec![
                Object::Real(color.r),
                Object::Real(color.g),
                Object::Real(color.b),
            ]),
        );
        annot.set("CA", Object::Real(action.opacity));
        annot.set("T", text_string(&action.title));
        annot.set("Contents", text_string(&action.comment));
        annot.set("NM", text_string(&action.request_id));

        let annot_id = self.doc.add_object(Object::Dictionary(annot));
        add_annotation_to_page(&mut self.doc, page_id, annot_id)?;
        debug!(
            request = %action.request_id,
            page = action.page_index,
            "Added highlight annotation"
        );
        Ok(annot_id)
    }

    /// Append one page of plain text at the end of the document.
    ///
    /// Long lines wrap; text that does not fit on the page is cut off with
    /// a trailing marker.
    pub fn append_text_page(&mut self, text: &str) -> Result<ObjectId, PdfAnnotateError> {
        let pages_id = pages_root(&self.doc)?;
        let media_box = self
            .pages
            .last()
            .map(|&id| self.media_box(id))
            .unwrap_or(LETTER_MEDIA_BOX);
        let [llx, lly, _urx, ury] = media_box;

        let usable = (ury - lly - 2.0 * SUMMARY_MARGIN).max(SUMMARY_LEADING as f64);
        let max_lines = (usable / SUMMARY_LEADING as f64).floor() as usize;
        let lines = fit_lines(&wrap_lines(text, SUMMARY_WRAP), max_lines);

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(SUMMARY_FONT.to_vec()), Object::Integer(SUMMARY_FONT_SIZE)],
            ),
            Operation::new("TL", vec![Object::Integer(SUMMARY_LEADING)]),
            Operation::new(
                "Td",
                vec![
                    Object::Real((llx + SUMMARY_MARGIN) as f32),
                    Object::Real((ury - SUMMARY_MARGIN) as f32),
                ],
            ),
        ];
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(latin1(line), StringFormat::Literal)],
            ));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| PdfAnnotateError::OperationError(e.to_string()))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), encoded));

        let font_id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => real_array(&media_box),
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });

        let pages = self.doc.get_object_mut(pages_id)?.as_dict_mut()?;
        let kid_count = match pages.get_mut(b"Kids") {
            Ok(Object::Array(kids)) => {
                kids.push(Object::Reference(page_id));
                kids.len() as i64
            }
            _ => {
                return Err(PdfAnnotateError::OperationError(
                    "page tree root has no Kids array".into(),
                ))
            }
        };
        // Count covers leaf pages, so a nested tree keeps its old total plus one
        let count = pages
            .get(b"Count")
            .and_then(|c| c.as_i64())
            .map(|c| c + 1)
            .unwrap_or(kid_count);
        pages.set("Count", Object::Integer(count));

        self.pages.push(page_id);
        debug!(lines = lines.len(), "Appended summary page");
        Ok(page_id)
    }

    /// MediaBox of a page, inherited through the page tree when absent
    fn media_box(&self, page_id: ObjectId) -> [f64; 4] {
        let mut current = Some(page_id);
        // Bounded walk guards against cyclic Parent links
        for _ in 0..32 {
            let Some(id) = current else { break };
            let Ok(dict) = self.doc.get_object(id).and_then(Object::as_dict) else {
                break;
            };
            if let Some(media_box) = dict
                .get(b"MediaBox")
                .ok()
                .and_then(|obj| self.resolve(obj).as_array().ok())
                .and_then(|arr| parse_box(arr))
            {
                return media_box;
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        LETTER_MEDIA_BOX
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }
}

impl AnnotationSink for PdfAnnotator {
    fn add_highlight(&mut self, action: &HighlightAction) -> Result<(), SinkError> {
        PdfAnnotator::add_highlight(self, action)
            .map(|_| ())
            .map_err(PdfAnnotateError::into_highlight_error)
    }

    fn append_summary_page(&mut self, text: &str) -> Result<(), SinkError> {
        self.append_text_page(text)
            .map(|_| ())
            .map_err(PdfAnnotateError::into_summary_error)
    }
}

/// Replay an annotation log onto a PDF and return the new bytes
pub fn apply_operations(
    pdf_bytes: &[u8],
    log: &AnnotationLog,
) -> Result<Vec<u8>, PdfAnnotateError> {
    if log.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let mut annotator = PdfAnnotator::load(pdf_bytes)?;
    for op in log.operations() {
        match op {
            AnnotationOp::AddHighlight { action, .. } => {
                annotator.add_highlight(action)?;
            }
            AnnotationOp::AppendSummaryPage { id, text } => {
                if let Err(e) = annotator.append_text_page(text) {
                    warn!(op = id, error = %e, "Skipping summary page");
                }
            }
        }
    }
    annotator.save()
}

fn add_annotation_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> Result<(), PdfAnnotateError> {
    let shared_array = match doc.get_object(page_id)?.as_dict()?.get(b"Annots") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };
    if let Some(array_id) = shared_array {
        if let Ok(Object::Array(arr)) = doc.get_object_mut(array_id) {
            arr.push(Object::Reference(annot_id));
            return Ok(());
        }
    }

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    if let Ok(Object::Array(ref mut arr)) = page_dict.get_mut(b"Annots") {
        arr.push(Object::Reference(annot_id));
    } else {
        page_dict.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
    }
    Ok(())
}

fn pages_root(doc: &Document) -> Result<ObjectId, PdfAnnotateError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| PdfAnnotateError::OperationError("No Root in trailer".into()))?;
    doc.get_object(catalog_id)
        .and_then(Object::as_dict)
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|_| PdfAnnotateError::OperationError("No Pages in catalog".into()))
}

fn parse_box(arr: &[Object]) -> Option<[f64; 4]> {
    if arr.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, obj) in out.iter_mut().zip(arr) {
        *slot = match obj {
            Object::Integer(i) => *i as f64,
            Object::Real(r) => *r as f64,
            _ => return None,
        };
    }
    Some(out)
}

fn real_array(values: &[f64]) -> Object {
    Object::Array(values.iter().map(|&v| Object::Real(v as f32)).collect())
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

/// WinAnsi-compatible bytes; characters outside Latin-1 become '?'
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Greedy word wrap; words longer than `width` are split
fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for raw in text.lines() {
        let mut line = String::new();
        for word in raw.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !line.is_empty() {
                    out.push(std::mem::take(&mut line));
                }
                out.push(word.drain(..width).collect());
            }
            let word: String = word.into_iter().collect();
            let needed = line.chars().count() + usize::from(!line.is_empty()) + word.chars().count();
            if needed > width && !line.is_empty() {
                out.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        out.push(line);
    }
    out
}

fn fit_lines(lines: &[String], max_lines: usize) -> Vec<String> {
    if lines.len() <= max_lines {
        return lines.to_vec();
    }
    let keep = max_lines.saturating_sub(1);
    let mut out = lines[..keep].to_vec();
    out.push(format!("... {} more line(s) not shown", lines.len() - keep));
    out
}
