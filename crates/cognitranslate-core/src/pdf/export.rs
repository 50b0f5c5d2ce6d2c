//! Plain-text to PDF export.
//!
//! Output is a single column of Helvetica text in
//! WinAnsiEncoding, word-wrapped to the page width and flowed onto as many
//! pages as needed.
//!
//! # Coordinate System
//!
//! PDF uses a bottom-left origin, so the first baseline of a page sits at
//! `page_height - margin - font_size` and each following line moves down by
//! the leading (`T*`).

use encoding_rs::WINDOWS_1252;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};
use tracing::debug;

use crate::config::ExportConfig;
use crate::error::{Error, Result};

/// Resource name of the page font in content streams.
const FONT_RESOURCE: &str = "F1";

/// Producer written into the document info dictionary.
const PRODUCER: &str = concat!("cognitranslate ", env!("CARGO_PKG_VERSION"));

/// Helvetica advance widths (1/1000 em) for WinAnsi codes 32..=126.
const HELVETICA_ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Advance width of `c` in Helvetica, in 1/1000 em.
fn glyph_width(c: char) -> u16 {
    if let Some(index) = u32::from(c).checked_sub(32)
        && let Some(&width) = usize::try_from(index)
            .ok()
            .and_then(|i| HELVETICA_ASCII_WIDTHS.get(i))
    {
        return width;
    }

    match c {
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => 278,
        'ç' => 500,
        'À'..='Å' | 'È'..='Ë' => 667,
        'Ç' | 'Ñ' | 'Ù'..='Ü' => 722,
        'Ò'..='Ö' | 'Œ' => 778,
        '\u{2018}' | '\u{2019}' | '\u{201A}' => 222,
        '\u{201C}' | '\u{201D}' | '\u{201E}' => 333,
        '\u{2014}' | '\u{2026}' | '\u{2030}' => 1000,
        _ => 556,
    }
}

/// Rendered width of `text` in points at `font_size`.
fn text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(c))).sum();
    #[allow(clippy::cast_precision_loss)]
    let units = units as f32;
    units * font_size / 1000.0
}

/// Encode text as WinAnsi bytes; characters outside the code page become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];

    for c in text.chars() {
        if c == '\t' {
            out.push(b' ');
            continue;
        }
        if c.is_control() {
            out.push(b'?');
            continue;
        }
        let (bytes, _, unmappable) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if unmappable || bytes.len() != 1 {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }

    out
}

/// Split a word wider than `max_width` into pieces that fit.
fn break_word(word: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for c in word.chars() {
        let mut candidate = current.clone();
        candidate.push(c);
        if !current.is_empty() && text_width(&candidate, font_size) > max_width {
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}

/// Word-wrap one paragraph (no newlines) to `max_width` points.
fn wrap_paragraph(paragraph: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let space = text_width(" ", font_size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in paragraph.split_whitespace() {
        let word_width = text_width(word, font_size);

        if current.is_empty() && word_width <= max_width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }

        if !current.is_empty() && current_width + space + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space + word_width;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if word_width <= max_width {
            current.push_str(word);
            current_width = word_width;
        } else {
            let mut pieces = break_word(word, max_width, font_size);
            current = pieces.pop().unwrap_or_default();
            current_width = text_width(&current, font_size);
            lines.extend(pieces);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Builds PDFs from plain text.
pub struct PdfExporter {
    layout: ExportConfig,
}

impl PdfExporter {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            layout: config.clone(),
        }
    }

    /// Override the document title written into the info dictionary.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.layout.title = title.into();
        self
    }

    /// Lay out `text` and return the serialized PDF.
    ///
    /// Newlines are hard breaks and blank lines are kept. An empty input
    /// still yields a single blank page.
    pub fn export(&self, text: &str) -> Result<Vec<u8>> {
        let lines = self.layout_lines(text);
        let pages = self.paginate(&lines);
        debug!("Exporting {} page(s)", pages.len());
        self.build_document(&pages)
    }

    fn layout_lines(&self, text: &str) -> Vec<String> {
        let max_width = self.layout.margin.mul_add(-2.0, self.layout.page_width);
        let mut lines = Vec::new();

        for paragraph in text.lines() {
            if paragraph.trim().is_empty() {
                lines.push(String::new());
            } else {
                lines.extend(wrap_paragraph(paragraph, max_width, self.layout.font_size));
            }
        }

        // Trailing blank lines only add empty pages
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }

        lines
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn lines_per_page(&self) -> usize {
        let usable = self.layout.margin.mul_add(-2.0, self.layout.page_height);
        (usable / self.layout.leading).floor().max(1.0) as usize
    }

    fn paginate(&self, lines: &[String]) -> Vec<Vec<String>> {
        if lines.is_empty() {
            return vec![Vec::new()];
        }

        lines
            .chunks(self.lines_per_page())
            .map(<[String]>::to_vec)
            .collect()
    }

    fn page_content(&self, lines: &[String]) -> Content {
        let layout = &self.layout;
        let first_baseline = layout.page_height - layout.margin - layout.font_size;

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(FONT_RESOURCE.as_bytes().to_vec()),
                    Object::Real(layout.font_size),
                ],
            ),
            Operation::new("TL", vec![Object::Real(layout.leading)]),
            Operation::new(
                "Td",
                vec![Object::Real(layout.margin), Object::Real(first_baseline)],
            ),
        ];

        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            if !line.is_empty() {
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
                ));
            }
        }

        operations.push(Operation::new("ET", vec![]));
        Content { operations }
    }

    fn build_document(&self, pages: &[Vec<String>]) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));

        let resources_id = doc.add_object(Dictionary::from_iter([(
            "Font",
            Object::Dictionary(Dictionary::from_iter([(
                FONT_RESOURCE,
                Object::Reference(font_id),
            )])),
        )]));

        let media_box = Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(self.layout.page_width),
            Object::Real(self.layout.page_height),
        ]);

        let mut kids = Vec::with_capacity(pages.len());
        for lines in pages {
            let content_bytes = self
                .page_content(lines)
                .encode()
                .map_err(|e| Error::PdfExport(format!("Failed to encode page content: {e}")))?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content_bytes));

            let page_id = doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
                ("Resources", Object::Reference(resources_id)),
                ("MediaBox", media_box.clone()),
            ]));
            kids.push(Object::Reference(page_id));
        }

        let count = i64::try_from(kids.len())
            .map_err(|e| Error::PdfExport(format!("Too many pages: {e}")))?;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(count)),
            ])),
        );

        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));

        let info_id = doc.add_object(Dictionary::from_iter([
            (
                "Title",
                Object::String(encode_win_ansi(&self.layout.title), StringFormat::Literal),
            ),
            (
                "Producer",
                Object::String(PRODUCER.as_bytes().to_vec(), StringFormat::Literal),
            ),
        ]));

        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc.trailer.set("Info", Object::Reference(info_id));
        doc.compress();

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| Error::PdfExport(format!("Failed to save PDF: {e}")))?;

        Ok(output)
    }
}

/// Export `text` with the default US Letter layout.
pub fn export_text_pdf(text: &str) -> Result<Vec<u8>> {
    PdfExporter::new(&ExportConfig::default()).export(text)
}
