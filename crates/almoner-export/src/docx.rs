use std::io::Cursor;

use docx_rs::{AlignmentType, BreakType, Docx, Paragraph, Run, RunFonts, Style, StyleType};

use crate::error::ExportError;
use crate::styles::DocumentStyles;

/// Longest text accepted as the label of a `Label: value` line.
const MAX_LABEL_CHARS: usize = 40;

/// One line of rendered card output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    Heading { level: u8, text: &'a str },
    Bullet(&'a str),
    /// A numbered item. Items are renumbered from 1 in each run of them.
    Numbered(&'a str),
    Field { label: &'a str, value: &'a str },
    PageBreak,
    Text(&'a str),
    Blank,
}

/// Split rendered output into blocks.
///
/// The subset understood:
/// - `#`, `##`, `###` headings
/// - `- item` bullets
/// - `1. item` numbered items
/// - `Label: value` lines
/// - `---` or `***` page breaks
/// - `**bold**` inline, inside any of the above
/// - `\` escapes the next character; a line starting with `\` is plain text
pub fn parse_blocks(rendered: &str) -> Vec<Block<'_>> {
    rendered.lines().map(|line| parse_line(line.trim())).collect()
}

fn parse_line(line: &str) -> Block<'_> {
    if line.is_empty() {
        return Block::Blank;
    }
    if line.starts_with('\\') {
        return Block::Text(line);
    }
    if line == "---" || line == "***" {
        return Block::PageBreak;
    }
    if let Some(text) = line.strip_prefix("### ") {
        return Block::Heading { level: 3, text };
    }
    if let Some(text) = line.strip_prefix("## ") {
        return Block::Heading { level: 2, text };
    }
    if let Some(text) = line.strip_prefix("# ") {
        return Block::Heading { level: 1, text };
    }
    if let Some(text) = line.strip_prefix("- ") {
        return Block::Bullet(text);
    }
    if let Some(text) = numbered_item(line) {
        return Block::Numbered(text);
    }
    if let Some((label, value)) = line.split_once(": ")
        && is_label(label)
    {
        return Block::Field {
            label,
            value: value.trim(),
        };
    }
    Block::Text(line)
}

/// Make user-entered text render literally wherever it is placed.
///
/// Line breaks and runs of whitespace fold into single spaces, `\` and `*`
/// are escaped, and text that would open a heading, list item, field or
/// page break is escaped at its first character.
pub fn escape_text(text: &str) -> String {
    let folded = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut escaped = String::with_capacity(folded.len());
    for c in folded.chars() {
        if matches!(c, '\\' | '*') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    if matches!(parse_line(&escaped), Block::Text(_) | Block::Blank) {
        escaped
    } else {
        format!("\\{escaped}")
    }
}

fn numbered_item(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(". ")
}

fn is_label(text: &str) -> bool {
    !text.is_empty()
        && text.chars().count() <= MAX_LABEL_CHARS
        && !text.contains('*')
        && text.chars().next().is_some_and(char::is_alphabetic)
}

/// Generate a DOCX document from rendered card output.
pub fn generate_docx(rendered: &str, styles: &DocumentStyles) -> Result<Vec<u8>, ExportError> {
    let mut docx = Docx::new()
        .add_style(heading_style("Heading1", "heading 1", styles.heading1_size))
        .add_style(heading_style("Heading2", "heading 2", styles.heading2_size))
        .add_style(heading_style("Heading3", "heading 3", styles.heading3_size));

    let mut number = 0usize;
    for block in parse_blocks(rendered) {
        if !matches!(block, Block::Numbered(_)) {
            number = 0;
        }
        let paragraph = match block {
            Block::Heading { level, text } => heading_paragraph(text, level, styles),
            Block::Bullet(text) => prefixed_paragraph("\u{2022} ", text, styles),
            Block::Numbered(text) => {
                number += 1;
                prefixed_paragraph(&format!("{number}. "), text, styles)
            }
            Block::Field { label, value } => {
                let mut para = Paragraph::new()
                    .align(AlignmentType::Left)
                    .add_run(body_run(&format!("{label}: "), styles).bold());
                for run in parse_inline(value, styles) {
                    para = para.add_run(run);
                }
                para
            }
            Block::PageBreak => Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
            Block::Text(text) => {
                let mut para = Paragraph::new().align(AlignmentType::Left);
                for run in parse_inline(text, styles) {
                    para = para.add_run(run);
                }
                para
            }
            Block::Blank => Paragraph::new(),
        };
        docx = docx.add_paragraph(paragraph);
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ExportError::Docx(e.to_string()))?;

    let bytes = buf.into_inner();
    tracing::debug!(bytes = bytes.len(), "generated docx");
    Ok(bytes)
}

fn heading_style(style_id: &str, name: &str, size_pt: usize) -> Style {
    Style::new(style_id, StyleType::Paragraph)
        .name(name)
        .size(size_pt * 2) // OOXML uses half-points
}

fn heading_paragraph(text: &str, level: u8, styles: &DocumentStyles) -> Paragraph {
    // Headings are bold throughout, so markers only need unescaping
    let text: String = inline_pieces(text)
        .into_iter()
        .map(|piece| match piece {
            Piece::Text(text) => text,
            Piece::BoldMarker => String::new(),
        })
        .collect();
    Paragraph::new().style(&format!("Heading{level}")).add_run(
        Run::new()
            .add_text(&text)
            .bold()
            .fonts(RunFonts::new().ascii(&styles.heading_font)),
    )
}

fn prefixed_paragraph(prefix: &str, text: &str, styles: &DocumentStyles) -> Paragraph {
    let mut para = Paragraph::new()
        .align(AlignmentType::Left)
        .add_run(body_run(prefix, styles));
    for run in parse_inline(text, styles) {
        para = para.add_run(run);
    }
    para
}

fn body_run(text: &str, styles: &DocumentStyles) -> Run {
    Run::new()
        .add_text(text)
        .size(styles.body_size * 2)
        .fonts(RunFonts::new().ascii(&styles.body_font))
}

enum Piece {
    Text(String),
    BoldMarker,
}

/// Split inline text at unescaped `**` markers, resolving `\\` escapes.
fn inline_pieces(text: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if !current.is_empty() {
                    pieces.push(Piece::Text(std::mem::take(&mut current)));
                }
                pieces.push(Piece::BoldMarker);
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        pieces.push(Piece::Text(current));
    }
    pieces
}

/// Parse simple inline formatting: **bold** segments.
fn parse_inline(text: &str, styles: &DocumentStyles) -> Vec<Run> {
    let pieces = inline_pieces(text);
    let markers = pieces
        .iter()
        .filter(|p| matches!(p, Piece::BoldMarker))
        .count();
    // An unpaired last marker is kept verbatim
    let mut paired = markers - markers % 2;

    let mut runs = Vec::new();
    let mut bold = false;
    for piece in pieces {
        match piece {
            Piece::BoldMarker if paired > 0 => {
                paired -= 1;
                bold = !bold;
            }
            Piece::BoldMarker => runs.push(body_run("**", styles)),
            Piece::Text(text) => {
                let run = body_run(&text, styles);
                runs.push(if bold { run.bold() } else { run });
            }
        }
    }
    runs
}
