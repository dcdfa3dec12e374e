//! almoner-export
//!
//! Patient card export: flatten a record into a card, render it through a
//! Tera template and convert the result to DOCX.

pub mod card;
pub mod docx;
pub mod error;
pub mod render;
pub mod styles;

/// MIME type of generated DOCX files.
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
