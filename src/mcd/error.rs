//! Custom error types for the mcd-codec crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
///
/// Every failure is fatal at the point it is raised; there is no retry
/// path and no partially written output is considered usable.
#[derive(Debug, Error)]
pub enum McdError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is structurally invalid: malformed counts or offsets, a
    /// name too long for its fixed field, an unknown glyph id, and so on.
    #[error("invalid format: {0}")]
    Format(String),

    /// A decoded glyph belongs to a font other than the one its line's
    /// text is declared in.
    #[error(
        "font mismatch: glyph {glyph_id} belongs to font {symbol_font}, \
         but the line is set in font {text_font}"
    )]
    FontMismatch {
        glyph_id: u32,
        symbol_font: u16,
        text_font: u32,
    },

    /// Encode-time: the target font has no symbol for the requested
    /// character.
    #[error("glyph not found in font {font}: {ch:?}")]
    GlyphNotFound { font: u32, ch: char },

    /// A required field in the edited interchange document is missing or
    /// ill-typed, or the document references tables the base file lacks.
    #[error("malformed interchange document: {0}")]
    MalformedInterchange(String),
}

impl From<serde_json::Error> for McdError {
    fn from(e: serde_json::Error) -> Self {
        McdError::MalformedInterchange(e.to_string())
    }
}

/// A convenience `Result` type alias using the crate's `McdError` type.
pub type Result<T> = std::result::Result<T, McdError>;
