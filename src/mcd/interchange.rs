//! Interchange document schema: the JSON editing surface.
//!
//! The document carries everything an editor needs to rewrite the
//! message set; symbol and font listings are included for reference but
//! the authoritative tables stay in the base binary.

use serde::{Deserialize, Serialize};

/// Root of the interchange document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub starting_seq_number: u32,
    pub messages: Vec<MessageDoc>,
    pub fonts: Vec<FontDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDoc {
    pub event_name: String,
    pub texts: Vec<TextDoc>,
}

/// One text block; `line` holds all lines joined by `\n`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextDoc {
    pub vpos: u32,
    pub hpos: u32,
    pub font: u32,
    pub line: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontDoc {
    pub id: u32,
    pub symbols: Vec<SymbolDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolDoc {
    #[serde(rename = "char")]
    pub ch: char,
    pub glyph_id: u32,
}
