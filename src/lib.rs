//! # mcd-codec
//!
//! A bidirectional codec for MCD localization containers.
//!
//! Decodes an `.mcd` binary into an editable JSON interchange document
//! and re-encodes an edited document, layered over a base `.mcd` that
//! supplies the symbol/glyph/font tables, back into a binary the game
//! can load.
pub mod mcd;

// Re-export the main types for convenience
pub use mcd::{
    error::{McdError, Result},
    hash_event_name,
    interchange::Document,
    models::{Event, Font, Header, Line, Message, Symbol, Text},
    McdFile,
};
