//! Data structures representing MCD format components.

/// On-disk stride of one opaque glyph record.
pub const GLYPH_RECORD_SIZE: usize = 40;

/// The fixed 40-byte file header: five (offset, count) pairs describing
/// the message, symbol, glyph, font, and event sections.
///
/// Offsets are absolute file positions. On write they are recomputed by
/// the layout planner so that counts and offsets always agree with the
/// sections actually emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub messages_offset: u32,
    pub messages_count: u32,
    pub symbols_offset: u32,
    pub symbols_count: u32,
    pub glyphs_offset: u32,
    pub glyphs_count: u32,
    pub fonts_offset: u32,
    pub fonts_count: u32,
    pub events_offset: u32,
    pub events_count: u32,
}

impl Header {
    pub const STRUCT_SIZE: u32 = 40;
}

/// A positioned group of texts tied to one event.
///
/// `event_id` must equal the hash of some event name present in the
/// event table; `seq_number` is a monotonic identifier supplied
/// externally.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub seq_number: u32,
    pub event_id: u32,
    pub texts: Vec<Text>,
}

impl Message {
    pub const STRUCT_SIZE: u32 = 16;
}

/// A positioned group of lines sharing one font.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub vpos: u32,
    pub hpos: u32,
    pub font: u32,
    pub lines: Vec<Line>,
}

impl Text {
    pub const STRUCT_SIZE: u32 = 20;
}

/// One rendered line: the raw 16-bit content code stream plus float
/// offsets.
///
/// `padding` is carried verbatim across decode/encode; observed files
/// always store zero. The on-disk record stores the content count twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub content: Vec<u16>,
    pub padding: u32,
    pub below: f32,
    pub horiz: f32,
}

impl Line {
    pub const STRUCT_SIZE: u32 = 24;
}

/// A (font id, display character, glyph id) triple.
///
/// (font id, character) is the encode-time lookup key; glyph id is the
/// decode-time lookup key. Both must be unique across the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub font_id: u16,
    pub ch: char,
    pub glyph_id: u32,
}

impl Symbol {
    pub const STRUCT_SIZE: u32 = 8;
}

/// Font id plus four float metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    pub id: u32,
    pub width: f32,
    pub height: f32,
    pub below: f32,
    pub horiz: f32,
}

impl Font {
    pub const STRUCT_SIZE: u32 = 20;
}

/// An (id, message index, name) triple.
///
/// `id` is the deterministic case-insensitive hash of `name`. The table
/// is sorted ascending by id on disk while `idx` keeps the original
/// message position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: u32,
    pub idx: u32,
    pub name: String,
}

impl Event {
    pub const STRUCT_SIZE: u32 = 40;
    /// Width of the fixed, NUL-padded UTF-8 name field.
    pub const NAME_SIZE: usize = 32;
}
