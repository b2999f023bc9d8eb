//! Fixed-size record codecs for the symbol, font, and event tables.
//!
//! Each record decodes by reading its fields in declared order at the
//! current stream position and encodes by writing them back with
//! identical widths.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use encoding_rs::UTF_16LE;

use super::error::{McdError, Result};
use super::models::{Event, Font, Symbol};

/// Deterministic 31-bit id for an event name.
///
/// Case-insensitive: the name is lowercased before hashing, and the top
/// bit of the CRC32 is cleared so the id always fits in 31 bits.
pub fn hash_event_name(name: &str) -> u32 {
    crc32fast::hash(name.to_lowercase().as_bytes()) & 0x7FFF_FFFF
}

impl Event {
    /// Build the event record for a message's event name.
    pub fn from_name(name: &str, message_idx: u32) -> Self {
        Event {
            id: hash_event_name(name),
            idx: message_idx,
            name: name.to_string(),
        }
    }
}

pub fn parse_symbol<R: Read>(reader: &mut R) -> Result<Symbol> {
    let font_id = reader.read_u16::<LittleEndian>()?;
    let mut char_bytes = [0u8; 2];
    reader.read_exact(&mut char_bytes)?;
    // A lone surrogate would decode to U+FFFD and re-encode as different
    // bytes, breaking round-trip fidelity for the record.
    let unit = u16::from_le_bytes(char_bytes);
    if (0xD800..=0xDFFF).contains(&unit) {
        return Err(McdError::Format(format!(
            "symbol character {:#06x} is a lone UTF-16 surrogate",
            unit
        )));
    }
    let (decoded, _, _) = UTF_16LE.decode(&char_bytes);
    let ch = decoded
        .chars()
        .next()
        .ok_or_else(|| McdError::Format("empty symbol character".to_string()))?;
    let glyph_id = reader.read_u32::<LittleEndian>()?;

    Ok(Symbol { font_id, ch, glyph_id })
}

pub fn write_symbol<W: Write>(writer: &mut W, symbol: &Symbol) -> Result<()> {
    writer.write_u16::<LittleEndian>(symbol.font_id)?;
    let mut units = [0u16; 2];
    let encoded = symbol.ch.encode_utf16(&mut units);
    if encoded.len() != 1 {
        return Err(McdError::Format(format!(
            "symbol character {:?} does not fit in a single UTF-16 unit",
            symbol.ch
        )));
    }
    writer.write_u16::<LittleEndian>(encoded[0])?;
    writer.write_u32::<LittleEndian>(symbol.glyph_id)?;
    Ok(())
}

pub fn parse_font<R: Read>(reader: &mut R) -> Result<Font> {
    Ok(Font {
        id: reader.read_u32::<LittleEndian>()?,
        width: reader.read_f32::<LittleEndian>()?,
        height: reader.read_f32::<LittleEndian>()?,
        below: reader.read_f32::<LittleEndian>()?,
        horiz: reader.read_f32::<LittleEndian>()?,
    })
}

pub fn write_font<W: Write>(writer: &mut W, font: &Font) -> Result<()> {
    writer.write_u32::<LittleEndian>(font.id)?;
    writer.write_f32::<LittleEndian>(font.width)?;
    writer.write_f32::<LittleEndian>(font.height)?;
    writer.write_f32::<LittleEndian>(font.below)?;
    writer.write_f32::<LittleEndian>(font.horiz)?;
    Ok(())
}

/// Parse an event record. The name field is fixed-width UTF-8 with
/// trailing NUL padding; only the trailing NULs are stripped.
pub fn parse_event<R: Read>(reader: &mut R) -> Result<Event> {
    let id = reader.read_u32::<LittleEndian>()?;
    let idx = reader.read_u32::<LittleEndian>()?;
    let mut name_bytes = [0u8; Event::NAME_SIZE];
    reader.read_exact(&mut name_bytes)?;
    let end = name_bytes
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    let name = std::str::from_utf8(&name_bytes[..end])
        .map_err(|e| McdError::Format(format!("event name is not valid UTF-8: {}", e)))?
        .to_string();

    Ok(Event { id, idx, name })
}

/// Write an event record, re-padding the name to exactly 32 bytes. A
/// name longer than the field is a contract violation, never truncated.
pub fn write_event<W: Write>(writer: &mut W, event: &Event) -> Result<()> {
    writer.write_u32::<LittleEndian>(event.id)?;
    writer.write_u32::<LittleEndian>(event.idx)?;
    let bytes = event.name.as_bytes();
    if bytes.len() > Event::NAME_SIZE {
        return Err(McdError::Format(format!(
            "event name {:?} exceeds {} bytes",
            event.name,
            Event::NAME_SIZE
        )));
    }
    let mut padded = [0u8; Event::NAME_SIZE];
    padded[..bytes.len()].copy_from_slice(bytes);
    writer.write_all(&padded)?;
    Ok(())
}
