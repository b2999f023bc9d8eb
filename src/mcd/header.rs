//! MCD header codec: five little-endian (offset, count) pairs.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;

use super::error::Result;
use super::models::Header;

/// Parse the fixed 40-byte header at the current stream position.
pub fn parse<R: Read>(reader: &mut R) -> Result<Header> {
    let header = Header {
        messages_offset: reader.read_u32::<LittleEndian>()?,
        messages_count: reader.read_u32::<LittleEndian>()?,
        symbols_offset: reader.read_u32::<LittleEndian>()?,
        symbols_count: reader.read_u32::<LittleEndian>()?,
        glyphs_offset: reader.read_u32::<LittleEndian>()?,
        glyphs_count: reader.read_u32::<LittleEndian>()?,
        fonts_offset: reader.read_u32::<LittleEndian>()?,
        fonts_count: reader.read_u32::<LittleEndian>()?,
        events_offset: reader.read_u32::<LittleEndian>()?,
        events_count: reader.read_u32::<LittleEndian>()?,
    };

    debug!(
        "Header parsed: {} messages, {} symbols, {} glyphs, {} fonts, {} events",
        header.messages_count,
        header.symbols_count,
        header.glyphs_count,
        header.fonts_count,
        header.events_count
    );

    Ok(header)
}

/// Write the header back in the same field order and widths.
pub fn write<W: Write>(writer: &mut W, header: &Header) -> Result<()> {
    writer.write_u32::<LittleEndian>(header.messages_offset)?;
    writer.write_u32::<LittleEndian>(header.messages_count)?;
    writer.write_u32::<LittleEndian>(header.symbols_offset)?;
    writer.write_u32::<LittleEndian>(header.symbols_count)?;
    writer.write_u32::<LittleEndian>(header.glyphs_offset)?;
    writer.write_u32::<LittleEndian>(header.glyphs_count)?;
    writer.write_u32::<LittleEndian>(header.fonts_offset)?;
    writer.write_u32::<LittleEndian>(header.fonts_count)?;
    writer.write_u32::<LittleEndian>(header.events_offset)?;
    writer.write_u32::<LittleEndian>(header.events_count)?;
    Ok(())
}
