//! Layout planning and serialization.
//!
//! The header is written first but describes sections that follow it, so
//! every offset is fully resolved in a planning pass before a single
//! byte is emitted. Section order is fixed: line content, messages,
//! texts, lines, symbols, the glyph blob, fonts, events. The first four
//! sections are NUL-padded up to 4-byte alignment; the symbol, glyph,
//! and font sections each carry a fixed 4-byte trailing pad.

use std::io::{Seek, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;

use super::error::Result;
use super::header;
use super::models::{Font, Header, Line, Message, Symbol, Text, GLYPH_RECORD_SIZE};
use super::records;
use super::utils::{align_up, write_padding};
use super::McdFile;

/// Absolute offsets computed for one serialization pass.
struct Layout {
    header: Header,
    /// Per line, in message -> text -> line traversal order.
    content_offsets: Vec<u32>,
    texts_base: u32,
    lines_base: u32,
}

/// Walk the object graph once and assign every section and child record
/// its absolute file offset.
fn plan(mcd: &McdFile) -> Layout {
    let mut offset = Header::STRUCT_SIZE;
    let mut content_offsets = Vec::new();
    let mut text_count: u32 = 0;
    let mut line_count: u32 = 0;

    for message in &mcd.messages {
        for text in &message.texts {
            text_count += 1;
            for line in &text.lines {
                content_offsets.push(offset);
                offset += line.content.len() as u32 * 2;
                line_count += 1;
            }
        }
    }
    offset = align_up(offset, 4);

    let mut header = mcd.header.clone();
    header.messages_offset = offset;
    header.messages_count = mcd.messages.len() as u32;
    offset = align_up(offset + header.messages_count * Message::STRUCT_SIZE, 4);

    let texts_base = offset;
    offset = align_up(offset + text_count * Text::STRUCT_SIZE, 4);

    let lines_base = offset;
    offset = align_up(offset + line_count * Line::STRUCT_SIZE, 4);

    header.symbols_offset = offset;
    header.symbols_count = mcd.symbols.len() as u32;
    offset += header.symbols_count * Symbol::STRUCT_SIZE + 4;

    // The glyph blob is opaque pass-through; its count never changes.
    header.glyphs_offset = offset;
    offset += header.glyphs_count * GLYPH_RECORD_SIZE as u32 + 4;

    header.fonts_offset = offset;
    header.fonts_count = mcd.fonts.len() as u32;
    offset += header.fonts_count * Font::STRUCT_SIZE + 4;

    header.events_offset = offset;
    header.events_count = mcd.events.len() as u32;

    Layout {
        header,
        content_offsets,
        texts_base,
        lines_base,
    }
}

/// Serialize the full binary image, updating `mcd.header` with the
/// planned offsets and counts.
pub fn write<W: Write + Seek>(writer: &mut W, mcd: &mut McdFile) -> Result<()> {
    let layout = plan(mcd);
    debug!(
        "Layout planned: messages at {:#x}, symbols at {:#x}, glyphs at {:#x}, fonts at {:#x}, events at {:#x}",
        layout.header.messages_offset,
        layout.header.symbols_offset,
        layout.header.glyphs_offset,
        layout.header.fonts_offset,
        layout.header.events_offset
    );
    mcd.header = layout.header;

    header::write(writer, &mcd.header)?;

    // Line content arrays, message -> text -> line traversal order.
    for message in &mcd.messages {
        for text in &message.texts {
            for line in &text.lines {
                for &code in &line.content {
                    writer.write_u16::<LittleEndian>(code)?;
                }
            }
        }
    }
    write_padding(writer, 4)?;

    // Message records; each points at its first owned text.
    let mut text_index: u32 = 0;
    for message in &mcd.messages {
        writer.write_u32::<LittleEndian>(layout.texts_base + text_index * Text::STRUCT_SIZE)?;
        writer.write_u32::<LittleEndian>(message.texts.len() as u32)?;
        writer.write_u32::<LittleEndian>(message.seq_number)?;
        writer.write_u32::<LittleEndian>(message.event_id)?;
        text_index += message.texts.len() as u32;
    }
    write_padding(writer, 4)?;

    // Text records; each points at its first owned line.
    let mut line_index: u32 = 0;
    for message in &mcd.messages {
        for text in &message.texts {
            writer.write_u32::<LittleEndian>(layout.lines_base + line_index * Line::STRUCT_SIZE)?;
            writer.write_u32::<LittleEndian>(text.lines.len() as u32)?;
            writer.write_u32::<LittleEndian>(text.vpos)?;
            writer.write_u32::<LittleEndian>(text.hpos)?;
            writer.write_u32::<LittleEndian>(text.font)?;
            line_index += text.lines.len() as u32;
        }
    }
    write_padding(writer, 4)?;

    // Line records; the content count is written twice, as on disk.
    let lines = mcd
        .messages
        .iter()
        .flat_map(|message| &message.texts)
        .flat_map(|text| &text.lines);
    for (line, &content_offset) in lines.zip(&layout.content_offsets) {
        writer.write_u32::<LittleEndian>(content_offset)?;
        writer.write_u32::<LittleEndian>(line.padding)?;
        writer.write_u32::<LittleEndian>(line.content.len() as u32)?;
        writer.write_u32::<LittleEndian>(line.content.len() as u32)?;
        writer.write_f32::<LittleEndian>(line.below)?;
        writer.write_f32::<LittleEndian>(line.horiz)?;
    }
    write_padding(writer, 4)?;

    for symbol in &mcd.symbols {
        records::write_symbol(writer, symbol)?;
    }
    writer.write_all(&[0u8; 4])?;

    writer.write_all(&mcd.glyphs)?;
    writer.write_all(&[0u8; 4])?;

    for font in &mcd.fonts {
        records::write_font(writer, font)?;
    }
    writer.write_all(&[0u8; 4])?;

    for event in &mcd.events {
        records::write_event(writer, event)?;
    }

    Ok(())
}
