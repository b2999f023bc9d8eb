//! Message, text, and line aggregates (offset-indirected records).
//!
//! Each record stores its children behind an absolute file offset. The
//! fixed-size part is read in place, then the child array is fetched
//! through `read_at` so the sequential scan of the parent array resumes
//! undisturbed.

use std::io::{Read, Seek};

use byteorder::{LittleEndian, ReadBytesExt};

use super::error::{McdError, Result};
use super::models::{Line, Message, Text};
use super::utils::read_at;

pub fn parse_message<R: Read + Seek>(reader: &mut R) -> Result<Message> {
    let texts_offset = reader.read_u32::<LittleEndian>()?;
    let texts_count = reader.read_u32::<LittleEndian>()?;
    let seq_number = reader.read_u32::<LittleEndian>()?;
    let event_id = reader.read_u32::<LittleEndian>()?;

    let texts = read_at(reader, texts_offset as u64, |r| {
        (0..texts_count)
            .map(|_| parse_text(r))
            .collect::<Result<Vec<_>>>()
    })?;

    Ok(Message {
        seq_number,
        event_id,
        texts,
    })
}

pub fn parse_text<R: Read + Seek>(reader: &mut R) -> Result<Text> {
    let lines_offset = reader.read_u32::<LittleEndian>()?;
    let lines_count = reader.read_u32::<LittleEndian>()?;
    let vpos = reader.read_u32::<LittleEndian>()?;
    let hpos = reader.read_u32::<LittleEndian>()?;
    let font = reader.read_u32::<LittleEndian>()?;

    let lines = read_at(reader, lines_offset as u64, |r| {
        (0..lines_count)
            .map(|_| parse_line(r))
            .collect::<Result<Vec<_>>>()
    })?;

    Ok(Text {
        vpos,
        hpos,
        font,
        lines,
    })
}

pub fn parse_line<R: Read + Seek>(reader: &mut R) -> Result<Line> {
    let content_offset = reader.read_u32::<LittleEndian>()?;
    let padding = reader.read_u32::<LittleEndian>()?;
    let content_count = reader.read_u32::<LittleEndian>()?;
    // The count is stored twice on disk; a disagreement means a torn record.
    let content_count_dup = reader.read_u32::<LittleEndian>()?;
    let below = reader.read_f32::<LittleEndian>()?;
    let horiz = reader.read_f32::<LittleEndian>()?;

    if content_count != content_count_dup {
        return Err(McdError::Format(format!(
            "line content count mismatch: {} vs {}",
            content_count, content_count_dup
        )));
    }

    let content = read_at(reader, content_offset as u64, |r| {
        (0..content_count)
            .map(|_| Ok(r.read_u16::<LittleEndian>()?))
            .collect::<Result<Vec<u16>>>()
    })?;

    Ok(Line {
        content,
        padding,
        below,
        horiz,
    })
}
