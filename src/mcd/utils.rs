//! Low-level positioning and alignment helpers.

use std::io::{Seek, SeekFrom, Write};

use super::error::Result;

const NUL_PAD: [u8; 4] = [0u8; 4];

/// Bytes needed to bring `offset` up to the next multiple of `align`.
pub fn padding_to(offset: u32, align: u32) -> u32 {
    (align - offset % align) % align
}

/// Advance `offset` to the next multiple of `align`.
pub fn align_up(offset: u32, align: u32) -> u32 {
    offset + padding_to(offset, align)
}

/// Write NUL padding up to the next multiple of `align`, based on the
/// writer's current position.
pub fn write_padding<W: Write + Seek>(writer: &mut W, align: u32) -> Result<()> {
    let position = writer.stream_position()? as u32;
    let pad = padding_to(position, align) as usize;
    writer.write_all(&NUL_PAD[..pad])?;
    Ok(())
}

/// Run `read` at the given absolute offset, then restore the previous
/// stream position.
///
/// Every aggregate record stores its children behind an offset
/// indirection; sequential scans of the parent array must not be
/// disturbed by the nested lookup.
pub fn read_at<R, T, F>(reader: &mut R, offset: u64, read: F) -> Result<T>
where
    R: Seek,
    F: FnOnce(&mut R) -> Result<T>,
{
    let saved = reader.stream_position()?;
    reader.seek(SeekFrom::Start(offset))?;
    let value = read(reader)?;
    reader.seek(SeekFrom::Start(saved))?;
    Ok(value)
}
