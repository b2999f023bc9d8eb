//! Line content instruction codec.
//!
//! A line's content is a flat stream of 16-bit codes, decoded left to
//! right. Values below `0x8000` are glyph ids, each followed by a signed
//! kerning delta; everything at or above `0x8000` is a control code.
//! Unrecognized instructions are preserved as visible placeholder markup
//! rather than dropped or rejected, and the placeholders are parsed back
//! into their raw code pairs on encode so round-trips are lossless.

use std::collections::HashMap;

use super::error::{McdError, Result};
use super::kerning::KerningTable;
use super::models::{Font, Line, Symbol};

/// Terminator; the only valid way to end a line's content.
pub const TERMINATOR: u16 = 0x8000;
/// Explicit space, followed by a font-id code.
pub const SPACE: u16 = 0x8001;
/// Special escape, followed by one opaque payload code.
pub const SPECIAL: u16 = 0x8020;

/// Render a raw code the way the original tool prints it: values in the
/// control range appear unsigned, everything else as a signed 16-bit
/// delta.
fn display_value(code: u16) -> i32 {
    if (0x8000..0x8300).contains(&code) {
        code as i32
    } else {
        code as i16 as i32
    }
}

/// Inverse of `display_value` for placeholder payloads.
fn raw_value(text: &str) -> Option<u16> {
    let value: i32 = text.parse().ok()?;
    if !(-0x8000..=0xFFFF).contains(&value) {
        return None;
    }
    Some(value as u16)
}

/// Decode a content stream into its editable string form.
///
/// `symbols_by_glyph` maps glyph id to symbol; `font` is the font the
/// owning text is declared in. Fails with `FontMismatch` when a glyph
/// belongs to a different font, and with `Format` for an unknown glyph
/// id or a truncated escape.
pub fn decode(
    content: &[u16],
    symbols_by_glyph: &HashMap<u32, Symbol>,
    font: &Font,
) -> Result<String> {
    let mut result = String::new();
    let mut idx = 0;

    while idx < content.len() {
        let code = content[idx];
        if code < TERMINATOR {
            let symbol = symbols_by_glyph.get(&(code as u32)).ok_or_else(|| {
                McdError::Format(format!("unknown glyph id {} in content stream", code))
            })?;
            if symbol.font_id as u32 != font.id {
                return Err(McdError::FontMismatch {
                    glyph_id: code as u32,
                    symbol_font: symbol.font_id,
                    text_font: font.id,
                });
            }
            result.push(symbol.ch);
            idx += 2; // skip kerning delta
        } else if code == SPACE {
            result.push(' ');
            idx += 2; // skip font id
        } else if code == TERMINATOR {
            break;
        } else if code == SPECIAL {
            let payload = content
                .get(idx + 1)
                .copied()
                .ok_or_else(|| McdError::Format("special escape missing payload".to_string()))?;
            result.push_str(&format!("<special:{}>", display_value(payload)));
            idx += 2;
        } else {
            result.push_str(&format!("<unknown:{}", display_value(code)));
            if let Some(&next) = content.get(idx + 1) {
                result.push_str(&format!(":{}", display_value(next)));
            }
            result.push('>');
            idx += 2;
        }
    }

    Ok(result)
}

/// Encode an edited string back into a line.
///
/// Spaces become a `[SPACE, font_id]` pair; placeholder markup produced
/// by `decode` is parsed back into its raw codes; every other character
/// is looked up in the font's symbol set (`GlyphNotFound` on a miss) and
/// paired with the reconstructed kerning delta toward the following
/// character, or 0 when there is none. The stream always ends with a
/// single terminator. A line containing at least one glyph takes the
/// font's `below` metric.
pub fn encode(
    text: &str,
    symbols_by_char: &HashMap<(u32, char), u32>,
    font: &Font,
    kernings: &KerningTable,
) -> Result<Line> {
    let chars: Vec<char> = text.chars().collect();
    let mut content = Vec::with_capacity(chars.len() * 2 + 1);
    let mut below = 0.0;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch == ' ' {
            content.push(SPACE);
            content.push(font.id as u16);
            i += 1;
            continue;
        }
        if ch == '<' {
            if let Some((codes, consumed)) = parse_placeholder(&chars[i..]) {
                content.extend(codes);
                i += consumed;
                continue;
            }
        }

        let glyph_id = *symbols_by_char
            .get(&(font.id, ch))
            .ok_or(McdError::GlyphNotFound { font: font.id, ch })?;
        below = font.below;
        content.push(glyph_id as u16);

        let delta = chars
            .get(i + 1)
            .map(|&next| kernings.lookup(font.id, ch, next))
            .unwrap_or(0);
        content.push(delta as u16);
        i += 1;
    }

    content.push(TERMINATOR);

    Ok(Line {
        content,
        padding: 0,
        below,
        horiz: 0.0,
    })
}

/// Try to parse `<special:N>` / `<unknown:A>` / `<unknown:A:B>` markup
/// at the start of `chars`. Returns the raw codes and the number of
/// characters consumed, or `None` when the text is not placeholder
/// markup (in which case `<` falls through to a regular glyph lookup).
fn parse_placeholder(chars: &[char]) -> Option<(Vec<u16>, usize)> {
    let close = chars.iter().position(|&c| c == '>')?;
    let tag: String = chars[1..close].iter().collect();

    let codes = if let Some(body) = tag.strip_prefix("special:") {
        vec![SPECIAL, raw_value(body)?]
    } else if let Some(body) = tag.strip_prefix("unknown:") {
        let mut codes = Vec::with_capacity(2);
        for part in body.split(':') {
            codes.push(raw_value(part)?);
        }
        if codes.is_empty() || codes.len() > 2 {
            return None;
        }
        codes
    } else {
        return None;
    };

    Some((codes, close + 1))
}
