//! Kerning reconstruction from decoded line content.
//!
//! The binary format stores the kerning delta applied after every glyph
//! but keeps no standalone pair table, so plausible spacing for edited
//! or newly added text has to be inferred: every decoded line is
//! replayed and the non-zero deltas between adjacent glyph pairs are
//! averaged per font. The table is rebuilt on every load and never
//! persisted.

use std::collections::HashMap;

use log::debug;

use super::content;
use super::models::{Message, Symbol};

#[derive(Debug, Clone, Copy)]
struct PairStat {
    sum: i64,
    count: u32,
}

/// Per-font averaged kerning deltas keyed by ordered character pair.
#[derive(Debug, Default)]
pub struct KerningTable {
    fonts: HashMap<u32, HashMap<(char, char), PairStat>>,
}

impl KerningTable {
    /// Replay every decoded line in the message set and accumulate the
    /// deltas between adjacent glyph-coded characters.
    pub fn reconstruct(messages: &[Message], symbols_by_glyph: &HashMap<u32, Symbol>) -> Self {
        let mut table = KerningTable::default();
        for message in messages {
            for text in &message.texts {
                for line in &text.lines {
                    table.accumulate(text.font, &line.content, symbols_by_glyph);
                }
            }
        }
        debug!(
            "Kerning reconstructed: {} fonts, {} pairs",
            table.fonts.len(),
            table.fonts.values().map(HashMap::len).sum::<usize>()
        );
        table
    }

    fn accumulate(
        &mut self,
        font_id: u32,
        content: &[u16],
        symbols_by_glyph: &HashMap<u32, Symbol>,
    ) {
        let mut idx = 0;
        // Content alternates code/argument pairs, so the walk steps by two.
        while idx + 1 < content.len() {
            let code = content[idx];
            if code == content::TERMINATOR {
                break;
            }
            if code < content::TERMINATOR {
                let delta = content[idx + 1] as i16;
                if delta != 0 {
                    let first = symbols_by_glyph.get(&(code as u32));
                    let second = content
                        .get(idx + 2)
                        .filter(|&&next| next < content::TERMINATOR)
                        .and_then(|&next| symbols_by_glyph.get(&(next as u32)));
                    if let (Some(first), Some(second)) = (first, second) {
                        let stat = self
                            .fonts
                            .entry(font_id)
                            .or_default()
                            .entry((first.ch, second.ch))
                            .or_insert(PairStat { sum: 0, count: 0 });
                        stat.sum += delta as i64;
                        stat.count += 1;
                    }
                }
            }
            idx += 2;
        }
    }

    /// Rounded mean delta for the pair under the font, or zero when the
    /// pair was never observed.
    pub fn lookup(&self, font_id: u32, first: char, second: char) -> i16 {
        self.mean(font_id, first, second)
            .map(|mean| mean.round() as i16)
            .unwrap_or(0)
    }

    /// Arithmetic mean delta for the pair, if observed.
    pub fn mean(&self, font_id: u32, first: char, second: char) -> Option<f64> {
        self.fonts
            .get(&font_id)
            .and_then(|pairs| pairs.get(&(first, second)))
            .map(|stat| stat.sum as f64 / stat.count as f64)
    }

    /// Number of times the pair was observed with a non-zero delta.
    pub fn pair_count(&self, font_id: u32, first: char, second: char) -> u32 {
        self.fonts
            .get(&font_id)
            .and_then(|pairs| pairs.get(&(first, second)))
            .map(|stat| stat.count)
            .unwrap_or(0)
    }
}
