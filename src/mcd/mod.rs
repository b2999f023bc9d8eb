//! Core MCD codec module.

pub mod content;
pub mod error;
pub mod interchange;
pub mod kerning;
pub mod models;
mod header;
mod layout;
mod messages;
mod records;
mod utils;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::info;

use error::{McdError, Result};
use interchange::{Document, FontDoc, MessageDoc, SymbolDoc, TextDoc};
use kerning::KerningTable;
use models::*;

pub use records::hash_event_name;

/// Derived lookup views over the symbol, font, and event tables.
///
/// These are caches, never independently mutable state; they are rebuilt
/// whenever a source collection is replaced.
#[derive(Debug, Default)]
struct Index {
    events_by_id: HashMap<u32, usize>,
    fonts_by_id: HashMap<u32, Font>,
    symbols_by_glyph: HashMap<u32, Symbol>,
    symbols_by_char: HashMap<(u32, char), u32>,
}

impl Index {
    fn build(symbols: &[Symbol], fonts: &[Font], events: &[Event]) -> Self {
        let mut index = Index::default();
        // A later event with a colliding id shadows an earlier one.
        for (i, event) in events.iter().enumerate() {
            index.events_by_id.insert(event.id, i);
        }
        for font in fonts {
            index.fonts_by_id.insert(font.id, *font);
        }
        for symbol in symbols {
            index.symbols_by_glyph.insert(symbol.glyph_id, *symbol);
            index
                .symbols_by_char
                .insert((symbol.font_id as u32, symbol.ch), symbol.glyph_id);
        }
        index
    }
}

/// A fully decoded MCD container.
///
/// The whole object graph is built once per decode, optionally mutated
/// wholesale through [`McdFile::update_from_document`], and re-linearized
/// once per encode. There is no partial update path.
pub struct McdFile {
    pub header: Header,
    pub messages: Vec<Message>,
    pub symbols: Vec<Symbol>,
    /// Opaque fixed-stride glyph records, preserved verbatim.
    pub glyphs: Vec<u8>,
    pub fonts: Vec<Font>,
    pub events: Vec<Event>,

    index: Index,
    kernings: KerningTable,
}

impl McdFile {
    /// Decode an MCD file from the given path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening MCD file: {}", path.display());
        let mut reader = BufReader::new(File::open(path)?);
        Self::from_reader(&mut reader)
    }

    /// Decode an MCD container from any seekable byte source.
    ///
    /// # Errors
    /// Returns an error if the file is truncated, a count or offset does
    /// not describe a readable section, an event name is not valid
    /// UTF-8, or a line record's duplicated content count disagrees with
    /// itself.
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let header = header::parse(reader)?;

        reader.seek(SeekFrom::Start(header.messages_offset as u64))?;
        let msgs = (0..header.messages_count)
            .map(|_| messages::parse_message(reader))
            .collect::<Result<Vec<_>>>()?;

        reader.seek(SeekFrom::Start(header.symbols_offset as u64))?;
        let symbols = (0..header.symbols_count)
            .map(|_| records::parse_symbol(reader))
            .collect::<Result<Vec<_>>>()?;

        reader.seek(SeekFrom::Start(header.glyphs_offset as u64))?;
        let mut glyphs = vec![0u8; header.glyphs_count as usize * GLYPH_RECORD_SIZE];
        reader.read_exact(&mut glyphs)?;

        reader.seek(SeekFrom::Start(header.fonts_offset as u64))?;
        let fonts = (0..header.fonts_count)
            .map(|_| records::parse_font(reader))
            .collect::<Result<Vec<_>>>()?;

        reader.seek(SeekFrom::Start(header.events_offset as u64))?;
        let events = (0..header.events_count)
            .map(|_| records::parse_event(reader))
            .collect::<Result<Vec<_>>>()?;

        let index = Index::build(&symbols, &fonts, &events);
        let kernings = KerningTable::reconstruct(&msgs, &index.symbols_by_glyph);

        info!(
            "MCD decoded: {} messages, {} symbols, {} fonts, {} events",
            msgs.len(),
            symbols.len(),
            fonts.len(),
            events.len()
        );

        Ok(Self {
            header,
            messages: msgs,
            symbols,
            glyphs,
            fonts,
            events,
            index,
            kernings,
        })
    }

    /// The kerning table reconstructed from the decoded content.
    pub fn kernings(&self) -> &KerningTable {
        &self.kernings
    }

    /// Emit the editable interchange form of the message set.
    ///
    /// # Errors
    /// Fails if a message references an event id absent from the event
    /// table, a text references an unknown font, or line content cannot
    /// be decoded (unknown glyph id, font mismatch).
    pub fn to_document(&self) -> Result<Document> {
        let starting_seq_number = self.messages.first().map(|m| m.seq_number).unwrap_or(0);

        let mut msgs = Vec::with_capacity(self.messages.len());
        for message in &self.messages {
            let event = self
                .index
                .events_by_id
                .get(&message.event_id)
                .map(|&i| &self.events[i])
                .ok_or_else(|| {
                    McdError::Format(format!(
                        "message {} references unknown event id {:#010x}",
                        message.seq_number, message.event_id
                    ))
                })?;

            let mut texts = Vec::with_capacity(message.texts.len());
            for text in &message.texts {
                let font = self.font_by_id(text.font)?;
                let line = text
                    .lines
                    .iter()
                    .map(|line| content::decode(&line.content, &self.index.symbols_by_glyph, &font))
                    .collect::<Result<Vec<_>>>()?
                    .join("\n");
                texts.push(TextDoc {
                    vpos: text.vpos,
                    hpos: text.hpos,
                    font: text.font,
                    line,
                });
            }
            msgs.push(MessageDoc {
                event_name: event.name.clone(),
                texts,
            });
        }

        let fonts = self
            .fonts
            .iter()
            .map(|font| FontDoc {
                id: font.id,
                symbols: self
                    .symbols
                    .iter()
                    .filter(|s| s.font_id as u32 == font.id)
                    .map(|s| SymbolDoc {
                        ch: s.ch,
                        glyph_id: s.glyph_id,
                    })
                    .collect(),
            })
            .collect();

        Ok(Document {
            starting_seq_number,
            messages: msgs,
            fonts,
        })
    }

    /// Replace the message and event collections with the edited
    /// interchange document, re-encoding all text against the existing
    /// symbol and kerning tables.
    ///
    /// Events are rebuilt from the edited message order: ids sort
    /// ascending while each event's `idx` keeps the original message
    /// position. Sequence numbers count up from `starting_seq_number`.
    ///
    /// # Errors
    /// Fails with `Format` when an event name exceeds its 32-byte field,
    /// `MalformedInterchange` when a text names a font the base file
    /// lacks, and `GlyphNotFound` when a character has no symbol under
    /// its font.
    pub fn update_from_document(&mut self, doc: &Document) -> Result<()> {
        let mut events: Vec<Event> = doc
            .messages
            .iter()
            .enumerate()
            .map(|(i, m)| Event::from_name(&m.event_name, i as u32))
            .collect();
        for event in &events {
            if event.name.len() > Event::NAME_SIZE {
                return Err(McdError::Format(format!(
                    "event name {:?} exceeds {} bytes",
                    event.name,
                    Event::NAME_SIZE
                )));
            }
        }
        events.sort_by_key(|e| e.id);
        self.events = events;
        self.index = Index::build(&self.symbols, &self.fonts, &self.events);

        let mut msgs = Vec::with_capacity(doc.messages.len());
        let mut seq_number = doc.starting_seq_number;
        for message_doc in &doc.messages {
            let mut texts = Vec::with_capacity(message_doc.texts.len());
            for text_doc in &message_doc.texts {
                let font = self.index.fonts_by_id.get(&text_doc.font).copied().ok_or_else(|| {
                    McdError::MalformedInterchange(format!(
                        "text references unknown font {}",
                        text_doc.font
                    ))
                })?;
                let lines = text_doc
                    .line
                    .split('\n')
                    .map(|line| {
                        content::encode(line, &self.index.symbols_by_char, &font, &self.kernings)
                    })
                    .collect::<Result<Vec<_>>>()?;
                texts.push(Text {
                    vpos: text_doc.vpos,
                    hpos: text_doc.hpos,
                    font: text_doc.font,
                    lines,
                });
            }
            msgs.push(Message {
                seq_number,
                event_id: hash_event_name(&message_doc.event_name),
                texts,
            });
            seq_number += 1;
        }
        self.messages = msgs;

        self.header.messages_count = self.messages.len() as u32;
        self.header.events_count = self.events.len() as u32;

        info!(
            "Interchange applied: {} messages, {} events",
            self.messages.len(),
            self.events.len()
        );
        Ok(())
    }

    /// Serialize the container, resolving the full byte layout before
    /// any section is written. Updates `self.header` with the planned
    /// offsets and counts.
    pub fn write_to<W: Write + Seek>(&mut self, writer: &mut W) -> Result<()> {
        layout::write(writer, self)
    }

    /// Serialize to a file, atomically: the image is written to a
    /// temporary sibling path and renamed into place on success, so a
    /// failed encode never leaves a partial output behind.
    pub fn write_to_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut tmp_name = path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let write_result = (|| -> Result<()> {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            self.write_to(&mut writer)?;
            writer.flush()?;
            Ok(())
        })();
        if let Err(e) = write_result {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }

        std::fs::rename(&tmp, path)?;
        info!("Wrote {}", path.display());
        Ok(())
    }

    fn font_by_id(&self, font_id: u32) -> Result<Font> {
        self.index.fonts_by_id.get(&font_id).copied().ok_or_else(|| {
            McdError::Format(format!("text references unknown font {}", font_id))
        })
    }
}
