use std::collections::HashMap;
use std::io::Cursor;

use mcd_codec::mcd::content;
use mcd_codec::mcd::kerning::KerningTable;
use mcd_codec::{hash_event_name, Font, McdError, McdFile, Symbol};

const EVENT_GREETING: &str = "prologue_greeting";
const EVENT_FAREWELL: &str = "PROLOGUE_Farewell";

const HEADER_SIZE: u32 = 40;

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_f32(buf: &mut Vec<u8>, v: f32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_content(buf: &mut Vec<u8>, codes: &[u16]) {
    for &code in codes {
        push_u16(buf, code);
    }
}

/// Content streams of the fixture, message -> text -> line order.
///
/// Font 1 maps 'A'->0, 'B'->1, 'C'->2; font 2 maps 'A'->3.
const CONTENT: [&[u16]; 4] = [
    // "AB A": A kern 2, B kern 0, space, A kern 0
    &[0, 2, 1, 0, 0x8001, 1, 0, 0, 0x8000],
    // "AB" with kern 3
    &[0, 3, 1, 0, 0x8000],
    // "AB" with kern 4
    &[0, 4, 1, 0, 0x8000],
    // "A<special:5><unknown:32834:7>"
    &[3, 0, 0x8020, 5, 0x8042, 7, 0x8000],
];

/// Build a canonical-layout MCD image: two messages, three texts, four
/// lines, two fonts, four symbols, two opaque glyph records.
///
/// When `mismatched_font` is set, the third text is declared as font 1
/// even though its content uses font 2's glyph 3.
fn build_fixture(mismatched_font: bool) -> Vec<u8> {
    let content_len: u32 = CONTENT.iter().map(|c| c.len() as u32 * 2).sum();

    let messages_offset = HEADER_SIZE + content_len; // 92, already aligned
    let texts_base = messages_offset + 2 * 16; // 124
    let lines_base = texts_base + 3 * 20; // 184
    let symbols_offset = lines_base + 4 * 24; // 280
    let glyphs_offset = symbols_offset + 4 * 8 + 4; // 316
    let fonts_offset = glyphs_offset + 2 * 40 + 4; // 400
    let events_offset = fonts_offset + 2 * 20 + 4; // 444

    let mut buf = Vec::new();

    // Header
    for pair in [
        (messages_offset, 2u32),
        (symbols_offset, 4),
        (glyphs_offset, 2),
        (fonts_offset, 2),
        (events_offset, 2),
    ] {
        push_u32(&mut buf, pair.0);
        push_u32(&mut buf, pair.1);
    }

    // Line content
    for codes in CONTENT {
        push_content(&mut buf, codes);
    }

    // Messages
    push_u32(&mut buf, texts_base);
    push_u32(&mut buf, 1);
    push_u32(&mut buf, 100);
    push_u32(&mut buf, hash_event_name(EVENT_GREETING));
    push_u32(&mut buf, texts_base + 20);
    push_u32(&mut buf, 2);
    push_u32(&mut buf, 101);
    push_u32(&mut buf, hash_event_name(EVENT_FAREWELL));

    // Texts
    let t2_font = if mismatched_font { 1 } else { 2 };
    for (lines_offset, lines_count, vpos, hpos, font) in [
        (lines_base, 1u32, 5u32, 6u32, 1u32),
        (lines_base + 24, 2, 7, 8, 1),
        (lines_base + 3 * 24, 1, 9, 10, t2_font),
    ] {
        push_u32(&mut buf, lines_offset);
        push_u32(&mut buf, lines_count);
        push_u32(&mut buf, vpos);
        push_u32(&mut buf, hpos);
        push_u32(&mut buf, font);
    }

    // Lines
    let mut content_offset = HEADER_SIZE;
    for (i, codes) in CONTENT.iter().enumerate() {
        push_u32(&mut buf, content_offset);
        push_u32(&mut buf, 0);
        push_u32(&mut buf, codes.len() as u32);
        push_u32(&mut buf, codes.len() as u32);
        push_f32(&mut buf, if i == 3 { 2.5 } else { 2.0 });
        push_f32(&mut buf, 0.0);
        content_offset += codes.len() as u32 * 2;
    }

    // Symbols + fixed pad
    for (font_id, ch, glyph_id) in [(1u16, 'A', 0u32), (1, 'B', 1), (1, 'C', 2), (2, 'A', 3)] {
        push_u16(&mut buf, font_id);
        push_u16(&mut buf, ch as u16);
        push_u32(&mut buf, glyph_id);
    }
    buf.extend_from_slice(&[0; 4]);

    // Glyph blob + fixed pad
    buf.extend((0..80u32).map(|i| (i % 251) as u8));
    buf.extend_from_slice(&[0; 4]);

    // Fonts + fixed pad
    for (id, width, height, below, horiz) in
        [(1u32, 10.0f32, 12.0f32, 2.0f32, 1.0f32), (2, 11.0, 13.0, 2.5, 1.5)]
    {
        push_u32(&mut buf, id);
        push_f32(&mut buf, width);
        push_f32(&mut buf, height);
        push_f32(&mut buf, below);
        push_f32(&mut buf, horiz);
    }
    buf.extend_from_slice(&[0; 4]);

    // Events, sorted ascending by id; idx keeps the message position
    let mut events = [(EVENT_GREETING, 0u32), (EVENT_FAREWELL, 1)];
    events.sort_by_key(|&(name, _)| hash_event_name(name));
    for (name, idx) in events {
        push_u32(&mut buf, hash_event_name(name));
        push_u32(&mut buf, idx);
        let mut padded = [0u8; 32];
        padded[..name.len()].copy_from_slice(name.as_bytes());
        buf.extend_from_slice(&padded);
    }

    assert_eq!(buf.len() as u32, events_offset + 2 * 40, "fixture layout drifted");
    buf
}

fn decode_fixture() -> McdFile {
    let bytes = build_fixture(false);
    McdFile::from_reader(&mut Cursor::new(bytes)).expect("decode fixture")
}

fn glyph_sequence(content: &[u16]) -> Vec<u16> {
    let mut glyphs = Vec::new();
    let mut idx = 0;
    while idx + 1 < content.len() && content[idx] != 0x8000 {
        if content[idx] < 0x8000 {
            glyphs.push(content[idx]);
        }
        idx += 2;
    }
    glyphs
}

fn font1_lookup_tables() -> (HashMap<u32, Symbol>, HashMap<(u32, char), u32>, Font) {
    let font = Font {
        id: 1,
        width: 10.0,
        height: 12.0,
        below: 2.0,
        horiz: 1.0,
    };
    let symbols = [
        Symbol { font_id: 1, ch: 'A', glyph_id: 0 },
        Symbol { font_id: 1, ch: 'B', glyph_id: 1 },
    ];
    let by_glyph = symbols.iter().map(|s| (s.glyph_id, *s)).collect();
    let by_char = symbols
        .iter()
        .map(|s| ((s.font_id as u32, s.ch), s.glyph_id))
        .collect();
    (by_glyph, by_char, font)
}

#[test]
fn decodes_fixture_structure() {
    let mcd = decode_fixture();

    assert_eq!(mcd.header.messages_count, 2);
    assert_eq!(mcd.header.symbols_count, 4);
    assert_eq!(mcd.header.glyphs_count, 2);
    assert_eq!(mcd.header.fonts_count, 2);
    assert_eq!(mcd.header.events_count, 2);
    assert_eq!(mcd.glyphs.len(), 80);

    let doc = mcd.to_document().expect("interchange form");
    assert_eq!(doc.starting_seq_number, 100);
    assert_eq!(doc.messages.len(), 2);
    assert_eq!(doc.messages[0].event_name, EVENT_GREETING);
    assert_eq!(doc.messages[1].event_name, EVENT_FAREWELL);
    assert_eq!(doc.messages[0].texts[0].line, "AB A");
    assert_eq!(doc.messages[1].texts[0].line, "AB\nAB");
    assert_eq!(
        doc.messages[1].texts[1].line,
        "A<special:5><unknown:32834:7>"
    );

    let font1 = doc.fonts.iter().find(|f| f.id == 1).expect("font 1 listed");
    let chars: Vec<char> = font1.symbols.iter().map(|s| s.ch).collect();
    assert_eq!(chars, vec!['A', 'B', 'C']);
    let font2 = doc.fonts.iter().find(|f| f.id == 2).expect("font 2 listed");
    assert_eq!(font2.symbols.len(), 1);
    assert_eq!(font2.symbols[0].glyph_id, 3);
}

#[test]
fn round_trip_is_byte_identical() {
    let original = build_fixture(false);
    let mut mcd = McdFile::from_reader(&mut Cursor::new(original.clone())).expect("decode");

    let mut out = Cursor::new(Vec::new());
    mcd.write_to(&mut out).expect("encode");

    assert_eq!(out.into_inner(), original, "round-trip changed bytes");
}

#[test]
fn layout_offsets_agree_with_emitted_sections() {
    let mut mcd = decode_fixture();
    let mut out = Cursor::new(Vec::new());
    mcd.write_to(&mut out).expect("encode");

    let content_len: u32 = mcd
        .messages
        .iter()
        .flat_map(|m| &m.texts)
        .flat_map(|t| &t.lines)
        .map(|l| l.content.len() as u32 * 2)
        .sum();
    let line_count: u32 = mcd
        .messages
        .iter()
        .flat_map(|m| &m.texts)
        .map(|t| t.lines.len() as u32)
        .sum();
    let text_count: u32 = mcd.messages.iter().map(|m| m.texts.len() as u32).sum();

    let align = |v: u32| (v + 3) & !3;
    let mut expected = align(HEADER_SIZE + content_len);
    assert_eq!(mcd.header.messages_offset, expected);
    expected = align(expected + mcd.header.messages_count * 16);
    expected = align(expected + text_count * 20);
    expected = align(expected + line_count * 24);
    assert_eq!(mcd.header.symbols_offset, expected);

    for offset in [
        mcd.header.messages_offset,
        mcd.header.symbols_offset,
        mcd.header.glyphs_offset,
        mcd.header.fonts_offset,
        mcd.header.events_offset,
    ] {
        assert_eq!(offset % 4, 0, "section boundary {} not aligned", offset);
    }
}

#[test]
fn event_hash_is_case_insensitive_and_31_bit() {
    for name in [EVENT_GREETING, EVENT_FAREWELL, "Z", "mixed_Case_Name"] {
        let hash = hash_event_name(name);
        assert_eq!(hash, hash_event_name(&name.to_uppercase()));
        assert_eq!(hash, hash_event_name(&name.to_lowercase()));
        assert!(hash < (1 << 31), "sign bit set in hash of {:?}", name);
    }
    assert_ne!(hash_event_name(EVENT_GREETING), hash_event_name(EVENT_FAREWELL));
}

#[test]
fn kerning_reconstruction_averages_pairs() {
    let mcd = decode_fixture();
    let kernings = mcd.kernings();

    // "AB" appears with deltas {2, 3, 4} under font 1
    assert_eq!(kernings.mean(1, 'A', 'B'), Some(3.0));
    assert_eq!(kernings.pair_count(1, 'A', 'B'), 3);
    assert_eq!(kernings.lookup(1, 'A', 'B'), 3);

    // never observed: reversed pair, other font
    assert_eq!(kernings.lookup(1, 'B', 'A'), 0);
    assert_eq!(kernings.pair_count(2, 'A', 'B'), 0);
}

#[test]
fn reencode_preserves_glyph_sequences_and_placeholders() {
    let mut mcd = decode_fixture();
    let doc = mcd.to_document().expect("interchange form");
    let original_contents: Vec<Vec<u16>> = mcd
        .messages
        .iter()
        .flat_map(|m| &m.texts)
        .flat_map(|t| &t.lines)
        .map(|l| l.content.clone())
        .collect();

    mcd.update_from_document(&doc).expect("apply unchanged document");

    let reencoded: Vec<Vec<u16>> = mcd
        .messages
        .iter()
        .flat_map(|m| &m.texts)
        .flat_map(|t| &t.lines)
        .map(|l| l.content.clone())
        .collect();

    assert_eq!(reencoded.len(), original_contents.len());
    for (new, old) in reencoded.iter().zip(&original_contents) {
        assert_eq!(glyph_sequence(new), glyph_sequence(old));
    }

    // placeholder markup decodes back to the exact original codes
    assert_eq!(reencoded[3], CONTENT[3]);
    // "AB" kerning now carries the reconstructed mean everywhere
    assert_eq!(reencoded[1], vec![0, 3, 1, 0, 0x8000]);
    assert_eq!(reencoded[2], vec![0, 3, 1, 0, 0x8000]);

    // the decoded strings are unchanged by re-encoding
    let doc_after = mcd.to_document().expect("interchange form after update");
    for (before, after) in doc.messages.iter().zip(&doc_after.messages) {
        for (t_before, t_after) in before.texts.iter().zip(&after.texts) {
            assert_eq!(t_before.line, t_after.line);
        }
    }
}

#[test]
fn update_sorts_events_and_keeps_message_order_idx() {
    let mut mcd = decode_fixture();
    let mut doc = mcd.to_document().expect("interchange form");

    let mut extra = doc.messages[0].clone();
    extra.event_name = "zz_added_event".to_string();
    extra.texts[0].line = "C".to_string();
    doc.messages.push(extra);
    doc.starting_seq_number = 500;

    mcd.update_from_document(&doc).expect("apply edited document");

    assert_eq!(mcd.events.len(), 3);
    for window in mcd.events.windows(2) {
        assert!(window[0].id < window[1].id, "event table not sorted by id");
    }
    for (position, name) in [(0, EVENT_GREETING), (1, EVENT_FAREWELL), (2, "zz_added_event")] {
        let event = mcd
            .events
            .iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("missing event {}", name));
        assert_eq!(event.idx, position, "idx must keep original message order");
        assert_eq!(event.id, hash_event_name(name));
    }

    let seqs: Vec<u32> = mcd.messages.iter().map(|m| m.seq_number).collect();
    assert_eq!(seqs, vec![500, 501, 502]);
    assert_eq!(mcd.header.messages_count, 3);
    assert_eq!(mcd.header.events_count, 3);
}

#[test]
fn encoding_unmapped_character_fails_with_glyph_not_found() {
    let mut mcd = decode_fixture();
    let mut doc = mcd.to_document().expect("interchange form");
    doc.messages[0].texts[0].line = "AXB".to_string();

    match mcd.update_from_document(&doc) {
        Err(McdError::GlyphNotFound { font, ch }) => {
            assert_eq!(font, 1);
            assert_eq!(ch, 'X');
        }
        other => panic!("expected GlyphNotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn decoding_foreign_glyph_fails_with_font_mismatch() {
    let bytes = build_fixture(true);
    let mcd = McdFile::from_reader(&mut Cursor::new(bytes)).expect("decode");

    match mcd.to_document() {
        Err(McdError::FontMismatch {
            glyph_id,
            symbol_font,
            text_font,
        }) => {
            assert_eq!(glyph_id, 3);
            assert_eq!(symbol_font, 2);
            assert_eq!(text_font, 1);
        }
        other => panic!("expected FontMismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn overlong_event_name_is_a_format_error() {
    let mut mcd = decode_fixture();
    let mut doc = mcd.to_document().expect("interchange form");
    doc.messages[0].event_name = "x".repeat(33);

    match mcd.update_from_document(&doc) {
        Err(McdError::Format(message)) => assert!(message.contains("exceeds")),
        other => panic!("expected Format error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn unknown_font_in_document_is_malformed_interchange() {
    let mut mcd = decode_fixture();
    let mut doc = mcd.to_document().expect("interchange form");
    doc.messages[0].texts[0].font = 99;

    assert!(matches!(
        mcd.update_from_document(&doc),
        Err(McdError::MalformedInterchange(_))
    ));
}

#[test]
fn content_decode_stops_at_terminator() {
    let (by_glyph, _, font) = font1_lookup_tables();
    let decoded =
        content::decode(&[0, 0, 0x8000, 1, 0, 0x8000], &by_glyph, &font).expect("decode");
    assert_eq!(decoded, "A", "codes after the terminator must be ignored");
}

#[test]
fn content_unknown_codes_round_trip_through_markup() {
    let (by_glyph, by_char, font) = font1_lookup_tables();
    let kernings = KerningTable::default();

    // 0x9001 reads back as a signed delta in placeholder markup
    let decoded = content::decode(&[0x9001, 7, 0x8000], &by_glyph, &font).expect("decode");
    assert_eq!(decoded, "<unknown:-28671:7>");

    let line = content::encode(&decoded, &by_char, &font, &kernings).expect("encode");
    assert_eq!(line.content, vec![0x9001, 7, 0x8000]);
}

#[test]
fn disagreeing_line_count_copies_are_rejected() {
    let mut bytes = build_fixture(false);
    // first line record sits at lines_base (184); its duplicated content
    // count is the fourth u32 field, at offset 196
    bytes[196..200].copy_from_slice(&8u32.to_le_bytes());

    match McdFile::from_reader(&mut Cursor::new(bytes)) {
        Err(McdError::Format(message)) => {
            assert!(
                message.contains("count mismatch"),
                "unexpected message: {}",
                message
            );
        }
        other => panic!("expected Format error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn content_decode_rejects_unknown_glyph_and_truncated_escape() {
    let (by_glyph, _, font) = font1_lookup_tables();

    // glyph id 5 has no symbol under any font
    match content::decode(&[5, 0, 0x8000], &by_glyph, &font) {
        Err(McdError::Format(message)) => {
            assert!(
                message.contains("unknown glyph id 5"),
                "unexpected message: {}",
                message
            );
        }
        other => panic!("expected Format error, got {:?}", other.map(|_| ())),
    }

    // special escape with no payload code following
    match content::decode(&[0x8020], &by_glyph, &font) {
        Err(McdError::Format(message)) => {
            assert!(
                message.contains("missing payload"),
                "unexpected message: {}",
                message
            );
        }
        other => panic!("expected Format error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn lone_surrogate_symbol_is_rejected() {
    let mut bytes = build_fixture(false);
    // first symbol record sits at symbols_offset (280); its UTF-16LE
    // character unit is at offset 282
    bytes[282..284].copy_from_slice(&0xD800u16.to_le_bytes());

    match McdFile::from_reader(&mut Cursor::new(bytes)) {
        Err(McdError::Format(message)) => {
            assert!(
                message.contains("surrogate"),
                "unexpected message: {}",
                message
            );
        }
        other => panic!("expected Format error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn content_space_carries_font_id() {
    let (_, by_char, font) = font1_lookup_tables();
    let kernings = KerningTable::default();

    let line = content::encode("A B", &by_char, &font, &kernings).expect("encode");
    assert_eq!(line.content, vec![0, 0, 0x8001, 1, 1, 0, 0x8000]);
    assert_eq!(line.below, font.below, "glyph line takes the font's below metric");
}

#[test]
fn write_to_path_is_atomic_and_leaves_no_temp_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("out.mcd");

    let mut mcd = decode_fixture();
    mcd.write_to_path(&path).expect("write");

    assert!(path.exists());
    assert!(!dir.path().join("out.mcd.tmp").exists());
    let written = std::fs::read(&path).expect("read back");
    assert_eq!(written, build_fixture(false));
}
