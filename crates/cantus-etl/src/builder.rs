//! Turns raw provider songs into [`SongRecord`]s.
//!
//! Building never fails: a song without a title or lyrics still yields a
//! record (with empty strings), and a missing album becomes `None`.

use std::borrow::Cow;

use cantus_core::model::SongRecord;

use crate::provider::RawSong;

/// Build a [`SongRecord`] for `artist_name` from one provider song.
///
/// The lyrics are normalized first (see [`normalize_lyrics`]); the word
/// count is taken from the normalized text.
pub fn build(raw: &RawSong, artist_name: &str) -> SongRecord {
    let title = raw.title.as_deref().map(str::trim).unwrap_or_default();
    let lyrics = raw
        .lyrics
        .as_deref()
        .map(normalize_lyrics)
        .unwrap_or_default();
    let album = raw
        .album
        .as_ref()
        .and_then(|album| album.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    SongRecord::new(artist_name, title, album, lyrics)
}

/// Repair encoding damage and normalize whitespace in a lyrics body.
///
/// - UTF-8 text that was decoded as Latin-1/Windows-1252 is re-decoded,
///   line by line.
/// - `\r\n` and lone `\r` become `\n`.
/// - Zero-width characters and byte-order marks are dropped; non-breaking
///   spaces become plain spaces.
pub fn normalize_lyrics(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(unified.len());
    for line in unified.split_inclusive('\n') {
        out.push_str(&repair_mojibake(line));
    }

    out.chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}'))
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect()
}

/// Undo a UTF-8 -> Windows-1252 mis-decode, if `text` is one.
///
/// Every char is mapped back to the single byte it would have come from;
/// the repair is kept only when those bytes form valid UTF-8 that differs
/// from the input. Genuine Latin-1 text (`café`) does not survive the
/// round trip and is returned unchanged.
pub fn repair_mojibake(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
        return Cow::Borrowed(text);
    }

    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        match cp1252_byte(c) {
            Some(b) => bytes.push(b),
            None => return Cow::Borrowed(text),
        }
    }

    match String::from_utf8(bytes) {
        Ok(repaired) if repaired != text => Cow::Owned(repaired),
        _ => Cow::Borrowed(text),
    }
}

/// The Windows-1252 byte that decodes to `c`, if any.
///
/// Undefined 1252 slots (0x81, 0x8D, 0x8F, 0x90, 0x9D) are commonly
/// passed through as the matching C1 control, so those map to themselves.
fn cp1252_byte(c: char) -> Option<u8> {
    let code = u32::from(c);
    if code < 0x80 || (0xA0..=0xFF).contains(&code) {
        return u8::try_from(code).ok();
    }
    let byte = match c {
        '\u{20AC}' => 0x80,
        '\u{0081}' => 0x81,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{008D}' => 0x8D,
        '\u{017D}' => 0x8E,
        '\u{008F}' => 0x8F,
        '\u{0090}' => 0x90,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{009D}' => 0x9D,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::RawAlbum;

    #[test]
    fn test_build_full_song() {
        let raw = RawSong::new("Emily", "The meteorite is a source of the light")
            .with_album("Ys");
        let record = build(&raw, "Joanna Newsom");

        assert_eq!(record.artist, "Joanna Newsom");
        assert_eq!(record.title, "Emily");
        assert_eq!(record.album.as_deref(), Some("Ys"));
        assert_eq!(record.lyrics_word_count, 8);
    }

    #[test]
    fn test_build_missing_fields_degrade() {
        let record = build(&RawSong::default(), "Kate Bush");
        assert_eq!(record.title, "");
        assert_eq!(record.lyrics, "");
        assert_eq!(record.lyrics_word_count, 0);
        assert!(record.album.is_none());
    }

    #[test]
    fn test_build_album_without_name() {
        let raw = RawSong {
            album: Some(RawAlbum { name: None }),
            ..RawSong::new("Song", "la")
        };
        assert!(build(&raw, "A").album.is_none());

        let blank = RawSong::new("Song", "la").with_album("  ");
        assert!(build(&blank, "A").album.is_none());
    }

    #[test]
    fn test_repair_mojibake_apostrophe() {
        assert_eq!(repair_mojibake("Itâ€™s me"), "It’s me");
    }

    #[test]
    fn test_repair_mojibake_accents() {
        assert_eq!(repair_mojibake("cafÃ© olÃ©"), "café olé");
    }

    #[test]
    fn test_repair_leaves_clean_text_alone() {
        assert!(matches!(repair_mojibake("plain ascii"), Cow::Borrowed(_)));
        assert_eq!(repair_mojibake("café"), "café");
        assert_eq!(repair_mojibake("It’s fine"), "It’s fine");
        assert_eq!(repair_mojibake("日本語"), "日本語");
    }

    #[test]
    fn test_normalize_repairs_per_line() {
        let text = "naïve line\r\nIâ€™m broken\n";
        assert_eq!(normalize_lyrics(text), "naïve line\nI’m broken\n");
    }

    #[test]
    fn test_normalize_strips_invisible_characters() {
        let text = "\u{FEFF}one\u{200B}two\u{00A0}three";
        assert_eq!(normalize_lyrics(text), "onetwo three");
    }

    #[test]
    fn test_word_count_uses_normalized_lyrics() {
        let raw = RawSong::new("T", "word\u{00A0}word");
        assert_eq!(build(&raw, "A").lyrics_word_count, 2);
    }
}
