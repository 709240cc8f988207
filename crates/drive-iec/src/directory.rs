//! Directory listings as loadable BASIC programs.
//!
//! `LOAD"$",8` returns a tokenless BASIC program: line numbers carry the
//! block counts and line text carries the quoted names, so `LIST` shows the
//! directory.

use format_vic20_bas::ProgramBuilder;

use crate::storage::DirEntry;

/// Guest address listings load at.
pub const LISTING_ADDRESS: u16 = 0x0401;

/// Reverse-video control code opening the header line.
const REVERSE_ON: u8 = 0x12;

/// Header line: reverse-video quoted disk name, plus "2A" in long form.
fn header_line(directory: &str, long: bool) -> Vec<u8> {
    // Text after the last separator; a trailing '/' leaves it empty.
    let name = directory.rsplit('/').next().unwrap_or(directory);

    let mut line = vec![b' '; if long { 25 } else { 19 }];
    line[0] = REVERSE_ON;
    line[1] = b'"';
    for (dst, &src) in line[2..18].iter_mut().zip(name.as_bytes()) {
        *dst = src;
    }
    line[18] = b'"';
    if long {
        line[23] = b'2';
        line[24] = b'A';
    }
    petscii_upper(&mut line);
    line
}

/// Entry line and its block count. `None` for hidden directories.
fn entry_line(entry: &DirEntry, long: bool) -> Option<(u16, Vec<u8>)> {
    let (blocks, stem, ext) = if entry.is_dir {
        if entry.name.starts_with('.') {
            return None;
        }
        (0, entry.name.as_str(), Some("DIR"))
    } else {
        let blocks = (entry.size / 256).clamp(1, u64::from(u16::MAX)) as u16;
        match entry.name.split_once('.') {
            Some((stem, ext)) => (blocks, stem, Some(ext)),
            None => (blocks, entry.name.as_str(), None),
        }
    };

    let lead = match blocks {
        0..=9 => 3,
        10..=99 => 2,
        _ => 1,
    };
    let width = if long { 16 } else { 10 };

    let mut line = vec![b' '; lead];
    line.push(b'"');
    line.extend(stem.bytes().take(width));
    line.push(b'"');
    if let Some(ext) = ext {
        let column = if long { 19 } else { 13 } + lead;
        if line.len() < column {
            line.resize(column, b' ');
        }
        line.extend_from_slice(ext.as_bytes());
    }
    petscii_upper(&mut line);
    Some((blocks, line))
}

/// ASCII to PETSCII for the listing: upper-case letters only.
fn petscii_upper(text: &mut [u8]) {
    text.make_ascii_uppercase();
}

/// Build the whole listing program for `entries` under `directory`.
#[must_use]
pub fn build_listing(directory: &str, entries: &[DirEntry], long: bool) -> Vec<u8> {
    let mut prg = ProgramBuilder::new(LISTING_ADDRESS);
    prg.add_line(0, &header_line(directory, long));
    for (blocks, line) in entries.iter().filter_map(|e| entry_line(e, long)) {
        prg.add_line(blocks, &line);
    }
    prg.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: u64) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            is_dir: false,
            size,
        }
    }

    #[test]
    fn header_pads_and_truncates_name() {
        let short = header_line("/sd/games", false);
        assert_eq!(short.len(), 19);
        assert_eq!(short[0], 0x12);
        assert_eq!(&short[1..9], b"\"GAMES  ");
        assert_eq!(short[18], b'"');

        let long = header_line("/a-very-long-directory-name", true);
        assert_eq!(long.len(), 25);
        assert_eq!(&long[2..18], b"A-VERY-LONG-DIRE");
        assert_eq!(&long[23..25], b"2A");
    }

    #[test]
    fn header_name_is_text_after_last_slash() {
        let root = header_line("/", false);
        assert_eq!(&root[1..19], b"\"                \"");
        let trailing = header_line("/sd/games/", false);
        assert_eq!(&trailing[2..18], [b' '; 16]);
        let bare = header_line("disk", false);
        assert_eq!(&bare[2..6], b"DISK");
    }

    #[test]
    fn file_entry_layout() {
        let (blocks, line) = entry_line(&file("hello.prg", 2048), false).expect("visible");
        assert_eq!(blocks, 8);
        assert_eq!(line, b"   \"HELLO\"      PRG");
        assert_eq!(&line[16..], b"PRG");
    }

    #[test]
    fn small_files_count_one_block() {
        let (blocks, line) = entry_line(&file("x", 12), false).expect("visible");
        assert_eq!(blocks, 1);
        assert_eq!(line, b"   \"X\"");
    }

    #[test]
    fn lead_shrinks_with_block_count() {
        let (_, line) = entry_line(&file("big.prg", 256 * 150), false).expect("visible");
        assert_eq!(&line[..2], b" \"");
        assert_eq!(&line[14..], b"PRG");
    }

    #[test]
    fn names_truncate_by_form() {
        let entry = file("abcdefghijklmnopqrst.prg", 256);
        let (_, short) = entry_line(&entry, false).expect("visible");
        assert_eq!(&short[3..15], b"\"ABCDEFGHIJ\"");
        let (_, long) = entry_line(&entry, true).expect("visible");
        assert_eq!(&long[3..21], b"\"ABCDEFGHIJKLMNOP\"");
        assert_eq!(&long[22..], b"PRG");
    }

    #[test]
    fn directories_show_dir_and_hidden_are_skipped() {
        let games = DirEntry {
            name: "games".into(),
            is_dir: true,
            size: 0,
        };
        let (blocks, line) = entry_line(&games, false).expect("visible");
        assert_eq!(blocks, 0);
        assert_eq!(&line[16..], b"DIR");

        let hidden = DirEntry {
            name: ".git".into(),
            is_dir: true,
            size: 0,
        };
        assert!(entry_line(&hidden, false).is_none());
    }

    #[test]
    fn listing_ends_with_terminator() {
        let listing = build_listing("/disk", &[file("a.prg", 300)], false);
        assert_eq!(&listing[..2], [0x01, 0x04]);
        assert!(listing.ends_with(&[0, 0, 0]));
    }
}
