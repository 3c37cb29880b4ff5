//! On-disk container of a [`PreloadedDatabase`].
//!
//! All integers are little-endian.
//!
//! ```text
//! magic        b"HPKP"
//! version      u16 = 1
//! reserved     u16 = 0
//! huffman_len  u32, followed by huffman_len bytes
//! trie_bits    u32, followed by ceil(trie_bits / 8) bytes
//! root         u32 bit offset of the root node
//! pinsets      u16 count, then per pinset:
//!                  name      u8 length + UTF-8
//!                  accepted  u16 count, each pin u8 length + ASCII
//!                  rejected  u16 count, each pin u8 length + ASCII
//! ```

use crate::{
    file::{io::write_le, Parser},
    pins::{PinIdentifier, Pinset},
    preload::PreloadedDatabase,
    Error, Result,
};

const MAGIC: &[u8; 4] = b"HPKP";
const VERSION: u16 = 1;

pub(crate) fn read(data: &[u8]) -> Result<PreloadedDatabase> {
    if data.is_empty() {
        return Err(Error::Empty);
    }

    let mut parser = Parser::new(data);
    if data.len() < MAGIC.len() || parser.read_bytes(MAGIC.len())? != MAGIC {
        return Err(Error::NotSupported);
    }
    if parser.read_le::<u16>()? != VERSION {
        return Err(Error::NotSupported);
    }
    let _reserved = parser.read_le::<u16>()?;

    let huffman_len = parser.read_le::<u32>()? as usize;
    let huffman_tree = parser.read_bytes(huffman_len)?.to_vec();

    let trie_bits = parser.read_le::<u32>()? as usize;
    let trie = parser.read_bytes(trie_bits.div_ceil(8))?.to_vec();
    let root_position = parser.read_le::<u32>()? as usize;

    let pinset_count = parser.read_le::<u16>()?;
    let mut pinsets = Vec::with_capacity(usize::from(pinset_count));
    for id in 0..u32::from(pinset_count) {
        let name = parser.read_prefixed_string_utf8()?;
        let mut pinset = Pinset::new(id, name);
        pinset.accepted_pins = read_pins(&mut parser)?;
        pinset.rejected_pins = read_pins(&mut parser)?;
        pinsets.push(pinset);
    }

    if parser.has_more_data() {
        return Err(malformed_error!(
            "{} trailing bytes after pinset table",
            parser.remaining()
        ));
    }

    PreloadedDatabase::from_parts(huffman_tree, trie, trie_bits, root_position, pinsets)
}

fn read_pins(parser: &mut Parser<'_>) -> Result<Vec<PinIdentifier>> {
    let count = parser.read_le::<u16>()?;
    let mut pins = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let text = parser.read_prefixed_string_utf8()?;
        let pin = PinIdentifier::parse(text)
            .map_err(|_| malformed_error!("Invalid pin '{}' in pinset table", text))?;
        pins.push(pin);
    }
    Ok(pins)
}

pub(crate) fn write(db: &PreloadedDatabase) -> Vec<u8> {
    let (huffman_tree, trie, trie_bits, root_position) = db.raw_parts();

    let mut out = Vec::with_capacity(16 + huffman_tree.len() + trie.len());
    out.extend_from_slice(MAGIC);
    write_le(&mut out, VERSION);
    write_le(&mut out, 0_u16);

    write_le(&mut out, huffman_tree.len() as u32);
    out.extend_from_slice(huffman_tree);
    write_le(&mut out, trie_bits as u32);
    out.extend_from_slice(&trie[..trie_bits.div_ceil(8)]);
    write_le(&mut out, root_position as u32);

    write_le(&mut out, db.pinsets().len() as u16);
    for pinset in db.pinsets() {
        write_string(&mut out, &pinset.name);
        write_pins(&mut out, &pinset.accepted_pins);
        write_pins(&mut out, &pinset.rejected_pins);
    }

    out
}

fn write_pins(out: &mut Vec<u8>, pins: &[PinIdentifier]) {
    write_le(out, pins.len() as u16);
    for pin in pins {
        write_string(out, pin.as_str());
    }
}

// Lengths are validated by the builder and by `read`.
fn write_string(out: &mut Vec<u8>, text: &str) {
    write_le(out, text.len() as u8);
    out.extend_from_slice(text.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pins::HashValue,
        preload::builder::{PinPolicy, PreloadBuilder, PreloadEntry},
    };

    fn database() -> PreloadedDatabase {
        PreloadBuilder::new()
            .pinset(
                Pinset::new(0, "corp")
                    .accept(HashValue::sha1(b"root").to_pin())
                    .reject(HashValue::sha1(b"old").to_pin()),
            )
            .entry(PreloadEntry::new("corp.example", true, true).with_pins(PinPolicy::new(0, 3, true)))
            .entry(PreloadEntry::new("plain.example", false, true))
            .build()
            .unwrap()
    }

    #[test]
    fn test_container_roundtrip() {
        let db = database();
        let bytes = db.to_bytes();
        assert_eq!(&bytes[..4], b"HPKP");

        let parsed = read(&bytes).unwrap();
        assert_eq!(parsed.pinsets(), db.pinsets());
        assert_eq!(parsed.raw_parts(), db.raw_parts());
        assert_eq!(
            parsed.lookup("mail.corp.example").unwrap(),
            db.lookup("mail.corp.example").unwrap()
        );
        assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn test_foreign_data() {
        assert!(matches!(read(&[]), Err(Error::Empty)));
        assert!(matches!(read(b"HP"), Err(Error::NotSupported)));
        assert!(matches!(read(b"MZ\x90\x00\x03\x00"), Err(Error::NotSupported)));
        assert!(matches!(read(b"HPKP\x02\x00\x00\x00"), Err(Error::NotSupported)));
    }

    #[test]
    fn test_every_truncation_fails() {
        let bytes = database().to_bytes();
        for len in 1..bytes.len() {
            assert!(read(&bytes[..len]).is_err(), "prefix of {len} bytes parsed");
        }
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = database().to_bytes();
        bytes.push(0);
        assert!(matches!(read(&bytes), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_root_outside_trie() {
        let db = database();
        let mut bytes = db.to_bytes();
        let (huffman, trie, _, _) = db.raw_parts();
        let root_at = 4 + 2 + 2 + 4 + huffman.len() + 4 + trie.len();
        bytes[root_at..root_at + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(read(&bytes), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_invalid_pin_text() {
        let db = PreloadedDatabase::from_parts(
            PreloadedDatabase::empty().raw_parts().0.to_vec(),
            vec![0b0100_0000],
            2,
            0,
            vec![Pinset::new(0, "x").accept(PinIdentifier::new("sha1/!!"))],
        )
        .unwrap();
        assert!(matches!(read(&db.to_bytes()), Err(Error::Malformed { .. })));
    }
}
