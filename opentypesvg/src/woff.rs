//! The [WOFF 1.0](https://www.w3.org/TR/WOFF/) container
//!
//! Each table is stored zlib compressed when that makes it smaller. There is
//! no support for the optional metadata or private data blocks; they are
//! ignored on read and never written.

use std::io::{Read, Write};

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use write_fonts::{
    read::{FontData, FontRef},
    types::Tag,
    validate::{Validate, ValidationCtx},
    FontBuilder, FontWrite, TableWriter,
};

use crate::{font_file::finish_sfnt, Error};

const SIGNATURE: Tag = Tag::new(b"wOFF");
const HEADER_LEN: usize = 44;
const DIRECTORY_ENTRY_LEN: usize = 20;
const SFNT_HEADER_LEN: usize = 12;
const SFNT_RECORD_LEN: usize = 16;

fn round4(len: usize) -> usize {
    (len + 3) & !3
}

struct TableEntry {
    tag: Tag,
    offset: u32,
    comp_length: u32,
    orig_length: u32,
    orig_checksum: u32,
}

impl FontWrite for TableEntry {
    fn write_into(&self, writer: &mut TableWriter) {
        self.tag.write_into(writer);
        self.offset.write_into(writer);
        self.comp_length.write_into(writer);
        self.orig_length.write_into(writer);
        self.orig_checksum.write_into(writer);
    }
}

struct Woff {
    flavor: u32,
    total_sfnt_size: u32,
    entries: Vec<TableEntry>,
    /// Stored table data, each item already padded to four bytes.
    tables: Vec<Vec<u8>>,
}

impl Woff {
    fn length(&self) -> usize {
        HEADER_LEN
            + DIRECTORY_ENTRY_LEN * self.entries.len()
            + self.tables.iter().map(Vec::len).sum::<usize>()
    }
}

impl FontWrite for Woff {
    fn write_into(&self, writer: &mut TableWriter) {
        SIGNATURE.write_into(writer);
        self.flavor.write_into(writer);
        (self.length() as u32).write_into(writer);
        (self.entries.len() as u16).write_into(writer);
        0u16.write_into(writer); // reserved
        self.total_sfnt_size.write_into(writer);
        // major & minor version
        0u16.write_into(writer);
        0u16.write_into(writer);
        // meta offset, length, orig length; private offset, length
        [0u32; 5].as_slice().write_into(writer);
        self.entries.as_slice().write_into(writer);
        for table in &self.tables {
            writer.write_slice(table);
        }
    }
}

impl Validate for Woff {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("WOFF", |ctx| {
            if u32::try_from(self.length()).is_err() {
                ctx.report("font is too large for WOFF");
            }
        })
    }
}

/// Wrap an sfnt in a WOFF container.
pub fn encode(sfnt: &[u8]) -> Result<Vec<u8>, Error> {
    let font = FontRef::new(sfnt).map_err(Error::read)?;
    let records = font.table_directory.table_records();
    let mut offset = HEADER_LEN + DIRECTORY_ENTRY_LEN * records.len();
    let mut total_sfnt_size = SFNT_HEADER_LEN + SFNT_RECORD_LEN * records.len();
    let mut entries = Vec::with_capacity(records.len());
    let mut tables = Vec::with_capacity(records.len());
    for record in records {
        let tag = record.tag();
        let data = font
            .table_data(tag)
            .ok_or_else(|| Error::Read(format!("data for '{tag}' is malformed")))?
            .as_bytes();
        let compressed = zlib(data).map_err(|e| Error::malformed("WOFF", e.to_string()))?;
        let mut stored = if compressed.len() < data.len() {
            compressed
        } else {
            data.to_vec()
        };
        let comp_length = stored.len();
        stored.resize(round4(comp_length), 0);
        entries.push(TableEntry {
            tag,
            offset: offset as u32,
            comp_length: comp_length as u32,
            orig_length: data.len() as u32,
            orig_checksum: record.checksum(),
        });
        offset += stored.len();
        total_sfnt_size += round4(data.len());
        tables.push(stored);
    }
    let woff = Woff {
        flavor: font.table_directory.sfnt_version(),
        total_sfnt_size: total_sfnt_size as u32,
        entries,
        tables,
    };
    write_fonts::dump_table(&woff).map_err(|e| Error::Build(e.to_string()))
}

/// Unwrap a WOFF container, returning the sfnt it holds.
pub fn decode(data: &[u8]) -> Result<Vec<u8>, Error> {
    let data = FontData::new(data);
    let truncated = |_| Error::malformed("WOFF", "truncated header");
    let signature: Tag = data.read_at(0).map_err(truncated)?;
    if signature != SIGNATURE {
        return Err(Error::malformed("WOFF", "bad signature"));
    }
    let flavor: u32 = data.read_at(4).map_err(truncated)?;
    let num_tables: u16 = data.read_at(12).map_err(truncated)?;

    let mut builder = FontBuilder::new();
    for i in 0..num_tables as usize {
        let pos = HEADER_LEN + i * DIRECTORY_ENTRY_LEN;
        let entry = read_entry(data, pos)
            .ok_or_else(|| Error::malformed("WOFF", "truncated table directory"))?;
        let start = entry.offset as usize;
        let stored = data
            .slice(start..start + entry.comp_length as usize)
            .ok_or_else(|| {
                Error::malformed("WOFF", format!("'{}' extends past the end", entry.tag))
            })?
            .as_bytes();
        let table = if entry.comp_length < entry.orig_length {
            let mut table = Vec::with_capacity(entry.orig_length as usize);
            ZlibDecoder::new(stored)
                .read_to_end(&mut table)
                .map_err(|e| Error::malformed("WOFF", format!("'{}': {e}", entry.tag)))?;
            if table.len() != entry.orig_length as usize {
                return Err(Error::malformed(
                    "WOFF",
                    format!("'{}' has the wrong length", entry.tag),
                ));
            }
            table
        } else {
            stored.to_vec()
        };
        builder.add_raw(entry.tag, table);
    }
    Ok(finish_sfnt(builder, flavor))
}

fn read_entry(data: FontData, pos: usize) -> Option<TableEntry> {
    Some(TableEntry {
        tag: data.read_at(pos).ok()?,
        offset: data.read_at(pos + 4).ok()?,
        comp_length: data.read_at(pos + 8).ok()?,
        orig_length: data.read_at(pos + 12).ok()?,
        orig_checksum: data.read_at(pos + 16).ok()?,
    })
}

fn zlib(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::best());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let sfnt = svg_test_data::simple_font();
        let woff = encode(&sfnt).unwrap();
        assert_eq!(&woff[..4], b"wOFF");
        assert_eq!(
            u32::from_be_bytes(woff[8..12].try_into().unwrap()) as usize,
            woff.len()
        );
        let decoded = decode(&woff).unwrap();
        let before = FontRef::new(&sfnt).unwrap();
        let after = FontRef::new(&decoded).unwrap();
        assert_eq!(
            after.table_directory.sfnt_version(),
            before.table_directory.sfnt_version()
        );
        assert_eq!(
            after.table_directory.table_records().len(),
            before.table_directory.table_records().len()
        );
        for record in before.table_directory.table_records() {
            assert_eq!(
                after.table_data(record.tag()).unwrap().as_bytes(),
                before.table_data(record.tag()).unwrap().as_bytes(),
                "{}",
                record.tag()
            );
        }
    }

    #[test]
    fn total_sfnt_size_matches_directory() {
        let sfnt = svg_test_data::simple_font();
        let woff = encode(&sfnt).unwrap();
        let total = u32::from_be_bytes(woff[16..20].try_into().unwrap()) as usize;
        // the builder pads every table, so the sizes agree
        assert_eq!(total, sfnt.len());
    }

    #[test]
    fn bad_signature() {
        let mut woff = encode(&svg_test_data::simple_font()).unwrap();
        woff[3] = b'X';
        assert!(matches!(
            decode(&woff),
            Err(Error::MalformedContainer { .. })
        ));
        assert!(decode(b"wOF").is_err());
    }
}
