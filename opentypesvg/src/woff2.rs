//! The [WOFF2](https://www.w3.org/TR/WOFF2/) container, without table transforms
//!
//! Tables are written with the null transform, so `glyf`, `loca` and `hmtx`
//! are stored exactly as they appear in the sfnt. Reading a file that uses
//! the glyf/loca or hmtx transforms is not supported, and neither are font
//! collections.

use std::io::{Read, Write};

use write_fonts::{
    read::{FontData, FontRef},
    types::Tag,
    validate::{Validate, ValidationCtx},
    FontBuilder, FontWrite, TableWriter,
};

use crate::{font_file::finish_sfnt, Error};

const SIGNATURE: Tag = Tag::new(b"wOF2");
const COLLECTION_TAG: u32 = u32::from_be_bytes(*b"ttcf");
const HEADER_LEN: usize = 48;
const SFNT_HEADER_LEN: usize = 12;
const SFNT_RECORD_LEN: usize = 16;
const ARBITRARY_TAG: u8 = 0x3f;
const GLYF: Tag = Tag::new(b"glyf");
const LOCA: Tag = Tag::new(b"loca");
/// glyf and loca use version 3 for "no transform"; every other table uses 0.
const GLYF_LOCA_NULL_TRANSFORM: u8 = 3;

const BROTLI_BUFFER_SIZE: usize = 4096;
const BROTLI_QUALITY: u32 = 11;
const BROTLI_WINDOW: u32 = 22;

/// Tags with a one byte encoding in the table directory.
#[rustfmt::skip]
static KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post",
    b"cvt ", b"fpgm", b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT",
    b"EBLC", b"gasp", b"hdmx", b"kern", b"LTSH", b"PCLT", b"VDMX", b"vhea",
    b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC", b"JSTF", b"MATH",
    b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar",
    b"gvar", b"hsty", b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop",
    b"trak", b"Zapf", b"Silf", b"Glat", b"Gloc", b"Feat", b"Sill",
];

fn round4(len: usize) -> usize {
    (len + 3) & !3
}

fn null_transform_version(tag: Tag) -> u8 {
    if tag == GLYF || tag == LOCA {
        GLYF_LOCA_NULL_TRANSFORM
    } else {
        0
    }
}

/// Append a `UIntBase128` to `out`.
fn write_base128(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut len = 0;
    let mut rest = value;
    loop {
        groups[len] = (rest & 0x7f) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | continuation);
    }
}

struct Woff2 {
    flavor: u32,
    num_tables: u16,
    total_sfnt_size: u32,
    directory: Vec<u8>,
    compressed: Vec<u8>,
}

impl Woff2 {
    fn unpadded_len(&self) -> usize {
        HEADER_LEN + self.directory.len() + self.compressed.len()
    }
}

impl FontWrite for Woff2 {
    fn write_into(&self, writer: &mut TableWriter) {
        let padding = round4(self.unpadded_len()) - self.unpadded_len();
        SIGNATURE.write_into(writer);
        self.flavor.write_into(writer);
        (round4(self.unpadded_len()) as u32).write_into(writer);
        self.num_tables.write_into(writer);
        0u16.write_into(writer); // reserved
        self.total_sfnt_size.write_into(writer);
        (self.compressed.len() as u32).write_into(writer);
        // major & minor version
        0u16.write_into(writer);
        0u16.write_into(writer);
        // meta offset, length, orig length; private offset, length
        [0u32; 5].as_slice().write_into(writer);
        writer.write_slice(&self.directory);
        writer.write_slice(&self.compressed);
        writer.write_slice(&[0u8; 3][..padding]);
    }
}

impl Validate for Woff2 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("WOFF2", |ctx| {
            if u32::try_from(round4(self.unpadded_len())).is_err() {
                ctx.report("font is too large for WOFF2");
            }
        })
    }
}

/// Wrap an sfnt in a WOFF2 container.
pub fn encode(sfnt: &[u8]) -> Result<Vec<u8>, Error> {
    let font = FontRef::new(sfnt).map_err(Error::read)?;
    let records = font.table_directory.table_records();
    let mut directory = Vec::new();
    let mut stream = Vec::with_capacity(sfnt.len());
    let mut total_sfnt_size = SFNT_HEADER_LEN + SFNT_RECORD_LEN * records.len();
    for record in records {
        let tag = record.tag();
        let data = font
            .table_data(tag)
            .ok_or_else(|| Error::Read(format!("data for '{tag}' is malformed")))?
            .as_bytes();
        let transform = null_transform_version(tag) << 6;
        match KNOWN_TAGS.iter().position(|known| **known == tag.into_bytes()) {
            Some(index) => directory.push(index as u8 | transform),
            None => {
                directory.push(ARBITRARY_TAG | transform);
                directory.extend_from_slice(&tag.into_bytes());
            }
        }
        write_base128(&mut directory, data.len() as u32);
        stream.extend_from_slice(data);
        total_sfnt_size += round4(data.len());
    }

    let mut encoder = brotli::CompressorWriter::new(
        Vec::new(),
        BROTLI_BUFFER_SIZE,
        BROTLI_QUALITY,
        BROTLI_WINDOW,
    );
    encoder
        .write_all(&stream)
        .map_err(|e| Error::malformed("WOFF2", e.to_string()))?;
    // finishes the brotli stream
    let compressed = encoder.into_inner();

    let woff2 = Woff2 {
        flavor: font.table_directory.sfnt_version(),
        num_tables: records.len() as u16,
        total_sfnt_size: total_sfnt_size as u32,
        directory,
        compressed,
    };
    write_fonts::dump_table(&woff2).map_err(|e| Error::Build(e.to_string()))
}

struct Reader<'a> {
    data: FontData<'a>,
    pos: usize,
}

impl Reader<'_> {
    fn read_u8(&mut self) -> Result<u8, Error> {
        self.read_bytes::<1>().map(|[b]| b)
    }

    fn read_u16(&mut self) -> Result<u16, Error> {
        self.read_bytes().map(u16::from_be_bytes)
    }

    fn read_u32(&mut self) -> Result<u32, Error> {
        self.read_bytes().map(u32::from_be_bytes)
    }

    fn read_tag(&mut self) -> Result<Tag, Error> {
        self.read_bytes().map(|bytes| Tag::new(&bytes))
    }

    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let bytes = self
            .data
            .slice(self.pos..self.pos + N)
            .and_then(|data| data.as_bytes().try_into().ok())
            .ok_or_else(|| Error::malformed("WOFF2", "truncated table directory"))?;
        self.pos += N;
        Ok(bytes)
    }

    fn read_base128(&mut self) -> Result<u32, Error> {
        let mut value: u32 = 0;
        for i in 0..5 {
            let byte = self.read_u8()?;
            if i == 0 && byte == 0x80 {
                return Err(Error::malformed("WOFF2", "UIntBase128 with leading zeros"));
            }
            if value & 0xfe00_0000 != 0 {
                return Err(Error::malformed("WOFF2", "UIntBase128 overflow"));
            }
            value = (value << 7) | (byte & 0x7f) as u32;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::malformed("WOFF2", "UIntBase128 is too long"))
    }
}

struct DirectoryEntry {
    tag: Tag,
    orig_length: u32,
}

/// Unwrap a WOFF2 container, returning the sfnt it holds.
pub fn decode(data: &[u8]) -> Result<Vec<u8>, Error> {
    let data = FontData::new(data);
    let mut header = Reader { data, pos: 0 };
    let signature = header.read_tag()?;
    if signature != SIGNATURE {
        return Err(Error::malformed("WOFF2", "bad signature"));
    }
    let flavor = header.read_u32()?;
    if flavor == COLLECTION_TAG {
        return Err(Error::UnsupportedContainer("WOFF2 font collections"));
    }
    let _length = header.read_u32()?;
    let num_tables = header.read_u16()?;
    let _reserved = header.read_u16()?;
    let _total_sfnt_size = header.read_u32()?;
    let total_compressed_size = header.read_u32()?;

    let mut reader = Reader {
        data,
        pos: HEADER_LEN,
    };
    let mut entries = Vec::with_capacity(num_tables as usize);
    for _ in 0..num_tables {
        let flags = reader.read_u8()?;
        let tag = match flags & ARBITRARY_TAG {
            ARBITRARY_TAG => reader.read_tag()?,
            index => Tag::new(KNOWN_TAGS[index as usize]),
        };
        let transform = flags >> 6;
        let orig_length = reader.read_base128()?;
        if transform != null_transform_version(tag) {
            return Err(Error::UnsupportedContainer("transformed WOFF2 tables"));
        }
        entries.push(DirectoryEntry { tag, orig_length });
    }

    let start = reader.pos;
    let compressed = data
        .slice(start..start + total_compressed_size as usize)
        .ok_or_else(|| Error::malformed("WOFF2", "compressed data extends past the end"))?
        .as_bytes();
    let mut stream = Vec::new();
    brotli::Decompressor::new(compressed, BROTLI_BUFFER_SIZE)
        .read_to_end(&mut stream)
        .map_err(|e| Error::malformed("WOFF2", e.to_string()))?;

    let mut builder = FontBuilder::new();
    let mut offset = 0;
    for entry in entries {
        let end = offset + entry.orig_length as usize;
        let table = stream.get(offset..end).ok_or_else(|| {
            Error::malformed("WOFF2", format!("'{}' extends past the end", entry.tag))
        })?;
        builder.add_raw(entry.tag, table.to_vec());
        offset = end;
    }
    Ok(finish_sfnt(builder, flavor))
}
