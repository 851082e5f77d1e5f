//! Compiling the [SVG](https://learn.microsoft.com/en-us/typography/opentype/spec/svg) table

use std::{borrow::Cow, collections::HashMap, io::Write};

use flate2::{write::GzEncoder, Compression};
use write_fonts::{
    types::{GlyphId16, Tag},
    validate::{Validate, ValidationCtx},
    FontWrite, TableWriter,
};

use crate::{
    compact::{compact, SvgRange},
    document::GlyphDocumentMap,
    error::Error,
};

/// The tag of the SVG table.
pub const SVG_TAG: Tag = Tag::new(b"SVG ");

/// version, offset to the document list, reserved
pub(crate) const HEADER_LEN: usize = 2 + 4 + 4;
/// the numEntries field at the start of the document list
pub(crate) const NUM_ENTRIES_LEN: usize = 2;
pub(crate) const RECORD_LEN: usize = 2 + 2 + 4 + 4;
pub(crate) const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A single entry in the SVG document list.
///
/// The offset is relative to the start of the document list, never to the
/// start of the table or the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DocumentRecord {
    /// The first glyph id for the range covered by this record.
    pub start_glyph_id: GlyphId16,
    /// The last glyph id for the range covered by this record.
    pub end_glyph_id: GlyphId16,
    /// Offset from the beginning of the document list to the document.
    pub svg_doc_offset: u32,
    /// Length of the (possibly compressed) document data.
    pub svg_doc_length: u32,
}

impl FontWrite for DocumentRecord {
    fn write_into(&self, writer: &mut TableWriter) {
        self.start_glyph_id.to_u16().write_into(writer);
        self.end_glyph_id.to_u16().write_into(writer);
        self.svg_doc_offset.write_into(writer);
        self.svg_doc_length.write_into(writer);
    }
}

/// The document list: the records followed by the stored documents.
struct DocumentList {
    records: Vec<DocumentRecord>,
    documents: Vec<Vec<u8>>,
}

impl FontWrite for DocumentList {
    fn write_into(&self, writer: &mut TableWriter) {
        (self.records.len() as u16).write_into(writer);
        self.records.write_into(writer);
        for document in &self.documents {
            writer.write_slice(document);
        }
    }
}

impl Validate for DocumentList {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("SVGDocumentList", |ctx| {
            ctx.in_field("document_records", |ctx| {
                if self.records.len() > u16::MAX as usize {
                    ctx.report(format!(
                        "{} records do not fit in numEntries",
                        self.records.len()
                    ));
                }
            })
        })
    }
}

struct Svg {
    document_list: DocumentList,
}

impl FontWrite for Svg {
    fn write_into(&self, writer: &mut TableWriter) {
        0u16.write_into(writer);
        // the document list immediately follows the header
        (HEADER_LEN as u32).write_into(writer);
        0u32.write_into(writer);
        self.document_list.write_into(writer);
    }
}

impl Validate for Svg {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_table("SVG", |ctx| {
            ctx.in_field("svg_document_list", |ctx| {
                self.document_list.validate_impl(ctx)
            })
        })
    }
}

/// A builder for the binary SVG table.
///
/// Documents with identical content are stored once and shared by every
/// record that uses them. When compression is enabled each distinct document
/// is gzipped, and the compressed form is kept only if it is smaller.
#[derive(Clone, Debug)]
pub struct SvgTableBuilder {
    compress: bool,
}

impl Default for SvgTableBuilder {
    fn default() -> Self {
        Self { compress: true }
    }
}

impl SvgTableBuilder {
    /// Create a new builder. Compression is enabled by default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether documents should be gzip compressed when that saves space.
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Compile the table for the provided ranges.
    ///
    /// Ranges must be sorted, non-empty, and must not overlap; this is always
    /// true for the output of [`compact`].
    pub fn build(&self, ranges: &[SvgRange]) -> Result<Vec<u8>, Error> {
        check_ranges(ranges)?;

        let mut next_offset = NUM_ENTRIES_LEN + RECORD_LEN * ranges.len();
        let mut seen: HashMap<&[u8], (u32, u32)> = HashMap::new();
        let mut records = Vec::with_capacity(ranges.len());
        let mut documents = Vec::new();

        for range in ranges {
            let content = range.document.as_bytes();
            let (svg_doc_offset, svg_doc_length) = match seen.get(content) {
                Some(location) => *location,
                None => {
                    let stored = self.stored_form(content);
                    let (offset, length) = document_location(next_offset, stored.len())?;
                    next_offset += stored.len();
                    documents.push(stored.into_owned());
                    seen.insert(content, (offset, length));
                    (offset, length)
                }
            };
            records.push(DocumentRecord {
                start_glyph_id: range.first,
                end_glyph_id: range.last,
                svg_doc_offset,
                svg_doc_length,
            });
        }

        log::debug!(
            "SVG table: {} records, {} distinct documents, {} bytes of document data",
            records.len(),
            documents.len(),
            documents.iter().map(Vec::len).sum::<usize>()
        );

        let table = Svg {
            document_list: DocumentList { records, documents },
        };
        write_fonts::dump_table(&table).map_err(|report| Error::Validation(report.to_string()))
    }

    fn stored_form<'a>(&self, content: &'a [u8]) -> Cow<'a, [u8]> {
        if !self.compress || content.starts_with(&GZIP_MAGIC) {
            return Cow::Borrowed(content);
        }
        match gzip(content) {
            Ok(compressed) if compressed.len() < content.len() => Cow::Owned(compressed),
            Ok(_) => Cow::Borrowed(content),
            Err(e) => {
                log::warn!("failed to compress SVG document, storing it uncompressed: {e}");
                Cow::Borrowed(content)
            }
        }
    }
}

/// The offset and length fields of a document record.
///
/// The whole document, not only its start, must be addressable with 32 bits.
fn document_location(offset: usize, length: usize) -> Result<(u32, u32), Error> {
    let too_large = || Error::DocumentTooLarge { offset, length };
    let end = offset.checked_add(length).ok_or_else(too_large)?;
    u32::try_from(end).map_err(|_| too_large())?;
    Ok((offset as u32, length as u32))
}

/// Compact the glyph documents and compile them into an SVG table, with
/// compression enabled.
pub fn compile(glyphs: &GlyphDocumentMap) -> Result<Vec<u8>, Error> {
    SvgTableBuilder::new().build(&compact(glyphs))
}

fn check_ranges(ranges: &[SvgRange]) -> Result<(), Error> {
    let mut previous_last: Option<GlyphId16> = None;
    for range in ranges {
        let overlaps = previous_last.is_some_and(|last| range.first <= last);
        if range.first > range.last || overlaps {
            return Err(Error::InvalidRange {
                first: range.first.to_u16(),
                last: range.last.to_u16(),
                previous_last: previous_last.map(GlyphId16::to_u16),
            });
        }
        previous_last = Some(range.last);
    }
    Ok(())
}

// the gzip header written by flate2 has a zero mtime, so output is reproducible
fn gzip(content: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(content)?;
    encoder.finish()
}
