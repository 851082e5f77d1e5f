//! Parsing the [SVG](https://learn.microsoft.com/en-us/typography/opentype/spec/svg) table

use std::{
    borrow::Cow,
    collections::{hash_map::Entry, HashMap},
    io::Read,
};

use flate2::read::GzDecoder;
use write_fonts::{read::FontData, types::GlyphId16};

use crate::{
    compact::SvgRange,
    document::{GlyphDocumentMap, SvgDocument},
    encode::{DocumentRecord, GZIP_MAGIC, NUM_ENTRIES_LEN, RECORD_LEN},
    error::Error,
};

/// A parsed, but not yet materialized, SVG table.
struct ParsedTable<'a> {
    records: Vec<DocumentRecord>,
    document_list: FontData<'a>,
}

impl<'a> ParsedTable<'a> {
    fn parse(data: &'a [u8]) -> Result<Self, Error> {
        let data = FontData::new(data);
        let version: u16 = data
            .read_at(0)
            .map_err(|_| Error::TruncatedTable("missing table header"))?;
        if version != 0 {
            return Err(Error::UnsupportedVersion(version));
        }
        let list_offset: u32 = data
            .read_at(2)
            .map_err(|_| Error::TruncatedTable("missing table header"))?;
        // reserved; the value itself is ignored
        data.read_at::<u32>(6)
            .map_err(|_| Error::TruncatedTable("missing table header"))?;

        let document_list = data
            .split_off(list_offset as usize)
            .ok_or(Error::TruncatedTable("document list offset is out of bounds"))?;
        let num_entries: u16 = document_list
            .read_at(0)
            .map_err(|_| Error::TruncatedTable("missing document list"))?;

        let mut records = Vec::with_capacity(num_entries as usize);
        let mut previous_last: Option<GlyphId16> = None;
        for index in 0..num_entries as usize {
            let record = read_record(document_list, NUM_ENTRIES_LEN + index * RECORD_LEN)
                .ok_or(Error::TruncatedTable("document records"))?;
            let out_of_order = previous_last.is_some_and(|last| record.start_glyph_id <= last);
            if record.start_glyph_id > record.end_glyph_id || out_of_order {
                return Err(Error::MalformedDirectory { index });
            }
            previous_last = Some(record.end_glyph_id);
            records.push(record);
        }
        Ok(Self {
            records,
            document_list,
        })
    }

    fn raw_document(&self, record: &DocumentRecord) -> Result<&'a [u8], Error> {
        let start = record.svg_doc_offset as usize;
        start
            .checked_add(record.svg_doc_length as usize)
            .and_then(|end| self.document_list.slice(start..end))
            .map(|data| data.as_bytes())
            .ok_or(Error::TruncatedTable(
                "document extends past the end of the table",
            ))
    }

    fn into_ranges(self) -> Result<Vec<SvgRange>, Error> {
        // records pointing at the same bytes share one document
        let mut documents: HashMap<(u32, u32), SvgDocument> = HashMap::new();
        let mut ranges = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let key = (record.svg_doc_offset, record.svg_doc_length);
            let document = match documents.entry(key) {
                Entry::Occupied(entry) => entry.get().clone(),
                Entry::Vacant(entry) => {
                    let raw = self.raw_document(record)?;
                    entry
                        .insert(SvgDocument::from(decompress(raw).into_owned()))
                        .clone()
                }
            };
            ranges.push(SvgRange::new(
                record.start_glyph_id,
                record.end_glyph_id,
                document,
            ));
        }
        Ok(ranges)
    }
}

fn read_record(list: FontData, pos: usize) -> Option<DocumentRecord> {
    Some(DocumentRecord {
        start_glyph_id: GlyphId16::new(list.read_at::<u16>(pos).ok()?),
        end_glyph_id: GlyphId16::new(list.read_at::<u16>(pos + 2).ok()?),
        svg_doc_offset: list.read_at(pos + 4).ok()?,
        svg_doc_length: list.read_at(pos + 8).ok()?,
    })
}

/// Decompress a stored document if it carries the gzip magic number.
///
/// Data that looks gzipped but fails to decompress is returned unchanged.
fn decompress(raw: &[u8]) -> Cow<'_, [u8]> {
    if raw.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        match GzDecoder::new(raw).read_to_end(&mut out) {
            Ok(_) => return Cow::Owned(out),
            Err(e) => log::warn!("failed to decompress SVG document, keeping raw bytes: {e}"),
        }
    }
    Cow::Borrowed(raw)
}

/// Read the document records of an SVG table, without touching the documents.
pub fn read_records(data: &[u8]) -> Result<Vec<DocumentRecord>, Error> {
    ParsedTable::parse(data).map(|table| table.records)
}

/// Decode an SVG table into its ranges, with every document decompressed.
///
/// Records that point at the same stored bytes share a single
/// [`SvgDocument`].
pub fn decode(data: &[u8]) -> Result<Vec<SvgRange>, Error> {
    ParsedTable::parse(data)?.into_ranges()
}

/// Decode an SVG table, returning the documents for the requested glyphs.
///
/// Requested glyphs that are not covered by any record are absent from the
/// result.
pub fn decode_glyphs(
    data: &[u8],
    glyphs: impl IntoIterator<Item = GlyphId16>,
) -> Result<GlyphDocumentMap, Error> {
    let ranges = decode(data)?;
    Ok(glyphs
        .into_iter()
        .filter_map(|gid| {
            find_range(&ranges, gid).map(|range| (gid, range.document.clone()))
        })
        .collect())
}

/// Expand ranges into a map containing every glyph they cover.
pub fn expand(ranges: &[SvgRange]) -> GlyphDocumentMap {
    ranges
        .iter()
        .flat_map(|range| range.glyphs().map(|gid| (gid, range.document.clone())))
        .collect()
}

/// Find the range covering a glyph in a sorted list of ranges.
pub fn find_range(ranges: &[SvgRange], gid: GlyphId16) -> Option<&SvgRange> {
    let index = ranges.partition_point(|range| range.last < gid);
    ranges.get(index).filter(|range| range.contains(gid))
}
