//! Compacting per-glyph documents into glyph id ranges

use write_fonts::types::GlyphId16;

use crate::document::{GlyphDocumentMap, SvgDocument};

/// A contiguous, inclusive run of glyph ids that share one document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SvgRange {
    /// The first glyph id covered by this range.
    pub first: GlyphId16,
    /// The last glyph id covered by this range (inclusive).
    pub last: GlyphId16,
    /// The document rendering every glyph in the range.
    pub document: SvgDocument,
}

impl SvgRange {
    pub fn new(first: GlyphId16, last: GlyphId16, document: SvgDocument) -> Self {
        Self {
            first,
            last,
            document,
        }
    }

    /// The number of glyphs covered by this range.
    ///
    /// A range whose `first` is greater than its `last` covers no glyphs.
    pub fn len(&self) -> usize {
        (self.last.to_u16() as usize + 1).saturating_sub(self.first.to_u16() as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if `gid` falls inside this range.
    pub fn contains(&self, gid: GlyphId16) -> bool {
        self.first <= gid && gid <= self.last
    }

    /// Iterate over the glyph ids covered by this range.
    pub fn glyphs(&self) -> impl Iterator<Item = GlyphId16> + Clone {
        (self.first.to_u16()..=self.last.to_u16()).map(GlyphId16::new)
    }
}

/// Compute the minimal ordered list of ranges for a set of glyph documents.
///
/// Glyphs are visited in ascending order. A glyph joins the open range if it
/// directly follows the range's last glyph and its document has the same
/// content; otherwise it starts a new range.
pub fn compact(glyphs: &GlyphDocumentMap) -> Vec<SvgRange> {
    let mut ranges: Vec<SvgRange> = Vec::new();
    // BTreeMap iteration is already sorted by glyph id
    for (gid, document) in glyphs {
        match ranges.last_mut() {
            Some(current)
                if current.last.to_u16().checked_add(1) == Some(gid.to_u16())
                    && current.document == *document =>
            {
                current.last = *gid;
            }
            _ => ranges.push(SvgRange::new(*gid, *gid, document.clone())),
        }
    }
    log::debug!(
        "compacted {} glyphs into {} ranges",
        glyphs.len(),
        ranges.len()
    );
    ranges
}
