//! Reading and writing the OpenType [SVG] table.
//!
//! The SVG table maps ranges of glyph ids to SVG documents. Building one
//! starts from a [`GlyphDocumentMap`], which is [compacted](compact) into the
//! smallest list of [`SvgRange`]s and then serialized with
//! [`SvgTableBuilder`]:
//!
//! ```
//! use svg_table::{compact, decode, GlyphDocumentMap, SvgDocument, SvgTableBuilder};
//! use write_fonts::types::GlyphId16;
//!
//! let mut glyphs = GlyphDocumentMap::new();
//! glyphs.insert(GlyphId16::new(3), SvgDocument::from("<svg id=\"a\"/>"));
//! glyphs.insert(GlyphId16::new(4), SvgDocument::from("<svg id=\"a\"/>"));
//!
//! let ranges = compact(&glyphs);
//! assert_eq!(ranges.len(), 1);
//!
//! let bytes = SvgTableBuilder::new().build(&ranges).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), ranges);
//! ```
//!
//! Documents taken from SVG files usually want some cleanup before they are
//! added to a font; see the [`sanitize`](mod@sanitize) module.
//!
//! [SVG]: https://learn.microsoft.com/en-us/typography/opentype/spec/svg

mod compact;
mod decode;
mod document;
mod encode;
mod error;
pub mod sanitize;

pub use compact::{compact, SvgRange};
pub use decode::{decode, decode_glyphs, expand, find_range, read_records};
pub use document::{GlyphDocumentMap, SvgDocument};
pub use encode::{compile, DocumentRecord, SvgTableBuilder, SVG_TAG};
pub use error::Error;
pub use sanitize::{sanitize, sanitize_or_passthrough, SanitizeWarning};
