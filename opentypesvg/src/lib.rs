//! Tools for working with the OpenType `SVG ` table.
//!
//! - [`add_svg_table`] builds the table from a folder of SVG files.
//! - [`dump_svg_table`] saves the documents of a table as SVG files.
//! - [`fonts_to_svg`] draws the glyphs of one or more fonts as SVG files.
//!
//! Fonts can be OpenType (CFF or TrueType flavored), WOFF, or WOFF2. Table
//! encoding and decoding lives in the [`svg_table`] crate.

mod add;
mod cleanup;
mod dump;
mod error;
pub mod font_file;
mod fonts2svg;
pub mod paths;
mod pen;
mod svg_files;
mod woff;
mod woff2;

pub use add::{add_svg_table, AddOptions, AddReport};
pub use dump::{dump_svg_table, DumpOptions, DumpReport};
pub use error::Error;
pub use font_file::{Flavor, FontFile};
pub use fonts2svg::{fonts_to_svg, parse_colors, Fonts2SvgOptions, Fonts2SvgReport, HexColor};
pub use pen::SvgPathPen;
