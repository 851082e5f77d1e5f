//! Saving the documents of a font's `SVG ` table as individual files

use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};

use svg_table::SVG_TAG;

use crate::{
    cleanup,
    font_file::{self, FontFile},
    paths::{self, OutputFolder},
    Error,
};

/// Options for [`dump_svg_table`].
#[derive(Clone, Debug, Default)]
pub struct DumpOptions {
    /// Where to save the files; defaults to `SVGs` next to the font.
    pub output_folder: Option<PathBuf>,
    /// Set the min-y of each root `viewBox` to zero.
    pub reset_view_box: bool,
    /// Only save these glyphs.
    pub glyph_names: Vec<String>,
    /// Never save these glyphs.
    pub exclude: Vec<String>,
}

/// The result of a successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DumpReport {
    Saved(usize),
}

impl fmt::Display for DumpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpReport::Saved(count) => f.write_str(&paths::final_message(*count)),
        }
    }
}

/// Save each glyph's document as `<glyph name>.svg`.
///
/// A document shared by a range of glyphs is written once per glyph.
pub fn dump_svg_table(font_path: &Path, options: &DumpOptions) -> Result<DumpReport, Error> {
    let font_path = font_file::checked_font_path(font_path)?;
    let font = FontFile::load(&font_path)?;
    let table = font.table_data(SVG_TAG)?.ok_or(Error::MissingSvgTable)?;
    let ranges = svg_table::decode(table)?;
    if ranges.is_empty() {
        return Err(Error::EmptySvgTable);
    }
    let glyph_order = font.glyph_order()?;

    let mut names: Vec<&str> = if options.glyph_names.is_empty() {
        glyph_order.iter().map(String::as_str).collect()
    } else {
        options.glyph_names.iter().map(String::as_str).collect()
    };
    names.sort_unstable();
    names.dedup();
    let skip: HashSet<&str> = options
        .exclude
        .iter()
        .map(String::as_str)
        .chain([".notdef"])
        .collect();
    let nested = paths::names_to_save_in_nested_folder(names.iter().copied());
    let wanted: HashSet<&str> = names.iter().copied().collect();

    let folder = paths::output_folder_path(options.output_folder.as_deref(), &font_path)?;
    let mut output = OutputFolder::new(folder, nested);
    let mut unnamed = 0;
    for range in &ranges {
        let document = match (options.reset_view_box, range.document.as_str()) {
            (true, Ok(text)) => cleanup::reset_view_box(text).into_bytes(),
            _ => range.document.as_bytes().to_vec(),
        };
        for gid in range.glyphs() {
            let name = match glyph_order.get(gid.to_u16() as usize) {
                Some(name) if wanted.contains(name.as_str()) => name.clone(),
                Some(_) => continue,
                None => {
                    unnamed += 1;
                    let name = format!("_unnamed{unnamed}");
                    log::warn!(
                        "Unable to find a glyph name at GID {}. Using name {name} instead.",
                        gid.to_u16()
                    );
                    name
                }
            };
            if skip.contains(name.as_str()) {
                continue;
            }
            output.save(&name, &document)?;
        }
    }
    Ok(DumpReport::Saved(output.saved()))
}
