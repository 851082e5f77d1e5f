//! Adding an `SVG ` table to a font from a folder of SVG files
//!
//! Each file is matched to a glyph by name: `A.svg` renders the glyph named
//! `A`. Documents are given the `glyph<gid>` id the table requires, stripped
//! of their root dimensions, and minified before they are stored.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use svg_table::{compact, GlyphDocumentMap, SvgDocument, SvgTableBuilder, SVG_TAG};
use write_fonts::types::GlyphId16;

use crate::{
    cleanup,
    font_file::{self, Flavor, FontFile},
    svg_files::{self, SvgFile},
    Error,
};

/// Options for [`add_svg_table`].
#[derive(Clone, Debug, Default)]
pub struct AddOptions {
    /// Copy the original font before it is modified in place.
    pub make_font_copy: bool,
    /// Leave the `viewBox` on the root elements.
    pub keep_view_box: bool,
    /// Also write WOFF and WOFF2 versions of the modified font.
    pub generate_woffs: bool,
    /// Gzip the documents in the font that is saved in place.
    pub compress: bool,
    /// Glyph names whose files are ignored.
    pub exclude: Vec<String>,
}

/// The result of a successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddReport {
    Added { count: usize, font: PathBuf },
    /// No file produced a document for a glyph in the font.
    NothingToAdd,
}

impl fmt::Display for AddReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddReport::Added { count: 1, font } => write!(
                f,
                "1 SVG glyph was successfully added to {}",
                font.display()
            ),
            AddReport::Added { count, font } => write!(
                f,
                "{count} SVG glyphs were successfully added to {}",
                font.display()
            ),
            AddReport::NothingToAdd => {
                f.write_str("Could not find any SVG files that can be added to the font.")
            }
        }
    }
}

/// Add the SVG files found in `svg_folder` to the font at `font_path`.
///
/// The font is rewritten in place, in the container it was loaded from. An
/// existing `SVG ` table is replaced.
pub fn add_svg_table(
    svg_folder: &Path,
    font_path: &Path,
    options: &AddOptions,
) -> Result<AddReport, Error> {
    let svg_folder = svg_folder
        .canonicalize()
        .unwrap_or_else(|_| svg_folder.to_owned());
    if !svg_folder.is_dir() {
        return Err(Error::InvalidFolderPath(svg_folder));
    }
    let font_path = font_file::checked_font_path(font_path)?;

    let files = svg_files::load_svg_files(&svg_files::find_svg_files(&svg_folder)?);
    if files.is_empty() {
        return Err(Error::NoSvgFiles);
    }

    let font = FontFile::load(&font_path)?;
    let glyph_order = font.glyph_order()?;
    let jobs = match_files_to_glyphs(files, &glyph_order, &options.exclude, &font_path);
    let documents: GlyphDocumentMap = jobs
        .par_iter()
        .filter_map(|(gid, file)| {
            prepare_document(file, *gid, options.keep_view_box)
                .map(|doc| (*gid, SvgDocument::from(doc)))
        })
        .collect();
    if documents.is_empty() {
        return Ok(AddReport::NothingToAdd);
    }
    log::info!(
        "adding {} documents to {}",
        documents.len(),
        font_path.display()
    );

    let ranges = compact(&documents);
    let table = SvgTableBuilder::new()
        .compress(options.compress)
        .build(&ranges)?;
    let sfnt = font.with_table(SVG_TAG, table)?;

    if options.make_font_copy {
        let copy = cleanup::font_copy_path(&font_path);
        std::fs::copy(&font_path, &copy).map_err(|e| Error::io(&copy, e))?;
        log::info!("saved a copy of the font to {}", copy.display());
    }
    font_file::save(&font_path, &sfnt, font.flavor())?;

    if options.generate_woffs {
        // web fonts are compressed as a whole already
        let sfnt = if options.compress {
            let table = SvgTableBuilder::new().compress(false).build(&ranges)?;
            font.with_table(SVG_TAG, table)?
        } else {
            sfnt
        };
        for (extension, flavor) in [("woff", Flavor::Woff), ("woff2", Flavor::Woff2)] {
            font_file::save(font_path.with_extension(extension), &sfnt, flavor)?;
        }
    }

    Ok(AddReport::Added {
        count: documents.len(),
        font: font_path,
    })
}

/// Pair each file with the glyph it renders, reporting the ones that have
/// no glyph or repeat an earlier name.
fn match_files_to_glyphs(
    files: Vec<SvgFile>,
    glyph_order: &[String],
    exclude: &[String],
    font_path: &Path,
) -> Vec<(GlyphId16, SvgFile)> {
    let gids: HashMap<&str, u16> = glyph_order
        .iter()
        .enumerate()
        .filter_map(|(i, name)| Some((name.as_str(), u16::try_from(i).ok()?)))
        .collect();
    let mut seen = HashSet::new();
    let mut jobs = Vec::with_capacity(files.len());
    for file in files {
        if exclude.contains(&file.glyph_name) {
            continue;
        }
        let Some(&gid) = gids.get(file.glyph_name.as_str()) else {
            log::warn!(
                "Could not find a glyph named {} in the font {}",
                file.glyph_name,
                font_path.display()
            );
            continue;
        };
        if !seen.insert(file.glyph_name.clone()) {
            log::warn!(
                "Skipped a duplicate file named {}.svg at {}",
                file.glyph_name,
                file.path.display()
            );
            continue;
        }
        jobs.push((GlyphId16::new(gid), file));
    }
    jobs
}

fn prepare_document(file: &SvgFile, gid: GlyphId16, keep_view_box: bool) -> Option<String> {
    let with_id = match cleanup::set_glyph_id(&file.contents, gid.to_u16()) {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("Skipping {}: {e}", file.path.display());
            return None;
        }
    };
    let sanitized = svg_table::sanitize_or_passthrough(with_id, keep_view_box);
    Some(cleanup::minify(&sanitized))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> SvgFile {
        SvgFile {
            path: PathBuf::from(format!("/svgs/{name}.svg")),
            glyph_name: name.to_string(),
            contents: "<svg><g/></svg>".to_string(),
        }
    }

    #[test]
    fn report_messages() {
        let font = PathBuf::from("font.otf");
        assert_eq!(
            AddReport::Added {
                count: 1,
                font: font.clone()
            }
            .to_string(),
            "1 SVG glyph was successfully added to font.otf"
        );
        assert_eq!(
            AddReport::Added { count: 3, font }.to_string(),
            "3 SVG glyphs were successfully added to font.otf"
        );
    }

    #[test]
    fn matching() {
        let _ = env_logger::builder().is_test(true).try_init();
        let order = [".notdef", "A", "B", "C"].map(String::from);
        let files = vec![file("A"), file("B"), file("Z"), file("A"), file("C")];
        let jobs = match_files_to_glyphs(files, &order, &["C".to_string()], Path::new("f.otf"));
        let matched: Vec<_> = jobs
            .iter()
            .map(|(gid, file)| (gid.to_u16(), file.glyph_name.as_str()))
            .collect();
        assert_eq!(matched, [(1, "A"), (2, "B")]);
    }

    #[test]
    fn documents_are_prepared() {
        let mut input = file("A");
        input.contents = "<?xml version=\"1.0\"?>\n<svg width=\"10\" viewBox=\"0 0 10 10\">\n  <path d=\"M0 0\"/>\n</svg>\n".into();
        assert_eq!(
            prepare_document(&input, GlyphId16::new(4), false).unwrap(),
            "<svg id=\"glyph4\"><path d=\"M0 0\"/></svg>"
        );
        assert_eq!(
            prepare_document(&input, GlyphId16::new(4), true).unwrap(),
            "<svg id=\"glyph4\" viewBox=\"0 0 10 10\"><path d=\"M0 0\"/></svg>"
        );
    }
}
