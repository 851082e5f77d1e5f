//! Finding and validating the SVG files to add to a font

use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use rayon::prelude::*;
use regex::Regex;

use crate::Error;

static SVG_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<svg\b[^>]*>.+?</svg>").unwrap());
static TEXT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b[^>]*>.*?</text>").unwrap());

/// An SVG file that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SvgFile {
    pub path: PathBuf,
    /// The file name without its extension.
    pub glyph_name: String,
    pub contents: String,
}

/// All `.svg` files in `folder` and its subfolders, sorted by path.
///
/// Hidden files are skipped.
pub fn find_svg_files(folder: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut found = Vec::new();
    let mut pending = vec![folder.to_owned()];
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| Error::io(&dir, e))?.path();
            if path.is_dir() {
                pending.push(path);
            } else if is_svg_file_name(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

fn is_svg_file_name(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    !name.starts_with('.') && name.to_ascii_lowercase().ends_with(".svg")
}

/// Why a file was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    NoSvgElement,
    HasTextElement,
}

/// Light validation: a document must have an `<svg>` element with content,
/// and must not use `<text>`.
pub fn validate(contents: &str) -> Result<(), Rejection> {
    if !SVG_ELEMENT.is_match(contents) {
        return Err(Rejection::NoSvgElement);
    }
    if TEXT_ELEMENT.is_match(contents) {
        return Err(Rejection::HasTextElement);
    }
    Ok(())
}

/// Read and validate files in parallel, keeping the ones that pass.
///
/// Files that cannot be read or fail validation are reported and skipped.
/// The result keeps the order of `paths`.
pub fn load_svg_files(paths: &[PathBuf]) -> Vec<SvgFile> {
    paths
        .par_iter()
        .filter_map(|path| {
            let contents = match fs::read_to_string(path) {
                Ok(contents) => contents,
                Err(e) => {
                    log::warn!("Could not read {}: {e}", path.display());
                    return None;
                }
            };
            match validate(&contents) {
                Ok(()) => (),
                Err(Rejection::NoSvgElement) => {
                    log::warn!(
                        "Could not find <svg> element in the file. Skipping {}",
                        path.display()
                    );
                    return None;
                }
                Err(Rejection::HasTextElement) => {
                    log::warn!(
                        "Found <text> element in the file. Skipping {}",
                        path.display()
                    );
                    return None;
                }
            }
            let glyph_name = path.file_stem()?.to_string_lossy().into_owned();
            Some(SvgFile {
                path: path.clone(),
                glyph_name,
                contents,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::plain("<svg><path d='M0 0'/></svg>", Ok(()))]
    #[case::with_attributes(
        "<?xml version='1.0'?>\n<svg xmlns='http://www.w3.org/2000/svg'>\n<g/>\n</svg>",
        Ok(())
    )]
    #[case::empty_element("<svg/>", Err(Rejection::NoSvgElement))]
    #[case::not_svg("<html>hi</html>", Err(Rejection::NoSvgElement))]
    #[case::text(
        "<svg><text x='0'>A</text></svg>",
        Err(Rejection::HasTextElement)
    )]
    #[case::text_path_is_fine("<svg><textPath/></svg>", Ok(()))]
    fn validation(#[case] contents: &str, #[case] expected: Result<(), Rejection>) {
        assert_eq!(validate(contents), expected);
    }

    #[test]
    fn finds_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("more");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("A.svg"), "<svg>a</svg>").unwrap();
        fs::write(dir.path().join(".hidden.svg"), "<svg>a</svg>").unwrap();
        fs::write(dir.path().join("notes.txt"), "<svg>a</svg>").unwrap();
        fs::write(nested.join("B.SVG"), "<svg>b</svg>").unwrap();
        let found = find_svg_files(dir.path()).unwrap();
        assert_eq!(found, [dir.path().join("A.svg"), nested.join("B.SVG")]);
    }

    #[test]
    fn loads_valid_files_only() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("A.svg");
        let text = dir.path().join("B.svg");
        fs::write(&good, "<svg>a</svg>").unwrap();
        fs::write(&text, "<svg><text>b</text></svg>").unwrap();
        let files = load_svg_files(&[good.clone(), text, dir.path().join("missing.svg")]);
        assert_eq!(
            files,
            [SvgFile {
                path: good,
                glyph_name: "A".into(),
                contents: "<svg>a</svg>".into(),
            }]
        );
    }
}
