//! Text level edits to SVG documents, and the font copy file name

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use svg_table::sanitize::{RootElement, RootElementError};

static XML_DECLARATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<\?xml\s.*?\?>").unwrap());
static ENABLE_BACKGROUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+enable-background\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap()
});
static BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static COPY_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\d+$").unwrap());

/// Give the root element the id the `SVG ` table requires, `glyph<gid>`.
pub fn set_glyph_id(document: &str, gid: u16) -> Result<String, RootElementError> {
    Ok(RootElement::locate(document)?.with_attribute("id", &format!("glyph{gid}")))
}

/// Strip what a font does not need: the XML declaration, the
/// `enable-background` attribute and insignificant whitespace.
pub fn minify(document: &str) -> String {
    let document = XML_DECLARATION.replace_all(document, "");
    let document = ENABLE_BACKGROUND.replace_all(&document, "");
    let document = BETWEEN_TAGS.replace_all(&document, "><");
    WHITESPACE.replace_all(&document, " ").trim().to_string()
}

/// Set the min-y of the root `viewBox` to zero.
///
/// Documents without a root element or a well formed `viewBox` are returned
/// unchanged.
pub fn reset_view_box(document: &str) -> String {
    let Ok(root) = RootElement::locate(document) else {
        return document.to_string();
    };
    let Some(view_box) = root.get("viewBox") else {
        return document.to_string();
    };
    let mut values: Vec<&str> = view_box
        .split(|c: char| c.is_ascii_whitespace() || c == ',')
        .filter(|v| !v.is_empty())
        .collect();
    if values.len() != 4 {
        log::debug!("ignoring malformed viewBox '{view_box}'");
        return document.to_string();
    }
    values[1] = "0";
    root.with_attribute("viewBox", &values.join(" "))
}

/// A file path for a backup copy of `font` that does not exist yet.
///
/// A `#N` suffix already on the file stem is dropped, then `#0`, `#1`, ...
/// are tried in turn.
pub fn font_copy_path(font: &Path) -> PathBuf {
    let stem = font
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    let stem = COPY_SUFFIX.replace(&stem, "");
    let extension = font
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let folder = font.parent().unwrap_or_else(|| Path::new(""));
    let mut candidate = folder.join(format!("{stem}{extension}"));
    let mut n = 0;
    while candidate.exists() {
        candidate = folder.join(format!("{stem}#{n}{extension}"));
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn glyph_id_is_added_or_replaced() {
        assert_eq!(
            set_glyph_id("<svg><g/></svg>", 3).unwrap(),
            r#"<svg id="glyph3"><g/></svg>"#
        );
        assert_eq!(
            set_glyph_id(r#"<svg id="A" x="1"><g/></svg>"#, 12).unwrap(),
            r#"<svg id="glyph12" x="1"><g/></svg>"#
        );
        assert_eq!(
            set_glyph_id("<html/>", 1),
            Err(RootElementError::Missing)
        );
    }

    #[rstest]
    #[case::declaration(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg>\n  <g/>\n</svg>\n",
        "<svg><g/></svg>"
    )]
    #[case::enable_background(
        r#"<svg x="0" enable-background="new 0 0 100 100"><g/></svg>"#,
        r#"<svg x="0"><g/></svg>"#
    )]
    #[case::whitespace(
        "<svg>\n\t<path\n\t\td=\"M0 0  L1 1\"/>\n</svg>",
        "<svg><path d=\"M0 0 L1 1\"/></svg>"
    )]
    fn minified(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(minify(input), expected);
    }

    #[rstest]
    #[case::negative(
        r#"<svg viewBox="0 -1000 1000 1000"><g/></svg>"#,
        r#"<svg viewBox="0 0 1000 1000"><g/></svg>"#
    )]
    #[case::commas(
        r#"<svg viewBox="10,20,30,40"/>"#,
        r#"<svg viewBox="10 0 30 40"/>"#
    )]
    #[case::missing("<svg><g/></svg>", "<svg><g/></svg>")]
    #[case::malformed(r#"<svg viewBox="1 2"/>"#, r#"<svg viewBox="1 2"/>"#)]
    fn view_box_reset(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(reset_view_box(input), expected);
    }

    #[test]
    fn copy_names() {
        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("font.otf");
        std::fs::write(&font, b"OTTO").unwrap();
        assert_eq!(font_copy_path(&font), dir.path().join("font#0.otf"));
        std::fs::write(dir.path().join("font#0.otf"), b"OTTO").unwrap();
        assert_eq!(font_copy_path(&font), dir.path().join("font#1.otf"));
        // copying a copy starts from the original name
        let copy = dir.path().join("font#0.otf");
        assert_eq!(font_copy_path(&copy), dir.path().join("font#1.otf"));
        let other = dir.path().join("other.ttf");
        assert_eq!(font_copy_path(&other), other);
    }
}
