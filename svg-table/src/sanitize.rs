//! Cleaning up the root element of an SVG document
//!
//! Glyph documents are rendered into the em box defined by the font, so an
//! explicit `width` or `height` on the root `<svg>` element only gets in the
//! way. The `viewBox` is optional: it is removed unless the caller asks to
//! keep it.
//!
//! This works on the text of the document. Only the start tag of the root
//! element is tokenized; everything after it is copied through untouched.

use std::ops::Range;

use thiserror::Error;

/// Why the root element of a document could not be located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RootElementError {
    #[error("no <svg> root element")]
    Missing,
    #[error("the <svg> start tag is not terminated")]
    Unterminated,
}

/// A document that could not be sanitized.
///
/// This is not fatal: the original text is carried along so that a batch of
/// documents can continue with it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not sanitize SVG document: {kind}")]
pub struct SanitizeWarning {
    kind: RootElementError,
    original: String,
}

impl SanitizeWarning {
    pub fn kind(&self) -> RootElementError {
        self.kind
    }

    /// The document as it was passed in.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn into_original(self) -> String {
        self.original
    }
}

#[derive(Clone, Debug)]
struct Attribute {
    /// The whole attribute, including the whitespace in front of it.
    span: Range<usize>,
    name: Range<usize>,
    /// The value, without quotes.
    value: Option<Range<usize>>,
}

/// The start tag of the root `<svg>` element of a document.
///
/// The root is the first element outside of comments, processing
/// instructions and declarations (including a doctype with an internal
/// subset). Attribute values are tokenized with their quotes, so text inside
/// a value is never mistaken for another attribute.
#[derive(Clone, Debug)]
pub struct RootElement<'a> {
    source: &'a str,
    /// The position just past `<svg`.
    name_end: usize,
    attributes: Vec<Attribute>,
}

impl<'a> RootElement<'a> {
    /// Find the root element of `source`.
    pub fn locate(source: &'a str) -> Result<Self, RootElementError> {
        let bytes = source.as_bytes();
        let start = find_first_element(bytes)?;
        let name_end = start + 4;
        let is_svg = bytes[start + 1..].starts_with(b"svg")
            && bytes
                .get(name_end)
                .is_none_or(|b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/');
        if !is_svg {
            return Err(RootElementError::Missing);
        }
        let attributes = parse_attributes(bytes, name_end)?;
        Ok(Self {
            source,
            name_end,
            attributes,
        })
    }

    fn find(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attr| &self.source[attr.name.clone()] == name)
    }

    /// The value of an attribute on the root element.
    ///
    /// An attribute without a value has the empty string as its value.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        let source = self.source;
        self.find(name)
            .map(|attr| attr.value.clone().map(|v| &source[v]).unwrap_or_default())
    }

    /// The document with the named attributes removed from the root element.
    pub fn without_attributes(&self, names: &[&str]) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut pos = 0;
        for attr in &self.attributes {
            if names.contains(&&self.source[attr.name.clone()]) {
                out.push_str(&self.source[pos..attr.span.start]);
                pos = attr.span.end;
            }
        }
        out.push_str(&self.source[pos..]);
        out
    }

    /// The document with an attribute of the root element set to `value`.
    ///
    /// An existing attribute keeps its position; a new one is inserted
    /// directly after the element name.
    pub fn with_attribute(&self, name: &str, value: &str) -> String {
        let (before, after) = match self.find(name) {
            Some(attr) => (
                &self.source[..attr.name.start],
                &self.source[attr.span.end..],
            ),
            None => (&self.source[..self.name_end], &self.source[self.name_end..]),
        };
        let separator = if self.find(name).is_some() { "" } else { " " };
        format!("{before}{separator}{name}=\"{value}\"{after}")
    }
}

/// Returns the position of the `<` that opens the first element.
fn find_first_element(bytes: &[u8]) -> Result<usize, RootElementError> {
    let mut pos = 0;
    loop {
        let start = pos + find_byte(b'<', &bytes[pos..]).ok_or(RootElementError::Missing)?;
        let rest = &bytes[start..];
        pos = if rest.starts_with(b"<!--") {
            start + 4 + find_seq(&rest[4..], b"-->").ok_or(RootElementError::Missing)? + 3
        } else if rest.starts_with(b"<?") {
            start + 2 + find_seq(&rest[2..], b"?>").ok_or(RootElementError::Missing)? + 2
        } else if rest.starts_with(b"<!") {
            start + skip_declaration(rest).ok_or(RootElementError::Missing)?
        } else {
            return Ok(start);
        };
    }
}

/// The length of a `<!...>` declaration, including a bracketed subset.
fn skip_declaration(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote = None;
    for (i, b) in bytes.iter().enumerate().skip(2) {
        match (quote, *b) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => (),
            (None, b'"' | b'\'') => quote = Some(*b),
            (None, b'[') => depth += 1,
            (None, b']') => depth = depth.saturating_sub(1),
            (None, b'>') if depth == 0 => return Some(i + 1),
            _ => (),
        }
    }
    None
}

fn parse_attributes(bytes: &[u8], mut pos: usize) -> Result<Vec<Attribute>, RootElementError> {
    let mut attributes = Vec::new();
    loop {
        let span_start = pos;
        pos = skip_whitespace(bytes, pos);
        match bytes.get(pos) {
            None => return Err(RootElementError::Unterminated),
            Some(b'>') => return Ok(attributes),
            Some(b'/') if bytes.get(pos + 1) == Some(&b'>') => return Ok(attributes),
            _ => (),
        }
        let name_start = pos;
        while bytes
            .get(pos)
            .is_some_and(|b| !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/'))
        {
            pos += 1;
        }
        if pos == name_start {
            // a stray '/' or '='
            pos += 1;
            continue;
        }
        let name = name_start..pos;
        let after_name = skip_whitespace(bytes, pos);
        let mut value = None;
        if bytes.get(after_name) == Some(&b'=') {
            pos = skip_whitespace(bytes, after_name + 1);
            match bytes.get(pos) {
                None => return Err(RootElementError::Unterminated),
                Some(&quote @ (b'"' | b'\'')) => {
                    let len =
                        find_byte(quote, &bytes[pos + 1..]).ok_or(RootElementError::Unterminated)?;
                    value = Some(pos + 1..pos + 1 + len);
                    pos += len + 2;
                }
                Some(_) => {
                    let start = pos;
                    // an unquoted value stops at whitespace or at the end of the tag
                    while let Some(&b) = bytes.get(pos) {
                        let closes =
                            b == b'>' || (b == b'/' && bytes.get(pos + 1) == Some(&b'>'));
                        if b.is_ascii_whitespace() || closes {
                            break;
                        }
                        pos += 1;
                    }
                    value = Some(start..pos);
                }
            }
        }
        attributes.push(Attribute {
            span: span_start..pos,
            name,
            value,
        });
    }
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}

fn find_byte(needle: u8, haystack: &[u8]) -> Option<usize> {
    haystack.iter().position(|b| *b == needle)
}

fn find_seq(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Remove `width`, `height` and (unless `keep_view_box` is set) `viewBox`
/// from the root element of an SVG document.
///
/// Applying this more than once gives the same result as applying it once.
pub fn sanitize(document: &str, keep_view_box: bool) -> Result<String, SanitizeWarning> {
    let root = RootElement::locate(document).map_err(|kind| SanitizeWarning {
        kind,
        original: document.to_owned(),
    })?;
    let names: &[&str] = if keep_view_box {
        &["width", "height"]
    } else {
        &["width", "height", "viewBox"]
    };
    Ok(root.without_attributes(names))
}

/// Like [`sanitize`], but logs a warning and returns the document unchanged
/// when it cannot be sanitized.
pub fn sanitize_or_passthrough(document: String, keep_view_box: bool) -> String {
    match sanitize(&document, keep_view_box) {
        Ok(clean) => clean,
        Err(warning) => {
            log::warn!("{warning}");
            warning.into_original()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::width_height(
        r#"<svg width="10" height='20' viewBox="0 0 1 1"><g/></svg>"#,
        false,
        "<svg><g/></svg>"
    )]
    #[case::keep_view_box(
        r#"<svg width="10" height='20' viewBox="0 0 1 1"><g/></svg>"#,
        true,
        r#"<svg viewBox="0 0 1 1"><g/></svg>"#
    )]
    #[case::nothing_to_do(
        r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#,
        false,
        r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#
    )]
    #[case::nested_untouched(
        r#"<svg width="1"><svg width="2" viewBox="0 0 2 2"/><rect height="3"/></svg>"#,
        false,
        r#"<svg><svg width="2" viewBox="0 0 2 2"/><rect height="3"/></svg>"#
    )]
    #[case::similar_names_untouched(
        r#"<svg stroke-width="2" data-height="4" width="1"/>"#,
        false,
        r#"<svg stroke-width="2" data-height="4"/>"#
    )]
    #[case::attribute_text_in_values(
        r#"<svg id='a width="3"' width = "5" >x</svg>"#,
        false,
        r#"<svg id='a width="3"' >x</svg>"#
    )]
    #[case::multiline(
        "<svg\n  version=\"1.1\"\n  width=\"10px\"\n  height=\"10px\"\n  viewBox=\"0 0 10 10\">\n</svg>",
        false,
        "<svg\n  version=\"1.1\">\n</svg>"
    )]
    #[case::unquoted_self_closing(
        "<svg width=1 height=2/>",
        false,
        "<svg/>"
    )]
    #[case::unquoted_path_value(
        "<svg href=a/b width=3>x</svg>",
        false,
        "<svg href=a/b>x</svg>"
    )]
    #[case::prolog(
        "<?xml version=\"1.0\"?>\n<!-- <svg width=\"1\"> -->\n<!DOCTYPE svg [ <!ENTITY a \"<svg>\"> ]>\n<svg width=\"2\"/>",
        false,
        "<?xml version=\"1.0\"?>\n<!-- <svg width=\"1\"> -->\n<!DOCTYPE svg [ <!ENTITY a \"<svg>\"> ]>\n<svg/>"
    )]
    fn sanitize_root(#[case] input: &str, #[case] keep_view_box: bool, #[case] expected: &str) {
        let clean = sanitize(input, keep_view_box).unwrap();
        assert_eq!(clean, expected);
        // idempotent
        assert_eq!(sanitize(&clean, keep_view_box).unwrap(), clean);
    }

    #[rstest]
    #[case::empty("", RootElementError::Missing)]
    #[case::not_svg("<html><svg/></html>", RootElementError::Missing)]
    #[case::svg_prefix("<svgx/>", RootElementError::Missing)]
    #[case::only_comment("<!-- <svg/> -->", RootElementError::Missing)]
    #[case::unterminated("<svg width=\"1\"", RootElementError::Unterminated)]
    #[case::unterminated_value("<svg width=\"1>", RootElementError::Unterminated)]
    fn unsanitizable(#[case] input: &str, #[case] kind: RootElementError) {
        let warning = sanitize(input, false).unwrap_err();
        assert_eq!(warning.kind(), kind);
        assert_eq!(warning.original(), input);
    }

    #[test]
    fn passthrough_keeps_original() {
        let _ = env_logger::builder().is_test(true).try_init();
        let doc = String::from("not svg at all");
        assert_eq!(sanitize_or_passthrough(doc.clone(), false), doc);
        assert_eq!(
            sanitize_or_passthrough("<svg width='1'/>".into(), false),
            "<svg/>"
        );
    }

    #[test]
    fn get_attribute_values() {
        let root = RootElement::locate("<svg a='1' b=\"two\" c=3 d>").unwrap();
        assert_eq!(root.get("a"), Some("1"));
        assert_eq!(root.get("b"), Some("two"));
        assert_eq!(root.get("c"), Some("3"));
        assert_eq!(root.get("d"), Some(""));
        assert_eq!(root.get("e"), None);
    }

    #[test]
    fn set_attribute() {
        let src = "<svg id=\"old\" x='1'><g id=\"keep\"/></svg>";
        let root = RootElement::locate(src).unwrap();
        assert_eq!(
            root.with_attribute("id", "glyph7"),
            "<svg id=\"glyph7\" x='1'><g id=\"keep\"/></svg>"
        );
        let root = RootElement::locate("<svg>\n<g/></svg>").unwrap();
        assert_eq!(
            root.with_attribute("id", "glyph3"),
            "<svg id=\"glyph3\">\n<g/></svg>"
        );
    }
}
