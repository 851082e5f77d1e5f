//! SVG documents and the glyph to document mapping

use std::{collections::BTreeMap, fmt, sync::Arc};

use write_fonts::types::GlyphId16;

/// A mapping from glyph id to the document used to render that glyph.
///
/// Built by callers before encoding, and produced by the decoder.
pub type GlyphDocumentMap = BTreeMap<GlyphId16, SvgDocument>;

/// The uncompressed bytes of a single SVG document.
///
/// Cloning is cheap; clones share the same allocation. Two documents are
/// equal if their bytes are equal, regardless of whether they share storage.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SvgDocument(Arc<[u8]>);

impl SvgDocument {
    /// Create a new document from its (uncompressed) bytes.
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// The raw bytes of the document.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The document as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.0)
    }

    /// The document as text, replacing invalid sequences.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    /// The length of the document in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if the document contains no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` if both documents share the same allocation.
    pub fn ptr_eq(&self, other: &SvgDocument) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<String> for SvgDocument {
    fn from(src: String) -> Self {
        Self(src.into_bytes().into())
    }
}

impl From<&str> for SvgDocument {
    fn from(src: &str) -> Self {
        Self(src.as_bytes().into())
    }
}

impl From<Vec<u8>> for SvgDocument {
    fn from(src: Vec<u8>) -> Self {
        Self(src.into())
    }
}

impl From<&[u8]> for SvgDocument {
    fn from(src: &[u8]) -> Self {
        Self(src.into())
    }
}

impl AsRef<[u8]> for SvgDocument {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SvgDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Ok(text) => write!(f, "SvgDocument({text:?})"),
            Err(_) => write!(f, "SvgDocument({} bytes)", self.0.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_content() {
        let one = SvgDocument::from("<svg/>");
        let two = SvgDocument::from(String::from("<svg/>"));
        assert_eq!(one, two);
        assert!(!one.ptr_eq(&two));
        assert!(one.ptr_eq(&one.clone()));
    }

    #[test]
    fn debug_shows_text() {
        let doc = SvgDocument::from("<svg/>");
        assert_eq!(format!("{doc:?}"), "SvgDocument(\"<svg/>\")");
        let binary = SvgDocument::from(vec![0xff, 0xfe]);
        assert_eq!(format!("{binary:?}"), "SvgDocument(2 bytes)");
    }
}
