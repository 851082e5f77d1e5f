//! Loading and saving fonts in any of the supported containers
//!
//! WOFF and WOFF2 files are unwrapped to a plain sfnt on load, and wrapped
//! again on save; everything in between works on sfnt bytes.

use std::{
    borrow::Cow,
    fs::File,
    io::Read,
    ops::Range,
    path::{Path, PathBuf},
};

use skrifa::MetadataProvider;
use write_fonts::{read::FontRef, types::Tag, FontBuilder};

use crate::{woff, woff2, Error};

/// The four kinds of font file the tools accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flavor {
    Otf,
    Ttf,
    Woff,
    Woff2,
}

impl Flavor {
    /// Determine the flavor from the first four bytes of a file.
    pub fn detect(data: &[u8]) -> Option<Self> {
        match data.get(..4)? {
            b"OTTO" => Some(Flavor::Otf),
            [0, 1, 0, 0] | b"true" => Some(Flavor::Ttf),
            b"wOFF" => Some(Flavor::Woff),
            b"wOF2" => Some(Flavor::Woff2),
            _ => None,
        }
    }

    /// Determine the flavor of a file on disk, reading only its header.
    pub fn sniff(path: &Path) -> Option<Self> {
        let mut head = [0u8; 4];
        File::open(path).ok()?.read_exact(&mut head).ok()?;
        Self::detect(&head)
    }

    pub fn name(self) -> &'static str {
        match self {
            Flavor::Otf => "OTF",
            Flavor::Ttf => "TTF",
            Flavor::Woff => "WOFF",
            Flavor::Woff2 => "WOFF2",
        }
    }
}

/// Resolve a path, checking that it points at a font file.
pub fn checked_font_path(path: &Path) -> Result<PathBuf, Error> {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_owned());
    if resolved.is_file() && Flavor::sniff(&resolved).is_some() {
        Ok(resolved)
    } else {
        Err(Error::InvalidFontPath(resolved))
    }
}

/// Resolve each path and keep those that point at a font file.
///
/// Every rejected path is reported with an error message.
pub fn validate_font_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter_map(|path| match checked_font_path(path) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                log::error!("{e}");
                None
            }
        })
        .collect()
}

/// A font loaded from disk, held as sfnt data.
#[derive(Clone, Debug)]
pub struct FontFile {
    path: PathBuf,
    flavor: Flavor,
    sfnt: Vec<u8>,
}

impl FontFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let flavor =
            Flavor::detect(&data).ok_or_else(|| Error::InvalidFontPath(path.to_owned()))?;
        let sfnt = match flavor {
            Flavor::Otf | Flavor::Ttf => data,
            Flavor::Woff => woff::decode(&data)?,
            Flavor::Woff2 => woff2::decode(&data)?,
        };
        log::debug!("loaded {} font {}", flavor.name(), path.display());
        Ok(Self {
            path: path.to_owned(),
            flavor,
            sfnt,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// The font as an (unwrapped) sfnt.
    pub fn sfnt(&self) -> &[u8] {
        &self.sfnt
    }

    pub fn font(&self) -> Result<FontRef<'_>, Error> {
        FontRef::new(&self.sfnt).map_err(Error::read)
    }

    pub fn table_data(&self, tag: Tag) -> Result<Option<&[u8]>, Error> {
        Ok(self.font()?.table_data(tag).map(|data| data.as_bytes()))
    }

    /// The names of all glyphs, indexed by glyph id.
    ///
    /// Names come from the `post` or `CFF ` table; fonts without either get
    /// synthesized `gidN` names.
    pub fn glyph_order(&self) -> Result<Vec<String>, Error> {
        let font = skrifa::FontRef::new(&self.sfnt).map_err(Error::read)?;
        Ok(font
            .glyph_names()
            .iter()
            .map(|(_, name)| name.to_string())
            .collect())
    }

    /// A copy of this font with a table added or replaced.
    pub fn with_table(&self, tag: Tag, data: Vec<u8>) -> Result<Vec<u8>, Error> {
        let font = self.font()?;
        let sfnt_version = font.table_directory.sfnt_version();
        let mut builder = FontBuilder::new();
        builder.add_raw(tag, data).copy_missing_tables(font);
        Ok(finish_sfnt(builder, sfnt_version))
    }
}

const HEAD: Tag = Tag::new(b"head");
const TABLE_DIRECTORY_LEN: usize = 12;
const TABLE_RECORD_LEN: usize = 16;
/// The whole font sums to this once `head.checksumAdjustment` is set.
const FONT_CHECKSUM: u32 = 0xB1B0AFBA;

/// Build the font, keeping the sfnt version of the source.
///
/// The builder always writes the TrueType version tag, which is wrong for
/// CFF flavored fonts. Since the version is part of the whole-font checksum,
/// `head.checksumAdjustment` is recomputed afterwards.
pub(crate) fn finish_sfnt(mut builder: FontBuilder, sfnt_version: u32) -> Vec<u8> {
    let mut data = builder.build();
    data[..4].copy_from_slice(&sfnt_version.to_be_bytes());
    let Some((index, head)) = head_location(&data) else {
        return data;
    };
    // the head record checksum is taken with the adjustment zeroed
    let adjustment = head.start + 8..head.start + 12;
    data[adjustment.clone()].fill(0);
    let record = TABLE_DIRECTORY_LEN + index * TABLE_RECORD_LEN + 4;
    let head_checksum = checksum(&data[head]);
    data[record..record + 4].copy_from_slice(&head_checksum.to_be_bytes());
    let value = FONT_CHECKSUM.wrapping_sub(checksum(&data));
    data[adjustment].copy_from_slice(&value.to_be_bytes());
    data
}

/// The directory index and byte range of the `head` table.
fn head_location(data: &[u8]) -> Option<(usize, Range<usize>)> {
    let font = FontRef::new(data).ok()?;
    let (index, record) = font
        .table_directory
        .table_records()
        .iter()
        .enumerate()
        .find(|(_, record)| record.tag() == HEAD)?;
    let start = record.offset() as usize;
    let end = start + record.length() as usize;
    (end - start >= 12 && end <= data.len()).then_some((index, start..end))
}

/// The OpenType table checksum: the sum of big endian words, zero padded.
fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Write sfnt data to disk, wrapped in the requested container.
pub fn save(path: impl AsRef<Path>, sfnt: &[u8], flavor: Flavor) -> Result<(), Error> {
    let path = path.as_ref();
    let data: Cow<[u8]> = match flavor {
        Flavor::Otf | Flavor::Ttf => Cow::Borrowed(sfnt),
        Flavor::Woff => Cow::Owned(woff::encode(sfnt)?),
        Flavor::Woff2 => Cow::Owned(woff2::encode(sfnt)?),
    };
    std::fs::write(path, data).map_err(|e| Error::io(path, e))?;
    log::debug!("saved {} font {}", flavor.name(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_flavors() {
        assert_eq!(Flavor::detect(b"OTTO...."), Some(Flavor::Otf));
        assert_eq!(Flavor::detect(&[0, 1, 0, 0, 0, 9]), Some(Flavor::Ttf));
        assert_eq!(Flavor::detect(b"true"), Some(Flavor::Ttf));
        assert_eq!(Flavor::detect(b"wOFF"), Some(Flavor::Woff));
        assert_eq!(Flavor::detect(b"wOF2"), Some(Flavor::Woff2));
        assert_eq!(Flavor::detect(b"ttcf"), None);
        assert_eq!(Flavor::detect(b"OTT"), None);
    }

    #[test]
    fn glyph_order_from_post() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        std::fs::write(&path, svg_test_data::simple_font()).unwrap();
        let font = FontFile::load(&path).unwrap();
        assert_eq!(font.flavor(), Flavor::Ttf);
        assert_eq!(
            font.glyph_order().unwrap(),
            [".notdef", "A", "B", "a", "space"]
        );
    }

    fn load_simple_font(dir: &Path) -> FontFile {
        let path = dir.join("font.ttf");
        std::fs::write(&path, svg_test_data::simple_font()).unwrap();
        FontFile::load(&path).unwrap()
    }

    /// The table with `head.checksumAdjustment` zeroed.
    fn comparable(tag: Tag, data: &[u8]) -> Vec<u8> {
        let mut data = data.to_vec();
        if tag == HEAD {
            data[8..12].fill(0);
        }
        data
    }

    #[test]
    fn with_table_keeps_other_tables() {
        let dir = tempfile::tempdir().unwrap();
        let font = load_simple_font(dir.path());
        let tag = Tag::new(b"TEST");
        let sfnt = font.with_table(tag, vec![1, 2, 3, 4]).unwrap();
        let rebuilt = FontRef::new(&sfnt).unwrap();
        assert_eq!(rebuilt.table_data(tag).unwrap().as_bytes(), &[1, 2, 3, 4]);
        let original = font.font().unwrap();
        for record in original.table_directory.table_records() {
            let tag = record.tag();
            assert_eq!(
                comparable(tag, rebuilt.table_data(tag).unwrap().as_bytes()),
                comparable(tag, original.table_data(tag).unwrap().as_bytes()),
                "{tag}"
            );
        }
        assert_eq!(checksum(&sfnt), FONT_CHECKSUM);
    }

    #[test]
    fn cff_version_keeps_checksums_valid() {
        let dir = tempfile::tempdir().unwrap();
        let font = load_simple_font(dir.path());
        let mut builder = FontBuilder::new();
        builder.copy_missing_tables(font.font().unwrap());
        let sfnt = finish_sfnt(builder, u32::from_be_bytes(*b"OTTO"));

        assert_eq!(&sfnt[..4], b"OTTO");
        assert_eq!(checksum(&sfnt), FONT_CHECKSUM);
        let rebuilt = FontRef::new(&sfnt).unwrap();
        for record in rebuilt.table_directory.table_records() {
            let data = rebuilt.table_data(record.tag()).unwrap();
            assert_eq!(
                checksum(&comparable(record.tag(), data.as_bytes())),
                record.checksum(),
                "{}",
                record.tag()
            );
        }
    }

    #[test]
    fn checksum_pads_the_last_word() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0, 0, 0, 1, 0, 0, 0, 2]), 3);
        assert_eq!(checksum(&[1]), 0x0100_0000);
        assert_eq!(checksum(&[0xff; 8]), 0xffff_fffe);
    }

    #[test]
    fn invalid_paths_are_dropped() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("font.ttf");
        let text = dir.path().join("notes.txt");
        std::fs::write(&font, svg_test_data::simple_font()).unwrap();
        std::fs::write(&text, "hello").unwrap();
        let valid = validate_font_paths(&[font.clone(), text, dir.path().join("missing.otf")]);
        assert_eq!(valid, [font.canonicalize().unwrap()]);
    }
}
