//! Drawing glyphs of one or more fonts as layered SVG files
//!
//! Each font is a layer with its own fill color. Layers are stacked in the
//! order the fonts were given, and every glyph name produces one file.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    fmt,
    path::PathBuf,
    str::FromStr,
    sync::LazyLock,
};

use rayon::prelude::*;
use regex::Regex;
use skrifa::{
    outline::DrawSettings,
    prelude::{LocationRef, Size},
    raw::{FontRef, TableProvider},
    GlyphId, MetadataProvider,
};

use crate::{
    font_file::{self, FontFile},
    paths::{self, OutputFolder},
    pen::SvgPathPen,
    Error,
};

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{6}(?:[0-9a-fA-F]{2})?$").unwrap());

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
const DEFAULT_UPEM: u16 = 1000;

/// A fill color written as `RRGGBB` or `RRGGBBAA`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexColor {
    rgb: String,
    alpha: u8,
}

impl HexColor {
    /// Opaque black, the SVG default fill.
    pub fn black() -> Self {
        Self {
            rgb: "000000".to_string(),
            alpha: 0xff,
        }
    }

    /// The color without its alpha, as given.
    pub fn rgb(&self) -> &str {
        &self.rgb
    }

    /// The opacity, if the color is not fully opaque.
    pub fn opacity(&self) -> Option<f32> {
        (self.alpha != 0xff).then(|| self.alpha as f32 / 255.0)
    }
}

impl FromStr for HexColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !HEX_COLOR.is_match(s) {
            return Err(Error::InvalidColor(s.to_string()));
        }
        let alpha = match s.get(6..) {
            Some(alpha) if !alpha.is_empty() => {
                u8::from_str_radix(alpha, 16).map_err(|_| Error::InvalidColor(s.to_string()))?
            }
            _ => 0xff,
        };
        Ok(Self {
            rgb: s[..6].to_string(),
            alpha,
        })
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alpha == 0xff {
            f.write_str(&self.rgb)
        } else {
            write!(f, "{}{:02x}", self.rgb, self.alpha)
        }
    }
}

/// Parse a comma separated list of colors.
pub fn parse_colors(input: &str) -> Result<Vec<HexColor>, Error> {
    paths::split_comma_sequence(input)
        .iter()
        .map(|color| color.parse())
        .collect()
}

/// Options for [`fonts_to_svg`].
#[derive(Clone, Debug, Default)]
pub struct Fonts2SvgOptions {
    /// One fill color per font; missing colors are black.
    pub colors: Vec<HexColor>,
    /// Where to save the files; defaults to `SVGs` next to the first font.
    pub output_folder: Option<PathBuf>,
    /// Only draw these glyphs.
    pub glyph_names: Vec<String>,
    /// Extra glyphs to draw along with the ones all fonts have.
    pub add_names: Vec<String>,
    /// Never draw these glyphs.
    pub exclude: Vec<String>,
    /// Draw the glyphs of any font, not only those all fonts have.
    pub union: bool,
    /// Fit the `viewBox` to the font's bounding box instead of the em.
    pub adjust_view_box: bool,
}

/// The result of a successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fonts2SvgReport {
    Saved(usize),
    /// The glyph selection came out empty.
    NothingToProcess,
}

impl fmt::Display for Fonts2SvgReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fonts2SvgReport::Saved(count) => f.write_str(&paths::final_message(*count)),
            Fonts2SvgReport::NothingToProcess => {
                f.write_str("The fonts and options provided can't produce any SVG files.")
            }
        }
    }
}

struct Layer {
    font: FontFile,
    gids: HashMap<String, GlyphId>,
    color: HexColor,
}

/// Draw the glyphs of `font_paths` into SVG files.
///
/// Paths that are not fonts are reported and skipped.
pub fn fonts_to_svg(
    font_paths: &[PathBuf],
    options: &Fonts2SvgOptions,
) -> Result<Fonts2SvgReport, Error> {
    let font_paths = font_file::validate_font_paths(font_paths);
    let Some(first_font) = font_paths.first() else {
        return Err(Error::NoFonts);
    };
    let colors = fit_colors(options.colors.clone(), font_paths.len());
    let folder = paths::output_folder_path(options.output_folder.as_deref(), first_font)?;

    let layers = font_paths
        .iter()
        .zip(colors)
        .map(|(path, color)| {
            let font = FontFile::load(path)?;
            let gids = font
                .glyph_order()?
                .into_iter()
                .enumerate()
                .map(|(gid, name)| (name, GlyphId::new(gid as u32)))
                .collect();
            Ok(Layer { font, gids, color })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let names = glyphs_to_draw(&layers, options);
    if names.is_empty() {
        return Ok(Fonts2SvgReport::NothingToProcess);
    }
    let skip: HashSet<&str> = options
        .exclude
        .iter()
        .map(String::as_str)
        .chain([".notdef"])
        .collect();
    let view_box = view_box(&layers[0].font, options.adjust_view_box)?;

    let documents: Vec<(&str, Option<String>)> = names
        .par_iter()
        .map(|name| {
            let document = if skip.contains(name.as_str()) {
                None
            } else {
                layered_document(name, &layers, &view_box)
            };
            (name.as_str(), document)
        })
        .collect();

    let nested = paths::names_to_save_in_nested_folder(names.iter().map(String::as_str));
    let mut output = OutputFolder::new(folder, nested);
    for (name, document) in documents {
        if let Some(document) = document {
            output.save(name, document.as_bytes())?;
        }
    }
    Ok(Fonts2SvgReport::Saved(output.saved()))
}

/// Pad the colors with black, or drop the extra ones, so there is one
/// color per font.
fn fit_colors(mut colors: Vec<HexColor>, num_fonts: usize) -> Vec<HexColor> {
    if colors.len() < num_fonts {
        let missing = num_fonts - colors.len();
        colors.resize(num_fonts, HexColor::black());
        log::warn!("The list of colors was extended with {missing} #000000 value(s).");
    } else if colors.len() > num_fonts {
        let extra = colors.split_off(num_fonts);
        let dropped: Vec<_> = extra.iter().map(HexColor::to_string).collect();
        log::warn!(
            "The list of colors got the last {} value(s) truncated: {}",
            extra.len(),
            dropped.join(" ")
        );
    }
    colors
}

/// The sorted glyph names to draw.
fn glyphs_to_draw(layers: &[Layer], options: &Fonts2SvgOptions) -> Vec<String> {
    let names: BTreeSet<&str> = if !options.glyph_names.is_empty() {
        options.glyph_names.iter().map(String::as_str).collect()
    } else if options.union {
        layers
            .iter()
            .flat_map(|layer| layer.gids.keys().map(String::as_str))
            .collect()
    } else {
        let mut common: BTreeSet<&str> = layers
            .first()
            .map(|layer| layer.gids.keys().map(String::as_str).collect())
            .unwrap_or_default();
        for layer in layers.iter().skip(1) {
            common.retain(|name| layer.gids.contains_key(*name));
        }
        common.extend(options.add_names.iter().map(String::as_str));
        common
    };
    names.into_iter().map(str::to_owned).collect()
}

/// The `viewBox` of every document, from the `head` table of the first font.
fn view_box(font: &FontFile, fit_to_bounds: bool) -> Result<String, Error> {
    let font = FontRef::new(font.sfnt()).map_err(Error::read)?;
    let upem = DEFAULT_UPEM as i32;
    let Ok(head) = font.head() else {
        return Ok(format!("0 -{upem} {upem} {upem}"));
    };
    Ok(if fit_to_bounds {
        let (x_min, y_min) = (head.x_min() as i32, head.y_min() as i32);
        let (x_max, y_max) = (head.x_max() as i32, head.y_max() as i32);
        format!("{x_min} {} {} {}", -y_max, x_max - x_min, y_max - y_min)
    } else {
        let upem = head.units_per_em() as i32;
        format!("0 -{upem} {upem} {upem}")
    })
}

/// The document for one glyph name, or `None` if no layer has contours.
fn layered_document(name: &str, layers: &[Layer], view_box: &str) -> Option<String> {
    let mut paths = String::new();
    for layer in layers {
        let Some(&gid) = layer.gids.get(name) else {
            continue;
        };
        let data = match path_data(&layer.font, gid) {
            Ok(data) if data.is_empty() => continue,
            Ok(data) => data,
            Err(e) => {
                log::warn!(
                    "Could not draw glyph {name} of {}: {e}",
                    layer.font.path().display()
                );
                continue;
            }
        };
        let opacity = layer
            .color
            .opacity()
            .map(|opacity| format!(" opacity=\"{opacity:.2}\""))
            .unwrap_or_default();
        paths.push_str(&format!(
            "\t<path{opacity} fill=\"#{}\" d=\"{data}\"/>\n",
            layer.color.rgb()
        ));
    }
    (!paths.is_empty())
        .then(|| format!("<svg xmlns=\"{SVG_NAMESPACE}\" viewBox=\"{view_box}\">\n{paths}</svg>"))
}

fn path_data(font: &FontFile, gid: GlyphId) -> Result<String, Error> {
    let font = FontRef::new(font.sfnt()).map_err(Error::read)?;
    let outlines = font.outline_glyphs();
    let Some(glyph) = outlines.get(gid) else {
        return Ok(String::new());
    };
    let mut pen = SvgPathPen::new();
    glyph
        .draw(
            DrawSettings::unhinted(Size::unscaled(), LocationRef::default()),
            &mut pen,
        )
        .map_err(Error::read)?;
    Ok(pen.into_path_data())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("aaabbb")]
    #[case("cccdddee")]
    #[case("000000")]
    #[case("ffffff00")]
    fn valid_colors(#[case] input: &str) {
        assert!(input.parse::<HexColor>().is_ok());
    }

    #[rstest]
    #[case("xxx")]
    #[case("xxxxxx")]
    #[case("aaa")]
    #[case("aaaxxx")]
    #[case("aaabbbc")]
    fn invalid_colors(#[case] input: &str) {
        assert!(matches!(
            input.parse::<HexColor>(),
            Err(Error::InvalidColor(_))
        ));
    }

    #[test]
    fn opacity() {
        let opaque: HexColor = "FF0000ff".parse().unwrap();
        assert_eq!(opaque.opacity(), None);
        assert_eq!(opaque.rgb(), "FF0000");
        let half: HexColor = "00ff0080".parse().unwrap();
        assert_eq!(format!("{:.2}", half.opacity().unwrap()), "0.50");
        assert_eq!(half.to_string(), "00ff0080");
    }

    #[test]
    fn color_lists() {
        let colors = parse_colors("ff0000, 00ff0080").unwrap();
        assert_eq!(colors.len(), 2);
        assert!(parse_colors("ff0000,nope").is_err());
    }

    #[test]
    fn colors_fit_the_fonts() {
        let _ = env_logger::builder().is_test(true).try_init();
        let red: HexColor = "ff0000".parse().unwrap();
        let blue: HexColor = "0000ff".parse().unwrap();
        assert_eq!(
            fit_colors(vec![red.clone()], 3),
            [red.clone(), HexColor::black(), HexColor::black()]
        );
        assert_eq!(fit_colors(vec![red.clone(), blue], 1), [red]);
    }
}
