//! test fonts shared between the svg-table and opentypesvg crates.
//!
//! The fonts are compiled on demand with write-fonts: a glyf/loca font with
//! post glyph names, so that both glyph names and outlines are available.

use kurbo::{BezPath, Rect, Shape};
use write_fonts::{
    tables::{
        glyf::{GlyfLocaBuilder, SimpleGlyph},
        head::Head,
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
        loca::LocaFormat,
        maxp::Maxp,
        post::Post,
    },
    types::{FWord, Tag, UfWord},
    FontBuilder,
};

pub const ADVANCE: u16 = 600;

/// A description of a test font.
#[derive(Clone, Debug)]
pub struct TestFont {
    units_per_em: u16,
    glyphs: Vec<(String, BezPath)>,
    tables: Vec<(Tag, Vec<u8>)>,
}

impl Default for TestFont {
    fn default() -> Self {
        Self {
            units_per_em: 1000,
            glyphs: vec![(".notdef".into(), BezPath::new())],
            tables: Vec::new(),
        }
    }
}

impl TestFont {
    /// A font containing only `.notdef`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn units_per_em(mut self, units_per_em: u16) -> Self {
        self.units_per_em = units_per_em;
        self
    }

    /// Add a glyph; glyph ids are assigned in the order glyphs are added.
    pub fn glyph(mut self, name: &str, path: BezPath) -> Self {
        self.glyphs.push((name.into(), path));
        self
    }

    /// Add raw data for some other table.
    pub fn table(mut self, tag: Tag, data: impl Into<Vec<u8>>) -> Self {
        self.tables.push((tag, data.into()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut glyf_builder = GlyfLocaBuilder::new();
        let mut h_metrics = Vec::with_capacity(self.glyphs.len());
        let mut font_bbox: Option<Rect> = None;
        for (name, path) in &self.glyphs {
            let glyph = SimpleGlyph::from_bezpath(path)
                .unwrap_or_else(|e| panic!("bad test glyph '{name}': {e:?}"));
            glyf_builder.add_glyph(&glyph).unwrap();
            let side_bearing = if path.elements().is_empty() {
                0
            } else {
                let bbox = path.bounding_box();
                font_bbox = Some(font_bbox.map_or(bbox, |b| b.union(bbox)));
                bbox.x0 as i16
            };
            h_metrics.push(LongMetric {
                advance: ADVANCE,
                side_bearing,
            });
        }
        let (glyf, loca, loca_format) = glyf_builder.build();
        let bbox = font_bbox.unwrap_or_default();

        let head = Head {
            units_per_em: self.units_per_em,
            index_to_loc_format: if loca_format == LocaFormat::Long { 1 } else { 0 },
            x_min: bbox.x0 as i16,
            y_min: bbox.y0 as i16,
            x_max: bbox.x1 as i16,
            y_max: bbox.y1 as i16,
            ..Default::default()
        };
        let maxp = Maxp {
            num_glyphs: self.glyphs.len() as u16,
            ..Default::default()
        };
        let hhea = Hhea {
            ascender: FWord::new(800),
            descender: FWord::new(-200),
            advance_width_max: UfWord::new(ADVANCE),
            number_of_h_metrics: self.glyphs.len() as u16,
            ..Default::default()
        };
        let hmtx = Hmtx {
            h_metrics,
            left_side_bearings: Vec::new(),
        };
        let post = Post::new_v2(self.glyphs.iter().map(|(n, _)| n.as_str()));

        let mut builder = FontBuilder::new();
        builder
            .add_table(&head)
            .unwrap()
            .add_table(&maxp)
            .unwrap()
            .add_table(&hhea)
            .unwrap()
            .add_table(&hmtx)
            .unwrap()
            .add_table(&post)
            .unwrap()
            .add_table(&glyf)
            .unwrap()
            .add_table(&loca)
            .unwrap();
        for (tag, data) in &self.tables {
            builder.add_raw(*tag, data.clone());
        }
        builder.build()
    }
}

/// An axis-aligned rectangle, wound counter-clockwise.
pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
    let mut path = BezPath::new();
    path.move_to((x0, y0));
    path.line_to((x1, y0));
    path.line_to((x1, y1));
    path.line_to((x0, y1));
    path.close_path();
    path
}

pub fn triangle() -> BezPath {
    let mut path = BezPath::new();
    path.move_to((100., 0.));
    path.line_to((500., 0.));
    path.line_to((300., 600.));
    path.close_path();
    path
}

/// A closed shape with a quadratic curve.
pub fn bowl() -> BezPath {
    let mut path = BezPath::new();
    path.move_to((100., 100.));
    path.line_to((500., 100.));
    path.quad_to((300., 500.), (100., 100.));
    path.close_path();
    path
}

/// `.notdef`, `A` (square), `B` (triangle), `a` (small square) and `space`.
pub fn simple_font() -> Vec<u8> {
    simple_font_builder().build()
}

pub fn simple_font_builder() -> TestFont {
    TestFont::new()
        .glyph("A", rect(100., 0., 500., 700.))
        .glyph("B", triangle())
        .glyph("a", rect(100., 0., 400., 400.))
        .glyph("space", BezPath::new())
}

/// A second layer for [`simple_font`]: `.notdef`, `A` (bowl), `C`, `space`.
pub fn layer_font() -> Vec<u8> {
    TestFont::new()
        .glyph("A", bowl())
        .glyph("C", rect(0., 0., 200., 200.))
        .glyph("space", BezPath::new())
        .build()
}
