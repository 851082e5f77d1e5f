//! A pen producing compact SVG path data from glyph outlines

use std::fmt::{self, Write};

use skrifa::outline::OutlinePen;

/// Formats a coordinate: whole numbers without a fractional part, and never
/// a negative zero.
#[derive(Clone, Copy)]
struct Coord(f32);

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < i64::MAX as f32 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Pen that writes SVG path data in the SVG coordinate system.
///
/// The y axis is flipped, so font units map to SVG user units with the
/// baseline at y = 0. Commands are not separated, lines that do not move are
/// dropped, and horizontal or vertical lines use `H` and `V`.
#[derive(Clone, Debug, Default)]
pub struct SvgPathPen {
    data: String,
    current: Option<(f32, f32)>,
}

impl SvgPathPen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_path_data(self) -> String {
        self.data
    }
}

impl OutlinePen for SvgPathPen {
    fn move_to(&mut self, x: f32, y: f32) {
        let y = -y;
        let _ = write!(self.data, "M{} {}", Coord(x), Coord(y));
        self.current = Some((x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let y = -y;
        let _ = match self.current {
            Some(current) if current == (x, y) => return,
            Some((cx, _)) if cx == x => write!(self.data, "V{}", Coord(y)),
            Some((_, cy)) if cy == y => write!(self.data, "H{}", Coord(x)),
            _ => write!(self.data, "L{} {}", Coord(x), Coord(y)),
        };
        self.current = Some((x, y));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        let y = -y;
        let _ = write!(
            self.data,
            "Q{} {} {} {}",
            Coord(cx0),
            Coord(-cy0),
            Coord(x),
            Coord(y)
        );
        self.current = Some((x, y));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let y = -y;
        let _ = write!(
            self.data,
            "C{} {} {} {} {} {}",
            Coord(cx0),
            Coord(-cy0),
            Coord(cx1),
            Coord(-cy1),
            Coord(x),
            Coord(y)
        );
        self.current = Some((x, y));
    }

    fn close(&mut self) {
        self.data.push('Z');
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_shortened() {
        let mut pen = SvgPathPen::new();
        pen.move_to(100.0, 0.0);
        pen.line_to(500.0, 0.0);
        pen.line_to(500.0, 700.0);
        pen.line_to(500.0, 700.0);
        pen.line_to(100.0, 600.0);
        pen.close();
        assert_eq!(pen.into_path_data(), "M100 0H500V-700L100 -600Z");
    }

    #[test]
    fn curves() {
        let mut pen = SvgPathPen::new();
        pen.move_to(0.0, 0.0);
        pen.quad_to(50.0, 100.0, 100.0, 0.0);
        pen.curve_to(120.0, -10.0, 130.5, 20.0, 0.0, 0.0);
        pen.close();
        assert_eq!(
            pen.into_path_data(),
            "M0 0Q50 -100 100 0C120 10 130.5 -20 0 0Z"
        );
    }

    #[test]
    fn negative_zero() {
        assert_eq!(Coord(-0.0).to_string(), "0");
        assert_eq!(Coord(-2.5).to_string(), "-2.5");
        assert_eq!(Coord(12.0).to_string(), "12");
    }

    #[test]
    fn empty() {
        assert!(SvgPathPen::new().is_empty());
    }
}
