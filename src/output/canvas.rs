use super::font;
use super::RenderSurface;
use crate::avatar::{Color, DrawContext, LineCap, Paint, Point, Rect, Stroke};
use image::{Rgb, RgbImage};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Segments used to flatten a full turn of a curve for stroking.
const CURVE_SEGMENTS: f32 = 96.0;

/// Software render surface backed by an RGB image
///
/// Shapes are point-sampled at pixel centres and alpha-blended over the
/// existing contents; there is no anti-aliasing.
pub struct RasterCanvas {
    image: Option<RgbImage>,
    width: u32,
    height: u32,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        tracing::debug!("Allocating {}x{} raster canvas", width, height);
        let image = (width > 0 && height > 0).then(|| RgbImage::new(width, height));
        Self {
            image,
            width,
            height,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let image = self.image.as_ref()?;
        (x < self.width && y < self.height).then(|| image.get_pixel(x, y).0)
    }

    fn blend(image: &mut RgbImage, x: u32, y: u32, color: Color) {
        let pixel = image.get_pixel_mut(x, y);
        *pixel = Rgb(color.over(pixel.0));
    }

    /// Blend `color` into every pixel in the box whose centre satisfies `inside`.
    fn fill_where<F>(&mut self, min: Point, max: Point, color: Color, inside: F)
    where
        F: Fn(f32, f32) -> bool,
    {
        let Some(image) = self.image.as_mut() else {
            return;
        };
        if color.a == 0 {
            return;
        }

        // Float to int casts saturate, so off-canvas boxes collapse to empty ranges
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil() as u32).min(self.width);
        let y1 = (max.y.ceil() as u32).min(self.height);

        for y in y0..y1 {
            for x in x0..x1 {
                if inside(x as f32 + 0.5, y as f32 + 0.5) {
                    Self::blend(image, x, y, color);
                }
            }
        }
    }

    fn stroke_polyline(&mut self, points: &[Point], closed: bool, stroke: &Stroke) {
        if points.len() < 2 || stroke.width <= 0.0 {
            return;
        }

        let mut segments: Vec<(Point, Point)> = points.windows(2).map(|w| (w[0], w[1])).collect();
        if closed {
            segments.push((points[points.len() - 1], points[0]));
        }

        let half = stroke.width / 2.0;
        let (min, max) = bounds(points, half);
        let butt = stroke.cap == LineCap::Butt && !closed;
        let last = segments.len() - 1;

        self.fill_where(min, max, stroke.color, |x, y| {
            let mut best = f32::MAX;
            let mut beyond_end = false;
            for (i, (a, b)) in segments.iter().enumerate() {
                let (d, t) = segment_distance(*a, *b, x, y);
                if d < best {
                    best = d;
                    beyond_end = (i == 0 && t < 0.0) || (i == last && t > 1.0);
                }
            }
            best <= half && !(butt && beyond_end)
        });
    }
}

fn bounds(points: &[Point], pad: f32) -> (Point, Point) {
    let (min, max) = points.iter().fold(
        (Point::new(f32::MAX, f32::MAX), Point::new(f32::MIN, f32::MIN)),
        |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        },
    );
    (
        Point::new(min.x - pad, min.y - pad),
        Point::new(max.x + pad, max.y + pad),
    )
}

/// Distance from (x, y) to segment ab, plus the unclamped projection parameter.
fn segment_distance(a: Point, b: Point, x: f32, y: f32) -> (f32, f32) {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        ((x - a.x) * dx + (y - a.y) * dy) / len2
    } else {
        0.0
    };
    let tc = t.clamp(0.0, 1.0);
    let (cx, cy) = (a.x + tc * dx, a.y + tc * dy);
    (((x - cx).powi(2) + (y - cy).powi(2)).sqrt(), t)
}

fn ellipse_point(center: Point, rx: f32, ry: f32, angle: f32) -> Point {
    Point::new(center.x + rx * angle.cos(), center.y + ry * angle.sin())
}

fn arc_points(center: Point, rx: f32, ry: f32, start: f32, end: f32) -> Vec<Point> {
    let sweep = end - start;
    let n = ((sweep.abs() / TAU) * CURVE_SEGMENTS).ceil().max(2.0) as usize;
    (0..=n)
        .map(|i| ellipse_point(center, rx, ry, start + sweep * i as f32 / n as f32))
        .collect()
}

fn is_full_turn(start: f32, end: f32) -> bool {
    (end - start).abs() >= TAU - 1e-4
}

impl DrawContext for RasterCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Color) {
        if let Some(image) = self.image.as_mut() {
            for pixel in image.pixels_mut() {
                *pixel = Rgb([color.r, color.g, color.b]);
            }
        }
    }

    fn fill_gradient(&mut self, rect: Rect, top: Color, bottom: Color) {
        if rect.height <= 0.0 {
            return;
        }
        let y0 = rect.y.floor().max(0.0) as u32;
        let y1 = ((rect.y + rect.height).ceil() as u32).min(self.height);
        for y in y0..y1 {
            let t = (y as f32 + 0.5 - rect.y) / rect.height;
            let color = top.lerp(bottom, t);
            self.fill_where(
                Point::new(rect.x, y as f32),
                Point::new(rect.x + rect.width, y as f32 + 1.0),
                color,
                |_, _| true,
            );
        }
    }

    fn circle(&mut self, center: Point, radius: f32, paint: &Paint) {
        if radius <= 0.0 {
            return;
        }
        match paint {
            Paint::Fill(color) => {
                let r2 = radius * radius;
                self.fill_where(
                    Point::new(center.x - radius, center.y - radius),
                    Point::new(center.x + radius, center.y + radius),
                    *color,
                    |x, y| (x - center.x).powi(2) + (y - center.y).powi(2) <= r2,
                );
            }
            Paint::Stroke(stroke) => {
                let points = arc_points(center, radius, radius, 0.0, TAU);
                self.stroke_polyline(&points, true, stroke);
            }
        }
    }

    fn ellipse(
        &mut self,
        center: Point,
        radius_x: f32,
        radius_y: f32,
        start_angle: f32,
        end_angle: f32,
        paint: &Paint,
    ) {
        if radius_x <= 0.0 || radius_y <= 0.0 {
            return;
        }
        let full = is_full_turn(start_angle, end_angle);

        match paint {
            Paint::Fill(color) => {
                // Partial fills are closed by the chord; keep the side holding the arc midpoint
                let a = ellipse_point(center, radius_x, radius_y, start_angle);
                let b = ellipse_point(center, radius_x, radius_y, end_angle);
                let mid = ellipse_point(center, radius_x, radius_y, (start_angle + end_angle) / 2.0);
                let side = |x: f32, y: f32| (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x);
                let arc_side = side(mid.x, mid.y);

                self.fill_where(
                    Point::new(center.x - radius_x, center.y - radius_y),
                    Point::new(center.x + radius_x, center.y + radius_y),
                    *color,
                    |x, y| {
                        let e = ((x - center.x) / radius_x).powi(2) + ((y - center.y) / radius_y).powi(2);
                        e <= 1.0 && (full || side(x, y) * arc_side >= 0.0)
                    },
                );
            }
            Paint::Stroke(stroke) => {
                let points = arc_points(center, radius_x, radius_y, start_angle, end_angle);
                self.stroke_polyline(&points, full, stroke);
            }
        }
    }

    fn rounded_rect(&mut self, rect: Rect, corner_radius: f32, paint: &Paint) {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let cr = corner_radius.clamp(0.0, rect.width.min(rect.height) / 2.0);
        let (left, top) = (rect.x + cr, rect.y + cr);
        let (right, bottom) = (rect.x + rect.width - cr, rect.y + rect.height - cr);

        match paint {
            Paint::Fill(color) => {
                self.fill_where(
                    Point::new(rect.x, rect.y),
                    Point::new(rect.x + rect.width, rect.y + rect.height),
                    *color,
                    |x, y| {
                        // Distance to the rectangle shrunk by the corner radius
                        let dx = x - x.clamp(left, right);
                        let dy = y - y.clamp(top, bottom);
                        dx * dx + dy * dy <= cr * cr
                    },
                );
            }
            Paint::Stroke(stroke) => {
                let mut points = Vec::new();
                for (cx, cy, start) in [
                    (left, top, PI),
                    (right, top, PI + FRAC_PI_2),
                    (right, bottom, 0.0),
                    (left, bottom, FRAC_PI_2),
                ] {
                    points.extend(arc_points(Point::new(cx, cy), cr, cr, start, start + FRAC_PI_2));
                }
                self.stroke_polyline(&points, true, stroke);
            }
        }
    }

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        self.stroke_polyline(&[from, to], false, stroke);
    }

    fn arc(&mut self, center: Point, radius: f32, start_angle: f32, end_angle: f32, stroke: &Stroke) {
        if radius <= 0.0 {
            return;
        }
        let points = arc_points(center, radius, radius, start_angle, end_angle);
        self.stroke_polyline(&points, is_full_turn(start_angle, end_angle), stroke);
    }

    fn text(&mut self, anchor: Point, content: &str, size: f32, color: Color) {
        let Some(image) = self.image.as_mut() else {
            return;
        };
        let scale = font::scale_for(size);
        let (w, h) = font::text_extent(content, scale);
        let origin_x = (anchor.x - w as f32 / 2.0).round() as i64;
        let origin_y = (anchor.y - h as f32 / 2.0).round() as i64;
        let advance = ((font::GLYPH_WIDTH + 1) * scale) as i64;

        for (i, c) in content.chars().enumerate() {
            let glyph_x = origin_x + i as i64 * advance;
            for (px, py) in font::glyph_pixels(c, scale) {
                let (x, y) = (glyph_x + px as i64, origin_y + py as i64);
                if x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64 {
                    Self::blend(image, x as u32, y as u32, color);
                }
            }
        }
    }
}

impl RenderSurface for RasterCanvas {
    fn context(&mut self) -> Option<&mut dyn DrawContext> {
        if self.image.is_some() {
            Some(self)
        } else {
            None
        }
    }

    fn frame(&self) -> Option<&RgbImage> {
        self.image.as_ref()
    }

    fn release(&mut self) {
        if self.image.take().is_some() {
            tracing::debug!("Raster canvas released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);

    fn canvas() -> RasterCanvas {
        let mut canvas = RasterCanvas::new(100, 100);
        canvas.clear(Color::WHITE);
        canvas
    }

    fn is_red(canvas: &RasterCanvas, x: u32, y: u32) -> bool {
        canvas.pixel(x, y) == Some([255, 0, 0])
    }

    #[test]
    fn filled_circle() {
        let mut c = canvas();
        c.circle(Point::new(50.0, 50.0), 10.0, &Paint::Fill(RED));
        assert!(is_red(&c, 50, 50));
        assert!(is_red(&c, 58, 50));
        assert!(!is_red(&c, 62, 50));
        assert!(!is_red(&c, 58, 58));
    }

    #[test]
    fn upper_half_ellipse_is_closed_by_its_chord() {
        let mut c = canvas();
        c.ellipse(Point::new(50.0, 50.0), 20.0, 20.0, PI, TAU, &Paint::Fill(RED));
        assert!(is_red(&c, 50, 40));
        assert!(!is_red(&c, 50, 55));
    }

    #[test]
    fn rounded_rect_cuts_corners() {
        let mut c = canvas();
        c.rounded_rect(Rect::new(20.0, 20.0, 60.0, 60.0), 12.0, &Paint::Fill(RED));
        assert!(is_red(&c, 50, 50));
        assert!(is_red(&c, 21, 50));
        assert!(!is_red(&c, 20, 20));
        assert!(!is_red(&c, 10, 50));
    }

    #[test]
    fn line_caps() {
        let round = Stroke {
            color: RED,
            width: 6.0,
            cap: LineCap::Round,
        };
        let butt = Stroke {
            cap: LineCap::Butt,
            ..round
        };

        let mut c = canvas();
        c.line(Point::new(20.0, 50.0), Point::new(80.0, 50.0), &round);
        assert!(is_red(&c, 50, 50));
        assert!(is_red(&c, 18, 50));
        assert!(!is_red(&c, 50, 55));

        let mut c = canvas();
        c.line(Point::new(20.0, 50.0), Point::new(80.0, 50.0), &butt);
        assert!(is_red(&c, 50, 50));
        assert!(!is_red(&c, 18, 50));
    }

    #[test]
    fn stroked_arc_leaves_the_inside_empty() {
        let mut c = canvas();
        let stroke = Stroke {
            color: RED,
            width: 3.0,
            cap: LineCap::Round,
        };
        c.arc(Point::new(50.0, 50.0), 20.0, 0.2, PI - 0.2, &stroke);
        assert!(is_red(&c, 50, 70));
        assert!(!is_red(&c, 50, 50));
        assert!(!is_red(&c, 50, 30));
    }

    #[test]
    fn gradient_runs_top_to_bottom() {
        let mut c = canvas();
        c.fill_gradient(Rect::new(0.0, 0.0, 100.0, 100.0), Color::BLACK, Color::WHITE);
        let top = c.pixel(10, 0).unwrap();
        let bottom = c.pixel(10, 99).unwrap();
        assert!(top[0] < 5);
        assert!(bottom[0] > 250);
    }

    #[test]
    fn translucent_fill_blends() {
        let mut c = canvas();
        c.circle(Point::new(50.0, 50.0), 10.0, &Paint::Fill(Color::BLACK.with_alpha(0x88)));
        let [r, g, b] = c.pixel(50, 50).unwrap();
        assert!(r > 100 && r < 140);
        assert_eq!((r, g), (g, b));
    }

    #[test]
    fn text_is_centred_on_anchor() {
        let mut c = canvas();
        c.text(Point::new(50.0, 50.0), "I", 6.0, RED);
        // 'I' at scale 1 is three columns wide around x=50, five rows tall around y=50
        assert!(is_red(&c, 50, 48));
        assert!(!is_red(&c, 40, 50));
    }

    #[test]
    fn released_canvas_offers_no_context() {
        let mut c = canvas();
        assert!(c.context().is_some());
        c.release();
        assert!(c.context().is_none());
        assert!(c.frame().is_none());

        let mut empty = RasterCanvas::new(0, 10);
        assert!(empty.context().is_none());
    }
}
