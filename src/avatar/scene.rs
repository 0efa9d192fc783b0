use super::color::Color;
use serde::Serialize;

/// Avatar layers, back to front. Primitives in a scene never go backwards
/// through this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Background,
    HairBack,
    Face,
    Nose,
    Mouth,
    FacialHair,
    Eyes,
    Eyebrows,
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCap {
    Butt,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    pub cap: LineCap,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Paint {
    Fill(Color),
    Stroke(Stroke),
}

impl Paint {
    pub fn color(&self) -> Color {
        match self {
            Paint::Fill(color) => *color,
            Paint::Stroke(stroke) => stroke.color,
        }
    }
}

/// Angles follow canvas convention: radians, clockwise from +x with y down.
/// A partial ellipse fill is closed by the chord between its end points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Gradient {
        rect: Rect,
        top: Color,
        bottom: Color,
    },
    Circle {
        center: Point,
        radius: f32,
        paint: Paint,
    },
    Ellipse {
        center: Point,
        radius_x: f32,
        radius_y: f32,
        start_angle: f32,
        end_angle: f32,
        paint: Paint,
    },
    RoundedRect {
        rect: Rect,
        corner_radius: f32,
        paint: Paint,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Arc {
        center: Point,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        stroke: Stroke,
    },
    Text {
        anchor: Point,
        content: String,
        size: f32,
        color: Color,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawPrimitive {
    pub layer: Layer,
    pub primitive: Primitive,
}

/// Drawing capability offered by a render surface.
///
/// Coordinates are canvas pixels. Text is anchored at its centre.
pub trait DrawContext {
    fn size(&self) -> (u32, u32);

    fn clear(&mut self, color: Color);

    fn fill_gradient(&mut self, rect: Rect, top: Color, bottom: Color);

    fn circle(&mut self, center: Point, radius: f32, paint: &Paint);

    fn ellipse(
        &mut self,
        center: Point,
        radius_x: f32,
        radius_y: f32,
        start_angle: f32,
        end_angle: f32,
        paint: &Paint,
    );

    fn rounded_rect(&mut self, rect: Rect, corner_radius: f32, paint: &Paint);

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke);

    fn arc(&mut self, center: Point, radius: f32, start_angle: f32, end_angle: f32, stroke: &Stroke);

    fn text(&mut self, anchor: Point, content: &str, size: f32, color: Color);
}

/// One frame's ordered draw list. Index order is z-order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AvatarScene {
    primitives: Vec<DrawPrimitive>,
    prompt: bool,
}

impl AvatarScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn prompt() -> Self {
        Self {
            primitives: Vec::new(),
            prompt: true,
        }
    }

    pub fn push(&mut self, layer: Layer, primitive: Primitive) {
        self.primitives.push(DrawPrimitive { layer, primitive });
    }

    pub fn primitives(&self) -> &[DrawPrimitive] {
        &self.primitives
    }

    /// True for the "no face" scene.
    pub fn is_prompt(&self) -> bool {
        self.prompt
    }

    /// Z-order indices (first, last) of a layer's primitives.
    pub fn layer_span(&self, layer: Layer) -> Option<(usize, usize)> {
        let first = self.primitives.iter().position(|p| p.layer == layer)?;
        let last = self.primitives.iter().rposition(|p| p.layer == layer)?;
        Some((first, last))
    }

    pub fn layers(&self) -> impl Iterator<Item = Layer> + '_ {
        self.primitives.iter().map(|p| p.layer)
    }

    pub fn is_layer_ordered(&self) -> bool {
        self.primitives.windows(2).all(|w| w[0].layer <= w[1].layer)
    }

    pub fn render(&self, ctx: &mut dyn DrawContext) {
        let _span = tracing::debug_span!("render", primitives = self.primitives.len()).entered();

        ctx.clear(Color::WHITE);
        for p in &self.primitives {
            match &p.primitive {
                Primitive::Gradient { rect, top, bottom } => ctx.fill_gradient(*rect, *top, *bottom),
                Primitive::Circle {
                    center,
                    radius,
                    paint,
                } => ctx.circle(*center, *radius, paint),
                Primitive::Ellipse {
                    center,
                    radius_x,
                    radius_y,
                    start_angle,
                    end_angle,
                    paint,
                } => ctx.ellipse(*center, *radius_x, *radius_y, *start_angle, *end_angle, paint),
                Primitive::RoundedRect {
                    rect,
                    corner_radius,
                    paint,
                } => ctx.rounded_rect(*rect, *corner_radius, paint),
                Primitive::Line { from, to, stroke } => ctx.line(*from, *to, stroke),
                Primitive::Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                    stroke,
                } => ctx.arc(*center, *radius, *start_angle, *end_angle, stroke),
                Primitive::Text {
                    anchor,
                    content,
                    size,
                    color,
                } => ctx.text(*anchor, content, *size, *color),
            }
        }
    }
}
