mod color;
mod compositor;
pub mod scene;

pub use color::Color;
pub use compositor::Compositor;
pub use scene::{AvatarScene, DrawContext, DrawPrimitive, Layer, LineCap, Paint, Point, Primitive, Rect, Stroke};
