mod canvas;
pub mod font;
mod loopback;
mod png;

pub use canvas::RasterCanvas;
pub use loopback::V4L2Output;
pub use png::PngSequenceOutput;

use crate::avatar::DrawContext;
use anyhow::Result;
use image::RgbImage;

/// A drawing target owned by the host
pub trait RenderSurface {
    /// Borrow the drawing context for this frame
    ///
    /// Returns `None` when no context can be acquired (released or zero-sized
    /// surface); callers skip rendering for that frame.
    fn context(&mut self) -> Option<&mut dyn DrawContext>;

    /// The most recently rendered frame, if the surface is rasterized
    fn frame(&self) -> Option<&RgbImage> {
        None
    }

    /// Drop the underlying context; later `context()` calls return `None`
    fn release(&mut self);
}

/// Trait for output destinations
pub trait OutputSink {
    /// Write a frame to the output
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Get the expected output resolution
    fn resolution(&self) -> (u32, u32);
}
