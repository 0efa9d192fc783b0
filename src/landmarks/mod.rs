mod replay;
mod synthetic;
pub mod topology;
pub mod types;

pub use replay::ReplaySource;
pub use synthetic::{FaceBuilder, SyntheticSource};
pub use types::{FaceObservation, FramePayload, Landmark, Topology};

use anyhow::Result;

/// Trait for per-frame landmark producers
pub trait LandmarkSource {
    /// Fetch the next frame's payload
    ///
    /// Returns `Ok(None)` once the stream has ended.
    fn next_frame(&mut self) -> Result<Option<FramePayload>>;

    /// Get the pixel dimensions of the frames the detector runs on
    fn resolution(&self) -> (u32, u32);
}
