use crate::error::{FrameError, FrameResult};
use serde::{Deserialize, Serialize};

/// A single landmark in normalized frame space.
///
/// `x` and `y` are in [0, 1] relative to the frame width/height. `z` is a
/// relative depth where more negative means closer to the camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Point ordering emitted by the landmark detector.
///
/// Both variants share the same index meaning for the first 468 points;
/// the refined mesh appends iris points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    FaceMesh,
    #[default]
    FaceMeshRefined,
}

impl Topology {
    pub const fn point_count(self) -> usize {
        match self {
            Topology::FaceMesh => 468,
            Topology::FaceMeshRefined => 478,
        }
    }
}

/// Raw per-frame payload as delivered by a landmark source.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload {
    Absent,
    Present {
        landmarks: Vec<Landmark>,
        frame_width: u32,
        frame_height: u32,
    },
}

impl FramePayload {
    pub fn is_present(&self) -> bool {
        matches!(self, FramePayload::Present { .. })
    }
}

/// One validated frame of landmarks.
///
/// Construction is the only place the topology is checked; downstream code
/// indexes landmarks freely.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceObservation {
    landmarks: Vec<Landmark>,
    frame_width: u32,
    frame_height: u32,
}

impl FaceObservation {
    pub fn new(
        landmarks: Vec<Landmark>,
        frame_width: u32,
        frame_height: u32,
        topology: Topology,
    ) -> FrameResult<Self> {
        if landmarks.len() != topology.point_count() {
            return Err(FrameError::InvalidObservation {
                expected: topology.point_count(),
                actual: landmarks.len(),
            });
        }
        if frame_width == 0 || frame_height == 0 {
            return Err(FrameError::DegenerateGeometry("zero frame dimension"));
        }
        if !landmarks.iter().all(Landmark::is_finite) {
            return Err(FrameError::DegenerateGeometry("non-finite landmark"));
        }

        Ok(Self {
            landmarks,
            frame_width,
            frame_height,
        })
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn landmark(&self, index: usize) -> Landmark {
        self.landmarks[index]
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    /// Landmark position scaled to the given pixel dimensions.
    pub fn scaled(&self, index: usize, width: f32, height: f32) -> (f32, f32) {
        let l = self.landmarks[index];
        (l.x * width, l.y * height)
    }

    /// Min/max extents of all landmarks in normalized units:
    /// `(min_x, min_y, max_x, max_y)`.
    pub fn extents(&self) -> (f32, f32, f32, f32) {
        self.landmarks.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(min_x, min_y, max_x, max_y), l| {
                (min_x.min(l.x), min_y.min(l.y), max_x.max(l.x), max_y.max(l.y))
            },
        )
    }
}
