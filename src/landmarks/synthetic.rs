use super::topology::*;
use super::types::{FaceObservation, FramePayload, Landmark, Topology};
use super::LandmarkSource;
use crate::error::FrameResult;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const GOLDEN_ANGLE: f32 = 2.399_963;

/// Builds a full-topology landmark set around a canonical neutral face.
///
/// The defaults classify as an oval face with medium features, normal eye
/// spacing and a closed, non-smiling mouth at 640x480. Setters override the
/// anatomical points the classifier reads; every other point is spread inside
/// the face so the bounding box stays defined by the boundary landmarks.
#[derive(Debug, Clone)]
pub struct FaceBuilder {
    points: Vec<Landmark>,
    topology: Topology,
    frame_width: u32,
    frame_height: u32,
}

impl FaceBuilder {
    pub fn new(topology: Topology) -> Self {
        let n = topology.point_count();
        let points = (0..n)
            .map(|i| {
                let angle = i as f32 * GOLDEN_ANGLE;
                let r = ((i as f32 + 0.5) / n as f32).sqrt() * 0.8;
                Landmark::new(0.5 + r * 0.10 * angle.cos(), 0.5 + r * 0.15 * angle.sin(), 0.0)
            })
            .collect();

        Self {
            points,
            topology,
            frame_width: 640,
            frame_height: 480,
        }
        .face_bounds(0.38, 0.62, 0.32, 0.68)
        .jaw(0.40, 0.60)
        .eyes(0.438, 0.47, 0.53, 0.562)
        .at(NOSE_TIP, 0.5, 0.55)
        .nostrils(0.475, 0.525)
        .mouth(0.475, 0.525, 0.605, 0.60)
        .at(LOWER_LIP_CENTER, 0.5, 0.61)
        .brows(0.42, 0.43)
    }

    pub fn frame(mut self, width: u32, height: u32) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self
    }

    /// Place one landmark, keeping its depth.
    pub fn at(mut self, index: usize, x: f32, y: f32) -> Self {
        let z = self.points[index].z;
        self.points[index] = Landmark::new(x, y, z);
        self
    }

    pub fn face_bounds(self, left: f32, right: f32, top: f32, chin: f32) -> Self {
        self.at(FACE_LEFT, left, 0.5)
            .at(FACE_RIGHT, right, 0.5)
            .at(FOREHEAD_TOP, 0.5, top)
            .at(CHIN, 0.5, chin)
    }

    pub fn jaw(self, left: f32, right: f32) -> Self {
        self.at(JAW_LEFT, left, 0.62).at(JAW_RIGHT, right, 0.62)
    }

    /// Horizontal eye corners, left to right across the frame.
    pub fn eyes(self, left_outer: f32, left_inner: f32, right_inner: f32, right_outer: f32) -> Self {
        self.at(LEFT_EYE_OUTER, left_outer, 0.45)
            .at(LEFT_EYE_INNER, left_inner, 0.45)
            .at(RIGHT_EYE_INNER, right_inner, 0.45)
            .at(RIGHT_EYE_OUTER, right_outer, 0.45)
    }

    pub fn nostrils(self, left: f32, right: f32) -> Self {
        self.at(NOSTRIL_LEFT, left, 0.56).at(NOSTRIL_RIGHT, right, 0.56)
    }

    /// Mouth corners at `corner_y` and the upper lip centre at `center_y`.
    pub fn mouth(self, left: f32, right: f32, corner_y: f32, center_y: f32) -> Self {
        self.at(MOUTH_LEFT, left, corner_y)
            .at(MOUTH_RIGHT, right, corner_y)
            .at(UPPER_LIP_CENTER, 0.5, center_y)
    }

    /// Vertical brow landmarks; the span between them drives thickness.
    pub fn brows(self, outer_y: f32, inner_y: f32) -> Self {
        self.at(LEFT_BROW_OUTER, 0.43, outer_y)
            .at(LEFT_BROW_INNER, 0.46, inner_y)
            .at(RIGHT_BROW_OUTER, 0.57, outer_y)
            .at(RIGHT_BROW_INNER, 0.54, inner_y)
    }

    pub fn offset(mut self, dx: f32, dy: f32) -> Self {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
        self
    }

    /// Uniform per-coordinate noise of at most `amount` normalized units.
    pub fn jitter<R: Rng>(mut self, rng: &mut R, amount: f32) -> Self {
        if amount <= 0.0 {
            return self;
        }
        for p in &mut self.points {
            p.x += rng.gen_range(-amount..=amount);
            p.y += rng.gen_range(-amount..=amount);
            p.z += rng.gen_range(-amount..=amount);
        }
        self
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.points
    }

    pub fn payload(self) -> FramePayload {
        FramePayload::Present {
            landmarks: self.points,
            frame_width: self.frame_width,
            frame_height: self.frame_height,
        }
    }

    pub fn build(self) -> FrameResult<FaceObservation> {
        FaceObservation::new(self.points, self.frame_width, self.frame_height, self.topology)
    }
}

/// Generates a swaying, jittered face for running without a detector
pub struct SyntheticSource {
    rng: StdRng,
    face: FaceBuilder,
    jitter: f32,
    dropout_every: u32,
    dropout_len: u32,
    max_frames: Option<u64>,
    frame_index: u64,
}

impl SyntheticSource {
    pub fn new(topology: Topology, width: u32, height: u32, seed: u64) -> Self {
        tracing::info!("Synthetic landmark source at {}x{} (seed {})", width, height, seed);

        Self {
            rng: StdRng::seed_from_u64(seed),
            face: FaceBuilder::new(topology).frame(width, height),
            jitter: 0.0,
            dropout_every: 0,
            dropout_len: 0,
            max_frames: None,
            frame_index: 0,
        }
    }

    pub fn with_jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter;
        self
    }

    /// Emit `len` absent frames at the end of every `every`-frame cycle.
    pub fn with_dropouts(mut self, every: u32, len: u32) -> Self {
        self.dropout_every = every;
        self.dropout_len = len.min(every);
        self
    }

    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    fn in_dropout(&self) -> bool {
        if self.dropout_every == 0 || self.dropout_len == 0 {
            return false;
        }
        let every = self.dropout_every as u64;
        self.frame_index % every >= every - self.dropout_len as u64
    }
}

impl LandmarkSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<FramePayload>> {
        if self.max_frames.is_some_and(|max| self.frame_index >= max) {
            return Ok(None);
        }

        let payload = if self.in_dropout() {
            FramePayload::Absent
        } else {
            let t = self.frame_index as f32;
            let dx = 0.05 * (t * 0.03).sin();
            let dy = 0.02 * (t * 0.05).sin();
            self.face
                .clone()
                .offset(dx, dy)
                .jitter(&mut self.rng, self.jitter)
                .payload()
        };

        self.frame_index += 1;
        Ok(Some(payload))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.face.frame_width, self.face.frame_height)
    }
}
