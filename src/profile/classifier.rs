use super::types::{BrowThickness, EyeDistance, FaceShape, FeatureSize, GeometricAttributes};
use crate::error::{FrameError, FrameResult};
use crate::landmarks::topology::*;
use crate::landmarks::FaceObservation;

/// Corner-above-centre margin for smile detection, in normalized units.
/// Not scaled by face size.
pub const SMILE_EPSILON: f32 = 0.005;

/// Brow span thresholds in absolute pixels, so they depend on the frame
/// resolution.
pub const THICK_BROW_PX: f32 = 8.0;
pub const THIN_BROW_PX: f32 = 4.0;

/// Pixel-space measurements taken from one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceMeasurements {
    pub face_width: f32,
    pub face_height: f32,
    pub jaw_width: f32,
    pub avg_eye_width: f32,
    pub eye_distance: f32,
    pub nose_width: f32,
    pub mouth_width: f32,
    pub avg_brow_height: f32,
    pub smiling: bool,
}

impl FaceMeasurements {
    pub fn take(obs: &FaceObservation) -> FrameResult<Self> {
        let (w, h) = obs.frame_size();
        let (w, h) = (w as f32, h as f32);
        let dx = |a: usize, b: usize| (obs.landmark(a).x - obs.landmark(b).x).abs() * w;
        let dy = |a: usize, b: usize| (obs.landmark(a).y - obs.landmark(b).y).abs() * h;

        let face_width = dx(FACE_LEFT, FACE_RIGHT);
        if face_width <= f32::EPSILON {
            return Err(FrameError::DegenerateGeometry("zero face width"));
        }

        let corner_avg_y = (obs.landmark(MOUTH_LEFT).y + obs.landmark(MOUTH_RIGHT).y) / 2.0;
        let center_y = obs.landmark(UPPER_LIP_CENTER).y;

        Ok(Self {
            face_width,
            face_height: dy(FOREHEAD_TOP, CHIN),
            jaw_width: dx(JAW_LEFT, JAW_RIGHT),
            avg_eye_width: (dx(LEFT_EYE_OUTER, LEFT_EYE_INNER)
                + dx(RIGHT_EYE_INNER, RIGHT_EYE_OUTER))
                / 2.0,
            eye_distance: dx(LEFT_EYE_OUTER, RIGHT_EYE_INNER),
            nose_width: dx(NOSTRIL_LEFT, NOSTRIL_RIGHT),
            mouth_width: dx(MOUTH_LEFT, MOUTH_RIGHT),
            avg_brow_height: (dy(LEFT_BROW_OUTER, LEFT_BROW_INNER)
                + dy(RIGHT_BROW_OUTER, RIGHT_BROW_INNER))
                / 2.0,
            smiling: corner_avg_y < center_y - SMILE_EPSILON,
        })
    }

    pub fn face_ratio(&self) -> f32 {
        self.face_height / self.face_width
    }

    pub fn jaw_ratio(&self) -> f32 {
        self.jaw_width / self.face_width
    }
}

/// Classify one observation. Pure: no state, no randomness.
pub fn classify(obs: &FaceObservation) -> FrameResult<GeometricAttributes> {
    let _span = tracing::debug_span!("classify").entered();

    let m = FaceMeasurements::take(obs)?;
    let fw = m.face_width;

    Ok(GeometricAttributes {
        face_shape: face_shape(m.face_ratio(), m.jaw_ratio()),
        eye_size: three_step(m.avg_eye_width, 0.12 * fw, 0.15 * fw),
        eye_distance: if m.eye_distance > 0.45 * fw {
            EyeDistance::Wide
        } else if m.eye_distance < 0.35 * fw {
            EyeDistance::Close
        } else {
            EyeDistance::Normal
        },
        nose_size: three_step(m.nose_width, 0.18 * fw, 0.25 * fw),
        mouth_size: three_step(m.mouth_width, 0.18 * fw, 0.25 * fw),
        eyebrow_thickness: if m.avg_brow_height > THICK_BROW_PX {
            BrowThickness::Thick
        } else if m.avg_brow_height < THIN_BROW_PX {
            BrowThickness::Thin
        } else {
            BrowThickness::Medium
        },
        smiling: m.smiling,
    })
}

fn face_shape(face_ratio: f32, jaw_ratio: f32) -> FaceShape {
    if face_ratio > 1.3 {
        FaceShape::Long
    } else if face_ratio < 1.1 && jaw_ratio > 0.85 {
        FaceShape::Round
    } else if jaw_ratio > 0.9 {
        FaceShape::Square
    } else {
        FaceShape::Oval
    }
}

/// Large above `large`, small below `small`, medium otherwise.
fn three_step(value: f32, small: f32, large: f32) -> FeatureSize {
    if value > large {
        FeatureSize::Large
    } else if value < small {
        FeatureSize::Small
    } else {
        FeatureSize::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{FaceBuilder, Topology};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn face() -> FaceBuilder {
        FaceBuilder::new(Topology::FaceMeshRefined)
    }

    #[test]
    fn canonical_face_is_neutral_oval() {
        let attrs = classify(&face().build().unwrap()).unwrap();
        assert_eq!(
            attrs,
            GeometricAttributes {
                face_shape: FaceShape::Oval,
                eye_size: FeatureSize::Medium,
                eye_distance: EyeDistance::Normal,
                nose_size: FeatureSize::Medium,
                mouth_size: FeatureSize::Medium,
                eyebrow_thickness: BrowThickness::Medium,
                smiling: false,
            }
        );
    }

    #[test]
    fn face_ratio_boundary_is_strict() {
        // width = 0.5 * 1000 = 500 px; height = 0.5 * h
        let at = |h: u32| {
            face()
                .frame(1000, h)
                .face_bounds(0.25, 0.75, 0.25, 0.75)
                .jaw(0.375, 0.625)
                .build()
                .unwrap()
        };

        assert_ne!(classify(&at(1300)).unwrap().face_shape, FaceShape::Long);
        assert_eq!(classify(&at(1310)).unwrap().face_shape, FaceShape::Long);
    }

    #[test]
    fn round_and_square_faces() {
        // ratio 1.0, jaw 0.875
        let round = face()
            .frame(1000, 1000)
            .face_bounds(0.25, 0.75, 0.25, 0.75)
            .jaw(0.28125, 0.71875)
            .build()
            .unwrap();
        assert_eq!(classify(&round).unwrap().face_shape, FaceShape::Round);

        // ratio 1.2, jaw 0.9375
        let square = face()
            .frame(1000, 1200)
            .face_bounds(0.25, 0.75, 0.25, 0.75)
            .jaw(0.265625, 0.734375)
            .build()
            .unwrap();
        assert_eq!(classify(&square).unwrap().face_shape, FaceShape::Square);
    }

    #[test]
    fn long_face_scenario() {
        // faceWidth 200, faceHeight 280, jawWidth 150
        let obs = face()
            .frame(400, 560)
            .face_bounds(0.25, 0.75, 0.25, 0.75)
            .jaw(0.3125, 0.6875)
            .build()
            .unwrap();

        let m = FaceMeasurements::take(&obs).unwrap();
        assert_eq!(m.face_width, 200.0);
        assert_eq!(m.face_height, 280.0);
        assert_eq!(m.jaw_width, 150.0);
        assert_eq!(classify(&obs).unwrap().face_shape, FaceShape::Long);
    }

    #[test]
    fn small_wide_eyes_scenario() {
        // faceWidth 200; each eye 20 px (0.10 fw); outer-left to inner-right 100 px (0.50 fw)
        let obs = face()
            .frame(400, 560)
            .face_bounds(0.25, 0.75, 0.25, 0.75)
            .jaw(0.3125, 0.6875)
            .eyes(0.375, 0.425, 0.625, 0.675)
            .build()
            .unwrap();

        let attrs = classify(&obs).unwrap();
        assert_eq!(attrs.eye_size, FeatureSize::Small);
        assert_eq!(attrs.eye_distance, EyeDistance::Wide);
    }

    #[test]
    fn large_close_eyes() {
        // faceWidth 200; each eye 32 px (0.16 fw); outer-left to inner-right 40 px (0.20 fw)
        let obs = face()
            .frame(400, 560)
            .face_bounds(0.25, 0.75, 0.25, 0.75)
            .jaw(0.3125, 0.6875)
            .eyes(0.41, 0.49, 0.51, 0.59)
            .build()
            .unwrap();

        let attrs = classify(&obs).unwrap();
        assert_eq!(attrs.eye_size, FeatureSize::Large);
        assert_eq!(attrs.eye_distance, EyeDistance::Close);
    }

    #[test]
    fn medium_eyes_at_normal_spacing() {
        // Each eye 27 px (0.135 fw); span 80 px (0.40 fw)
        let obs = face()
            .frame(400, 560)
            .face_bounds(0.25, 0.75, 0.25, 0.75)
            .jaw(0.3125, 0.6875)
            .eyes(0.35, 0.4175, 0.55, 0.6175)
            .build()
            .unwrap();

        let attrs = classify(&obs).unwrap();
        assert_eq!(attrs.eye_size, FeatureSize::Medium);
        assert_eq!(attrs.eye_distance, EyeDistance::Normal);
    }

    #[test]
    fn smile_boundary_is_strict() {
        let center = 0.5_f32;
        let not_smiling = face()
            .mouth(0.475, 0.525, center - SMILE_EPSILON, center)
            .build()
            .unwrap();
        assert!(!classify(&not_smiling).unwrap().smiling);

        let smiling = face()
            .mouth(0.475, 0.525, center - 0.0051, center)
            .build()
            .unwrap();
        assert!(classify(&smiling).unwrap().smiling);
    }

    #[test]
    fn brow_thresholds_are_in_pixels() {
        // 0.02 * 480 = 9.6 px
        let thick = face().brows(0.41, 0.43).build().unwrap();
        assert_eq!(classify(&thick).unwrap().eyebrow_thickness, BrowThickness::Thick);

        // 0.005 * 480 = 2.4 px
        let thin = face().brows(0.425, 0.43).build().unwrap();
        assert_eq!(classify(&thin).unwrap().eyebrow_thickness, BrowThickness::Thin);

        // Same landmarks on a 4x taller frame cross into thick
        let hires = face().frame(2560, 1920).brows(0.425, 0.43).build().unwrap();
        assert_eq!(classify(&hires).unwrap().eyebrow_thickness, BrowThickness::Thick);
    }

    #[test]
    fn nose_and_mouth_sizes() {
        // face width 153.6 px; 0.1 * 640 = 64 px is large
        let large = face().nostrils(0.45, 0.55).mouth(0.45, 0.55, 0.605, 0.60).build().unwrap();
        let attrs = classify(&large).unwrap();
        assert_eq!(attrs.nose_size, FeatureSize::Large);
        assert_eq!(attrs.mouth_size, FeatureSize::Large);

        // 0.02 * 640 = 12.8 px is small
        let small = face().nostrils(0.49, 0.51).mouth(0.49, 0.51, 0.605, 0.60).build().unwrap();
        let attrs = classify(&small).unwrap();
        assert_eq!(attrs.nose_size, FeatureSize::Small);
        assert_eq!(attrs.mouth_size, FeatureSize::Small);
    }

    #[test]
    fn collapsed_face_is_rejected() {
        let obs = face().face_bounds(0.5, 0.5, 0.32, 0.68).build().unwrap();
        let err = classify(&obs).unwrap_err();
        assert!(err.is_invalid_observation());
    }

    proptest! {
        #[test]
        fn classification_is_deterministic(seed in any::<u64>(), jitter in 0.0f32..0.01) {
            let mut rng = StdRng::seed_from_u64(seed);
            let obs = face().jitter(&mut rng, jitter).build().unwrap();
            prop_assert_eq!(classify(&obs), classify(&obs.clone()));
        }
    }
}
