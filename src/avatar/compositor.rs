use super::color::Color;
use super::scene::{AvatarScene, Layer, LineCap, Paint, Point, Primitive, Rect, Stroke};
use crate::landmarks::topology::*;
use crate::landmarks::FaceObservation;
use crate::profile::{BrowThickness, FaceProfile, FaceShape, FeatureSize, HairStyle};
use std::f32::consts::{PI, TAU};

const BACKGROUND_TOP: Color = Color::rgb(0xFF, 0xE4, 0xE1);
const BACKGROUND_BOTTOM: Color = Color::rgb(0xE0, 0xE6, 0xFF);
const PROMPT_TEXT: Color = Color::rgb(0x66, 0x66, 0x66);
const PROMPT_MESSAGE: &str = "Step into view!";
const PROMPT_SIZE: f32 = 32.0;

const SHADING_ALPHA: u8 = 0x88;
const BROW_COLOR: Color = Color::rgb(0x2C, 0x18, 0x10);
const FACIAL_HAIR_COLOR: Color = Color::rgb(0x2C, 0x18, 0x10);
const NOSE_COLOR: Color = Color::rgb(0xD2, 0xB4, 0x8C);
const NOSTRIL_COLOR: Color = Color::rgb(0x8B, 0x73, 0x55);
const MOUTH_COLOR: Color = Color::rgb(0x8B, 0x00, 0x00);

const NOSTRIL_RADIUS: f32 = 2.0;
const SMILE_STROKE: f32 = 3.0;
const SMILE_INSET: f32 = 0.2;
const FACIAL_HAIR_DROP: f32 = 20.0;
const CURLS: usize = 8;

/// Face frame shared by every layer: live landmark positions in canvas
/// pixels plus the bounding-box centre and base radius.
struct FaceFrame<'a> {
    obs: &'a FaceObservation,
    width: f32,
    height: f32,
    center: Point,
    radius: f32,
}

impl<'a> FaceFrame<'a> {
    fn new(obs: &'a FaceObservation, width: f32, height: f32) -> Self {
        let (min_x, min_y, max_x, max_y) = obs.extents();
        let (min_x, max_x) = (min_x * width, max_x * width);
        let (min_y, max_y) = (min_y * height, max_y * height);

        Self {
            obs,
            width,
            height,
            center: Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0),
            radius: (max_x - min_x).max(max_y - min_y) * 0.6,
        }
    }

    fn at(&self, index: usize) -> Point {
        let (x, y) = self.obs.scaled(index, self.width, self.height);
        Point::new(x, y)
    }

    fn offset(&self, dx: f32, dy: f32) -> Point {
        Point::new(self.center.x + dx * self.radius, self.center.y + dy * self.radius)
    }
}

fn full_ellipse(center: Point, radius_x: f32, radius_y: f32, paint: Paint) -> Primitive {
    Primitive::Ellipse {
        center,
        radius_x,
        radius_y,
        start_angle: 0.0,
        end_angle: TAU,
        paint,
    }
}

fn disc(center: Point, radius: f32, color: Color) -> Primitive {
    Primitive::Circle {
        center,
        radius,
        paint: Paint::Fill(color),
    }
}

/// Builds avatar scenes for a canvas of fixed size.
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    width: u32,
    height: u32,
}

impl Compositor {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Full avatar for a present face. Layers are emitted strictly back to
    /// front: background, hair, face, nose, mouth, facial hair, eyes, brows.
    pub fn compose(&self, profile: &FaceProfile, obs: &FaceObservation) -> AvatarScene {
        let _span = tracing::debug_span!("compose").entered();

        let face = FaceFrame::new(obs, self.width as f32, self.height as f32);
        let mut scene = AvatarScene::new();

        self.background(&mut scene);
        hair(&mut scene, &face, profile);
        face_base(&mut scene, &face, profile);
        nose(&mut scene, &face, profile);
        mouth(&mut scene, &face, profile);
        if profile.appearance.facial_hair {
            facial_hair(&mut scene, &face);
        }
        eyes(&mut scene, &face, profile);
        eyebrows(&mut scene, &face, profile);

        scene
    }

    /// Background plus an instruction to step into view.
    pub fn prompt_scene(&self) -> AvatarScene {
        let mut scene = AvatarScene::prompt();
        self.background(&mut scene);
        scene.push(
            Layer::Message,
            Primitive::Text {
                anchor: Point::new(self.width as f32 / 2.0, self.height as f32 / 2.0),
                content: PROMPT_MESSAGE.to_string(),
                size: PROMPT_SIZE,
                color: PROMPT_TEXT,
            },
        );
        scene
    }

    fn background(&self, scene: &mut AvatarScene) {
        scene.push(
            Layer::Background,
            Primitive::Gradient {
                rect: Rect::new(0.0, 0.0, self.width as f32, self.height as f32),
                top: BACKGROUND_TOP,
                bottom: BACKGROUND_BOTTOM,
            },
        );
    }
}

fn hair(scene: &mut AvatarScene, face: &FaceFrame, profile: &FaceProfile) {
    let r = face.radius;
    let paint = Paint::Fill(profile.appearance.hair_color);

    match profile.appearance.hair_style {
        HairStyle::Short => scene.push(
            Layer::HairBack,
            Primitive::Ellipse {
                center: face.offset(0.0, -0.3),
                radius_x: r * 1.1,
                radius_y: r * 1.1,
                start_angle: PI,
                end_angle: TAU,
                paint,
            },
        ),
        HairStyle::Medium => scene.push(
            Layer::HairBack,
            Primitive::Ellipse {
                center: face.offset(0.0, -0.2),
                radius_x: r * 1.2,
                radius_y: r * 0.8,
                start_angle: PI,
                end_angle: TAU,
                paint,
            },
        ),
        HairStyle::Long => scene.push(
            Layer::HairBack,
            full_ellipse(face.center, r * 1.3, r * 1.5, paint),
        ),
        HairStyle::Curly => {
            for i in 0..CURLS {
                let angle = i as f32 / CURLS as f32 * TAU;
                let center = face.offset(0.9 * angle.cos(), -0.3 + 0.3 * angle.sin());
                scene.push(Layer::HairBack, disc(center, r * 0.2, profile.appearance.hair_color));
            }
        }
    }
}

fn face_base(scene: &mut AvatarScene, face: &FaceFrame, profile: &FaceProfile) {
    let r = face.radius;
    let c = face.center;
    let skin = profile.appearance.skin_tone;
    let paint = Paint::Fill(skin);

    let base = match profile.geometry.face_shape {
        FaceShape::Round => Primitive::Circle {
            center: c,
            radius: r,
            paint,
        },
        FaceShape::Long => full_ellipse(c, r * 0.8, r * 1.2, paint),
        FaceShape::Square => Primitive::RoundedRect {
            rect: Rect::new(c.x - r, c.y - r, r * 2.0, r * 2.0),
            corner_radius: r * 0.2,
            paint,
        },
        FaceShape::Oval => full_ellipse(c, r * 0.9, r * 1.1, paint),
    };
    scene.push(Layer::Face, base);

    // Translucent lower-right shading gives a pseudo-3D cue
    scene.push(
        Layer::Face,
        full_ellipse(
            face.offset(0.3, 0.3),
            r * 0.3,
            r * 0.5,
            Paint::Fill(skin.with_alpha(SHADING_ALPHA)),
        ),
    );
}

fn nose(scene: &mut AvatarScene, face: &FaceFrame, profile: &FaceProfile) {
    let r = face.radius;
    let half_width = match profile.geometry.nose_size {
        FeatureSize::Large => r * 0.15,
        FeatureSize::Small => r * 0.08,
        FeatureSize::Medium => r * 0.12,
    };

    scene.push(
        Layer::Nose,
        full_ellipse(face.at(NOSE_TIP), half_width, r * 0.1, Paint::Fill(NOSE_COLOR)),
    );
    for nostril in [NOSTRIL_LEFT, NOSTRIL_RIGHT] {
        scene.push(Layer::Nose, disc(face.at(nostril), NOSTRIL_RADIUS, NOSTRIL_COLOR));
    }
}

fn mouth(scene: &mut AvatarScene, face: &FaceFrame, profile: &FaceProfile) {
    let r = face.radius;
    let width = match profile.geometry.mouth_size {
        FeatureSize::Large => r * 0.3,
        FeatureSize::Small => r * 0.15,
        FeatureSize::Medium => r * 0.22,
    };

    let left = face.at(MOUTH_LEFT);
    let right = face.at(MOUTH_RIGHT);
    let top = face.at(UPPER_LIP_CENTER);
    let bottom = face.at(LOWER_LIP_CENTER);
    let center = Point::new((left.x + right.x) / 2.0, (top.y + bottom.y) / 2.0);

    let primitive = if profile.geometry.smiling {
        Primitive::Arc {
            center,
            radius: width,
            start_angle: SMILE_INSET,
            end_angle: PI - SMILE_INSET,
            stroke: Stroke {
                color: MOUTH_COLOR,
                width: SMILE_STROKE,
                cap: LineCap::Round,
            },
        }
    } else {
        full_ellipse(center, width, r * 0.05, Paint::Fill(MOUTH_COLOR))
    };
    scene.push(Layer::Mouth, primitive);
}

fn facial_hair(scene: &mut AvatarScene, face: &FaceFrame) {
    let r = face.radius;
    let chin = face.at(CHIN);
    scene.push(
        Layer::FacialHair,
        full_ellipse(
            Point::new(chin.x, chin.y + FACIAL_HAIR_DROP),
            r * 0.4,
            r * 0.2,
            Paint::Fill(FACIAL_HAIR_COLOR),
        ),
    );
}

fn eyes(scene: &mut AvatarScene, face: &FaceFrame, profile: &FaceProfile) {
    let eye_radius = face.radius
        * match profile.geometry.eye_size {
            FeatureSize::Large => 0.18,
            FeatureSize::Small => 0.12,
            FeatureSize::Medium => 0.15,
        };

    for index in [LEFT_EYE_OUTER, RIGHT_EYE_OUTER] {
        let eye = face.at(index);
        scene.push(Layer::Eyes, disc(eye, eye_radius, Color::WHITE));
        scene.push(Layer::Eyes, disc(eye, eye_radius * 0.6, profile.appearance.iris_color));
        scene.push(Layer::Eyes, disc(eye, eye_radius * 0.3, Color::BLACK));
        scene.push(
            Layer::Eyes,
            disc(
                Point::new(eye.x - eye_radius * 0.2, eye.y - eye_radius * 0.2),
                eye_radius * 0.15,
                Color::WHITE,
            ),
        );
    }
}

fn eyebrows(scene: &mut AvatarScene, face: &FaceFrame, profile: &FaceProfile) {
    let stroke = Stroke {
        color: BROW_COLOR,
        width: match profile.geometry.eyebrow_thickness {
            BrowThickness::Thick => 6.0,
            BrowThickness::Thin => 2.0,
            BrowThickness::Medium => 4.0,
        },
        cap: LineCap::Round,
    };

    for (from, to) in [
        (LEFT_BROW_OUTER, LEFT_BROW_INNER),
        (RIGHT_BROW_OUTER, RIGHT_BROW_INNER),
    ] {
        scene.push(
            Layer::Eyebrows,
            Primitive::Line {
                from: face.at(from),
                to: face.at(to),
                stroke,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{FaceBuilder, Topology};
    use crate::profile::{classify, EyeDistance, GeometricAttributes, RandomAttributes};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn profile(shape: FaceShape, style: HairStyle, smiling: bool, facial_hair: bool) -> FaceProfile {
        FaceProfile::new(
            GeometricAttributes {
                face_shape: shape,
                eye_size: FeatureSize::Large,
                eye_distance: EyeDistance::Normal,
                nose_size: FeatureSize::Small,
                mouth_size: FeatureSize::Medium,
                eyebrow_thickness: BrowThickness::Thick,
                smiling,
            },
            RandomAttributes {
                skin_tone: Color::rgb(0xC6, 0x86, 0x42),
                hair_color: Color::rgb(0xDA, 0xA5, 0x20),
                iris_color: Color::rgb(0x41, 0x69, 0xE1),
                hair_style: style,
                facial_hair,
            },
        )
    }

    fn observation() -> FaceObservation {
        FaceBuilder::new(Topology::FaceMeshRefined).build().unwrap()
    }

    #[test]
    fn face_frame_matches_landmark_extents() {
        let obs = observation();
        let face = FaceFrame::new(&obs, 640.0, 480.0);
        // extents x 0.38..0.62, y 0.32..0.68
        assert!((face.center.x - 320.0).abs() < 1e-3);
        assert!((face.center.y - 240.0).abs() < 1e-3);
        // max(153.6, 172.8) * 0.6
        assert!((face.radius - 103.68).abs() < 1e-2);
    }

    #[test]
    fn hair_sits_behind_eyes_and_mouth() {
        let obs = observation();
        let compositor = Compositor::new(640, 480);
        for style in &HairStyle::ALL {
            let scene = compositor.compose(&profile(FaceShape::Oval, *style, false, true), &obs);
            let (_, hair_last) = scene.layer_span(Layer::HairBack).unwrap();
            let (eyes_first, _) = scene.layer_span(Layer::Eyes).unwrap();
            let (mouth_first, _) = scene.layer_span(Layer::Mouth).unwrap();
            assert!(hair_last < eyes_first);
            assert!(hair_last < mouth_first);
            assert!(scene.is_layer_ordered());
        }
    }

    #[test]
    fn curly_hair_is_a_ring_of_eight_discs() {
        let scene = Compositor::new(640, 480)
            .compose(&profile(FaceShape::Oval, HairStyle::Curly, false, false), &observation());
        let curls = scene.layers().filter(|l| *l == Layer::HairBack).count();
        assert_eq!(curls, 8);
    }

    #[test]
    fn face_shape_selects_base_primitive() {
        let obs = observation();
        let compositor = Compositor::new(640, 480);
        let base = |shape| {
            let scene = compositor.compose(&profile(shape, HairStyle::Short, false, false), &obs);
            let (first, last) = scene.layer_span(Layer::Face).unwrap();
            assert_eq!(last - first, 1, "base plus shading");
            scene.primitives()[first].primitive.clone()
        };

        assert!(matches!(base(FaceShape::Round), Primitive::Circle { .. }));
        assert!(matches!(base(FaceShape::Square), Primitive::RoundedRect { .. }));
        match base(FaceShape::Long) {
            Primitive::Ellipse {
                radius_x, radius_y, ..
            } => assert!(radius_y > radius_x),
            other => panic!("unexpected base {:?}", other),
        }
    }

    #[test]
    fn shading_is_translucent_skin() {
        let p = profile(FaceShape::Oval, HairStyle::Short, false, false);
        let scene = Compositor::new(640, 480).compose(&p, &observation());
        let (_, last) = scene.layer_span(Layer::Face).unwrap();
        match &scene.primitives()[last].primitive {
            Primitive::Ellipse { paint, .. } => {
                assert_eq!(paint.color(), p.appearance.skin_tone.with_alpha(0x88))
            }
            other => panic!("unexpected shading {:?}", other),
        }
    }

    #[test]
    fn smile_is_a_stroked_arc() {
        let obs = observation();
        let compositor = Compositor::new(640, 480);

        let smiling = compositor.compose(&profile(FaceShape::Oval, HairStyle::Short, true, false), &obs);
        let (m, _) = smiling.layer_span(Layer::Mouth).unwrap();
        match &smiling.primitives()[m].primitive {
            Primitive::Arc {
                start_angle,
                end_angle,
                stroke,
                ..
            } => {
                assert_eq!(*start_angle, 0.2);
                assert_eq!(*end_angle, PI - 0.2);
                assert_eq!(stroke.cap, LineCap::Round);
            }
            other => panic!("unexpected mouth {:?}", other),
        }

        let neutral = compositor.compose(&profile(FaceShape::Oval, HairStyle::Short, false, false), &obs);
        let (m, _) = neutral.layer_span(Layer::Mouth).unwrap();
        assert!(matches!(
            neutral.primitives()[m].primitive,
            Primitive::Ellipse {
                paint: Paint::Fill(_),
                ..
            }
        ));
    }

    #[test]
    fn both_eyes_share_the_session_iris() {
        let p = profile(FaceShape::Oval, HairStyle::Short, false, false);
        let scene = Compositor::new(640, 480).compose(&p, &observation());
        let irises: Vec<Color> = scene
            .primitives()
            .iter()
            .filter(|d| d.layer == Layer::Eyes)
            .filter_map(|d| match d.primitive {
                Primitive::Circle { paint, .. } => Some(paint.color()),
                _ => None,
            })
            .filter(|c| *c == p.appearance.iris_color)
            .collect();
        assert_eq!(irises.len(), 2);
    }

    #[test]
    fn brow_width_and_facial_hair_toggle() {
        let obs = observation();
        let compositor = Compositor::new(640, 480);

        let with = compositor.compose(&profile(FaceShape::Oval, HairStyle::Short, false, true), &obs);
        assert!(with.layer_span(Layer::FacialHair).is_some());
        let (b, _) = with.layer_span(Layer::Eyebrows).unwrap();
        match &with.primitives()[b].primitive {
            Primitive::Line { stroke, .. } => assert_eq!(stroke.width, 6.0),
            other => panic!("unexpected brow {:?}", other),
        }

        let without = compositor.compose(&profile(FaceShape::Oval, HairStyle::Short, false, false), &obs);
        assert!(without.layer_span(Layer::FacialHair).is_none());
    }

    #[test]
    fn prompt_scene_has_background_and_message() {
        let scene = Compositor::new(640, 480).prompt_scene();
        assert!(scene.is_prompt());
        assert_eq!(scene.layers().collect::<Vec<_>>(), vec![Layer::Background, Layer::Message]);
        match &scene.primitives()[1].primitive {
            Primitive::Text { anchor, content, .. } => {
                assert_eq!(*anchor, Point::new(320.0, 240.0));
                assert_eq!(content, "Step into view!");
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn layers_stay_ordered_for_jittered_faces(seed in any::<u64>(), style in 0usize..4, facial_hair in any::<bool>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let obs = FaceBuilder::new(Topology::FaceMeshRefined)
                .jitter(&mut rng, 0.01)
                .build()
                .unwrap();
            let mut p = profile(FaceShape::Oval, HairStyle::ALL[style], false, facial_hair);
            p.geometry = classify(&obs).unwrap();

            let scene = Compositor::new(640, 480).compose(&p, &obs);
            prop_assert!(scene.is_layer_ordered());
            prop_assert!(!scene.is_prompt());
        }
    }
}
