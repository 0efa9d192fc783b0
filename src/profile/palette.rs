use super::types::{HairStyle, RandomAttributes};
use crate::avatar::Color;
use rand::Rng;

pub const SKIN_TONES: [Color; 6] = [
    Color::rgb(0xFD, 0xBC, 0xB4),
    Color::rgb(0xF1, 0xC2, 0x7D),
    Color::rgb(0xE0, 0xAC, 0x69),
    Color::rgb(0xC6, 0x86, 0x42),
    Color::rgb(0x8D, 0x55, 0x24),
    Color::rgb(0xFF, 0xE0, 0xBD),
];

pub const HAIR_COLORS: [Color; 6] = [
    Color::rgb(0x2C, 0x18, 0x10),
    Color::rgb(0x8B, 0x45, 0x13),
    Color::rgb(0xDA, 0xA5, 0x20),
    Color::rgb(0xFF, 0x45, 0x00),
    Color::rgb(0x00, 0x00, 0x00),
    Color::rgb(0x69, 0x69, 0x69),
];

pub const IRIS_COLORS: [Color; 5] = [
    Color::rgb(0x8B, 0x45, 0x13),
    Color::rgb(0x22, 0x8B, 0x22),
    Color::rgb(0x41, 0x69, 0xE1),
    Color::rgb(0x80, 0x80, 0x80),
    Color::rgb(0xDA, 0xA5, 0x20),
];

/// Draw a fresh appearance: uniform over each palette, facial hair with the
/// given probability.
pub fn sample_appearance<R: Rng + ?Sized>(rng: &mut R, facial_hair_probability: f64) -> RandomAttributes {
    RandomAttributes {
        skin_tone: pick(rng, &SKIN_TONES),
        hair_color: pick(rng, &HAIR_COLORS),
        iris_color: pick(rng, &IRIS_COLORS),
        hair_style: pick(rng, &HairStyle::ALL),
        facial_hair: rng.gen_bool(probability(facial_hair_probability)),
    }
}

fn pick<R: Rng + ?Sized, T: Copy, const N: usize>(rng: &mut R, items: &[T; N]) -> T {
    items[rng.gen_range(0..N)]
}

/// Clamp into [0, 1]; NaN means never.
fn probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}
