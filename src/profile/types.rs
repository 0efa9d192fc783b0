use crate::avatar::Color;
use serde::Serialize;
use std::fmt;

macro_rules! attribute_enum {
    (@count) => { 0usize };
    (@count $head:ident $($tail:ident)*) => { 1usize + attribute_enum!(@count $($tail)*) };
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: [$name; attribute_enum!(@count $($variant)+)] = [$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

attribute_enum!(FaceShape {
    Round => "round",
    Oval => "oval",
    Square => "square",
    Long => "long",
});

attribute_enum!(
    /// Shared three-step scale for eyes, nose and mouth.
    FeatureSize {
        Small => "small",
        Medium => "medium",
        Large => "large",
    }
);

attribute_enum!(EyeDistance {
    Close => "close",
    Normal => "normal",
    Wide => "wide",
});

attribute_enum!(BrowThickness {
    Thin => "thin",
    Medium => "medium",
    Thick => "thick",
});

attribute_enum!(HairStyle {
    Short => "short",
    Medium => "medium",
    Long => "long",
    Curly => "curly",
});

/// Attributes derived purely from one observation's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometricAttributes {
    pub face_shape: FaceShape,
    pub eye_size: FeatureSize,
    pub eye_distance: EyeDistance,
    pub nose_size: FeatureSize,
    pub mouth_size: FeatureSize,
    pub eyebrow_thickness: BrowThickness,
    pub smiling: bool,
}

impl fmt::Display for GeometricAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "face={} eyes={} spacing={} nose={} mouth={} brows={} smiling={}",
            self.face_shape,
            self.eye_size,
            self.eye_distance,
            self.nose_size,
            self.mouth_size,
            self.eyebrow_thickness,
            self.smiling
        )
    }
}

/// Appearance sampled once when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomAttributes {
    pub skin_tone: Color,
    pub hair_color: Color,
    pub iris_color: Color,
    pub hair_style: HairStyle,
    pub facial_hair: bool,
}

/// Everything the compositor needs to draw one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaceProfile {
    #[serde(flatten)]
    pub geometry: GeometricAttributes,
    #[serde(flatten)]
    pub appearance: RandomAttributes,
}

impl FaceProfile {
    pub fn new(geometry: GeometricAttributes, appearance: RandomAttributes) -> Self {
        Self {
            geometry,
            appearance,
        }
    }

    /// Short human-readable line for a host UI.
    pub fn summary(&self) -> String {
        format!(
            "Face: {}, Eyes: {}, Hair: {}, Mood: {}",
            self.geometry.face_shape,
            self.geometry.eye_size,
            self.appearance.hair_style,
            if self.geometry.smiling { "Happy" } else { "Neutral" }
        )
    }
}
