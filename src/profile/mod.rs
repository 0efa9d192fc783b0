mod classifier;
pub mod palette;
pub mod types;

pub use classifier::{classify, FaceMeasurements, SMILE_EPSILON, THICK_BROW_PX, THIN_BROW_PX};
pub use palette::sample_appearance;
pub use types::{
    BrowThickness, EyeDistance, FaceProfile, FaceShape, FeatureSize, GeometricAttributes,
    HairStyle, RandomAttributes,
};
