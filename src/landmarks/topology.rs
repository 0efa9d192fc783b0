//! Face mesh indices the classifier and compositor rely on.
//!
//! Left/right follow the detector's own naming (subject's side as seen in a
//! mirrored selfie frame).

pub const FACE_LEFT: usize = 234;
pub const FACE_RIGHT: usize = 454;
pub const FOREHEAD_TOP: usize = 10;
pub const CHIN: usize = 152;

pub const JAW_LEFT: usize = 172;
pub const JAW_RIGHT: usize = 397;

pub const LEFT_EYE_OUTER: usize = 33;
pub const LEFT_EYE_INNER: usize = 133;
pub const RIGHT_EYE_INNER: usize = 362;
pub const RIGHT_EYE_OUTER: usize = 263;

pub const NOSTRIL_LEFT: usize = 219;
pub const NOSTRIL_RIGHT: usize = 439;
pub const NOSE_TIP: usize = 19;

pub const MOUTH_LEFT: usize = 61;
pub const MOUTH_RIGHT: usize = 291;
pub const UPPER_LIP_CENTER: usize = 13;
pub const LOWER_LIP_CENTER: usize = 14;

pub const LEFT_BROW_OUTER: usize = 70;
pub const LEFT_BROW_INNER: usize = 63;
pub const RIGHT_BROW_OUTER: usize = 300;
pub const RIGHT_BROW_INNER: usize = 293;
