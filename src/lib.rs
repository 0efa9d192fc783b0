//! Cartoon avatar mirror: turns per-frame face landmarks into a stable,
//! session-scoped cartoon character and renders it every frame.

pub mod avatar;
pub mod config;
pub mod error;
pub mod landmarks;
pub mod output;
pub mod pipeline;
pub mod profile;
pub mod session;

pub use error::{FrameError, FrameResult};
pub use pipeline::{AvatarPipeline, FrameReport};
