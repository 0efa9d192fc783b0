//! Per-frame processing: validate, track the session, compose, render.
//!
//! Every failure here is local to one frame. `process_frame` never returns an
//! error; what went wrong is logged and recorded in the `FrameReport`.

use crate::avatar::{AvatarScene, Compositor};
use crate::error::FrameError;
use crate::landmarks::{FaceObservation, FramePayload, Topology};
use crate::output::RenderSurface;
use crate::profile::{FaceProfile, GeometricAttributes};
use crate::session::{SessionConfig, SessionManager, SessionStatus};
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Instant;

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub status: SessionStatus,
    /// Number of draw primitives rendered (0 when the frame was skipped).
    pub scene_len: usize,
    pub prompt: bool,
    pub rendered: bool,
    pub error: Option<FrameError>,
}

impl FrameReport {
    fn skipped(status: SessionStatus, error: Option<FrameError>) -> Self {
        Self {
            status,
            scene_len: 0,
            prompt: false,
            rendered: false,
            error,
        }
    }
}

pub struct AvatarPipeline<R = StdRng> {
    sessions: SessionManager<R>,
    topology: Topology,
    scene: Option<AvatarScene>,
    stopped: bool,
}

impl AvatarPipeline {
    pub fn new(config: SessionConfig, topology: Topology) -> Self {
        Self::with_sessions(SessionManager::new(config), topology)
    }

    pub fn seeded(config: SessionConfig, topology: Topology, seed: u64) -> Self {
        Self::with_sessions(SessionManager::seeded(config, seed), topology)
    }
}

impl<R> AvatarPipeline<R> {
    pub fn with_sessions(sessions: SessionManager<R>, topology: Topology) -> Self {
        Self {
            sessions,
            topology,
            scene: None,
            stopped: false,
        }
    }

    /// Snapshot of the current geometric attributes for display.
    pub fn attributes(&self) -> Option<GeometricAttributes> {
        self.profile().map(|p| p.geometry)
    }

    pub fn profile(&self) -> Option<&FaceProfile> {
        self.sessions.session().map(|s| s.profile())
    }

    pub fn session_id(&self) -> Option<u64> {
        self.sessions.session().map(|s| s.id())
    }

    /// Scene rendered for the most recent frame that got one.
    pub fn scene(&self) -> Option<&AvatarScene> {
        self.scene.as_ref()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// End the session and release the surface. Later frames are ignored.
    pub fn shutdown(&mut self, surface: &mut dyn RenderSurface) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.sessions.end();
        self.scene = None;
        surface.release();
        tracing::info!("Avatar pipeline stopped");
    }
}

impl<R: Rng> AvatarPipeline<R> {
    pub fn process_frame(
        &mut self,
        payload: FramePayload,
        now: Instant,
        surface: &mut dyn RenderSurface,
    ) -> FrameReport {
        if self.stopped {
            return FrameReport::skipped(SessionStatus::Stopped, None);
        }

        let status = match payload {
            FramePayload::Absent => self.sessions.observe_absent(),
            FramePayload::Present {
                landmarks,
                frame_width,
                frame_height,
            } => {
                let observed =
                    FaceObservation::new(landmarks, frame_width, frame_height, self.topology)
                        .and_then(|obs| self.sessions.observe(obs, now));
                match observed {
                    Ok(status) => status,
                    Err(e) => {
                        tracing::warn!("Dropping frame: {}", e);
                        return FrameReport::skipped(SessionStatus::Rejected, Some(e));
                    }
                }
            }
        };

        let Some(ctx) = surface.context() else {
            tracing::debug!("Skipping render: {}", FrameError::SurfaceUnavailable);
            return FrameReport::skipped(status, Some(FrameError::SurfaceUnavailable));
        };

        // Landmarks map onto whatever surface the host handed us this frame
        let (width, height) = ctx.size();
        let compositor = Compositor::new(width, height);
        let scene = match self.sessions.session() {
            Some(session) => compositor.compose(session.profile(), session.observation()),
            None => compositor.prompt_scene(),
        };
        scene.render(ctx);

        let report = FrameReport {
            status,
            scene_len: scene.primitives().len(),
            prompt: scene.is_prompt(),
            rendered: true,
            error: None,
        };
        self.scene = Some(scene);
        report
    }
}

impl<R> Drop for AvatarPipeline<R> {
    fn drop(&mut self) {
        if !self.stopped {
            self.sessions.end();
        }
    }
}
