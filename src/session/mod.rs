//! Face presence tracking and profile stabilization.
//!
//! A session starts on the first present frame after an absence and ends
//! once more than `grace_frames` consecutive frames have no face. Appearance
//! is sampled exactly once per session; geometry is re-classified at most
//! once per debounce interval while drawing still follows every frame.

use crate::error::FrameResult;
use crate::landmarks::FaceObservation;
use crate::profile::{classify, sample_appearance, FaceProfile};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Minimum time between re-classifications.
    pub debounce: Duration,
    /// Consecutive absent frames tolerated before the session ends.
    pub grace_frames: u32,
    pub facial_hair_probability: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            grace_frames: 10,
            facial_hair_probability: 0.3,
        }
    }
}

/// Outcome of feeding one frame to the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SessionStatus {
    /// No face and no session.
    Idle,
    Started { session: u64 },
    /// Geometry was recomputed; `changed` if the attributes differ.
    Reclassified { session: u64, changed: bool },
    /// Face present, debounce still running; geometry kept.
    Held { session: u64 },
    /// Face missing but still within the grace period.
    Dropout { session: u64, absent_frames: u32 },
    Ended { session: u64 },
    /// Frame dropped as an invalid observation.
    Rejected,
    /// Pipeline shut down; frame ignored.
    Stopped,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: u64,
    profile: FaceProfile,
    observation: FaceObservation,
    last_classified: Instant,
    absent_frames: u32,
}

impl Session {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn profile(&self) -> &FaceProfile {
        &self.profile
    }

    /// Most recent valid observation, used to keep drawing during dropouts.
    pub fn observation(&self) -> &FaceObservation {
        &self.observation
    }

    pub fn absent_frames(&self) -> u32 {
        self.absent_frames
    }
}

pub struct SessionManager<R = StdRng> {
    config: SessionConfig,
    rng: R,
    session: Option<Session>,
    next_id: u64,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn seeded(config: SessionConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R> SessionManager<R> {
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Discard the active session, if any. Returns its id.
    pub fn end(&mut self) -> Option<u64> {
        let session = self.session.take()?;
        tracing::info!("Session {} released", session.id);
        Some(session.id)
    }
}

impl<R: Rng> SessionManager<R> {
    pub fn with_rng(config: SessionConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            session: None,
            next_id: 1,
        }
    }

    /// Feed a frame with a face.
    ///
    /// Fails only when classification is due and the geometry is degenerate;
    /// the session is left untouched in that case.
    pub fn observe(&mut self, obs: FaceObservation, now: Instant) -> FrameResult<SessionStatus> {
        let Some(session) = self.session.as_mut() else {
            return self.start(obs, now);
        };

        let due = now.saturating_duration_since(session.last_classified) >= self.config.debounce;
        let status = if due {
            let geometry = classify(&obs)?;
            let changed = geometry != session.profile.geometry;
            session.profile.geometry = geometry;
            session.last_classified = now;
            if changed {
                tracing::info!("Session {} profile: {}", session.id, session.profile.summary());
                tracing::debug!("Session {} geometry: {}", session.id, geometry);
            }
            SessionStatus::Reclassified {
                session: session.id,
                changed,
            }
        } else {
            SessionStatus::Held { session: session.id }
        };

        session.observation = obs;
        session.absent_frames = 0;
        Ok(status)
    }

    /// Feed a frame without a face.
    pub fn observe_absent(&mut self) -> SessionStatus {
        let Some(session) = self.session.as_mut() else {
            return SessionStatus::Idle;
        };

        session.absent_frames += 1;
        let (id, absent_frames) = (session.id, session.absent_frames);

        if absent_frames > self.config.grace_frames {
            self.session = None;
            tracing::info!("Session {} ended after {} absent frames", id, absent_frames);
            SessionStatus::Ended { session: id }
        } else {
            tracing::debug!("Session {} dropout ({} absent frames)", id, absent_frames);
            SessionStatus::Dropout {
                session: id,
                absent_frames,
            }
        }
    }

    fn start(&mut self, obs: FaceObservation, now: Instant) -> FrameResult<SessionStatus> {
        let geometry = classify(&obs)?;
        let appearance = sample_appearance(&mut self.rng, self.config.facial_hair_probability);
        let id = self.next_id;
        self.next_id += 1;

        let session = Session {
            id,
            profile: FaceProfile::new(geometry, appearance),
            observation: obs,
            last_classified: now,
            absent_frames: 0,
        };
        tracing::info!("Session {} started: {}", id, session.profile.summary());
        self.session = Some(session);

        Ok(SessionStatus::Started { session: id })
    }
}
