//! TOML tuning file for the session and the synthetic source.

use crate::landmarks::Topology;
use crate::session::SessionConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionSection,
    pub topology: TopologySection,
    pub synthetic: SyntheticSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub debounce_ms: u64,
    pub grace_frames: u32,
    pub facial_hair_probability: f64,
}

impl Default for SessionSection {
    fn default() -> Self {
        let defaults = SessionConfig::default();
        Self {
            debounce_ms: defaults.debounce.as_millis() as u64,
            grace_frames: defaults.grace_frames,
            facial_hair_probability: defaults.facial_hair_probability,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologySection {
    pub kind: Topology,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticSection {
    /// Uniform per-coordinate noise, in normalized units.
    pub jitter: f32,
    /// Emit a dropout burst every N frames; 0 disables dropouts.
    pub dropout_every: u32,
    pub dropout_len: u32,
}

impl Default for SyntheticSection {
    fn default() -> Self {
        Self {
            jitter: 0.002,
            dropout_every: 0,
            dropout_len: 0,
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let p = self.session.facial_hair_probability;
        if !(0.0..=1.0).contains(&p) {
            bail!("facial_hair_probability must be within [0, 1], got {}", p);
        }
        if !self.synthetic.jitter.is_finite() || self.synthetic.jitter < 0.0 {
            bail!("synthetic jitter must be a non-negative number");
        }
        if self.synthetic.dropout_every > 0 && self.synthetic.dropout_len > self.synthetic.dropout_every {
            bail!(
                "dropout_len ({}) cannot exceed dropout_every ({})",
                self.synthetic.dropout_len,
                self.synthetic.dropout_every
            );
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            debounce: Duration::from_millis(self.session.debounce_ms),
            grace_frames: self.session.grace_frames,
            facial_hair_probability: self.session.facial_hair_probability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.session_config(), SessionConfig::default());
        assert_eq!(config.topology.kind, Topology::FaceMeshRefined);
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config = AppConfig::parse(
            r#"
            [session]
            grace_frames = 4

            [topology]
            kind = "face_mesh"
            "#,
        )
        .unwrap();

        assert_eq!(config.session.grace_frames, 4);
        assert_eq!(config.session.debounce_ms, 1000);
        assert_eq!(config.topology.kind, Topology::FaceMesh);
        assert_eq!(config.synthetic.jitter, 0.002);
    }

    #[test]
    fn probability_out_of_range_is_rejected() {
        let err = AppConfig::parse("[session]\nfacial_hair_probability = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("facial_hair_probability"));
    }

    #[test]
    fn dropout_longer_than_period_is_rejected() {
        assert!(AppConfig::parse("[synthetic]\ndropout_every = 5\ndropout_len = 6\n").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AppConfig::load("/nonexistent/camola-avatar.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/camola-avatar.toml"));
    }
}
