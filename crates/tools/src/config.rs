use std::fs;
use std::path::Path;

use layers::{MAX_SUBDIVISIONS, TessellationConfig};
use scene::{CameraConfig, KinematicsConfig};
use serde::{Deserialize, Serialize};

/// Everything the `globe` binary can be tuned with. Every section and field
/// is optional in the file; missing values keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub tessellation: TessellationConfig,
    pub kinematics: KinematicsConfig,
    pub camera: CameraConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: String, reason: String },
    Parse { path: String, reason: String },
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, reason } => write!(f, "read config {path}: {reason}"),
            ConfigError::Parse { path, reason } => write!(f, "parse config {path}: {reason}"),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl GlobeConfig {
    /// Load from a JSON file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let display = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        let config = Self::from_json_str(&text).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: display,
                reason,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the sphere radius for both meshes and vessels.
    ///
    /// Distances tuned for the old radius (vessel speed, jitter threshold,
    /// camera fly altitude) are rescaled so the globe behaves the same at
    /// any size.
    pub fn with_radius(mut self, radius: f64) -> Result<Self, ConfigError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "radius must be positive, got {radius}"
            )));
        }
        let scale = radius / self.kinematics.radius;
        self.tessellation.radius = radius;
        self.kinematics.radius = radius;
        self.kinematics.speed_scale *= scale;
        self.kinematics.min_speed_rate *= scale;
        self.kinematics.noise_threshold *= scale;
        self.camera.fly_altitude *= scale;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, radius) in [
            ("tessellation.radius", self.tessellation.radius),
            ("kinematics.radius", self.kinematics.radius),
        ] {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive, got {radius}"
                )));
            }
        }
        if !self.kinematics.speed_scale.is_finite() || self.kinematics.speed_scale <= 0.0 {
            return Err(ConfigError::Invalid(
                "kinematics.speed_scale must be positive".to_string(),
            ));
        }
        let tessellation = &self.tessellation;
        if tessellation.min_subdivisions > MAX_SUBDIVISIONS {
            return Err(ConfigError::Invalid(format!(
                "tessellation.min_subdivisions must be at most {MAX_SUBDIVISIONS}, got {}",
                tessellation.min_subdivisions
            )));
        }
        if let Some(step) = tessellation.max_step_deg {
            if !step.is_finite() || step <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "tessellation.max_step_deg must be positive, got {step}"
                )));
            }
        }
        if !self.camera.step.is_finite() || self.camera.step <= 0.0 || self.camera.step > 1.0 {
            return Err(ConfigError::Invalid(
                "camera.step must be in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}
