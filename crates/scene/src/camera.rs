//! Progress-driven camera transitions ("fly to vessel" and back).
//!
//! Progress advances by a fixed step per tick, not by elapsed time, so a
//! transition always takes the same number of frames.

use foundation::math::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::advance_progress;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Progress gained per tick.
    pub step: f64,
    /// Distance above a vessel the camera settles at after `fly_to`.
    pub fly_altitude: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            step: 0.02,
            fly_altitude: 0.5,
        }
    }
}

impl CameraConfig {
    fn effective_step(&self) -> f64 {
        usable_step(self.step).unwrap_or(Self::default().step)
    }
}

fn usable_step(step: f64) -> Option<f64> {
    (step.is_finite() && step > 0.0).then_some(step)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraTransition {
    pub progress: f64,
    pub start_position: Vec3,
    pub target_position: Vec3,
    pub start_look_at: Option<Vec3>,
    pub end_look_at: Option<Vec3>,
    pub is_animating: bool,
}

impl CameraTransition {
    pub fn new(
        start_position: Vec3,
        target_position: Vec3,
        start_look_at: Option<Vec3>,
        end_look_at: Option<Vec3>,
    ) -> Self {
        Self {
            progress: 0.0,
            start_position,
            target_position,
            start_look_at,
            end_look_at,
            is_animating: true,
        }
    }

    /// Look-at at progress 0. Without one the camera looks at the globe
    /// center.
    pub fn from_look_at(&self) -> Vec3 {
        self.start_look_at.unwrap_or(Vec3::ZERO)
    }

    /// Look-at at progress 1; keeps the starting look-at when unset.
    pub fn to_look_at(&self) -> Vec3 {
        self.end_look_at.unwrap_or_else(|| self.from_look_at())
    }

    /// Position and look-at at `progress`. Progress 1 returns both targets
    /// exactly.
    pub fn sample(&self, progress: f64) -> (Vec3, Vec3) {
        if progress >= 1.0 {
            return (self.target_position, self.to_look_at());
        }
        let t = progress.clamp(0.0, 1.0);
        (
            self.start_position.lerp(self.target_position, t),
            self.from_look_at().lerp(self.to_look_at(), t),
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraFrame {
    pub position: Vec3,
    pub look_at: Vec3,
    pub progress: f64,
    pub done: bool,
}

/// One controllable camera with at most one transition in flight.
#[derive(Debug, Clone)]
pub struct CameraController {
    config: CameraConfig,
    position: Vec3,
    look_at: Vec3,
    transition: Option<CameraTransition>,
    home: Option<(Vec3, Vec3)>,
}

impl CameraController {
    pub fn new(config: CameraConfig, position: Vec3, look_at: Vec3) -> Self {
        Self {
            config,
            position,
            look_at,
            transition: None,
            home: None,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn transition(&self) -> Option<&CameraTransition> {
        self.transition.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.transition.as_ref().is_some_and(|t| t.is_animating)
    }

    /// Begin a transition, replacing any in flight.
    pub fn start(&mut self, transition: CameraTransition) {
        if self.transition.is_some() {
            debug!("camera transition superseded");
        }
        self.transition = Some(transition);
    }

    /// Transition from the current viewpoint to `position`.
    pub fn transition_to(&mut self, position: Vec3, look_at: Option<Vec3>) {
        self.start(CameraTransition::new(
            self.position,
            position,
            Some(self.look_at),
            look_at,
        ));
    }

    /// Advance the active transition by the configured step.
    pub fn tick(&mut self) -> Option<CameraFrame> {
        self.tick_with(self.config.step)
    }

    /// Advance the active transition by `step` of progress.
    ///
    /// The final frame lands exactly on the target and discards the
    /// transition. Returns `None` when nothing is animating. A non-finite or
    /// non-positive `step` uses the configured one instead.
    pub fn tick_with(&mut self, step: f64) -> Option<CameraFrame> {
        let step = usable_step(step).unwrap_or_else(|| self.config.effective_step());
        let transition = self.transition.as_mut()?;
        if !transition.is_animating {
            return None;
        }

        transition.progress = advance_progress(transition.progress, step);
        let progress = transition.progress;
        let (position, look_at) = transition.sample(progress);
        self.position = position;
        self.look_at = look_at;

        let done = progress >= 1.0;
        if done {
            self.transition = None;
        }
        Some(CameraFrame {
            position,
            look_at,
            progress,
            done,
        })
    }

    /// Stop where the camera is now. The halted transition stays inspectable
    /// until the next `start`.
    pub fn cancel(&mut self) {
        if let Some(transition) = self.transition.as_mut() {
            transition.is_animating = false;
            debug!(progress = transition.progress, "camera transition cancelled");
        }
    }

    /// Frame `target` from `fly_altitude` above it, looking at it.
    ///
    /// The viewpoint before the first fly-to is remembered for
    /// [`CameraController::return_home`]. Returns `false` for a target at
    /// the globe center.
    pub fn fly_to(&mut self, target: Vec3) -> bool {
        let Some(up) = target.try_normalize() else {
            return false;
        };
        if self.home.is_none() {
            self.home = Some((self.position, self.look_at));
        }
        let position = up * (target.length() + self.config.fly_altitude);
        self.transition_to(position, Some(target));
        true
    }

    /// Fly back to the viewpoint saved by the first `fly_to`.
    pub fn return_home(&mut self) -> bool {
        match self.home.take() {
            Some((position, look_at)) => {
                self.transition_to(position, Some(look_at));
                true
            }
            None => false,
        }
    }
}
