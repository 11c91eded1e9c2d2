use crate::frame::Frame;

/// Largest step handed to the simulation; longer stalls (tab switches,
/// breakpoints) are truncated so vessels do not teleport.
pub const DEFAULT_MAX_DT_S: f64 = 0.1;

/// Turns wall-clock timestamps from the host loop into [`Frame`]s.
#[derive(Debug, Clone)]
pub struct FrameClock {
    max_dt_s: f64,
    last_s: Option<f64>,
    frame: Frame,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DT_S)
    }
}

impl FrameClock {
    pub fn new(max_dt_s: f64) -> Self {
        Self {
            max_dt_s: max_dt_s.max(0.0),
            last_s: None,
            frame: Frame::fixed(0, 0.0),
        }
    }

    /// Current frame (the last one returned by [`FrameClock::tick`]).
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Advance to the wall-clock instant `now_s`.
    ///
    /// The first call yields `dt = 0`. Backwards or non-finite timestamps
    /// also yield `dt = 0`.
    pub fn tick(&mut self, now_s: f64) -> Frame {
        let dt = match self.last_s {
            Some(last) if now_s.is_finite() => (now_s - last).clamp(0.0, self.max_dt_s),
            _ => 0.0,
        };
        if now_s.is_finite() {
            self.last_s = Some(now_s);
        }
        self.frame = self.frame.advance(dt);
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::FrameClock;

    #[test]
    fn first_tick_has_zero_dt() {
        let mut clock = FrameClock::default();
        let f = clock.tick(100.0);
        assert_eq!(f.dt_s, 0.0);
        assert_eq!(f.index, 1);
    }

    #[test]
    fn dt_is_clamped() {
        let mut clock = FrameClock::new(0.1);
        clock.tick(1.0);
        assert_eq!(clock.tick(1.05).dt_s, 1.05 - 1.0);
        assert_eq!(clock.tick(5.0).dt_s, 0.1);
        assert_eq!(clock.tick(4.0).dt_s, 0.0);
        assert_eq!(clock.tick(f64::NAN).dt_s, 0.0);
        assert_eq!(clock.frame().index, 5);
    }
}
