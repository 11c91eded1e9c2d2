use foundation::time::Time;

/// Per-frame timing handed to everything the render loop advances.
///
/// Frames are plain values so a run can be recorded and replayed: the same
/// sequence of `dt_s` values always produces the same vessel and camera state.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Elapsed seconds since the previous frame.
    pub dt_s: f64,
    /// Accumulated time at the end of this frame.
    pub time: Time,
}

impl Frame {
    /// Frame `index` of a fixed-rate sequence.
    pub fn fixed(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    /// The next frame of a fixed-rate sequence.
    pub fn next(self) -> Self {
        Self::fixed(self.index + 1, self.dt_s)
    }

    /// The next frame after `dt_s` seconds; used for variable frame rates.
    pub fn advance(self, dt_s: f64) -> Self {
        Self {
            index: self.index + 1,
            dt_s,
            time: Time(self.time.0 + dt_s),
        }
    }
}
