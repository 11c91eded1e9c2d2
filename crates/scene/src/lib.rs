pub mod camera;
pub mod fleet;
pub mod route;
pub mod transform;
pub mod vessel;

pub use camera::*;
pub use fleet::*;
pub use transform::*;
pub use vessel::*;

/// Progress values this close to 1 count as complete. Accumulating many
/// small increments otherwise stalls just short of the target.
pub const PROGRESS_EPS: f64 = 1e-9;

/// Advance a `[0, 1]` progress value, snapping to exactly 1 at the end.
pub fn advance_progress(progress: f64, delta: f64) -> f64 {
    let next = (progress + delta).min(1.0);
    if next >= 1.0 - PROGRESS_EPS {
        1.0
    } else {
        next.max(progress)
    }
}
