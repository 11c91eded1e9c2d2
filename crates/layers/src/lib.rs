pub mod borders;
pub mod error;
pub mod resample;
pub mod sphere_mesh;
pub mod triangulate;

pub use borders::*;
pub use error::*;
pub use sphere_mesh::{MAX_SUBDIVISIONS, SphereMesh, TessellationConfig, Tessellator, tessellate};
