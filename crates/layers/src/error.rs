/// Input-shape failures while turning a ring into a mesh.
///
/// These are properties of the input, not bugs: callers skip the offending
/// polygon and keep going with the rest of the collection.
#[derive(Debug, Clone, PartialEq)]
pub enum TessellationError {
    /// Fewer than 3 distinct vertices after normalization.
    TooFewPoints { ring: usize, count: usize },
    NonFinite { ring: usize, index: usize },
    /// The ring encloses no area (collinear or collapsed points).
    ZeroArea { ring: usize },
    /// Ear clipping rejected the input or produced no triangles.
    Triangulation { reason: String },
}

impl std::fmt::Display for TessellationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TessellationError::TooFewPoints { ring, count } => {
                write!(f, "ring {ring} has {count} distinct points, need at least 3")
            }
            TessellationError::NonFinite { ring, index } => {
                write!(f, "ring {ring} has a non-finite coordinate at vertex {index}")
            }
            TessellationError::ZeroArea { ring } => write!(f, "ring {ring} has zero area"),
            TessellationError::Triangulation { reason } => {
                write!(f, "triangulation failed: {reason}")
            }
        }
    }
}

impl std::error::Error for TessellationError {}
