pub mod feeds;
pub mod geojson;

pub use feeds::*;
pub use geojson::*;
