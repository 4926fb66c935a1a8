pub mod geo;
pub mod ids;
pub mod viewport;

// Foundation crate: small, well-tested primitives only.
pub use geo::*;
pub use ids::*;
pub use viewport::*;
