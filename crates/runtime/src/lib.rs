pub mod event_bus;
pub mod metrics;
pub mod pass;

pub use event_bus::*;
pub use metrics::*;
pub use pass::*;
