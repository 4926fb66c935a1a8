//! State synchronization for the interactive map widget.
//!
//! [`MapWidget`] keeps an external rendering surface in step with the
//! application's [`catalog::LocationStore`] across searches, marker clicks
//! and destructive style switches. The individual controllers are exposed
//! for hosts that want to compose them differently.

pub mod config;
pub mod error;
pub mod map_widget;
pub mod reconciler;
pub mod search;
pub mod selection;
pub mod style_switch;
pub mod theme;

pub use config::*;
pub use error::*;
pub use map_widget::*;
pub use reconciler::*;
pub use search::*;
pub use selection::*;
pub use style_switch::*;
pub use theme::*;
