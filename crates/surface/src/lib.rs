//! Map rendering surface: the traits an external renderer implements, the
//! lifecycle handle the widget drives it through, and a headless renderer
//! for tests and scripted sessions.

pub mod handle;
pub mod headless;
pub mod marker;
pub mod style;
pub mod traits;

pub use handle::*;
pub use marker::*;
pub use style::*;
pub use traits::*;
