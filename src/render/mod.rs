//! Dual-surface rendering
//!
//! One drawing context, two surfaces: a 3D scene rendered first, then a 2D
//! overlay composited on top with a transparent background. The compositor
//! owns both surfaces, the camera and the viewport; nothing else writes
//! viewport size or orientation.

mod compositor;
mod layout;
mod overlay;
mod scene;

pub use compositor::Compositor;
pub use layout::{classify_orientation, AnchorPos, HAlign, StageLayout, VAlign, ORIENTATION_DEADBAND};
pub use overlay::{Overlay, OverlayNode};
pub use scene::{Instance, Scene3d};
