//! flow-carousel
//!
//! Incremental view rotation for tile-based worlds. The view turns in quarter
//! turns with an eased animation while the baked geometry of the world's
//! sections is rewritten in place, spread over the frames of the animation so
//! no frame pays for a full-map rebuild. The visible viewport switches to the
//! new orientation all at once on a fixed frame, so it is never seen half
//! rotated.
//!
//! High-level modules
//! - `classify`: maps materials to transform strategies and owns their tables
//! - `context`: configuration and the session entry points the host calls
//! - `controller`: per-map rotation state machine and eased angle
//! - `data_structures`: materials, assets, sub-mesh buffers and section grid
//! - `draw`: draw-matrix interception and draw-time material remapping
//! - `error`: typed engine errors
//! - `math`: planar rotation, quarter turns and cell rectangles
//! - `resources`: section geometry authoring
//! - `scheduler`: spreads section rewrites over the animation frames
//! - `transform`: rewrites sub-mesh geometry for a view angle
//! - `view`: camera and input helpers for the rotated view
//!

pub mod classify;
pub mod context;
pub mod controller;
pub mod data_structures;
pub mod draw;
pub mod error;
pub mod math;
pub mod resources;
pub mod scheduler;
pub mod transform;
pub mod view;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use context::{CarouselConfig, Context, FrameReport, MapView};
pub use controller::{Phase, RotationController, RotationState};
pub use error::CarouselError;
pub use math::{Cell, CellRect, Rot4};
