//! Engine data structures: materials, assets and section geometry.
//!
//! - `material` holds material/asset handles, asset descriptors and the
//!   transform [`Strategy`](material::Strategy) each material classifies into
//! - `section` holds sub-mesh buffers, per-quad metadata and the section grid

pub mod material;
pub mod section;
