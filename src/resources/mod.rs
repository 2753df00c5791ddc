/**
 * This module contains the helpers hosts author section geometry with.
 */
pub mod mesh;

pub use mesh::SectionBuilder;
