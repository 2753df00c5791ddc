//! Error types shared by the classifier, the transform engine and the session.
//!
//! Engine-local errors never abort a frame: the caller logs them and skips the
//! offending sub-mesh. Only [`CarouselError::UnmappedLinkedMaterial`] is fatal
//! for the material it names, since there is no fallback geometry for it.

use crate::data_structures::material::{AssetId, MaterialHandle};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CarouselError {
    #[error("can't map linked material {material:?} to any registered atlas")]
    UnmappedLinkedMaterial { material: MaterialHandle },

    #[error(
        "bad buffer shape for material {material:?}: {vertices} vertices, {quads} quad entries, stride {stride}"
    )]
    BufferShape {
        material: MaterialHandle,
        vertices: usize,
        quads: usize,
        stride: usize,
    },

    #[error("asset {asset:?} was never registered")]
    UnknownAsset { asset: AssetId },

    #[error("section ({x}, {z}) is outside the section grid")]
    SectionOutOfBounds { x: i32, z: i32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CarouselError>;
