//! Materials, visual assets and the transform strategies they classify into.
//!
//! Materials are opaque handles owned by the host. Assets describe how a piece
//! of content is drawn (single sprite, four-way texture swap, auto-tiling…) and
//! are registered once with the [`Classifier`](crate::classify::Classifier),
//! which turns them into a [`Strategy`] per material.

use cgmath::Vector2;

use crate::math::Rot4;

/// Stable host-side identity of a material (an index or content hash).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(pub u32);

/// Identity of a registered visual asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u32);

/// East/west mirroring flags of a four-way sprite: the east (or west) view is
/// the opposite side's texture drawn mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlipBits {
    pub east: bool,
    pub west: bool,
}

impl FlipBits {
    /// Whether a sprite shown at `facing` is drawn mirrored.
    pub fn mirrors(&self, facing: Rot4) -> bool {
        facing == Rot4::East && self.east || facing == Rot4::West && self.west
    }
}

/// How an asset's graphic is drawn, resolved once at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicKind {
    /// One texture. `draw_rotated` is set when the quad is physically rotated
    /// with its owner.
    Single { draw_rotated: bool },
    /// One texture per orientation. Without `draw_rotated` the orientation is
    /// simulated by swapping textures rather than rotating the quad.
    Multi { draw_rotated: bool, flip: FlipBits },
    /// One of several interchangeable textures.
    Random,
    /// Auto-tiling sprite drawn from a 16-entry atlas keyed by link directions.
    Linked,
    /// The filler drawn in the corner between linked neighbours.
    LinkedCornerFiller,
    Other,
}

/// Atlas batching group of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtlasGroup {
    Plant,
    Building,
    Item,
    Misc,
}

/// The category of the object a material is printed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OwnerKind {
    Plant,
    Building,
    Item,
    Pawn,
    #[default]
    Other,
}

/// The object a material is being printed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Owner {
    pub kind: OwnerKind,
    pub rotation: Rot4,
    /// Whether the owner's definition allows it to be rotated at all.
    pub rotatable: bool,
}

impl Owner {
    pub fn new(kind: OwnerKind, rotation: Rot4) -> Self {
        Self {
            kind,
            rotation,
            rotatable: true,
        }
    }

    pub fn fixed(kind: OwnerKind) -> Self {
        Self {
            kind,
            rotation: Rot4::North,
            rotatable: false,
        }
    }
}

/// Axis-aligned texture rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub min: Vector2<f32>,
    pub max: Vector2<f32>,
}

impl UvRect {
    pub const UNIT: UvRect = UvRect {
        min: Vector2 { x: 0.0, y: 0.0 },
        max: Vector2 { x: 1.0, y: 1.0 },
    };

    pub fn new(min: Vector2<f32>, max: Vector2<f32>) -> Self {
        Self { min, max }
    }

    /// Corners in plane printing order: `(0,0) (0,1) (1,1) (1,0)`.
    pub fn corners(&self) -> [Vector2<f32>; 4] {
        [
            Vector2::new(self.min.x, self.min.y),
            Vector2::new(self.min.x, self.max.y),
            Vector2::new(self.max.x, self.max.y),
            Vector2::new(self.max.x, self.min.y),
        ]
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Everything the classifier needs to know about one visual asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDescriptor {
    pub id: AssetId,
    pub kind: GraphicKind,
    /// Set when the asset is batched into a shared texture atlas.
    pub atlas_group: Option<AtlasGroup>,
    /// Per-orientation materials of a four-way sprite, indexed by [`Rot4`].
    pub orientation_materials: Option<[MaterialHandle; 4]>,
    /// Per-orientation atlas rectangles of a batched four-way sprite.
    pub orientation_uvs: Option<[UvRect; 4]>,
}

impl AssetDescriptor {
    pub fn new(id: AssetId, kind: GraphicKind) -> Self {
        Self {
            id,
            kind,
            atlas_group: None,
            orientation_materials: None,
            orientation_uvs: None,
        }
    }

    pub fn with_atlas_group(mut self, group: AtlasGroup) -> Self {
        self.atlas_group = Some(group);
        self
    }

    pub fn with_orientation_materials(mut self, materials: [MaterialHandle; 4]) -> Self {
        self.orientation_materials = Some(materials);
        self
    }

    pub fn with_orientation_uvs(mut self, uvs: [UvRect; 4]) -> Self {
        self.orientation_uvs = Some(uvs);
        self
    }

    pub fn flip(&self) -> FlipBits {
        match self.kind {
            GraphicKind::Multi { flip, .. } => flip,
            _ => FlipBits::default(),
        }
    }
}

/// How the transform engine rewrites the geometry of one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// Orientation independent, never touched.
    #[default]
    None,
    /// Each quad rotates about its stored center.
    RotateAboutCenter,
    /// Four-way texture-swap sprite: corners are permuted, UVs may mirror.
    ExchangeVertices { asset: AssetId, base: Rot4 },
    /// The distinct material copy of a mirrored [`Strategy::ExchangeVertices`]
    /// sprite. Transformed identically.
    MirrorAware { asset: AssetId, base: Rot4 },
    /// Auto-tiling sprite resolved to entry `link` of the atlas built from
    /// `source`. Corners are permuted; the texture is remapped at draw time.
    Linked { source: MaterialHandle, link: u8 },
    /// Atlas-batched mixed quads; behavior is read per quad from its metadata.
    AtlasHybrid,
    /// Five-vertex soft-shadow quads shifted by their stored offset.
    ShadowOffset,
}

impl Strategy {
    /// Vertices per quad this strategy expects, if it touches geometry at all.
    pub fn stride(&self) -> Option<usize> {
        match self {
            Strategy::None => None,
            Strategy::ShadowOffset => Some(5),
            _ => Some(4),
        }
    }
}
