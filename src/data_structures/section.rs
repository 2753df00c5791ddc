//! Section geometry: per-material sub-meshes with their per-quad metadata, and
//! the grid of sections covering a world.
//!
//! A [`SubMesh`] keeps the geometry exactly as the host authored it next to a
//! rendered copy. The transform engine always derives the rendered copy from
//! the authored one, so rewrites never accumulate error and the authored
//! buffers never change between rebuilds.

use cgmath::{Vector2, Vector3};

use crate::{
    data_structures::material::{AssetId, FlipBits, MaterialHandle},
    error::{CarouselError, Result},
    math::{Cell, CellRect, Rot4},
};

/// Per-quad transform parameters recorded while printing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum QuadMeta {
    /// Copied through unchanged.
    #[default]
    None,
    /// Rotation center of the object the quad belongs to.
    Center(Vector3<f32>),
    /// A batched four-way sprite quad.
    Exchange {
        asset: AssetId,
        base: Rot4,
        flip: FlipBits,
    },
    /// Offset of a shadow from its caster.
    Shadow(Vector3<f32>),
}

/// Interleaved vertex as handed to the host for upload.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RegionVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl RegionVertex {
    pub fn new(position: Vector3<f32>, uv: Vector2<f32>) -> Self {
        Self {
            position: position.into(),
            uv: uv.into(),
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position.into()
    }

    pub fn uv(&self) -> Vector2<f32> {
        self.uv.into()
    }
}

/// All quads of one material inside one section.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub material: MaterialHandle,
    pub vertices: Vec<Vector3<f32>>,
    /// One per vertex; may be empty (shadows carry no texture coordinates).
    pub uvs: Vec<Vector2<f32>>,
    /// One per quad (per 4 vertices, or per 5 for shadows).
    pub meta: Vec<QuadMeta>,
    rendered: Vec<RegionVertex>,
    dirty: bool,
}

impl SubMesh {
    pub fn new(material: MaterialHandle) -> Self {
        Self {
            material,
            vertices: Vec::new(),
            uvs: Vec::new(),
            meta: Vec::new(),
            rendered: Vec::new(),
            dirty: false,
        }
    }

    pub fn from_parts(
        material: MaterialHandle,
        vertices: Vec<Vector3<f32>>,
        uvs: Vec<Vector2<f32>>,
        meta: Vec<QuadMeta>,
    ) -> Self {
        let mut mesh = Self {
            material,
            vertices,
            uvs,
            meta,
            rendered: Vec::new(),
            dirty: false,
        };
        mesh.reset_rendered();
        mesh
    }

    pub fn authored_uv(&self, index: usize) -> Vector2<f32> {
        self.uvs.get(index).copied().unwrap_or(Vector2::new(0.0, 0.0))
    }

    /// Reset the rendered copy to the authored geometry.
    fn reset_rendered(&mut self) {
        let uvs = &self.uvs;
        self.rendered.clear();
        self.rendered.extend(self.vertices.iter().enumerate().map(|(i, v)| {
            let uv = uvs.get(i).copied().unwrap_or(Vector2::new(0.0, 0.0));
            RegionVertex::new(*v, uv)
        }));
        self.dirty = true;
    }

    pub fn rendered(&self) -> &[RegionVertex] {
        &self.rendered
    }

    /// The rendered vertices as raw bytes, ready for a vertex buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.rendered)
    }

    /// Whether the rendered copy changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn write_rendered(&mut self, positions: &[Vector3<f32>], uvs: &[Vector2<f32>]) {
        self.rendered.clear();
        self.rendered.extend(
            positions
                .iter()
                .zip(uvs)
                .map(|(p, uv)| RegionVertex::new(*p, *uv)),
        );
        self.dirty = true;
    }

    pub fn quad_count(&self, stride: usize) -> usize {
        self.vertices.len() / stride
    }
}

/// A fixed-size tile of the world with one sub-mesh per material.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    pub sub_meshes: Vec<SubMesh>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sub_mesh(&self, material: MaterialHandle) -> Option<&SubMesh> {
        self.sub_meshes.iter().find(|m| m.material == material)
    }

    /// The sub-mesh of `material`, created empty on first use.
    pub fn sub_mesh_mut(&mut self, material: MaterialHandle) -> &mut SubMesh {
        let idx = match self.sub_meshes.iter().position(|m| m.material == material) {
            Some(idx) => idx,
            None => {
                self.sub_meshes.push(SubMesh::new(material));
                self.sub_meshes.len() - 1
            }
        };
        &mut self.sub_meshes[idx]
    }

    pub fn vertex_count(&self) -> usize {
        self.sub_meshes.iter().map(|m| m.vertices.len()).sum()
    }
}

/// Row-major grid of sections covering a world.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionGrid {
    width: i32,
    height: i32,
    sections: Vec<Section>,
}

impl SectionGrid {
    pub fn new(width: i32, height: i32) -> Self {
        let (width, height) = (width.max(0), height.max(0));
        Self {
            width,
            height,
            sections: vec![Section::new(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn bounds(&self) -> CellRect {
        CellRect::new(0, 0, self.width, self.height)
    }

    fn index(&self, coord: Cell) -> Option<usize> {
        self.bounds()
            .contains(coord)
            .then(|| coord.z as usize * self.width as usize + coord.x as usize)
    }

    pub fn get(&self, coord: Cell) -> Option<&Section> {
        self.index(coord).map(|i| &self.sections[i])
    }

    pub fn get_mut(&mut self, coord: Cell) -> Option<&mut Section> {
        self.index(coord).map(|i| &mut self.sections[i])
    }

    /// Install a freshly built section, returning the one it replaces.
    pub fn replace(&mut self, coord: Cell, section: Section) -> Result<Section> {
        let idx = self
            .index(coord)
            .ok_or(CarouselError::SectionOutOfBounds {
                x: coord.x,
                z: coord.z,
            })?;
        Ok(std::mem::replace(&mut self.sections[idx], section))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, &Section)> {
        let width = self.width.max(1);
        self.sections
            .iter()
            .enumerate()
            .map(move |(i, s)| (Cell::new(i as i32 % width, i as i32 / width), s))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.sections.iter_mut()
    }
}
