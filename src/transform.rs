//! Geometry transform engine.
//!
//! Rewrites the rendered buffers of a [`SubMesh`] from its authored buffers for
//! a given view angle. Which rewrite applies is decided by the material's
//! [`Strategy`]:
//!
//! - `RotateAboutCenter` turns each quad about its stored center
//! - `ExchangeVertices` / `MirrorAware` / `Linked` keep the quad where it is but
//!   hand each logical corner the planar position of another corner, which is
//!   what a quarter-turned texture-swap sprite looks like; UVs mirror when the
//!   orientation shown is a flipped one
//! - `AtlasHybrid` decides per quad from its [`QuadMeta`]
//! - `ShadowOffset` shifts five-vertex shadow quads by how much their offset
//!   from the caster turned
//!
//! The engine owns grow-only scratch buffers so steady-state rewrites do not
//! allocate.

use std::collections::HashSet;

use cgmath::{Vector2, Vector3, Zero};

use crate::{
    classify::Classifier,
    data_structures::{
        material::{AssetId, FlipBits, MaterialHandle, Strategy},
        section::{QuadMeta, Section, SubMesh},
    },
    error::{CarouselError, Result},
    math::{Rot4, ensure_len, rotate_planar},
};

/// Vertex `i` of a quad takes the planar position of corner `(i + offset) % 4`
/// and keeps its own height.
pub fn exchange_corners(quad: [Vector3<f32>; 4], offset: Rot4) -> [Vector3<f32>; 4] {
    let off = offset.index() as usize;
    std::array::from_fn(|i| {
        let from = quad[(i + off) & 3];
        Vector3::new(from.x, quad[i].y, from.z)
    })
}

/// Corner UVs of a quad, reversed when the shown side is mirrored.
pub fn assign_uvs(uvs: [Vector2<f32>; 4], mirrored: bool) -> [Vector2<f32>; 4] {
    if mirrored {
        [uvs[3], uvs[2], uvs[1], uvs[0]]
    } else {
        uvs
    }
}

/// The orientation a four-way sprite authored at `base` shows once the view
/// has turned to `view`.
pub fn shown_facing(base: Rot4, view: Rot4) -> Rot4 {
    base.relative_to(view)
}

#[derive(Debug, Default)]
pub struct TransformEngine {
    positions: Vec<Vector3<f32>>,
    uvs: Vec<Vector2<f32>>,
    reported: HashSet<MaterialHandle>,
}

impl TransformEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scratch capacity in vertices.
    pub fn scratch_len(&self) -> usize {
        self.positions.len()
    }

    /// Rewrite every sub-mesh of `section`. A sub-mesh that fails is logged
    /// once per material and left as it was; the rest of the section is still
    /// rewritten. Returns the number of sub-meshes rewritten.
    pub fn rewrite_section(
        &mut self,
        section: &mut Section,
        classifier: &Classifier,
        angle: f32,
    ) -> usize {
        let mut rewritten = 0;
        for mesh in section.sub_meshes.iter_mut() {
            match self.rewrite(mesh, classifier, angle) {
                Ok(true) => rewritten += 1,
                Ok(false) => {}
                Err(e) => {
                    if self.reported.insert(mesh.material) {
                        log::error!("Skipping mesh rewrite: {}", e);
                    }
                }
            }
        }
        rewritten
    }

    /// Rewrite one sub-mesh for `angle`. Returns whether it was touched.
    pub fn rewrite(
        &mut self,
        mesh: &mut SubMesh,
        classifier: &Classifier,
        angle: f32,
    ) -> Result<bool> {
        let strategy = classifier.strategy(mesh.material);
        let Some(stride) = strategy.stride() else {
            return Ok(false);
        };
        if mesh.vertices.is_empty() {
            return Ok(false);
        }
        check_shape(mesh, stride)?;

        let len = mesh.vertices.len();
        ensure_len(&mut self.positions, len);
        ensure_len(&mut self.uvs, len);
        let view = Rot4::from_angle(angle);

        match strategy {
            Strategy::None => return Ok(false),
            Strategy::RotateAboutCenter => self.rotate_about_centers(mesh, angle),
            Strategy::ExchangeVertices { asset, base } | Strategy::MirrorAware { asset, base } => {
                let flip = classifier
                    .asset(asset)
                    .ok_or(CarouselError::UnknownAsset { asset })?
                    .flip();
                let mirrored = flip.mirrors(shown_facing(base, view));
                self.exchange(mesh, view, mirrored);
            }
            Strategy::Linked { .. } => self.exchange(mesh, view, false),
            Strategy::AtlasHybrid => self.atlas_hybrid(mesh, classifier, angle)?,
            Strategy::ShadowOffset => self.shift_shadows(mesh, angle),
        }

        mesh.write_rendered(&self.positions[..len], &self.uvs[..len]);
        Ok(true)
    }

    fn copy_quad(&mut self, mesh: &SubMesh, start: usize, stride: usize) {
        for i in start..start + stride {
            self.positions[i] = mesh.vertices[i];
            self.uvs[i] = mesh.authored_uv(i);
        }
    }

    fn rotate_quad(&mut self, mesh: &SubMesh, start: usize, center: Vector3<f32>, angle: f32) {
        for i in start..start + 4 {
            self.positions[i] = center + rotate_planar(mesh.vertices[i] - center, angle);
            self.uvs[i] = mesh.authored_uv(i);
        }
    }

    fn exchange_quad(&mut self, mesh: &SubMesh, start: usize, view: Rot4, uvs: [Vector2<f32>; 4]) {
        let quad = std::array::from_fn(|k| mesh.vertices[start + k]);
        for (k, p) in exchange_corners(quad, view).into_iter().enumerate() {
            self.positions[start + k] = p;
            self.uvs[start + k] = uvs[k];
        }
    }

    fn authored_quad_uvs(mesh: &SubMesh, start: usize) -> [Vector2<f32>; 4] {
        std::array::from_fn(|k| mesh.authored_uv(start + k))
    }

    fn rotate_about_centers(&mut self, mesh: &SubMesh, angle: f32) {
        for (q, meta) in mesh.meta.iter().enumerate() {
            let start = q * 4;
            match meta {
                QuadMeta::Center(c) => self.rotate_quad(mesh, start, *c, angle),
                _ => self.copy_quad(mesh, start, 4),
            }
        }
    }

    fn exchange(&mut self, mesh: &SubMesh, view: Rot4, mirrored: bool) {
        for q in 0..mesh.quad_count(4) {
            let start = q * 4;
            let uvs = assign_uvs(Self::authored_quad_uvs(mesh, start), mirrored);
            self.exchange_quad(mesh, start, view, uvs);
        }
    }

    fn atlas_hybrid(&mut self, mesh: &SubMesh, classifier: &Classifier, angle: f32) -> Result<()> {
        let view = Rot4::from_angle(angle);
        for (q, meta) in mesh.meta.iter().enumerate() {
            let start = q * 4;
            match *meta {
                QuadMeta::None | QuadMeta::Shadow(_) => self.copy_quad(mesh, start, 4),
                QuadMeta::Center(c) => self.rotate_quad(mesh, start, c, angle),
                QuadMeta::Exchange { asset, base, flip } => {
                    let uvs = Self::atlas_uvs(mesh, start, classifier, asset, base, flip, view)?;
                    self.exchange_quad(mesh, start, view, uvs);
                }
            }
        }
        Ok(())
    }

    /// UVs of a batched four-way sprite quad: the atlas rectangle of the
    /// orientation now shown, mirrored when that side is a flipped one.
    fn atlas_uvs(
        mesh: &SubMesh,
        start: usize,
        classifier: &Classifier,
        asset: AssetId,
        base: Rot4,
        flip: FlipBits,
        view: Rot4,
    ) -> Result<[Vector2<f32>; 4]> {
        let desc = classifier
            .asset(asset)
            .ok_or(CarouselError::UnknownAsset { asset })?;
        let facing = shown_facing(base, view);
        let uvs = match desc.orientation_uvs {
            Some(rects) => rects[facing.index() as usize].corners(),
            None => Self::authored_quad_uvs(mesh, start),
        };
        Ok(assign_uvs(uvs, flip.mirrors(facing)))
    }

    fn shift_shadows(&mut self, mesh: &SubMesh, angle: f32) {
        for (q, meta) in mesh.meta.iter().enumerate() {
            let start = q * 5;
            let offset = match meta {
                QuadMeta::Shadow(o) | QuadMeta::Center(o) => *o,
                _ => Vector3::zero(),
            };
            if offset.is_zero() {
                self.copy_quad(mesh, start, 5);
                continue;
            }
            let shift = rotate_planar(offset, angle) - offset;
            for i in start..start + 5 {
                self.positions[i] = mesh.vertices[i] + shift;
                self.uvs[i] = mesh.authored_uv(i);
            }
        }
    }
}

fn check_shape(mesh: &SubMesh, stride: usize) -> Result<()> {
    let vertices = mesh.vertices.len();
    if vertices % stride != 0 || mesh.meta.len() * stride != vertices {
        return Err(CarouselError::BufferShape {
            material: mesh.material,
            vertices,
            quads: mesh.meta.len(),
            stride,
        });
    }
    Ok(())
}
