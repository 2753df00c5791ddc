use cgmath::{Vector2, Vector3};

use crate::data_structures::{
    material::{MaterialHandle, UvRect},
    section::{QuadMeta, Section, SubMesh},
};

#[derive(Debug, Default)]
struct Printed {
    vertices: Vec<Vector3<f32>>,
    uvs: Vec<Vector2<f32>>,
    meta: Vec<QuadMeta>,
}

/**
 * Prints the quads of one section, one sub-mesh per material.
 *
 * Every quad is recorded together with its metadata so the buffers always keep
 * one meta entry per 4 vertices (5 for shadows). `finish` hands out a section
 * whose rendered buffers start out as the authored geometry.
 */
#[derive(Debug, Default)]
pub struct SectionBuilder {
    shadow_material: Option<MaterialHandle>,
    printed: Vec<(MaterialHandle, Printed)>,
}

impl SectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shadow_material(mut self, material: MaterialHandle) -> Self {
        self.shadow_material = Some(material);
        self
    }

    fn target(&mut self, material: MaterialHandle) -> &mut Printed {
        let idx = match self.printed.iter().position(|(m, _)| *m == material) {
            Some(idx) => idx,
            None => {
                self.printed.push((material, Printed::default()));
                self.printed.len() - 1
            }
        };
        &mut self.printed[idx].1
    }

    /// Flat `size.x` × `size.y` plane centered on `center`, lying on the
    /// `x`/`z` plane at the center's height.
    pub fn print_plane(
        &mut self,
        material: MaterialHandle,
        center: Vector3<f32>,
        size: Vector2<f32>,
        uvs: UvRect,
        meta: QuadMeta,
    ) -> &mut Self {
        let (hw, hh) = (size.x / 2.0, size.y / 2.0);
        let corners = [
            Vector3::new(center.x - hw, center.y, center.z - hh),
            Vector3::new(center.x - hw, center.y, center.z + hh),
            Vector3::new(center.x + hw, center.y, center.z + hh),
            Vector3::new(center.x + hw, center.y, center.z - hh),
        ];
        self.print_quad(material, corners, uvs.corners(), meta)
    }

    pub fn print_quad(
        &mut self,
        material: MaterialHandle,
        corners: [Vector3<f32>; 4],
        uvs: [Vector2<f32>; 4],
        meta: QuadMeta,
    ) -> &mut Self {
        let printed = self.target(material);
        printed.vertices.extend(corners);
        printed.uvs.extend(uvs);
        printed.meta.push(meta);
        self
    }

    /// Five-vertex soft shadow quad cast with `offset` from its caster. Dropped
    /// with a warning when no shadow material was set.
    pub fn print_shadow(&mut self, corners: [Vector3<f32>; 5], offset: Vector3<f32>) -> &mut Self {
        let Some(material) = self.shadow_material else {
            log::warn!("Dropping shadow quad: the builder has no shadow material");
            return self;
        };
        let printed = self.target(material);
        printed.vertices.extend(corners);
        printed.meta.push(QuadMeta::Shadow(offset));
        self
    }

    /// The rendered buffers start out as the authored ones, unmirrored and
    /// facing north. [`crate::Context::install_section`] brings them to the
    /// displayed orientation.
    pub fn finish(self) -> Section {
        Section {
            sub_meshes: self
                .printed
                .into_iter()
                .map(|(material, p)| SubMesh::from_parts(material, p.vertices, p.uvs, p.meta))
                .collect(),
        }
    }
}
