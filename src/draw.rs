//! Draw-time hooks for geometry that is not baked into section buffers.
//!
//! The host calls into this module right before submitting draws:
//!
//! - [`DrawInterceptor`] rotates the model matrix of a dynamically drawn object
//!   (entities, overlays) about the object's center by the eased view angle
//! - [`draw_material`] picks the texture a swapped or auto-tiling sprite must
//!   be drawn with for the committed view orientation
//! - [`draw_offset`] keeps linked corner fillers on the top edge of their wall

use std::ops::{Deref, DerefMut};

use cgmath::{Matrix4, Vector3};

use crate::{
    classify::Classifier,
    data_structures::material::{MaterialHandle, Strategy},
    math::{Rot4, planar_rotation, rotate_planar},
};

/// Rotate `matrix` about `center` (on the flat plane) by `angle` degrees:
/// translate to the center, rotate, translate back.
pub fn rotate_draw_matrix(matrix: Matrix4<f32>, angle: f32, center: Vector3<f32>) -> Matrix4<f32> {
    let mut m = matrix;
    m.w.x -= center.x;
    m.w.z -= center.z;
    m = planar_rotation(angle) * m;
    m.w.x += center.x;
    m.w.z += center.z;
    m
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DrawScope {
    angle: f32,
    center: Vector3<f32>,
}

/// Rotates the draw matrices of one dynamic object at a time.
///
/// A scope is opened while one object draws. Scopes don't nest: opening a
/// scope while another is active keeps the outer one, so a composite object
/// (a body drawing its parts) turns about a single center.
#[derive(Debug, Default)]
pub struct DrawInterceptor {
    active: Option<DrawScope>,
    shadow_material: Option<MaterialHandle>,
}

impl DrawInterceptor {
    pub fn new(shadow_material: Option<MaterialHandle>) -> Self {
        Self {
            active: None,
            shadow_material,
        }
    }

    pub fn set_shadow_material(&mut self, material: Option<MaterialHandle>) {
        self.shadow_material = material;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Open a scope. Returns `false` (and changes nothing) when one is open.
    pub fn begin(&mut self, angle: f32, center: Vector3<f32>) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(DrawScope { angle, center });
        true
    }

    pub fn end(&mut self) {
        self.active = None;
    }

    /// Open a scope closed again when the guard drops.
    pub fn scope(&mut self, angle: f32, center: Vector3<f32>) -> ScopeGuard<'_> {
        let opened = self.begin(angle, center);
        ScopeGuard {
            interceptor: self,
            opened,
        }
    }

    /// The matrix to actually draw with. Unchanged outside a scope and for the
    /// soft-shadow material, whose geometry is already offset for the view.
    pub fn intercept(&self, matrix: Matrix4<f32>, material: MaterialHandle) -> Matrix4<f32> {
        match self.active {
            Some(scope) if Some(material) != self.shadow_material => {
                rotate_draw_matrix(matrix, scope.angle, scope.center)
            }
            _ => matrix,
        }
    }
}

/// Closes the scope it opened on drop.
pub struct ScopeGuard<'a> {
    interceptor: &'a mut DrawInterceptor,
    opened: bool,
}

impl Deref for ScopeGuard<'_> {
    type Target = DrawInterceptor;

    fn deref(&self) -> &Self::Target {
        self.interceptor
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interceptor
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if self.opened {
            self.interceptor.end();
        }
    }
}

/// Rotate the four link-direction bits right by `by` quarter turns.
pub fn rotate_link_bits(link: u8, by: Rot4) -> u8 {
    let off = by.index() as u32;
    let link = (link & 0xf) as u32;
    (((link >> off) | (link << ((4 - off) % 4))) & 0xf) as u8
}

/// The material to draw `material` with when the visible sections are rotated
/// to `committed` degrees.
pub fn draw_material(
    classifier: &Classifier,
    material: MaterialHandle,
    committed: f32,
) -> MaterialHandle {
    match classifier.strategy(material) {
        Strategy::ExchangeVertices { asset, base } | Strategy::MirrorAware { asset, base } => {
            let Some(mats) = classifier
                .asset(asset)
                .and_then(|a| a.orientation_materials)
            else {
                return material;
            };
            let view = Rot4::from_angle(-committed);
            mats[base.rotated(view).index() as usize]
        }
        Strategy::Linked { source, link } => {
            let rotated = rotate_link_bits(link, Rot4::from_angle(committed));
            match classifier.atlas(source) {
                Some(atlas) => atlas.entries[rotated as usize],
                None => material,
            }
        }
        _ => material,
    }
}

/// Draw offset of a sub-mesh. Corner fillers are printed shifted up by
/// `shift`; that shift is turned with the view so the filler stays on the top
/// edge of its wall as seen on screen.
pub fn draw_offset(
    classifier: &Classifier,
    material: MaterialHandle,
    offset: Vector3<f32>,
    current: f32,
    shift: f32,
) -> Vector3<f32> {
    if !classifier.is_corner_filler(material) {
        return offset;
    }
    let up = Vector3::new(0.0, 0.0, shift);
    offset - up + rotate_planar(up, current)
}
