#![allow(dead_code)]

use flow_carousel::{
    Cell, Context, MapView,
    cgmath::{Vector2, Vector3},
    classify::{Atlas, MaterialFactory},
    data_structures::{
        material::{AssetDescriptor, AssetId, GraphicKind, MaterialHandle, Owner, OwnerKind, UvRect},
        section::QuadMeta,
    },
    resources::SectionBuilder,
};

/// Hands out fresh handles starting at `next` and remembers what it copied.
pub(crate) struct CountingFactory {
    next: u32,
    pub(crate) duplicated: Vec<MaterialHandle>,
}

impl CountingFactory {
    pub(crate) fn new() -> Self {
        Self {
            next: 10_000,
            duplicated: Vec::new(),
        }
    }
}

impl Default for CountingFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialFactory for CountingFactory {
    fn duplicate(&mut self, source: MaterialHandle) -> MaterialHandle {
        self.duplicated.push(source);
        let handle = MaterialHandle(self.next);
        self.next += 1;
        handle
    }
}

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
    (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4 && (a.z - b.z).abs() < 1e-4
}

pub(crate) fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
    assert!(close(a, b), "{:?} != {:?}", a, b);
}

pub(crate) const ROTATING: MaterialHandle = MaterialHandle(1);
pub(crate) const ROTATING_ASSET: AssetId = AssetId(1);
pub(crate) const SHADOW: MaterialHandle = MaterialHandle(2);

/// A context that knows one sprite asset turned with the view and the shadow
/// material, both already classified.
pub(crate) fn rotating_context() -> Context {
    let mut ctx = Context::new(Default::default()).unwrap();
    ctx.set_shadow_material(SHADOW);
    ctx.register_asset(AssetDescriptor::new(
        ROTATING_ASSET,
        GraphicKind::Single {
            draw_rotated: false,
        },
    ));
    let mut factory = CountingFactory::new();
    ctx.classify(
        ROTATING,
        Some(ROTATING_ASSET),
        Owner::fixed(OwnerKind::Building),
        &mut factory,
    )
    .unwrap();
    ctx.classify(SHADOW, None, Owner::default(), &mut factory)
        .unwrap();
    ctx
}

/// Every section of `map` gets one rotating plane per cell-sized spot at its
/// center and a shadow quad, all placed in world cell coordinates.
pub(crate) fn fill_map(ctx: &Context, map: &mut MapView) {
    let size = ctx.config.section_size as f32;
    let bounds = map.bounds();
    for coord in bounds.cells() {
        let origin = Vector3::new(coord.x as f32 * size, 0.0, coord.z as f32 * size);
        let center = origin + Vector3::new(3.5, 0.0, 1.5);
        let mut builder = SectionBuilder::new().with_shadow_material(SHADOW);
        builder
            .print_plane(
                ROTATING,
                center,
                Vector2::new(1.0, 2.0),
                UvRect::UNIT,
                QuadMeta::Center(center),
            )
            .print_shadow(
                [
                    origin,
                    origin + Vector3::new(0.0, 0.0, 1.0),
                    origin + Vector3::new(1.0, 0.0, 1.0),
                    origin + Vector3::new(1.0, 0.0, 0.0),
                    origin + Vector3::new(0.5, 0.0, 0.5),
                ],
                Vector3::new(0.0, 0.0, 0.4),
            );
        let _ = map.sections.replace(coord, builder.finish());
    }
}

pub(crate) fn atlas(source: u32, first_entry: u32) -> Atlas {
    Atlas {
        source: MaterialHandle(source),
        entries: std::array::from_fn(|i| MaterialHandle(first_entry + i as u32)),
    }
}

/// Positions of the rendered copy of `material` in the section at `coord`.
pub(crate) fn rendered_positions(
    map: &MapView,
    coord: Cell,
    material: MaterialHandle,
) -> Vec<Vector3<f32>> {
    map.sections
        .get(coord)
        .and_then(|s| s.sub_mesh(material))
        .map(|m| m.rendered().iter().map(|v| v.position()).collect())
        .unwrap_or_default()
}

/// UVs of the rendered copy of `material` in the section at `coord`.
pub(crate) fn rendered_uvs(
    map: &MapView,
    coord: Cell,
    material: MaterialHandle,
) -> Vec<Vector2<f32>> {
    map.sections
        .get(coord)
        .and_then(|s| s.sub_mesh(material))
        .map(|m| m.rendered().iter().map(|v| v.uv()).collect())
        .unwrap_or_default()
}
