use flow_carousel::{
    CarouselConfig, CarouselError, Cell, Context, MapView, Rot4,
    cgmath::{Matrix4, Vector2, Vector3, Vector4},
    data_structures::material::{
        AssetDescriptor, AssetId, FlipBits, GraphicKind, MaterialHandle, Owner, OwnerKind, UvRect,
    },
    data_structures::section::{QuadMeta, Section},
    resources::SectionBuilder,
    transform::{TransformEngine, assign_uvs},
};

use crate::common::test_utils::{
    CountingFactory, ROTATING, SHADOW, assert_close, fill_map, init_logger, rendered_positions,
    rendered_uvs, rotating_context,
};

mod common;

#[test]
fn default_config_is_valid() {
    assert_eq!(CarouselConfig::default().validate(), Ok(()));
}

#[test]
fn bad_config_is_rejected() {
    let lock_too_late = CarouselConfig {
        viewport_lock_frame: 8,
        ..Default::default()
    };
    assert!(matches!(
        lock_too_late.validate(),
        Err(CarouselError::InvalidConfig(_))
    ));
    let no_frames = CarouselConfig {
        anim_frames: 1,
        viewport_lock_frame: 0,
        ..Default::default()
    };
    assert!(no_frames.validate().is_err());
    let empty_viewport = CarouselConfig {
        viewport_size: (0, 3),
        ..Default::default()
    };
    assert!(empty_viewport.validate().is_err());
    assert!(Context::new(lock_too_late).is_err());
}

#[test]
fn viewport_is_fully_rotated_at_the_lock_frame() {
    init_logger();
    let mut ctx = rotating_context();
    let mut map = ctx.new_map(12, 9);
    fill_map(&ctx, &mut map);
    let reference = map.clone();

    let camera = Cell::new(6 * 17 + 3, 4 * 17 + 8);
    ctx.rotate_by(&mut map, 90.0, camera);
    let viewport = map.rotation.viewport();
    assert_eq!(viewport.area(), 12);

    let lock = ctx.config.viewport_lock_frame;
    for _ in 0..=lock {
        ctx.tick(&mut map);
    }
    assert_eq!(map.rotation.committed(), 90.0);

    let mut engine = TransformEngine::new();
    for coord in viewport.cells() {
        let mut expected = reference.sections.get(coord).cloned().unwrap_or_default();
        engine.rewrite_section(&mut expected, &ctx.classifier, 90.0);
        for material in [ROTATING, SHADOW] {
            let want: Vec<_> = expected
                .sub_mesh(material)
                .map(|m| m.rendered().iter().map(|v| v.position()).collect())
                .unwrap_or_default();
            assert_eq!(rendered_positions(&map, coord, material), want, "{:?}", coord);
        }
    }
}

#[test]
fn whole_map_is_rotated_once_the_animation_settles() {
    let mut ctx = rotating_context();
    let mut map = ctx.new_map(10, 6);
    fill_map(&ctx, &mut map);
    let reference = map.clone();

    ctx.rotate_by(&mut map, -90.0, Cell::new(0, 0));
    let mut frames = 0;
    let mut rewritten = 0;
    loop {
        let report = ctx.tick(&mut map);
        rewritten += report.rewritten;
        if report.step.is_none() {
            assert_eq!(report.angle, 270.0);
            break;
        }
        frames += 1;
    }
    assert_eq!(frames, ctx.config.anim_frames);
    assert_eq!(rewritten, 2 * map.sections.len());

    let mut engine = TransformEngine::new();
    for (coord, section) in reference.sections.iter() {
        let mut expected = section.clone();
        engine.rewrite_section(&mut expected, &ctx.classifier, 270.0);
        assert_eq!(map.sections.get(coord), Some(&expected));
    }
}

#[test]
fn commands_without_a_quarter_turn_still_finish_the_whole_map() {
    let mut ctx = rotating_context();
    let mut map = ctx.new_map(10, 6);
    fill_map(&ctx, &mut map);
    let reference = map.clone();

    ctx.rotate_by(&mut map, 90.0, Cell::new(0, 0));
    ctx.tick(&mut map);
    ctx.tick(&mut map);
    ctx.rotate_by(&mut map, 0.0, Cell::new(60, 40));
    ctx.rotate_by(&mut map, 30.0, Cell::new(60, 40));
    for _ in 0..20 {
        ctx.tick(&mut map);
    }
    assert_eq!(map.rotation.current(), 90.0);
    assert_eq!(map.rotation.committed(), 90.0);

    let mut engine = TransformEngine::new();
    for (coord, section) in reference.sections.iter() {
        let mut expected = section.clone();
        engine.rewrite_section(&mut expected, &ctx.classifier, 90.0);
        assert_eq!(map.sections.get(coord), Some(&expected), "{:?}", coord);
    }
}

#[test]
fn repeated_north_reset_finishes_the_first_one() {
    let mut ctx = rotating_context();
    let mut map = ctx.new_map(10, 6);
    fill_map(&ctx, &mut map);
    let reference = map.clone();

    ctx.rotate_by(&mut map, 180.0, Cell::new(0, 0));
    settle(&mut ctx, &mut map);
    ctx.reset_north(&mut map, Cell::new(0, 0));
    ctx.tick(&mut map);
    ctx.reset_north(&mut map, Cell::new(0, 0));
    settle(&mut ctx, &mut map);
    assert_eq!(map.rotation.committed(), 0.0);

    let mut engine = TransformEngine::new();
    for (coord, section) in reference.sections.iter() {
        let mut expected = section.clone();
        engine.rewrite_section(&mut expected, &ctx.classifier, 0.0);
        assert_eq!(map.sections.get(coord), Some(&expected), "{:?}", coord);
    }
}

#[test]
fn rebuilt_sections_match_what_their_neighbours_show() {
    let mut ctx = rotating_context();
    let mut map = ctx.new_map(10, 6);
    ctx.rotate_by(&mut map, 90.0, Cell::new(0, 0));
    let viewport = map.rotation.viewport();

    let center = Vector3::new(0.5, 0.0, 0.5);
    let section = || {
        let mut builder = SectionBuilder::new();
        builder.print_plane(
            ROTATING,
            center,
            Vector2::new(1.0, 1.0),
            UvRect::UNIT,
            QuadMeta::Center(center),
        );
        builder.finish()
    };

    // The viewport still shows the committed angle until the lock frame.
    let inside = viewport.cells().next().unwrap();
    assert_eq!(ctx.install_section(&mut map, inside, section()).unwrap(), 1);
    let outside = Cell::new(9, 5);
    assert!(!viewport.contains(outside));
    assert_eq!(ctx.install_section(&mut map, outside, section()).unwrap(), 1);
    let authored = section().sub_meshes[0].vertices.clone();
    assert_eq!(rendered_positions(&map, inside, ROTATING), authored);
    assert_ne!(rendered_positions(&map, outside, ROTATING), authored);

    assert!(ctx.install_section(&mut map, Cell::new(10, 0), section()).is_err());
}

const MIRRORED_ASSET: AssetId = AssetId(7);

/// A context that also knows a texture-swap sprite whose east side is the
/// west texture mirrored, and the material an east-facing one is printed with.
fn mirrored_context() -> (Context, MaterialHandle) {
    let mut ctx = rotating_context();
    ctx.register_asset(AssetDescriptor::new(
        MIRRORED_ASSET,
        GraphicKind::Multi {
            draw_rotated: false,
            flip: FlipBits {
                east: true,
                west: false,
            },
        },
    ));
    let printed = ctx
        .classify(
            MaterialHandle(40),
            Some(MIRRORED_ASSET),
            Owner::new(OwnerKind::Building, Rot4::East),
            &mut CountingFactory::new(),
        )
        .unwrap();
    assert_ne!(printed.material, MaterialHandle(40));
    (ctx, printed.material)
}

fn mirrored_section(ctx: &Context, coord: Cell, material: MaterialHandle) -> Section {
    let size = ctx.config.section_size as f32;
    let center = Vector3::new(coord.x as f32 * size + 2.5, 0.0, coord.z as f32 * size + 4.5);
    let mut builder = SectionBuilder::new();
    builder.print_plane(
        material,
        center,
        Vector2::new(1.0, 1.0),
        UvRect::UNIT,
        QuadMeta::None,
    );
    builder.finish()
}

fn settle(ctx: &mut Context, map: &mut MapView) {
    for _ in 0..=ctx.config.anim_frames {
        ctx.tick(map);
    }
    assert!(map.rotation.state().is_idle());
}

#[test]
fn loading_shows_mirrored_sides_as_when_built_facing_north() {
    let (mut ctx, material) = mirrored_context();
    let mut map = ctx.new_map(4, 4);
    let coord = Cell::new(1, 2);
    let mirrored = assign_uvs(UvRect::UNIT.corners(), true).to_vec();

    let section = mirrored_section(&ctx, coord, material);
    ctx.install_section(&mut map, coord, section).unwrap();
    assert_eq!(rendered_uvs(&map, coord, material), mirrored);
    let built_at_north = map.sections.get(coord).cloned().unwrap();

    // Turned a quarter, the east side is shown as north: not mirrored.
    ctx.rotate_by(&mut map, 90.0, Cell::new(0, 0));
    settle(&mut ctx, &mut map);
    assert_eq!(rendered_uvs(&map, coord, material), UvRect::UNIT.corners().to_vec());

    ctx.rotate_by(&mut map, 90.0, Cell::new(0, 0));
    ctx.tick(&mut map);
    ctx.on_load(&mut map);
    assert_eq!(rendered_uvs(&map, coord, material), mirrored);
    assert_eq!(map.sections.get(coord), Some(&built_at_north));
}

#[test]
fn sections_built_before_the_lock_show_the_committed_mirroring() {
    let (mut ctx, material) = mirrored_context();
    let mut map = ctx.new_map(10, 6);
    ctx.rotate_by(&mut map, 90.0, Cell::new(0, 0));
    ctx.tick(&mut map);
    let inside = map.rotation.viewport().cells().next().unwrap();
    assert!(map.rotation.defers(inside));

    let section = mirrored_section(&ctx, inside, material);
    assert_eq!(ctx.install_section(&mut map, inside, section).unwrap(), 1);
    assert_eq!(
        rendered_uvs(&map, inside, material),
        assign_uvs(UvRect::UNIT.corners(), true).to_vec()
    );

    settle(&mut ctx, &mut map);
    assert_eq!(map.rotation.committed(), 90.0);
    assert_eq!(rendered_uvs(&map, inside, material), UvRect::UNIT.corners().to_vec());
}

#[test]
fn loading_a_map_faces_north_again() {
    let mut ctx = rotating_context();
    let mut map = ctx.new_map(4, 4);
    fill_map(&ctx, &mut map);
    let reference = map.clone();

    ctx.rotate_by(&mut map, 90.0, Cell::new(0, 0));
    for _ in 0..3 {
        ctx.tick(&mut map);
    }
    ctx.on_load(&mut map);

    assert!(map.rotation.state().is_idle());
    assert_eq!(map.rotation.target(), 0.0);
    assert!(ctx.tick(&mut map).step.is_none());
    for (coord, _) in reference.sections.iter() {
        assert_eq!(
            rendered_positions(&map, coord, ROTATING),
            rendered_positions(&reference, coord, ROTATING)
        );
    }
}

#[test]
fn dynamic_draws_use_the_eased_angle() {
    let mut ctx = rotating_context();
    let mut map = ctx.new_map(4, 4);
    ctx.rotate_by(&mut map, 90.0, Cell::new(0, 0));
    for _ in 0..ctx.config.anim_frames + 1 {
        ctx.tick(&mut map);
    }
    assert_eq!(map.rotation.current(), 90.0);

    let center = Vector3::new(2.0, 0.0, 2.0);
    let m = Matrix4::from_translation(Vector3::new(3.0, 0.0, 2.0));
    let origin = |m: Matrix4<f32>| (m * Vector4::new(0.0, 0.0, 0.0, 1.0)).truncate();
    {
        let scope = ctx.draw_scope(&map, center);
        assert_close(origin(scope.intercept(m, ROTATING)), Vector3::new(2.0, 0.0, 3.0));
        assert_eq!(scope.intercept(m, SHADOW), m);
    }
    assert_eq!(ctx.intercept(m, ROTATING), m);

    assert!(ctx.begin_draw(&map, center));
    assert_ne!(ctx.intercept(m, ROTATING), m);
    ctx.end_draw();
    assert_eq!(ctx.draw_material(&map, MaterialHandle(12345)), MaterialHandle(12345));
    assert_eq!(
        ctx.draw_offset(&map, ROTATING, Vector3::new(1.0, 0.0, 1.0)),
        Vector3::new(1.0, 0.0, 1.0)
    );
}

#[test]
fn reset_north_goes_through_the_animation() {
    let ctx = rotating_context();
    let mut map = ctx.new_map(4, 4);
    ctx.rotate_by(&mut map, 180.0, Cell::new(0, 0));
    ctx.reset_north(&mut map, Cell::new(0, 0));
    assert_eq!(map.rotation.current(), 180.0);
    assert_eq!(map.rotation.target(), 0.0);
}

#[test]
fn classification_errors_carry_context() {
    let mut ctx = rotating_context();
    let err = ctx
        .classify(
            MaterialHandle(3),
            Some(flow_carousel::data_structures::material::AssetId(404)),
            Default::default(),
            &mut crate::common::test_utils::CountingFactory::new(),
        )
        .unwrap_err();
    assert!(format!("{:#}", err).contains("MaterialHandle(3)"));
    assert!(err.downcast_ref::<CarouselError>().is_some());
}
