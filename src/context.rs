//! The session context: configuration plus everything shared by the maps of
//! one session (classification tables, transform scratch buffers, the draw
//! interceptor).
//!
//! Per-map state lives in [`MapView`]. The host drives both through the
//! [`Context`] entry points:
//!
//! - [`Context::tick`] once per displayed frame and map
//! - [`Context::rotate_by`] on a rotation command
//! - [`Context::on_section_built`] whenever a section was freshly authored
//! - [`Context::intercept`], [`Context::draw_material`] and
//!   [`Context::draw_offset`] while drawing
//! - [`Context::on_load`] after a map was loaded

use anyhow::Context as _;
use cgmath::{Matrix4, Vector3};

use crate::{
    classify::{Atlas, Classified, Classifier, MaterialFactory},
    controller::RotationController,
    data_structures::{
        material::{AssetDescriptor, AssetId, AtlasGroup, MaterialHandle, Owner},
        section::{Section, SectionGrid},
    },
    draw::{self, DrawInterceptor, ScopeGuard},
    error::{CarouselError, Result},
    math::{Cell, CellRect},
    scheduler::{StepReport, viewport_rect},
    transform::TransformEngine,
};

/// Tunables of the rotation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CarouselConfig {
    /// Frames one quarter turn takes.
    pub anim_frames: u32,
    /// Frame at which every viewport section is rewritten at once.
    pub viewport_lock_frame: u32,
    /// Edge length of a section, in cells.
    pub section_size: i32,
    /// Viewport size, in sections, captured on every rotation command.
    pub viewport_size: (i32, i32),
    /// Upward shift linked corner fillers are printed with.
    pub corner_filler_shift: f32,
    /// Atlas groups whose batched meshes are rewritten per quad.
    pub eligible_atlas_groups: Vec<AtlasGroup>,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            anim_frames: 8,
            viewport_lock_frame: 5,
            section_size: 17,
            viewport_size: (4, 3),
            corner_filler_shift: 0.09,
            eligible_atlas_groups: vec![AtlasGroup::Plant, AtlasGroup::Building, AtlasGroup::Item],
        }
    }
}

impl CarouselConfig {
    pub fn validate(&self) -> Result<()> {
        if self.anim_frames < 2 {
            return Err(CarouselError::InvalidConfig(format!(
                "anim_frames must be at least 2, got {}",
                self.anim_frames
            )));
        }
        if self.viewport_lock_frame >= self.anim_frames {
            return Err(CarouselError::InvalidConfig(format!(
                "viewport_lock_frame {} must be below anim_frames {}",
                self.viewport_lock_frame, self.anim_frames
            )));
        }
        if self.section_size <= 0 || self.viewport_size.0 <= 0 || self.viewport_size.1 <= 0 {
            return Err(CarouselError::InvalidConfig(
                "section and viewport sizes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rotation state and section geometry of one viewed map.
#[derive(Debug, Clone)]
pub struct MapView {
    pub rotation: RotationController,
    pub sections: SectionGrid,
}

impl MapView {
    pub fn bounds(&self) -> CellRect {
        self.sections.bounds()
    }
}

/// What one [`Context::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    /// The eased angle to draw this frame with.
    pub angle: f32,
    /// The scheduler step, if the map was animating.
    pub step: Option<StepReport>,
    /// Sub-meshes rewritten this frame.
    pub rewritten: usize,
}

#[derive(Debug)]
pub struct Context {
    pub config: CarouselConfig,
    pub classifier: Classifier,
    pub(crate) engine: TransformEngine,
    pub(crate) draw: DrawInterceptor,
}

impl Context {
    pub fn new(config: CarouselConfig) -> anyhow::Result<Self> {
        config
            .validate()
            .context("Rejected carousel configuration")?;
        let classifier = Classifier::new(config.eligible_atlas_groups.clone());
        Ok(Self {
            config,
            classifier,
            engine: TransformEngine::new(),
            draw: DrawInterceptor::default(),
        })
    }

    /// A map of `width` × `height` sections, facing north.
    pub fn new_map(&self, width: i32, height: i32) -> MapView {
        MapView {
            rotation: RotationController::new(
                self.config.anim_frames,
                self.config.viewport_lock_frame,
            ),
            sections: SectionGrid::new(width, height),
        }
    }

    pub fn set_shadow_material(&mut self, material: MaterialHandle) {
        self.classifier.set_shadow_material(material);
        self.draw.set_shadow_material(Some(material));
    }

    pub fn register_asset(&mut self, asset: AssetDescriptor) {
        self.classifier.register_asset(asset);
    }

    pub fn register_atlas(&mut self, atlas: Atlas, factory: &mut dyn MaterialFactory) {
        self.classifier.register_atlas(atlas, factory);
    }

    /// Classify a material while printing. See [`Classifier::classify`].
    pub fn classify(
        &mut self,
        material: MaterialHandle,
        asset: Option<AssetId>,
        owner: Owner,
        factory: &mut dyn MaterialFactory,
    ) -> anyhow::Result<Classified> {
        self.classifier
            .classify(material, asset, owner, factory)
            .with_context(|| format!("Failed to classify material {:?}", material))
    }

    /// Drop every classification table, e.g. when content was reloaded.
    pub fn clear_classification(&mut self) {
        self.classifier.clear();
        self.draw.set_shadow_material(None);
    }

    /// The viewport, in sections, around the cell the camera looks at.
    pub fn viewport_for(&self, map: &MapView, camera_cell: Cell) -> CellRect {
        viewport_rect(
            camera_cell.section(self.config.section_size),
            self.config.viewport_size,
            &map.bounds(),
        )
    }

    /// Start turning `map` by `delta` degrees.
    pub fn rotate_by(&self, map: &mut MapView, delta: f32, camera_cell: Cell) {
        let viewport = self.viewport_for(map, camera_cell);
        map.rotation.rotate_by(delta, viewport);
    }

    /// Turn `map` back to north.
    pub fn reset_north(&self, map: &mut MapView, camera_cell: Cell) {
        let viewport = self.viewport_for(map, camera_cell);
        map.rotation.reset_north(viewport);
    }

    /// Advance `map` by one displayed frame.
    pub fn tick(&mut self, map: &mut MapView) -> FrameReport {
        let target = map.rotation.target();
        let bounds = map.bounds();
        let started = instant::Instant::now();
        let mut rewritten = 0;

        let sections = &mut map.sections;
        let engine = &mut self.engine;
        let classifier = &self.classifier;
        let step = map.rotation.advance_frame(&bounds, &mut |coord| {
            if let Some(section) = sections.get_mut(coord) {
                rewritten += engine.rewrite_section(section, classifier, target);
            }
        });

        if let Some(report) = step {
            let s = map.rotation.state();
            log::trace!(
                "Rotation step {}: {} sections done, cursor {}, quota {}, {} visited{} in {:?}",
                s.progress,
                s.sections_done,
                s.cursor,
                report.quota,
                report.processed,
                if report.locked { " (viewport lock)" } else { "" },
                started.elapsed()
            );
        }

        FrameReport {
            angle: map.rotation.current(),
            step,
            rewritten,
        }
    }

    /// The section at `coord` was freshly authored. Rewrite it for the target
    /// orientation right away. Inside the viewport before the lock frame the
    /// rest of the viewport still shows the committed orientation, so the
    /// section is brought to that one and the lock frame turns it with its
    /// neighbours.
    pub fn on_section_built(&mut self, map: &mut MapView, coord: Cell) -> anyhow::Result<usize> {
        let angle = if map.rotation.defers(coord) {
            map.rotation.committed()
        } else {
            map.rotation.target()
        };
        let section = map
            .sections
            .get_mut(coord)
            .ok_or(CarouselError::SectionOutOfBounds {
                x: coord.x,
                z: coord.z,
            })
            .with_context(|| format!("Can't refresh rebuilt section {:?}", coord))?;
        Ok(self
            .engine
            .rewrite_section(section, &self.classifier, angle))
    }

    /// Install a freshly built section and refresh it.
    pub fn install_section(
        &mut self,
        map: &mut MapView,
        coord: Cell,
        section: Section,
    ) -> anyhow::Result<usize> {
        map.sections
            .replace(coord, section)
            .with_context(|| format!("Can't install section {:?}", coord))?;
        self.on_section_built(map, coord)
    }

    /// Open a draw scope for one dynamic object centered at `center`.
    pub fn begin_draw(&mut self, map: &MapView, center: Vector3<f32>) -> bool {
        self.draw.begin(map.rotation.current(), center)
    }

    pub fn end_draw(&mut self) {
        self.draw.end();
    }

    /// Like [`Context::begin_draw`], closed when the guard drops.
    pub fn draw_scope(&mut self, map: &MapView, center: Vector3<f32>) -> ScopeGuard<'_> {
        self.draw.scope(map.rotation.current(), center)
    }

    pub fn intercept(&self, matrix: Matrix4<f32>, material: MaterialHandle) -> Matrix4<f32> {
        self.draw.intercept(matrix, material)
    }

    pub fn draw_material(&self, map: &MapView, material: MaterialHandle) -> MaterialHandle {
        draw::draw_material(&self.classifier, material, map.rotation.committed())
    }

    pub fn draw_offset(
        &self,
        map: &MapView,
        material: MaterialHandle,
        offset: Vector3<f32>,
    ) -> Vector3<f32> {
        draw::draw_offset(
            &self.classifier,
            material,
            offset,
            map.rotation.current(),
            self.config.corner_filler_shift,
        )
    }

    /// A loaded map always faces north: drop any rotation and rewrite every
    /// section as it is displayed facing north (mirrored sides included).
    pub fn on_load(&mut self, map: &mut MapView) {
        map.rotation.reset();
        self.draw.end();
        for section in map.sections.iter_mut() {
            self.engine.rewrite_section(section, &self.classifier, 0.0);
        }
    }
}
