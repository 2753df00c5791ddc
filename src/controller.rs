//! Rotation controller: the per-world rotation state machine.
//!
//! The controller is `Idle` while `current == target` and `Animating`
//! otherwise. [`RotationController::rotate_by`] commits whatever animation is
//! in flight and starts a new one towards the next quarter turn;
//! [`RotationController::advance_frame`] eases `current` towards `target` with
//! a quadratic ease-in over `anim_frames` frames and drives the
//! [`Scheduler`] once per animated frame.

use crate::{
    math::{Cell, CellRect, delta_angle, positive_mod, snap_quarter},
    scheduler::{Scheduler, StepReport},
};

/// Rotation state of one viewed world.
///
/// Not persisted: a loaded world always starts facing north.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    /// Eased angle used for drawing, in degrees.
    pub current: f32,
    /// Angle the running animation started from.
    pub start: f32,
    /// Angle the running animation ends at; always a multiple of 90°.
    pub target: f32,
    /// Target the visible sections were last rewritten for.
    pub committed: f32,
    /// Frames since the last rotation command.
    pub progress: u32,
    /// Off-viewport sections rewritten by the running animation.
    pub sections_done: usize,
    /// Scan position of the scheduler.
    pub cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Animating,
}

impl RotationState {
    pub fn phase(&self) -> Phase {
        if self.current == self.target {
            Phase::Idle
        } else {
            Phase::Animating
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == Phase::Idle
    }
}

#[derive(Debug, Clone)]
pub struct RotationController {
    state: RotationState,
    viewport: CellRect,
    scheduler: Scheduler,
    anim_frames: u32,
}

impl RotationController {
    pub fn new(anim_frames: u32, lock_frame: u32) -> Self {
        Self {
            state: RotationState::default(),
            viewport: CellRect::default(),
            scheduler: Scheduler::new(anim_frames, lock_frame),
            anim_frames,
        }
    }

    pub fn state(&self) -> &RotationState {
        &self.state
    }

    pub fn current(&self) -> f32 {
        self.state.current
    }

    pub fn target(&self) -> f32 {
        self.state.target
    }

    pub fn committed(&self) -> f32 {
        self.state.committed
    }

    /// The viewport captured by the last rotation command, in sections.
    pub fn viewport(&self) -> CellRect {
        self.viewport
    }

    /// Whether a section freshly built now would be rewritten again by the
    /// coming viewport lock, making an immediate rewrite wasted work.
    pub fn defers(&self, coord: Cell) -> bool {
        !self.state.is_idle()
            && self.state.progress < self.scheduler.lock_frame()
            && self.viewport.contains(coord)
    }

    /// Start turning the view by `delta` degrees (snapped to a quarter turn).
    ///
    /// Any animation in flight is committed immediately and its remaining
    /// off-screen work dropped. A delta that snaps to no turn at all changes
    /// nothing, so an animation in flight keeps running to completion.
    pub fn rotate_by(&mut self, delta: f32, viewport: CellRect) {
        let step = positive_mod(snap_quarter(delta), 360.0);
        if step == 0.0 {
            log::debug!("Ignoring rotation by {} (no quarter turn)", delta);
            return;
        }
        let s = &mut self.state;
        s.current = s.target;
        s.start = s.current;
        s.progress = 0;
        s.sections_done = 0;
        s.cursor = 0;
        s.target = positive_mod(s.target + step, 360.0);
        self.viewport = viewport;
        log::debug!(
            "Rotating view from {} to {} (viewport {:?})",
            s.start,
            s.target,
            viewport
        );
    }

    /// Rotate back to north through the normal animation.
    pub fn reset_north(&mut self, viewport: CellRect) {
        self.rotate_by(-self.state.target, viewport);
    }

    /// Drop all state, as after loading a world.
    pub fn reset(&mut self) {
        self.state = RotationState::default();
        self.viewport = CellRect::default();
    }

    /// The eased angle for animation frame `progress`.
    pub fn eased_angle(&self, progress: u32) -> f32 {
        let s = &self.state;
        if progress >= self.anim_frames {
            return s.target;
        }
        let dist = delta_angle(s.start, s.target);
        let p = progress as f32;
        let n = self.anim_frames as f32;
        positive_mod(s.start + p * p * dist / (n * n), 360.0)
    }

    /// Advance one displayed frame. Updates `current`, then, while animating,
    /// runs one scheduler step over `bounds` calling `visit` per section.
    ///
    /// Returns `None` when idle.
    pub fn advance_frame(
        &mut self,
        bounds: &CellRect,
        visit: &mut dyn FnMut(Cell),
    ) -> Option<StepReport> {
        self.state.current = self.eased_angle(self.state.progress);
        if self.state.is_idle() {
            return None;
        }
        let report = self
            .scheduler
            .step(&mut self.state, &self.viewport, bounds, visit);
        self.state.progress += 1;
        Some(report)
    }
}
