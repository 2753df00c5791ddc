//! Section refresh scheduling.
//!
//! Spreads the rewrite of every section over the frames of one rotation
//! animation. Sections outside the captured viewport trickle in at a fixed
//! quota per frame in row-major scan order; the sections inside the viewport
//! are all rewritten together on the viewport-lock frame, which is the moment
//! the visible area switches to the new orientation.

use crate::{
    controller::RotationState,
    math::{Cell, CellRect},
};

/// What one scheduler step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    /// Off-viewport sections allowed per frame for this animation.
    pub quota: usize,
    /// Sections handed to the visitor this step.
    pub processed: usize,
    /// Whether this was the viewport-lock frame.
    pub locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    anim_frames: u32,
    lock_frame: u32,
}

impl Scheduler {
    pub fn new(anim_frames: u32, lock_frame: u32) -> Self {
        Self {
            anim_frames,
            lock_frame,
        }
    }

    pub fn lock_frame(&self) -> u32 {
        self.lock_frame
    }

    /// Sections of `bounds` outside the (clipped) viewport.
    pub fn outside_count(bounds: &CellRect, viewport: &CellRect) -> usize {
        bounds
            .area()
            .saturating_sub(viewport.clipped_to(bounds).area())
    }

    /// Per-frame quota: the outside work spread over every frame but the lock
    /// frame.
    pub fn quota(&self, outside: usize) -> usize {
        let frames = self.anim_frames.saturating_sub(1).max(1) as usize;
        outside.div_ceil(frames)
    }

    /// Run one frame of scheduling for the animation frame `state.progress`,
    /// calling `visit` once per section to rewrite.
    pub fn step(
        &self,
        state: &mut RotationState,
        viewport: &CellRect,
        bounds: &CellRect,
        visit: &mut dyn FnMut(Cell),
    ) -> StepReport {
        let outside = Self::outside_count(bounds, viewport);
        let quota = self.quota(outside);
        let mut processed = 0;

        if state.progress == self.lock_frame {
            for cell in viewport.clipped_to(bounds).cells() {
                visit(cell);
                processed += 1;
            }
            state.committed = state.target;
            return StepReport {
                quota,
                processed,
                locked: true,
            };
        }

        let goal = outside.min(state.sections_done + quota);
        let width = bounds.width.max(1) as usize;
        let total = bounds.area();
        while state.sections_done < goal && state.cursor < total {
            let cell = Cell::new(
                bounds.min_x + (state.cursor % width) as i32,
                bounds.min_z + (state.cursor / width) as i32,
            );
            if !viewport.contains(cell) {
                visit(cell);
                state.sections_done += 1;
                processed += 1;
            }
            state.cursor += 1;
        }

        StepReport {
            quota,
            processed,
            locked: false,
        }
    }
}

/// The viewport rectangle, in sections, around the section the camera looks
/// at: `size` sections centered on `camera`, shifted to lie inside `bounds`
/// and clipped when `bounds` is smaller.
pub fn viewport_rect(camera: Cell, size: (i32, i32), bounds: &CellRect) -> CellRect {
    let (w, h) = size;
    CellRect::new(camera.x - w / 2, camera.z - h / 2, w, h)
        .moved_inside(bounds)
        .clipped_to(bounds)
}
