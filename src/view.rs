//! View and input helpers that keep camera-relative behavior consistent with
//! the rotated view.

use cgmath::{Vector2, Vector3};

use crate::math::{Cell, CellRect, Rot4, rotate_planar, rotate_planar2};

/// Cells the rotated camera can see, given the unrotated view rectangle: the
/// bounding box of the rectangle's corner cells turned by `-current` about its
/// center.
pub fn view_rect(rect: &CellRect, current: f32) -> CellRect {
    let center = rect.center();
    let corners = rect.corners().map(|c| {
        let shifted = Vector3::new(c.x as f32 + 0.5, 0.0, c.z as f32 + 0.5);
        rotate_planar(shifted - center, -current) + center
    });
    let (mut min_x, mut min_z) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_z) = (f32::MIN, f32::MIN);
    for c in corners {
        min_x = min_x.min(c.x);
        min_z = min_z.min(c.z);
        max_x = max_x.max(c.x);
        max_z = max_z.max(c.z);
    }
    CellRect::from_limits(
        min_x.floor() as i32,
        min_z.floor() as i32,
        max_x.ceil() as i32,
        max_z.ceil() as i32,
    )
}

/// A mouse drag delta in screen space, turned into world-plane space.
pub fn rotate_drag(delta: Vector2<f32>, current: f32) -> Vector2<f32> {
    rotate_planar2(delta, current)
}

/// Keyboard/edge-scroll camera movement, turned so "up" still moves the camera
/// up on screen.
pub fn rotate_dolly(input: Vector2<f32>, current: f32) -> Vector2<f32> {
    rotate_planar2(input, -current)
}

/// Where a label drawn `offset_z` above an object sits in the rotated view.
pub fn label_position(draw_pos: Vector3<f32>, offset_z: f32, current: f32) -> Vector3<f32> {
    draw_pos + rotate_planar(Vector3::new(0.0, 0.0, offset_z), current)
}

/// The texture orientation a four-way entity facing `facing` in the world must
/// be drawn with so it looks the same way relative to the screen.
pub fn facing_for_view(facing: Rot4, current: f32) -> Rot4 {
    facing.rotated(Rot4::from_angle(-current))
}

/// Screen-relative facing of an entity at `from` moving to the adjacent cell
/// `to`. `None` when it doesn't move.
pub fn facing_toward(from: Cell, to: Cell, current: f32) -> Option<Rot4> {
    if from == to {
        return None;
    }
    let diff = Rot4::from_angle(current).rotate_cell(Cell::new(to.x - from.x, to.z - from.z));
    Some(if diff.x > 0 {
        Rot4::East
    } else if diff.x < 0 {
        Rot4::West
    } else if diff.z > 0 {
        Rot4::North
    } else {
        Rot4::South
    })
}
