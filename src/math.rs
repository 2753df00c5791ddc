//! Planar math helpers: angle arithmetic, quarter turns, rotation about the
//! vertical axis and integer cell rectangles.
//!
//! Every rotation in the crate goes through [`rotate_planar`] (or the exact
//! [`Rot4::rotate`] it delegates to for quarter turns), so the vertex rewrites,
//! the draw-matrix interception and the view helpers all agree on direction:
//!
//! `rotate((x, y, z), θ) = (x·cosθ − z·sinθ, y, x·sinθ + z·cosθ)`

use cgmath::{Matrix4, Vector2, Vector3, Vector4, Zero};

/// `x mod m`, always in `[0, m)` for positive `m`.
pub fn positive_mod(x: f32, m: f32) -> f32 {
    ((x % m) + m) % m
}

/// Shortest signed difference from `from` to `to`, in `(-180, 180]`.
pub fn delta_angle(from: f32, to: f32) -> f32 {
    let d = positive_mod(to - from, 360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Round an angle to the closest multiple of 90°.
pub fn snap_quarter(angle: f32) -> f32 {
    (angle / 90.0).round() * 90.0
}

/// Whether `angle` is an exact multiple of 90°.
pub fn is_quarter(angle: f32) -> bool {
    positive_mod(angle, 90.0) == 0.0
}

/// One of the four flat orientations, in quarter turns from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rot4 {
    #[default]
    North,
    East,
    South,
    West,
}

impl Rot4 {
    pub const ALL: [Rot4; 4] = [Rot4::North, Rot4::East, Rot4::South, Rot4::West];

    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(4) as usize]
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Nearest quarter turn to a flat angle in degrees.
    pub fn from_angle(angle: f32) -> Self {
        let a = positive_mod(angle, 360.0);
        if a < 45.0 {
            Rot4::North
        } else if a < 135.0 {
            Rot4::East
        } else if a < 225.0 {
            Rot4::South
        } else if a < 315.0 {
            Rot4::West
        } else {
            Rot4::North
        }
    }

    pub fn angle(self) -> f32 {
        self.index() as f32 * 90.0
    }

    pub fn rotated(self, by: Rot4) -> Self {
        Self::from_index(self.index() as i32 + by.index() as i32)
    }

    /// The turn that takes `other` to `self`.
    pub fn relative_to(self, other: Rot4) -> Self {
        Self::from_index(self.index() as i32 - other.index() as i32)
    }

    pub fn inverse(self) -> Self {
        Self::from_index(-(self.index() as i32))
    }

    /// Exact planar rotation of a vector by this many quarter turns.
    pub fn rotate(self, v: Vector3<f32>) -> Vector3<f32> {
        match self {
            Rot4::North => v,
            Rot4::East => Vector3::new(-v.z, v.y, v.x),
            Rot4::South => Vector3::new(-v.x, v.y, -v.z),
            Rot4::West => Vector3::new(v.z, v.y, -v.x),
        }
    }

    pub fn rotate_cell(self, cell: Cell) -> Cell {
        match self {
            Rot4::North => cell,
            Rot4::East => Cell::new(-cell.z, cell.x),
            Rot4::South => Cell::new(-cell.x, -cell.z),
            Rot4::West => Cell::new(cell.z, -cell.x),
        }
    }
}

/// Rotate `v` about the vertical axis by `angle` degrees.
///
/// Quarter turns are computed without trigonometry, so rotating a vertex by a
/// 90°-aligned target lands on exact coordinates.
pub fn rotate_planar(v: Vector3<f32>, angle: f32) -> Vector3<f32> {
    if is_quarter(angle) {
        return Rot4::from_angle(angle).rotate(v);
    }
    let (s, c) = angle.to_radians().sin_cos();
    Vector3::new(v.x * c - v.z * s, v.y, v.x * s + v.z * c)
}

/// [`rotate_planar`] for screen-space vectors, treating `y` as the planar `z`.
pub fn rotate_planar2(v: Vector2<f32>, angle: f32) -> Vector2<f32> {
    let r = rotate_planar(Vector3::new(v.x, 0.0, v.y), angle);
    Vector2::new(r.x, r.z)
}

/// The 4x4 matrix form of [`rotate_planar`].
pub fn planar_rotation(angle: f32) -> Matrix4<f32> {
    let x = rotate_planar(Vector3::unit_x(), angle);
    let z = rotate_planar(Vector3::unit_z(), angle);
    Matrix4::from_cols(
        x.extend(0.0),
        Vector4::unit_y(),
        z.extend(0.0),
        Vector4::unit_w(),
    )
}

/// Grow-only resize: makes `buf` at least `len` long, doubling capacity when it
/// has to grow so repeated calls settle quickly. Never shrinks.
pub fn ensure_len<T: Clone + Zero>(buf: &mut Vec<T>, len: usize) {
    if buf.len() < len {
        let new_len = len.max(buf.len() * 2);
        buf.resize(new_len, T::zero());
    }
}

/// Integer coordinate on the flat `x`/`z` plane (cells or sections).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cell {
    pub x: i32,
    pub z: i32,
}

impl Cell {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The section holding this cell, for square sections of `size` cells.
    pub fn section(self, size: i32) -> Cell {
        Cell::new(self.x.div_euclid(size), self.z.div_euclid(size))
    }
}

/// Inclusive-min, exclusive-max rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellRect {
    pub min_x: i32,
    pub min_z: i32,
    pub width: i32,
    pub height: i32,
}

impl CellRect {
    pub const fn new(min_x: i32, min_z: i32, width: i32, height: i32) -> Self {
        Self {
            min_x,
            min_z,
            width,
            height,
        }
    }

    /// Rectangle spanning two inclusive corners.
    pub fn from_limits(min_x: i32, min_z: i32, max_x: i32, max_z: i32) -> Self {
        Self::new(min_x, min_z, max_x - min_x + 1, max_z - min_z + 1)
    }

    pub fn max_x(&self) -> i32 {
        self.min_x + self.width - 1
    }

    pub fn max_z(&self) -> i32 {
        self.min_z + self.height - 1
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn area(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.width as usize * self.height as usize
        }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min_x
            && cell.x <= self.max_x()
            && cell.z >= self.min_z
            && cell.z <= self.max_z()
    }

    pub fn moved_by(&self, dx: i32, dz: i32) -> Self {
        Self::new(self.min_x + dx, self.min_z + dz, self.width, self.height)
    }

    /// Shift (without resizing) so the rectangle lies inside `bounds`. When
    /// `self` is larger than `bounds` it ends up aligned to the min corner.
    pub fn moved_inside(&self, bounds: &CellRect) -> Self {
        let mut r = *self;
        if r.max_x() > bounds.max_x() {
            r = r.moved_by(bounds.max_x() - r.max_x(), 0);
        }
        if r.max_z() > bounds.max_z() {
            r = r.moved_by(0, bounds.max_z() - r.max_z());
        }
        if r.min_x < bounds.min_x {
            r = r.moved_by(bounds.min_x - r.min_x, 0);
        }
        if r.min_z < bounds.min_z {
            r = r.moved_by(0, bounds.min_z - r.min_z);
        }
        r
    }

    pub fn clipped_to(&self, bounds: &CellRect) -> Self {
        let min_x = self.min_x.max(bounds.min_x);
        let min_z = self.min_z.max(bounds.min_z);
        let max_x = self.max_x().min(bounds.max_x());
        let max_z = self.max_z().min(bounds.max_z());
        Self::from_limits(min_x, min_z, max_x, max_z)
    }

    /// Cells in row-major order (`x` fastest).
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let (w, h) = (self.width.max(0), self.height.max(0));
        (0..h).flat_map(move |dz| {
            (0..w).map(move |dx| Cell::new(self.min_x + dx, self.min_z + dz))
        })
    }

    /// The four corner cells, counter-clockwise from the min corner.
    pub fn corners(&self) -> [Cell; 4] {
        [
            Cell::new(self.min_x, self.min_z),
            Cell::new(self.min_x, self.max_z()),
            Cell::new(self.max_x(), self.max_z()),
            Cell::new(self.max_x(), self.min_z),
        ]
    }

    pub fn center(&self) -> Vector3<f32> {
        Vector3::new(
            self.min_x as f32 + self.width as f32 / 2.0,
            0.0,
            self.min_z as f32 + self.height as f32 / 2.0,
        )
    }
}
