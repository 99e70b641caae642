//! The six axis-aligned face directions.
//!
//! Each direction knows its opposite, its unit offset and the four corner
//! vertices of the unit-cube face it points out of. Corners are wound
//! counter-clockwise when viewed from outside the cube, so a fan from vertex 0
//! yields outward-facing triangles.

use glam::{IVec3, Vec2, Vec3};

/// Side length of one block tile in the texture atlas, in UV units.
pub const BLOCK_UV: f32 = 0.03125;

/// One corner of a face quad: position inside the unit cube plus atlas UV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl FaceVertex {
    const fn new(position: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn uv(&self) -> Vec2 {
        Vec2::from_array(self.uv)
    }
}

/// Face direction, ordered as in [`Direction::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Direction {
    XPos = 0,
    XNeg = 1,
    YPos = 2,
    YNeg = 3,
    ZPos = 4,
    ZNeg = 5,
}

const OFFSETS: [[i32; 3]; 6] = [
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
];

const U: f32 = BLOCK_UV;

const QUADS: [[FaceVertex; 4]; 6] = [
    // +X
    [
        FaceVertex::new([1.0, 0.0, 1.0], [0.0, 0.0]),
        FaceVertex::new([1.0, 0.0, 0.0], [U, 0.0]),
        FaceVertex::new([1.0, 1.0, 0.0], [U, U]),
        FaceVertex::new([1.0, 1.0, 1.0], [0.0, U]),
    ],
    // -X
    [
        FaceVertex::new([0.0, 0.0, 0.0], [0.0, 0.0]),
        FaceVertex::new([0.0, 0.0, 1.0], [U, 0.0]),
        FaceVertex::new([0.0, 1.0, 1.0], [U, U]),
        FaceVertex::new([0.0, 1.0, 0.0], [0.0, U]),
    ],
    // +Y
    [
        FaceVertex::new([0.0, 1.0, 1.0], [0.0, 0.0]),
        FaceVertex::new([1.0, 1.0, 1.0], [U, 0.0]),
        FaceVertex::new([1.0, 1.0, 0.0], [U, U]),
        FaceVertex::new([0.0, 1.0, 0.0], [0.0, U]),
    ],
    // -Y
    [
        FaceVertex::new([0.0, 0.0, 0.0], [0.0, 0.0]),
        FaceVertex::new([1.0, 0.0, 0.0], [U, 0.0]),
        FaceVertex::new([1.0, 0.0, 1.0], [U, U]),
        FaceVertex::new([0.0, 0.0, 1.0], [0.0, U]),
    ],
    // +Z
    [
        FaceVertex::new([0.0, 0.0, 1.0], [0.0, 0.0]),
        FaceVertex::new([1.0, 0.0, 1.0], [U, 0.0]),
        FaceVertex::new([1.0, 1.0, 1.0], [U, U]),
        FaceVertex::new([0.0, 1.0, 1.0], [0.0, U]),
    ],
    // -Z
    [
        FaceVertex::new([1.0, 0.0, 0.0], [0.0, 0.0]),
        FaceVertex::new([0.0, 0.0, 0.0], [U, 0.0]),
        FaceVertex::new([0.0, 1.0, 0.0], [U, U]),
        FaceVertex::new([1.0, 1.0, 0.0], [0.0, U]),
    ],
];

impl Direction {
    /// All six directions in table order.
    pub const ALL: [Direction; 6] = [
        Direction::XPos,
        Direction::XNeg,
        Direction::YPos,
        Direction::YNeg,
        Direction::ZPos,
        Direction::ZNeg,
    ];

    /// The four horizontal directions, indexed by [`Direction::lateral_slot`].
    pub const LATERAL: [Direction; 4] = [
        Direction::XPos,
        Direction::XNeg,
        Direction::ZPos,
        Direction::ZNeg,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::XPos => Direction::XNeg,
            Direction::XNeg => Direction::XPos,
            Direction::YPos => Direction::YNeg,
            Direction::YNeg => Direction::YPos,
            Direction::ZPos => Direction::ZNeg,
            Direction::ZNeg => Direction::ZPos,
        }
    }

    /// Unit offset towards the neighboring cell.
    #[inline]
    pub fn offset(self) -> IVec3 {
        IVec3::from_array(OFFSETS[self as usize])
    }

    /// Offset as a float vector, used as the face normal.
    #[inline]
    pub fn normal(self) -> Vec3 {
        self.offset().as_vec3()
    }

    /// Corner vertices of the face quad, in fan order.
    #[inline]
    pub fn vertices(self) -> &'static [FaceVertex; 4] {
        &QUADS[self as usize]
    }

    /// Neighbor-link slot for horizontal directions; `None` for ±Y.
    pub const fn lateral_slot(self) -> Option<usize> {
        match self {
            Direction::XPos => Some(0),
            Direction::XNeg => Some(1),
            Direction::ZPos => Some(2),
            Direction::ZNeg => Some(3),
            Direction::YPos | Direction::YNeg => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Direction::XPos => "x pos",
            Direction::XNeg => "x neg",
            Direction::YPos => "y pos",
            Direction::YNeg => "y neg",
            Direction::ZPos => "z pos",
            Direction::ZNeg => "z neg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for dir in Direction::ALL {
            assert_ne!(dir.opposite(), dir);
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(dir.offset() + dir.opposite().offset(), IVec3::ZERO);
        }
    }

    #[test]
    fn offsets_are_unit_axes() {
        for dir in Direction::ALL {
            let o = dir.offset();
            assert_eq!(o.x.abs() + o.y.abs() + o.z.abs(), 1, "{}", dir.name());
        }
    }

    #[test]
    fn quads_lie_on_their_face_plane() {
        for dir in Direction::ALL {
            let n = dir.normal();
            // Outward faces sit on the plane 1 for positive directions, 0 for negative.
            let plane = if n.max_element() > 0.0 { 1.0 } else { 0.0 };
            for v in dir.vertices() {
                assert_eq!(v.position().dot(n.abs()), plane, "{}", dir.name());
            }
        }
    }

    #[test]
    fn quads_wind_outward() {
        for dir in Direction::ALL {
            let [a, b, c, _] = dir.vertices().map(|v| v.position());
            let face_normal = (b - a).cross(c - a).normalize();
            assert_eq!(face_normal, dir.normal(), "{}", dir.name());
        }
    }

    #[test]
    fn lateral_slots_are_dense() {
        for (slot, dir) in Direction::LATERAL.iter().enumerate() {
            assert_eq!(dir.lateral_slot(), Some(slot));
        }
        assert_eq!(Direction::YPos.lateral_slot(), None);
        assert_eq!(Direction::YNeg.lateral_slot(), None);
    }

    #[test]
    fn uvs_span_one_tile() {
        for dir in Direction::ALL {
            for v in dir.vertices() {
                assert!(v.uv().x == 0.0 || v.uv().x == BLOCK_UV);
                assert!(v.uv().y == 0.0 || v.uv().y == BLOCK_UV);
            }
        }
    }
}
