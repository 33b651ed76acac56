//! Fundamental identity and geometric types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 3D position in world space (world units).
/// x = East, y = North, z = Up. Containment and capture only look at x/y.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Range to another position (3D distance).
    pub fn range_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Squared horizontal range (ignoring height).
    pub fn horizontal_range_sq_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Horizontal range (ignoring height).
    pub fn horizontal_range_to(&self, other: &Position) -> f64 {
        self.horizontal_range_sq_to(other).sqrt()
    }

    /// Same height, shifted on the horizontal plane.
    pub fn offset(&self, dx: f64, dy: f64) -> Position {
        Position::new(self.x + dx, self.y + dy, self.z)
    }
}

/// Name of a world/map the host runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(pub String);

impl WorldId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A position pinned to a world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: WorldId,
    pub position: Position,
}

impl Location {
    pub fn new(world: WorldId, position: Position) -> Self {
        Self { world, position }
    }

    pub fn same_world(&self, other: &Location) -> bool {
        self.world == other.world
    }

    /// Squared horizontal range, `None` across worlds.
    pub fn horizontal_range_sq_to(&self, other: &Location) -> Option<f64> {
        self.same_world(other)
            .then(|| self.position.horizontal_range_sq_to(&other.position))
    }

    /// Horizontal range, `None` across worlds.
    pub fn horizontal_range_to(&self, other: &Location) -> Option<f64> {
        self.horizontal_range_sq_to(other).map(f64::sqrt)
    }
}

/// A connected actor (player character).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ActorId(pub u64);

/// A faction. Id 0 is reserved for "nobody".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FactionId(pub u32);

impl FactionId {
    /// Sentinel for "no owner" / "no winner".
    pub const NONE: FactionId = FactionId(0);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// Opaque zone handle, unique within one engine instance.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ZoneId(pub u32);

/// Opaque capture point handle.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PointId(pub u32);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "beacon_{}", self.0)
    }
}

/// Sequence number of an incursion event.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EventId(pub u64);

/// One column of the claim grid (16 x 16 world units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapCell {
    pub x: i32,
    pub y: i32,
}

impl MapCell {
    /// Edge length of a cell in world units.
    pub const SIZE: i32 = 16;

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell containing a horizontal position.
    pub fn containing(position: &Position) -> Self {
        let size = Self::SIZE as f64;
        Self {
            x: (position.x / size).floor() as i32,
            y: (position.y / size).floor() as i32,
        }
    }

    /// Centre of the cell in world units.
    pub fn center(&self) -> (f64, f64) {
        let half = Self::SIZE as f64 / 2.0;
        (
            (self.x * Self::SIZE) as f64 + half,
            (self.y * Self::SIZE) as f64 + half,
        )
    }

    /// Horizontal distance from the cell centre to a point.
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        let (cx, cy) = self.center();
        let dx = x - cx;
        let dy = y - cy;
        (dx * dx + dy * dy).sqrt()
    }
}
