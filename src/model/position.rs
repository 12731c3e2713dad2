use serde::{Deserialize, Serialize};

/// A tile coordinate on the world grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan (taxicab) distance to another position.
    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Axis-aligned bounding box, inclusive on both corners.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Position,
    pub max: Position,
}

impl Bounds {
    /// # Panics
    /// Panics if `min` is not component-wise `<= max`.
    pub fn new(min: Position, max: Position) -> Self {
        assert!(
            min.x <= max.x && min.y <= max.y,
            "Bounds::new: min {min:?} exceeds max {max:?}"
        );
        Self { min, max }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    /// Manhattan distance from `pos` to the nearest point of the box (0 if inside).
    pub fn manhattan_distance_to(&self, pos: Position) -> u32 {
        let dx = if pos.x < self.min.x {
            self.min.x.abs_diff(pos.x)
        } else if pos.x > self.max.x {
            pos.x.abs_diff(self.max.x)
        } else {
            0
        };
        let dy = if pos.y < self.min.y {
            self.min.y.abs_diff(pos.y)
        } else if pos.y > self.max.y {
            pos.y.abs_diff(self.max.y)
        } else {
            0
        };
        dx + dy
    }

    pub fn center(&self) -> Position {
        Position::new(
            self.min.x + (self.max.x - self.min.x) / 2,
            self.min.y + (self.max.y - self.min.y) / 2,
        )
    }
}
