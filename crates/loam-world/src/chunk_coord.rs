use serde::{Deserialize, Serialize};

/// Integer address of a terrain chunk on the horizontal grid.
///
/// `cy` runs along world +Z / heightmap +Y; chunk `(cx, cy)` is centred at
/// `(cx, cy) * chunk_world_size`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
        }
    }

    /// World-space centre of this chunk.
    #[inline]
    pub fn world_center(self, chunk_world_size: f32) -> [f32; 2] {
        [
            self.cx as f32 * chunk_world_size,
            self.cy as f32 * chunk_world_size,
        ]
    }

    /// Chunk whose centre is nearest to world position `(x, y)`.
    #[inline]
    pub fn containing(x: f32, y: f32, chunk_world_size: f32) -> Self {
        Self {
            cx: (x / chunk_world_size).round() as i32,
            cy: (y / chunk_world_size).round() as i32,
        }
    }

    /// Every coord in the square window of `radius` chunks around `self`, row by row.
    pub fn window(self, radius: i32) -> impl Iterator<Item = ChunkCoord> {
        (-radius..=radius)
            .flat_map(move |dy| (-radius..=radius).map(move |dx| self.offset(dx, dy)))
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<ChunkCoord> for (i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_rounds_to_nearest_centre() {
        assert_eq!(ChunkCoord::containing(0.0, 0.0, 238.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::containing(118.0, -118.0, 238.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::containing(120.0, -120.0, 238.0), ChunkCoord::new(1, -1));
        assert_eq!(ChunkCoord::containing(476.0, 0.0, 238.0), ChunkCoord::new(2, 0));
    }

    #[test]
    fn window_covers_square() {
        let coords: Vec<_> = ChunkCoord::new(5, -2).window(1).collect();
        assert_eq!(coords.len(), 9);
        assert_eq!(coords[0], ChunkCoord::new(4, -3));
        assert_eq!(coords[4], ChunkCoord::new(5, -2));
        assert_eq!(coords[8], ChunkCoord::new(6, -1));
        assert_eq!(ChunkCoord::new(0, 0).window(0).count(), 1);
    }
}
