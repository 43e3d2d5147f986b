/// Axis-aligned 2D bounds in map projection units.
///
/// Used as a data extent: `[min_x, min_y]` to `[max_x, max_y]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

pub type Extent = Aabb2;

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Builds bounds from `[min_x, min_y, max_x, max_y]`.
    pub fn from_corners(corners: [f64; 4]) -> Self {
        Aabb2 {
            min: [corners[0], corners[1]],
            max: [corners[2], corners[3]],
        }
    }

    pub fn corners(&self) -> [f64; 4] {
        [self.min[0], self.min[1], self.max[0], self.max[1]]
    }

    /// An extent with max < min on either axis bounds nothing.
    pub fn is_empty(&self) -> bool {
        !(self.min[0] <= self.max[0] && self.min[1] <= self.max[1])
    }

    pub fn union(&self, other: &Self) -> Self {
        Aabb2 {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }
}
