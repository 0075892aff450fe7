//! A single occupied TreeGrid cell: centre, half-extent, and its samples.
//! Cells live in an arena (`Vec<IndexCell>`); the grid matrix holds
//! `Option<usize>` ids into the arena rather than a sentinel empty-cell
//! pointer.

use crate::BBox;
use crate::index::sample::Sample;
use crate::Point;

#[derive(Debug, Clone)]
pub struct IndexCell {
    pub center: Point,
    pub half_width: f64,
    pub half_height: f64,
    pub samples: Vec<Sample>,
}

impl IndexCell {
    pub fn new(center: Point, half_width: f64, half_height: f64) -> Self {
        IndexCell {
            center,
            half_width,
            half_height,
            samples: Vec::new(),
        }
    }

    pub fn bbox(&self) -> BBox {
        BBox::centered_on(self.center, self.half_width, self.half_height)
    }

    pub fn intersects(&self, box_: &BBox) -> bool {
        self.bbox().intersects(box_)
    }
}
