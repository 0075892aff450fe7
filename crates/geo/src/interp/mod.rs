//! The four resampling kernels (§4.6) plus the shared quad math bilinear
//! needs. Every kernel takes a TreeGrid, a `PositionSource`/`DataAccessor`
//! pair, the output cell centre, and the requested bands; it returns one
//! `f64` value per band, substituting `no_data` where a band's value hits
//! `ignore_value` and a retry still comes up empty.

pub mod bicubic;
pub mod bilinear;
pub mod bilinear_l1;
pub mod idw;
pub mod nearest;
pub mod quadmath;

pub use bicubic::bicubic;
pub use bilinear::bilinear_quad;
pub use bilinear_l1::bilinear_level1_quad;
pub use idw::inverse_distance_weighted;
pub use nearest::nearest_neighbour;

/// Which kernel the engine should run for a given output cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterpolationKind {
    Nearest,
    InverseDistance { k: usize },
    BilinearLevel1,
    Bilinear,
    Bicubic,
}

impl InterpolationKind {
    /// `n_per_quadrant` a quad-based kernel needs from `TreeGrid::quad`, or
    /// `None` for kernels that use `k_nearest` instead.
    pub fn quadrant_size(self) -> Option<usize> {
        match self {
            InterpolationKind::Bilinear => Some(1),
            InterpolationKind::Bicubic => Some(4),
            _ => None,
        }
    }
}
