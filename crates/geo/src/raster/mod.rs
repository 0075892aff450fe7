pub mod accessor;
pub mod bil;
pub mod block;
pub mod io;

pub use accessor::DataAccessor;
pub use block::{Level1Block, Level1Raster};
pub use io::{RasterHeader, RasterReader, RasterWriter};
