//! Slide rendering: rasterize a slide frame and encode it with its audio into one segment.

pub mod raster;
pub mod segment;
