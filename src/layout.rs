//! Font-fit layout: the largest font size that keeps a slide's literal lines inside the canvas.

pub mod fit;
pub mod measure;
pub(crate) mod text_engine;
