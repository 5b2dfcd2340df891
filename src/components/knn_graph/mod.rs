//! KNN graph pipeline (build, layout, view) and its canvas component.

pub mod builder;
mod component;
pub mod layout;
pub mod preview;
mod render;
pub mod scene;
mod types;
pub mod viewport;

pub use component::KnnGraphCanvas;
pub use types::{Dimensions, GraphData, GraphLink, GraphNode, Position};
