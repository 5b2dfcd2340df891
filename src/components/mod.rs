//! UI components.

pub mod k_selector;
pub mod knn_graph;
