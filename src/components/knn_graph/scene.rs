//! One laid-out graph plus the interaction state drawn over it.

use log::{debug, info};
use serde::Deserialize;

use super::builder;
use super::layout::{self, LayoutParams};
use super::preview::PreviewConfig;
use super::types::{Dimensions, GraphData, Position};
use super::viewport::{Margin, ViewportController};
use crate::dataset::{ItemId, RankingDataset};

/// Drawn node radius in layout units.
pub const NODE_RADIUS: f64 = 10.0;
/// Pointer distance that still counts as touching a node.
pub const HIT_RADIUS: f64 = 12.0;

/// Container geometry rules.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
	/// Initial translation of the drawing group.
	pub margin: Margin,
	/// Share of the window height the canvas may take.
	pub height_fraction: f64,
	/// Height cap in CSS pixels.
	pub max_height: f64,
}

impl Default for FrameConfig {
	fn default() -> Self {
		Self {
			margin: Margin::default(),
			height_fraction: 0.9,
			max_height: 800.0,
		}
	}
}

impl FrameConfig {
	/// Canvas size for a container width and window height.
	pub fn dimensions(&self, container_width: f64, window_height: f64) -> Dimensions {
		Dimensions::new(
			container_width.max(0.0),
			(window_height * self.height_fraction).min(self.max_height).max(0.0),
		)
	}

	/// Center of the area inside the margins, in layout space.
	pub fn layout_center(&self, dims: Dimensions) -> Position {
		let m = self.margin;
		Position::new(
			(dims.width - m.left - m.right) / 2.0,
			(dims.height - m.top - m.bottom) / 2.0,
		)
	}
}

/// What the hover panel shows for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverInfo {
	/// Row position of the node.
	pub index: usize,
	/// The row's own identifier.
	pub original_id: ItemId,
	/// Preview image for the identifier.
	pub image_path: String,
	/// Shown when the preview fails to load.
	pub placeholder: String,
}

impl HoverInfo {
	/// Panel heading.
	pub fn title(&self) -> String {
		format!("Node {} (Original ID: {})", self.index, self.original_id)
	}
}

/// A laid-out graph plus the interaction state drawn on top of it.
pub struct GraphScene {
	/// Nodes and links derived from the dataset.
	pub graph: GraphData,
	/// Transform, gestures and pins; fresh on every build.
	pub viewport: ViewportController,
	/// Canvas size the layout was computed for.
	pub dimensions: Dimensions,
	positions: Vec<Position>,
	hover: Option<usize>,
}

impl GraphScene {
	/// Run the full pipeline: build the graph, lay it out once, reset the view.
	///
	/// Returns `None` while the container has no size; layout waits for a
	/// measurement.
	pub fn build(
		dataset: &RankingDataset,
		k: usize,
		zoom: f64,
		dimensions: Dimensions,
		params: LayoutParams,
		frame: FrameConfig,
	) -> Option<Self> {
		if !dimensions.is_measured() {
			debug!(
				"Container is {}x{}; deferring layout",
				dimensions.width, dimensions.height
			);
			return None;
		}
		let graph = builder::build(dataset, k);
		let positions = layout::layout(
			graph.nodes.len(),
			&graph.links,
			params,
			frame.layout_center(dimensions),
		);
		info!(
			"Built KNN graph: {} nodes, {} links (k={}) on {}x{}",
			graph.nodes.len(),
			graph.links.len(),
			k,
			dimensions.width,
			dimensions.height
		);
		Some(Self {
			graph,
			viewport: ViewportController::new(zoom, frame.margin),
			dimensions,
			positions,
			hover: None,
		})
	}

	/// Drawn position of a node: its pin if dragged, else its layout position.
	pub fn position(&self, index: usize) -> Position {
		self.viewport
			.pin_of(index)
			.or_else(|| self.positions.get(index).copied())
			.unwrap_or_default()
	}

	/// Topmost node under a screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let p = self.viewport.transform.screen_to_world(sx, sy);
		self.graph
			.nodes
			.iter()
			.rev()
			.map(|n| n.index)
			.find(|&i| self.position(i).distance(p) < HIT_RADIUS)
	}

	/// Node under the pointer, if any.
	pub fn hovered(&self) -> Option<usize> {
		self.hover
	}

	/// Returns whether the hovered node changed.
	pub fn set_hover(&mut self, node: Option<usize>) -> bool {
		if self.hover == node {
			return false;
		}
		self.hover = node;
		true
	}

	/// Panel contents for the hovered node.
	pub fn hover_info(&self, preview: &PreviewConfig) -> Option<HoverInfo> {
		let node = self.graph.nodes.get(self.hover?)?;
		Some(HoverInfo {
			index: node.index,
			original_id: node.original_id,
			image_path: preview.image_path(node.original_id),
			placeholder: preview.placeholder.clone(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn triangle() -> RankingDataset {
		RankingDataset::from(vec![vec![0, 1, 2], vec![1, 0, 2], vec![2, 0, 1]])
	}

	fn scene_at(dataset: &RankingDataset, dims: Dimensions) -> GraphScene {
		GraphScene::build(
			dataset,
			1,
			1.0,
			dims,
			LayoutParams::default(),
			FrameConfig::default(),
		)
		.unwrap()
	}

	fn scene(dataset: &RankingDataset) -> GraphScene {
		scene_at(dataset, Dimensions::new(800.0, 600.0))
	}

	fn centroid(scene: &GraphScene) -> Position {
		let n = scene.graph.nodes.len() as f64;
		let (sx, sy) = (0..scene.graph.nodes.len())
			.map(|i| scene.position(i))
			.fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
		Position::new(sx / n, sy / n)
	}

	#[test]
	fn frame_height_follows_window_with_cap() {
		let frame = FrameConfig::default();
		assert_eq!(frame.dimensions(640.0, 500.0), Dimensions::new(640.0, 450.0));
		assert_eq!(frame.dimensions(640.0, 2000.0).height, 800.0);
		assert!(!frame.dimensions(0.0, 500.0).is_measured());
	}

	#[test]
	fn single_row_lands_near_layout_center() {
		let dataset = RankingDataset::from(vec![vec![5]]);
		let scene = scene(&dataset);
		assert_eq!(scene.graph.nodes.len(), 1);
		assert!(scene.graph.links.is_empty());
		let center = FrameConfig::default().layout_center(Dimensions::new(800.0, 600.0));
		assert!(scene.position(0).distance(center) < 1.0);
	}

	#[test]
	fn hit_testing_goes_through_the_transform() {
		let dataset = triangle();
		let mut scene = scene(&dataset);
		scene.viewport.zoom_by(2.0, 123.0, 45.0);
		let (sx, sy) = scene.viewport.transform.world_to_screen(scene.position(2));
		assert_eq!(scene.node_at_position(sx, sy), Some(2));
		assert_eq!(scene.node_at_position(-10_000.0, -10_000.0), None);
	}

	#[test]
	fn pins_override_layout_positions() {
		let dataset = triangle();
		let mut scene = scene(&dataset);
		let before = scene.position(1);
		scene.viewport.begin_node_drag(1, 0.0, 0.0, before);
		scene.viewport.pointer_move(30.0, 40.0);
		scene.viewport.release();
		assert_eq!(scene.position(1), Position::new(before.x + 30.0, before.y + 40.0));
	}

	#[test]
	fn hover_reports_index_identifier_and_preview() {
		let dataset = RankingDataset::from(vec![vec![41, 7], vec![7, 41]]);
		let mut scene = scene(&dataset);
		assert!(scene.set_hover(Some(0)));
		assert!(!scene.set_hover(Some(0)));
		let info = scene.hover_info(&PreviewConfig::default()).unwrap();
		assert_eq!(info.title(), "Node 0 (Original ID: 41)");
		assert_eq!(info.image_path, "/jpg/image_0042.jpg");
		assert_eq!(info.placeholder, "/placeholder.png");

		scene.set_hover(None);
		assert_eq!(scene.hover_info(&PreviewConfig::default()), None);
	}

	#[test]
	fn empty_dataset_builds_an_empty_scene() {
		let scene = scene(&RankingDataset::default());
		assert!(scene.graph.nodes.is_empty());
		assert_eq!(scene.node_at_position(100.0, 100.0), None);
		assert_eq!(scene.viewport.transform.x, 40.0);
	}

	#[test]
	fn unmeasured_container_defers_layout() {
		let dataset = triangle();
		let build = |dims| {
			GraphScene::build(
				&dataset,
				1,
				1.0,
				dims,
				LayoutParams::default(),
				FrameConfig::default(),
			)
		};
		assert!(build(Dimensions::default()).is_none());
		assert!(build(Dimensions::new(0.0, 600.0)).is_none());
		assert!(build(Dimensions::new(800.0, 0.0)).is_none());
		assert!(build(Dimensions::new(800.0, 600.0)).is_some());
	}

	#[test]
	fn resize_rebuild_discards_pins_and_recenters() {
		let dataset = triangle();
		let mut before = scene(&dataset);
		let at = before.position(1);
		before.viewport.begin_node_drag(1, 0.0, 0.0, at);
		before.viewport.pointer_move(200.0, 150.0);
		before.viewport.release();
		before.viewport.zoom_by(2.0, 10.0, 10.0);
		assert!(before.viewport.is_pinned(1));

		let dims = Dimensions::new(1200.0, 900.0);
		let after = scene_at(&dataset, dims);
		assert!(!after.viewport.is_pinned(1));
		assert_eq!(after.dimensions, dims);
		assert_eq!(after.viewport.transform.x, 40.0);
		assert_eq!(after.viewport.transform.y, 20.0);
		assert_eq!(after.viewport.scale(), 1.0);
		let center = FrameConfig::default().layout_center(dims);
		assert!(centroid(&after).distance(center) < 5.0);
	}
}
