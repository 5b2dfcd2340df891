use crate::dataset::ItemId;

/// A visualizable dataset row.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Row position in the dataset, also the layout identity.
	pub index: usize,
	/// The row's own identifier (position 0).
	pub original_id: ItemId,
	/// Text drawn beside the node.
	pub label: String,
}

/// A ranked edge from a row to one of its neighbors.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
	/// Index of the row the ranking belongs to.
	pub source: usize,
	/// Index of the neighbor's row.
	pub target: usize,
	/// `1 / (rank + 1)`, so the nearest neighbor weighs 0.5.
	pub weight: f64,
}

impl GraphLink {
	/// Rendered stroke width, proportional to the square root of the weight.
	pub fn stroke_width(&self) -> f64 {
		self.weight.sqrt() * 3.0
	}
}

/// Nodes in row order and their links.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	/// One per row, indexed by row position.
	pub nodes: Vec<GraphNode>,
	/// Ranked edges between rows.
	pub links: Vec<GraphLink>,
}

/// A point in layout space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Position {
	/// Point at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance.
	pub fn distance(self, other: Position) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}

	/// Both coordinates are finite.
	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

/// Measured container size in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dimensions {
	/// Width in CSS pixels.
	pub width: f64,
	/// Height in CSS pixels.
	pub height: f64,
}

impl Dimensions {
	/// Size of `width` by `height`.
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// Layout is deferred until both sides are positive.
	pub fn is_measured(&self) -> bool {
		self.width > 0.0 && self.height > 0.0
	}
}
