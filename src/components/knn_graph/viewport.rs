//! Pan/zoom transform, pointer gestures, drag pins and fullscreen mode.

use std::collections::HashMap;
use std::fmt::Debug;

use log::{debug, warn};
use serde::Deserialize;

use super::types::Position;

/// Smallest allowed zoom factor.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed zoom factor.
pub const MAX_SCALE: f64 = 5.0;

/// Offsets between the container edge and the drawing group.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Margin {
	/// Space above the drawing group.
	pub top: f64,
	/// Space right of the drawing group.
	pub right: f64,
	/// Space below the drawing group.
	pub bottom: f64,
	/// Space left of the drawing group.
	pub left: f64,
}

impl Default for Margin {
	fn default() -> Self {
		Self {
			top: 20.0,
			right: 20.0,
			bottom: 30.0,
			left: 40.0,
		}
	}
}

/// Pan/zoom mapping from layout space to screen space: `screen = world * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal screen offset.
	pub x: f64,
	/// Vertical screen offset.
	pub y: f64,
	/// Scale factor.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// Map a screen point into layout space.
	pub fn screen_to_world(&self, sx: f64, sy: f64) -> Position {
		Position::new((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Map a layout point onto the screen.
	pub fn world_to_screen(&self, p: Position) -> (f64, f64) {
		(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	/// Multiply the scale by `factor`, keeping the screen point `(ax, ay)` fixed.
	pub fn scaled_about(self, factor: f64, ax: f64, ay: f64) -> Self {
		let k = (self.k * factor).clamp(MIN_SCALE, MAX_SCALE);
		let ratio = k / self.k;
		Self {
			x: ax - (ax - self.x) * ratio,
			y: ay - (ay - self.y) * ratio,
			k,
		}
	}
}

/// An in-progress node drag.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	/// Node being dragged, if any.
	pub node: Option<usize>,
	/// Pointer position at press, in screen space.
	pub start_x: f64,
	/// See `start_x`.
	pub start_y: f64,
	/// Node position at press, in layout space.
	pub node_start: Position,
}

/// An in-progress background pan.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	/// Whether a pan is underway.
	pub active: bool,
	/// Pointer position at press, in screen space.
	pub start_x: f64,
	/// See `start_x`.
	pub start_y: f64,
	/// Transform offset at press.
	pub transform_start_x: f64,
	/// See `transform_start_x`.
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
struct PinchState {
	distance: f64,
	mid_x: f64,
	mid_y: f64,
}

/// What a pointer move changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerUpdate {
	/// No gesture was active.
	Idle,
	/// The transform moved.
	Panned,
	/// The given node's pin moved.
	Dragged(usize),
}

/// Presentation mode of the graph container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FullscreenMode {
	/// Inline in the page.
	#[default]
	Normal,
	/// The container fills the screen.
	Fullscreen,
}

impl FullscreenMode {
	/// Mode matching whether the host currently has an element in fullscreen.
	pub fn from_active(active: bool) -> Self {
		if active {
			FullscreenMode::Fullscreen
		} else {
			FullscreenMode::Normal
		}
	}

	/// The other mode.
	pub fn toggled(self) -> Self {
		match self {
			FullscreenMode::Normal => FullscreenMode::Fullscreen,
			FullscreenMode::Fullscreen => FullscreenMode::Normal,
		}
	}

	/// Whether the container fills the screen.
	pub fn is_fullscreen(self) -> bool {
		self == FullscreenMode::Fullscreen
	}

	/// Ask the host to switch to the other mode; a refused request keeps `self`.
	pub fn request_toggle<E: Debug>(self, host: impl FnOnce(Self) -> Result<(), E>) -> Self {
		let target = self.toggled();
		match host(target) {
			Ok(()) => target,
			Err(e) => {
				warn!("Fullscreen switch to {:?} refused: {:?}", target, e);
				self
			}
		}
	}
}

/// Owns the view transform, gesture state and drag pins.
#[derive(Clone, Debug, Default)]
pub struct ViewportController {
	/// Current layout-to-screen mapping.
	pub transform: ViewTransform,
	/// Active node drag.
	pub drag: DragState,
	/// Active background pan.
	pub pan: PanState,
	pinch: Option<PinchState>,
	pins: HashMap<usize, Position>,
}

impl ViewportController {
	/// Start at `zoom`, translated by the margin's top-left corner.
	pub fn new(zoom: f64, margin: Margin) -> Self {
		let k = if zoom.is_finite() && zoom > 0.0 {
			zoom.clamp(MIN_SCALE, MAX_SCALE)
		} else {
			1.0
		};
		Self {
			transform: ViewTransform {
				x: margin.left,
				y: margin.top,
				k,
			},
			..Self::default()
		}
	}

	/// Current zoom factor.
	pub fn scale(&self) -> f64 {
		self.transform.k
	}

	/// Zoom by a multiplicative factor around a screen anchor.
	pub fn zoom_by(&mut self, factor: f64, ax: f64, ay: f64) {
		if factor.is_finite() && factor > 0.0 {
			self.transform = self.transform.scaled_about(factor, ax, ay);
		}
	}

	/// Apply a wheel event; `ctrl` marks trackpad pinch, `line_mode` a
	/// line-based delta.
	pub fn wheel(&mut self, delta_y: f64, line_mode: bool, ctrl: bool, ax: f64, ay: f64) {
		let unit = if line_mode { 0.05 } else { 0.002 };
		let boost = if ctrl { 10.0 } else { 1.0 };
		self.zoom_by(2f64.powf(-delta_y * unit * boost), ax, ay);
	}

	/// Start panning from a background press.
	pub fn begin_pan(&mut self, x: f64, y: f64) {
		self.drag = DragState::default();
		self.pan = PanState {
			active: true,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	/// Start dragging `node`, currently drawn at `node_pos`.
	pub fn begin_node_drag(&mut self, node: usize, x: f64, y: f64, node_pos: Position) {
		self.pan.active = false;
		self.drag = DragState {
			node: Some(node),
			start_x: x,
			start_y: y,
			node_start: node_pos,
		};
		self.pins.insert(node, node_pos);
	}

	/// Whether a node is being dragged.
	pub fn is_dragging(&self) -> bool {
		self.drag.node.is_some()
	}

	/// Continue whichever gesture is active.
	pub fn pointer_move(&mut self, x: f64, y: f64) -> PointerUpdate {
		if let Some(node) = self.drag.node {
			let k = self.transform.k;
			let at = Position::new(
				self.drag.node_start.x + (x - self.drag.start_x) / k,
				self.drag.node_start.y + (y - self.drag.start_y) / k,
			);
			self.pins.insert(node, at);
			PointerUpdate::Dragged(node)
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
			PointerUpdate::Panned
		} else {
			PointerUpdate::Idle
		}
	}

	/// End any pan, drag or pinch. A dragged node keeps its pin.
	pub fn release(&mut self) {
		if let Some(node) = self.drag.node.take() {
			debug!("Node {} dropped and pinned", node);
		}
		self.pan.active = false;
		self.pinch = None;
	}

	/// Start a two-finger pinch; ends any pan or drag.
	pub fn begin_pinch(&mut self, distance: f64, mid_x: f64, mid_y: f64) {
		self.release();
		self.pinch = Some(PinchState {
			distance,
			mid_x,
			mid_y,
		});
	}

	/// Scale by the change in finger distance and pan by the midpoint shift.
	pub fn pinch_to(&mut self, distance: f64, mid_x: f64, mid_y: f64) {
		let Some(prev) = self.pinch.as_mut() else {
			return;
		};
		let factor = if prev.distance > 0.0 {
			distance / prev.distance
		} else {
			1.0
		};
		let mut t = self.transform.scaled_about(factor, prev.mid_x, prev.mid_y);
		t.x += mid_x - prev.mid_x;
		t.y += mid_y - prev.mid_y;
		*prev = PinchState {
			distance,
			mid_x,
			mid_y,
		};
		self.transform = t;
	}

	/// Where a dragged node was left, if it was.
	pub fn pin_of(&self, node: usize) -> Option<Position> {
		self.pins.get(&node).copied()
	}

	/// Whether a node has been dragged since the last rebuild.
	pub fn is_pinned(&self, node: usize) -> bool {
		self.pins.contains_key(&node)
	}
}
