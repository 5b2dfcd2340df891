//! Fixed-step force-directed layout.
//!
//! Four forces act on every step, in this order: springs along links, pairwise
//! charge, centroid gravity and disk collision. The simulation cools with an
//! exponential alpha schedule and is advanced a fixed number of steps, so the
//! same input always yields the same positions.

use std::f64::consts::PI;

use log::{debug, warn};
use serde::Deserialize;

use super::types::{GraphLink, Position};

const INITIAL_RADIUS: f64 = 10.0;
const DISTANCE_MIN2: f64 = 1.0;
const JIGGLE_SEED: u64 = 0x2545_f491_4f6c_dd1d;

/// How link weight feeds into spring strength.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkWeighting {
	/// Weight only affects rendering.
	#[default]
	Uniform,
	/// Spring strength is multiplied by the link weight.
	ByWeight,
}

/// Simulation constants.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
	/// Rest length of every spring.
	pub link_distance: f64,
	/// Whether weight scales spring strength.
	pub link_weighting: LinkWeighting,
	/// Negative values repel.
	pub charge_strength: f64,
	/// Fraction of the centroid offset removed per step.
	pub center_strength: f64,
	/// Radius of the disk each node occupies.
	pub collision_radius: f64,
	/// Fixed number of steps per layout.
	pub iterations: usize,
	/// Fraction of velocity lost per step.
	pub velocity_decay: f64,
	/// Alpha reached after 300 steps; sets the cooling rate.
	pub alpha_min: f64,
}

impl Default for LayoutParams {
	fn default() -> Self {
		Self {
			link_distance: 100.0,
			link_weighting: LinkWeighting::Uniform,
			charge_strength: -2000.0,
			center_strength: 0.4,
			collision_radius: 35.0,
			iterations: 200,
			velocity_decay: 0.4,
			alpha_min: 0.001,
		}
	}
}

#[derive(Clone, Debug, Default)]
struct Body {
	x: f64,
	y: f64,
	vx: f64,
	vy: f64,
	fx: Option<f64>,
	fy: Option<f64>,
}

#[derive(Clone, Debug)]
struct Spring {
	source: usize,
	target: usize,
	strength: f64,
	bias: f64,
}

/// Deterministic tiny offsets for coincident points.
#[derive(Clone, Debug)]
struct Jiggle(u64);

impl Jiggle {
	fn next(&mut self) -> f64 {
		// xorshift64*
		self.0 ^= self.0 >> 12;
		self.0 ^= self.0 << 25;
		self.0 ^= self.0 >> 27;
		let bits = self.0.wrapping_mul(0x2545_f491_4f6c_dd1d) >> 11;
		((bits as f64) / ((1u64 << 53) as f64) - 0.5) * 1e-6
	}
}

/// A spring-electrical simulation over indexed bodies.
#[derive(Clone, Debug)]
pub struct ForceLayout {
	bodies: Vec<Body>,
	springs: Vec<Spring>,
	params: LayoutParams,
	center: Position,
	alpha: f64,
	alpha_decay: f64,
	jiggle: Jiggle,
}

impl ForceLayout {
	/// Place `node_count` bodies on a spiral around `center` and attach springs.
	///
	/// Links whose endpoints are out of range or identical are ignored.
	pub fn new(node_count: usize, links: &[GraphLink], params: LayoutParams, center: Position) -> Self {
		let angle_step = PI * (3.0 - 5f64.sqrt());
		let bodies = (0..node_count)
			.map(|i| {
				let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * angle_step;
				Body {
					x: center.x + radius * angle.cos(),
					y: center.y + radius * angle.sin(),
					..Body::default()
				}
			})
			.collect();

		let usable: Vec<&GraphLink> = links
			.iter()
			.filter(|l| l.source < node_count && l.target < node_count && l.source != l.target)
			.collect();
		let mut degree = vec![0usize; node_count];
		for link in &usable {
			degree[link.source] += 1;
			degree[link.target] += 1;
		}
		let springs = usable
			.into_iter()
			.map(|link| {
				let (ds, dt) = (degree[link.source] as f64, degree[link.target] as f64);
				let mut strength = 1.0 / ds.min(dt);
				if params.link_weighting == LinkWeighting::ByWeight {
					strength *= link.weight;
				}
				Spring {
					source: link.source,
					target: link.target,
					strength,
					bias: ds / (ds + dt),
				}
			})
			.collect();

		Self {
			bodies,
			springs,
			params,
			center,
			alpha: 1.0,
			alpha_decay: 1.0 - params.alpha_min.powf(1.0 / 300.0),
			jiggle: Jiggle(JIGGLE_SEED),
		}
	}

	/// Current cooling factor.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Hold a body at a fixed point while stepping.
	pub fn pin(&mut self, index: usize, at: Position) {
		if let Some(body) = self.bodies.get_mut(index) {
			body.fx = Some(at.x);
			body.fy = Some(at.y);
		}
	}

	/// Return a pinned body to free simulation.
	pub fn unpin(&mut self, index: usize) {
		if let Some(body) = self.bodies.get_mut(index) {
			body.fx = None;
			body.fy = None;
		}
	}

	/// Advance the simulation by one step.
	pub fn tick(&mut self) {
		self.alpha += (0.0 - self.alpha) * self.alpha_decay;
		let alpha = self.alpha;

		self.apply_springs(alpha);
		self.apply_charge(alpha);
		self.apply_center();
		self.apply_collision();

		let keep = 1.0 - self.params.velocity_decay;
		for body in &mut self.bodies {
			match body.fx {
				Some(fx) => {
					body.x = fx;
					body.vx = 0.0;
				}
				None => {
					body.vx *= keep;
					body.x += body.vx;
				}
			}
			match body.fy {
				Some(fy) => {
					body.y = fy;
					body.vy = 0.0;
				}
				None => {
					body.vy *= keep;
					body.y += body.vy;
				}
			}
		}
	}

	/// Advance the configured number of steps.
	pub fn run(&mut self) {
		for _ in 0..self.params.iterations {
			self.tick();
		}
		debug!(
			"Layout settled: {} bodies, {} springs, alpha {:.4}",
			self.bodies.len(),
			self.springs.len(),
			self.alpha
		);
	}

	/// Current positions; non-finite bodies are reported at the center.
	pub fn positions(&self) -> Vec<Position> {
		self.bodies
			.iter()
			.enumerate()
			.map(|(i, b)| {
				let p = Position::new(b.x, b.y);
				if p.is_finite() {
					p
				} else {
					warn!("Body {} diverged; placing it at the layout center", i);
					self.center
				}
			})
			.collect()
	}

	fn apply_springs(&mut self, alpha: f64) {
		let distance = self.params.link_distance;
		for spring in &self.springs {
			let (s, t) = (&self.bodies[spring.source], &self.bodies[spring.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = self.jiggle.next();
			}
			if y == 0.0 {
				y = self.jiggle.next();
			}
			let l = x.hypot(y);
			let l = (l - distance) / l * alpha * spring.strength;
			let (x, y) = (x * l, y * l);

			let t = &mut self.bodies[spring.target];
			t.vx -= x * spring.bias;
			t.vy -= y * spring.bias;
			let s = &mut self.bodies[spring.source];
			s.vx += x * (1.0 - spring.bias);
			s.vy += y * (1.0 - spring.bias);
		}
	}

	// Exact pairwise summation, O(n^2) per step.
	fn apply_charge(&mut self, alpha: f64) {
		let strength = self.params.charge_strength * alpha;
		let n = self.bodies.len();
		for i in 0..n {
			let (xi, yi) = (self.bodies[i].x, self.bodies[i].y);
			let (mut dvx, mut dvy) = (0.0, 0.0);
			for (j, other) in self.bodies.iter().enumerate() {
				if i == j {
					continue;
				}
				let mut x = other.x - xi;
				let mut y = other.y - yi;
				if x == 0.0 {
					x = self.jiggle.next();
				}
				if y == 0.0 {
					y = self.jiggle.next();
				}
				let mut l = x * x + y * y;
				if l < DISTANCE_MIN2 {
					l = (DISTANCE_MIN2 * l).sqrt();
				}
				dvx += x * strength / l;
				dvy += y * strength / l;
			}
			self.bodies[i].vx += dvx;
			self.bodies[i].vy += dvy;
		}
	}

	fn apply_center(&mut self) {
		let n = self.bodies.len();
		if n == 0 {
			return;
		}
		let (sx, sy) = self
			.bodies
			.iter()
			.fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
		let k = self.params.center_strength;
		let dx = (sx / n as f64 - self.center.x) * k;
		let dy = (sy / n as f64 - self.center.y) * k;
		for body in &mut self.bodies {
			body.x -= dx;
			body.y -= dy;
		}
	}

	fn apply_collision(&mut self) {
		let r = self.params.collision_radius;
		let reach = r + r;
		let n = self.bodies.len();
		for i in 0..n {
			let xi = self.bodies[i].x + self.bodies[i].vx;
			let yi = self.bodies[i].y + self.bodies[i].vy;
			for j in (i + 1)..n {
				let other = &self.bodies[j];
				let mut x = xi - other.x - other.vx;
				let mut y = yi - other.y - other.vy;
				let mut l = x * x + y * y;
				if l >= reach * reach {
					continue;
				}
				if x == 0.0 {
					x = self.jiggle.next();
					l += x * x;
				}
				if y == 0.0 {
					y = self.jiggle.next();
					l += y * y;
				}
				let l = l.sqrt();
				let push = (reach - l) / l;
				let (x, y) = (x * push, y * push);
				// Equal radii split the correction evenly.
				self.bodies[i].vx += x * 0.5;
				self.bodies[i].vy += y * 0.5;
				self.bodies[j].vx -= x * 0.5;
				self.bodies[j].vy -= y * 0.5;
			}
		}
	}
}

/// Lay out `node_count` nodes around `center` and return their positions.
pub fn layout(node_count: usize, links: &[GraphLink], params: LayoutParams, center: Position) -> Vec<Position> {
	let mut sim = ForceLayout::new(node_count, links, params, center);
	sim.run();
	sim.positions()
}

#[cfg(test)]
mod tests {
	use super::*;

	const CENTER: Position = Position { x: 370.0, y: 275.0 };

	fn link(source: usize, target: usize, weight: f64) -> GraphLink {
		GraphLink {
			source,
			target,
			weight,
		}
	}

	fn triangle() -> Vec<GraphLink> {
		vec![link(0, 1, 0.5), link(1, 0, 0.5), link(2, 0, 0.5)]
	}

	fn min_pair_distance(positions: &[Position]) -> f64 {
		let mut min = f64::INFINITY;
		for i in 0..positions.len() {
			for j in (i + 1)..positions.len() {
				min = min.min(positions[i].distance(positions[j]));
			}
		}
		min
	}

	#[test]
	fn single_node_settles_at_center() {
		let positions = layout(1, &[], LayoutParams::default(), CENTER);
		assert_eq!(positions.len(), 1);
		assert!(positions[0].distance(CENTER) < 1.0);
	}

	#[test]
	fn empty_graph_has_no_positions() {
		assert!(layout(0, &[], LayoutParams::default(), CENTER).is_empty());
	}

	#[test]
	fn layout_is_deterministic() {
		let a = layout(3, &triangle(), LayoutParams::default(), CENTER);
		let b = layout(3, &triangle(), LayoutParams::default(), CENTER);
		assert_eq!(a, b);
	}

	#[test]
	fn nodes_do_not_overlap_after_settling() {
		let params = LayoutParams::default();
		let mut links = Vec::new();
		for i in 0..12 {
			links.push(link(i, (i + 1) % 12, 0.5));
			links.push(link(i, (i + 5) % 12, 1.0 / 3.0));
		}
		let positions = layout(12, &links, params, CENTER);
		assert!(positions.iter().all(|p| p.is_finite()));
		assert!(min_pair_distance(&positions) >= params.collision_radius);
	}

	#[test]
	fn isolated_nodes_are_still_placed() {
		let links = vec![link(0, 1, 0.5)];
		let positions = layout(4, &links, LayoutParams::default(), CENTER);
		assert_eq!(positions.len(), 4);
		assert!(positions.iter().all(|p| p.is_finite()));
		assert!(min_pair_distance(&positions) >= LayoutParams::default().collision_radius);
	}

	#[test]
	fn centroid_is_pulled_to_center() {
		let positions = layout(3, &triangle(), LayoutParams::default(), CENTER);
		let cx = positions.iter().map(|p| p.x).sum::<f64>() / 3.0;
		let cy = positions.iter().map(|p| p.y).sum::<f64>() / 3.0;
		assert!(Position::new(cx, cy).distance(CENTER) < 5.0);
	}

	#[test]
	fn linked_pair_separates_towards_link_distance() {
		let params = LayoutParams {
			charge_strength: 0.0,
			..LayoutParams::default()
		};
		let positions = layout(2, &[link(0, 1, 0.5)], params, CENTER);
		let d = positions[0].distance(positions[1]);
		assert!((d - params.link_distance).abs() < 5.0, "distance {}", d);
	}

	#[test]
	fn weighted_springs_pull_less_than_uniform_ones() {
		let base = LayoutParams {
			charge_strength: 0.0,
			collision_radius: 0.0,
			iterations: 2,
			..LayoutParams::default()
		};
		let weighted = LayoutParams {
			link_weighting: LinkWeighting::ByWeight,
			..base
		};
		let links = [link(0, 1, 0.25)];
		let start = ForceLayout::new(2, &links, base, CENTER).positions();
		let d0 = start[0].distance(start[1]);
		let uniform = layout(2, &links, base, CENTER);
		let scaled = layout(2, &links, weighted, CENTER);
		let (du, dw) = (
			uniform[0].distance(uniform[1]),
			scaled[0].distance(scaled[1]),
		);
		// Both springs stretch the pair towards the link distance, the weighted one more slowly.
		assert!(du > dw && dw > d0, "{} {} {}", d0, du, dw);
	}

	#[test]
	fn pinned_body_holds_its_position() {
		let mut sim = ForceLayout::new(3, &triangle(), LayoutParams::default(), CENTER);
		let at = Position::new(10.0, 20.0);
		sim.pin(1, at);
		sim.run();
		assert_eq!(sim.positions()[1], at);

		assert!(sim.alpha() < 0.02);

		sim.unpin(1);
		sim.tick();
		assert_ne!(sim.positions()[1], at);
	}

	#[test]
	fn out_of_range_links_are_ignored() {
		let links = vec![link(0, 7, 0.5), link(1, 1, 0.5)];
		let positions = layout(2, &links, LayoutParams::default(), CENTER);
		assert!(positions.iter().all(|p| p.is_finite()));
	}

	#[test]
	fn config_deserializes_with_defaults() {
		let params: LayoutParams =
			serde_json::from_str(r#"{"iterations": 50, "link_weighting": "by_weight"}"#).unwrap();
		assert_eq!(params.iterations, 50);
		assert_eq!(params.link_weighting, LinkWeighting::ByWeight);
		assert_eq!(params.link_distance, 100.0);
	}
}
