use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::scene::{GraphScene, NODE_RADIUS};

const BACKGROUND: &str = "#ffffff";
const LINK_COLOR: &str = "rgba(153, 153, 153, 0.6)";
const NODE_COLOR: &str = "#69b3a2";
const LABEL_COLOR: &str = "#333333";
const HOVER_RING: &str = "#2a3b4c";

pub fn render(scene: &GraphScene, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, scene.dimensions.width, scene.dimensions.height);
	ctx.save();
	let t = scene.viewport.transform;
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_links(scene, ctx);
	draw_nodes(scene, ctx);
	ctx.restore();
}

fn draw_links(scene: &GraphScene, ctx: &CanvasRenderingContext2d) {
	ctx.set_stroke_style_str(LINK_COLOR);
	for link in &scene.graph.links {
		let (a, b) = (scene.position(link.source), scene.position(link.target));
		ctx.set_line_width(link.stroke_width());
		ctx.begin_path();
		ctx.move_to(a.x, a.y);
		ctx.line_to(b.x, b.y);
		ctx.stroke();
	}
}

fn draw_nodes(scene: &GraphScene, ctx: &CanvasRenderingContext2d) {
	let hovered = scene.hovered();
	ctx.set_font("10px sans-serif");

	for node in &scene.graph.nodes {
		let p = scene.position(node.index);

		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, NODE_RADIUS, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(NODE_COLOR);
		ctx.fill();

		if scene.viewport.is_pinned(node.index) {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(3.0),
				&JsValue::from_f64(2.0),
			));
			ctx.set_stroke_style_str(NODE_COLOR);
			ctx.set_line_width(1.5);
			ctx.begin_path();
			let _ = ctx.arc(p.x, p.y, NODE_RADIUS + 3.0, 0.0, 2.0 * PI);
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		if hovered == Some(node.index) {
			ctx.set_stroke_style_str(HOVER_RING);
			ctx.set_line_width(2.0);
			ctx.begin_path();
			let _ = ctx.arc(p.x, p.y, NODE_RADIUS + 1.0, 0.0, 2.0 * PI);
			ctx.stroke();
		}

		ctx.set_fill_style_str(LABEL_COLOR);
		let _ = ctx.fill_text(&node.label, p.x + NODE_RADIUS + 2.0, p.y + 3.0);
	}
}
