use std::cell::RefCell;
use std::rc::Rc;

use leptos::ev;
use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent};

use super::layout::LayoutParams;
use super::preview::PreviewConfig;
use super::render;
use super::scene::{FrameConfig, GraphScene, HoverInfo};
use super::types::Dimensions;
use super::viewport::{FullscreenMode, PointerUpdate};
use crate::dataset::RankingDataset;

type SharedScene = Rc<RefCell<Option<GraphScene>>>;

const DOM_DELTA_LINE: u32 = 1;

/// Force-directed KNN graph with pan, zoom, node drag, hover previews and
/// fullscreen. Rebuilt whenever the dataset, `k`, `zoom` or the container size
/// changes.
#[component]
pub fn KnnGraphCanvas(
	/// Ranking table to visualize.
	#[prop(into)]
	data: Signal<RankingDataset>,
	/// Neighbors linked per row.
	#[prop(into)]
	k: Signal<usize>,
	/// Initial zoom factor, clamped to the allowed scale range.
	#[prop(into, default = Signal::stored(1.0))]
	zoom: Signal<f64>,
	/// Simulation constants.
	#[prop(optional)]
	layout: LayoutParams,
	/// Hover preview image lookup.
	#[prop(optional)]
	preview: PreviewConfig,
	/// Margins and height rules for the canvas.
	#[prop(optional)]
	frame: FrameConfig,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let scene: SharedScene = Rc::new(RefCell::new(None));
	let preview = StoredValue::new(preview);
	let (dimensions, set_dimensions) = signal(Dimensions::default());
	let (hover_info, set_hover_info) = signal(None::<HoverInfo>);
	let fullscreen = RwSignal::new(FullscreenMode::Normal);

	let measure = move || {
		let Some(container) = container_ref.get_untracked() else {
			return;
		};
		let window_height = window()
			.inner_height()
			.ok()
			.and_then(|h| h.as_f64())
			.unwrap_or(0.0);
		let next = frame.dimensions(container.get_bounding_client_rect().width(), window_height);
		if next != dimensions.get_untracked() {
			debug!("Container measured at {}x{}", next.width, next.height);
			set_dimensions.set(next);
		}
	};

	Effect::new(move |_| {
		if container_ref.get().is_some() {
			measure();
		}
	});
	let resize = window_event_listener(ev::resize, move |_| measure());
	on_cleanup(move || resize.remove());

	// Fullscreen changes bubble from the element through the document to the
	// window. A window-sized container may not resize when it goes fullscreen,
	// so the mode is re-read here rather than on resize.
	let sync_fullscreen = move |_: web_sys::Event| {
		let mode = FullscreenMode::from_active(document().fullscreen_element().is_some());
		if mode != fullscreen.get_untracked() {
			debug!("Host fullscreen state is now {:?}", mode);
			fullscreen.set(mode);
		}
		measure();
	};
	let fs_change = window_event_listener_untyped("fullscreenchange", sync_fullscreen);
	let fs_error = window_event_listener_untyped("fullscreenerror", sync_fullscreen);
	on_cleanup(move || {
		fs_change.remove();
		fs_error.remove();
	});

	let scene_build = scene.clone();
	Effect::new(move |_| {
		data.track();
		let (dims, k, zoom) = (dimensions.get(), k.get(), zoom.get());
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(next) = data.with_untracked(|ds| GraphScene::build(ds, k, zoom, dims, layout, frame))
		else {
			return;
		};
		canvas.set_width(dims.width as u32);
		canvas.set_height(dims.height as u32);
		*scene_build.borrow_mut() = Some(next);
		set_hover_info.set(None);
		draw(&canvas, &scene_build);
	});

	let redraw = {
		let scene = scene.clone();
		move || {
			if let Some(canvas) = canvas_ref.get_untracked() {
				let canvas: HtmlCanvasElement = canvas.into();
				draw(&canvas, &scene);
			}
		}
	};
	let local = move |client_x: i32, client_y: i32| -> Option<(f64, f64)> {
		let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
		let rect = canvas.get_bounding_client_rect();
		Some((client_x as f64 - rect.left(), client_y as f64 - rect.top()))
	};

	let press = {
		let (scene, redraw) = (scene.clone(), redraw.clone());
		move |x: f64, y: f64| {
			if let Some(ref mut s) = *scene.borrow_mut() {
				match s.node_at_position(x, y) {
					Some(idx) => {
						let at = s.position(idx);
						s.viewport.begin_node_drag(idx, x, y, at);
					}
					None => s.viewport.begin_pan(x, y),
				}
			}
			redraw();
		}
	};

	let hover_and_move = {
		let (scene, redraw) = (scene.clone(), redraw.clone());
		move |x: f64, y: f64| {
			let mut changed = false;
			if let Some(ref mut s) = *scene.borrow_mut() {
				if !s.viewport.is_dragging() {
					let hovered = s.node_at_position(x, y);
					if s.set_hover(hovered) {
						set_hover_info.set(preview.with_value(|p| s.hover_info(p)));
						changed = true;
					}
				}
				changed |= s.viewport.pointer_move(x, y) != PointerUpdate::Idle;
			}
			if changed {
				redraw();
			}
		}
	};

	let release = {
		let (scene, redraw) = (scene.clone(), redraw.clone());
		move |clear_hover: bool| {
			if let Some(ref mut s) = *scene.borrow_mut() {
				s.viewport.release();
				if clear_hover && s.set_hover(None) {
					set_hover_info.set(None);
				}
			}
			redraw();
		}
	};

	let on_mousedown = {
		let press = press.clone();
		move |ev: MouseEvent| {
			if let Some((x, y)) = local(ev.client_x(), ev.client_y()) {
				press(x, y);
			}
		}
	};

	let on_mousemove = {
		let hover_and_move = hover_and_move.clone();
		move |ev: MouseEvent| {
			if let Some((x, y)) = local(ev.client_x(), ev.client_y()) {
				hover_and_move(x, y);
			}
		}
	};

	let on_mouseup = {
		let release = release.clone();
		move |_: MouseEvent| release(false)
	};

	let on_mouseleave = {
		let release = release.clone();
		move |_: MouseEvent| release(true)
	};

	let on_wheel = {
		let (scene, redraw) = (scene.clone(), redraw.clone());
		move |ev: WheelEvent| {
			ev.prevent_default();
			let Some((x, y)) = local(ev.client_x(), ev.client_y()) else {
				return;
			};
			if let Some(ref mut s) = *scene.borrow_mut() {
				s.viewport.wheel(
					ev.delta_y(),
					ev.delta_mode() == DOM_DELTA_LINE,
					ev.ctrl_key(),
					x,
					y,
				);
			}
			redraw();
		}
	};

	let touches = move |ev: &TouchEvent| -> Vec<(f64, f64)> {
		let list = ev.touches();
		(0..list.length())
			.filter_map(|i| list.get(i))
			.filter_map(|t| local(t.client_x(), t.client_y()))
			.collect()
	};

	let on_touchstart = {
		let (scene, press) = (scene.clone(), press.clone());
		move |ev: TouchEvent| {
			ev.prevent_default();
			match touches(&ev).as_slice() {
				[] => {}
				[(x, y)] => press(*x, *y),
				[a, b, ..] => {
					if let Some(ref mut s) = *scene.borrow_mut() {
						let (distance, mx, my) = pinch_geometry(*a, *b);
						s.viewport.begin_pinch(distance, mx, my);
					}
				}
			}
		}
	};

	let on_touchmove = {
		let (scene, redraw) = (scene.clone(), redraw.clone());
		move |ev: TouchEvent| {
			ev.prevent_default();
			match touches(&ev).as_slice() {
				[] => {}
				[(x, y)] => hover_and_move(*x, *y),
				[a, b, ..] => {
					if let Some(ref mut s) = *scene.borrow_mut() {
						let (distance, mx, my) = pinch_geometry(*a, *b);
						s.viewport.pinch_to(distance, mx, my);
					}
					redraw();
				}
			}
		}
	};

	let on_touchend = {
		let release = release.clone();
		move |ev: TouchEvent| match touches(&ev).as_slice() {
			[] => release(false),
			// A lifted pinch finger leaves the other one panning.
			[(x, y)] => {
				release(false);
				press(*x, *y);
			}
			_ => {}
		}
	};

	// The host confirms through `fullscreenchange`, or reverts through
	// `fullscreenerror`; both re-sync the mode and re-measure.
	let toggle_fullscreen = move |_: MouseEvent| {
		let Some(container) = container_ref.get_untracked() else {
			return;
		};
		let mode = fullscreen
			.get_untracked()
			.request_toggle(|target| match target {
				FullscreenMode::Fullscreen => container.request_fullscreen(),
				FullscreenMode::Normal => {
					document().exit_fullscreen();
					Ok(())
				}
			});
		fullscreen.set(mode);
	};

	view! {
		<div
			node_ref=container_ref
			class="knn-graph-container"
			style=move || container_style(fullscreen.get())
		>
			<h2>{move || format!("KNN Graph Visualization (k={})", k.get())}</h2>
			<div
				class="knn-graph-frame"
				style="border: 1px solid #ddd; border-radius: 5px; overflow: hidden; position: relative;"
			>
				<canvas
					node_ref=canvas_ref
					class="knn-graph-canvas"
					on:mousedown=on_mousedown
					on:mousemove=on_mousemove
					on:mouseup=on_mouseup
					on:mouseleave=on_mouseleave
					on:wheel=on_wheel
					on:touchstart=on_touchstart
					on:touchmove=on_touchmove
					on:touchend=on_touchend
					style="display: block; cursor: grab; touch-action: none;"
				/>
				{move || hover_info.get().map(|info| view! { <HoverPanel info=info /> })}
				<button
					class="knn-fullscreen-toggle"
					on:click=toggle_fullscreen
					style="position: absolute; top: 10px; right: 10px; padding: 5px; cursor: pointer; background: rgba(255, 255, 255, 0.8); border: 1px solid #ccc; border-radius: 5px;"
				>
					{move || {
						if fullscreen.get().is_fullscreen() { "Exit Fullscreen" } else { "Fullscreen" }
					}}
				</button>
			</div>
		</div>
	}
}

/// Inspection panel for the hovered node; a missing image swaps in the
/// placeholder once.
#[component]
fn HoverPanel(info: HoverInfo) -> impl IntoView {
	let title = info.title();
	let id = info.original_id;
	let (src, set_src) = signal(info.image_path);
	let (failed, set_failed) = signal(false);
	let placeholder = info.placeholder;

	view! {
		<div
			class="knn-hover-panel"
			style="position: absolute; top: 50px; right: 10px; background: white; padding: 5px; border: 1px solid #ccc; border-radius: 5px; box-shadow: 0 0 10px rgba(0,0,0,0.2); z-index: 1000;"
		>
			<p style="margin: 0 0 5px 0; font-weight: bold;">{title}</p>
			<img
				src=move || src.get()
				alt=move || {
					if failed.get() { "Image not found".to_string() } else { format!("Image {}", id) }
				}
				on:error=move |_| {
					if failed.get_untracked() {
						return;
					}
					debug!("No preview image for {}; using placeholder", id);
					set_failed.set(true);
					set_src.set(placeholder.clone());
				}
				style="max-width: 200px; max-height: 200px; display: block;"
			/>
		</div>
	}
}

fn container_style(mode: FullscreenMode) -> &'static str {
	match mode {
		FullscreenMode::Normal => "width: 100%; padding: 10px; position: relative;",
		FullscreenMode::Fullscreen => {
			"width: 100%; height: 100%; padding: 10px; position: fixed; top: 0; left: 0; z-index: 1000; background-color: white;"
		}
	}
}

fn pinch_geometry(a: (f64, f64), b: (f64, f64)) -> (f64, f64, f64) {
	(
		(a.0 - b.0).hypot(a.1 - b.1),
		(a.0 + b.0) / 2.0,
		(a.1 + b.1) / 2.0,
	)
}

fn draw(canvas: &HtmlCanvasElement, scene: &SharedScene) {
	let Some(ctx) = canvas
		.get_context("2d")
		.ok()
		.flatten()
		.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
	else {
		warn!("Canvas 2d context unavailable");
		return;
	};
	if let Some(ref s) = *scene.borrow() {
		render::render(s, &ctx);
	}
}
