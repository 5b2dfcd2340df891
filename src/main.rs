use knn_graph_canvas::{App, AppConfig, init_logging};
use leptos::prelude::*;

fn main() {
	init_logging();
	let config = AppConfig::load();
	leptos::mount::mount_to_body(move || view! { <App config=config /> })
}
