use std::f64::consts::FRAC_PI_2;

use leptos::prelude::*;

use crate::components::k_selector::{KSelector, max_k};
use crate::components::knn_graph::KnnGraphCanvas;
use crate::config::AppConfig;
use crate::dataset::{RankingDataset, parse_dataset};

/// Deterministic sample ranking table (text encoding): `n` points in four
/// clusters, each row listing its `neighbors` nearest points.
fn sample_rankings(n: usize, neighbors: usize) -> String {
	let points: Vec<(f64, f64)> = (0..n)
		.map(|i| {
			let angle = (i % 4) as f64 * FRAC_PI_2;
			(
				10.0 * angle.cos() + 4.0 * rand_simple(2 * i),
				10.0 * angle.sin() + 4.0 * rand_simple(2 * i + 1),
			)
		})
		.collect();

	let mut out = String::from("# sample ranking: id followed by its nearest neighbors\n");
	for (i, &(x, y)) in points.iter().enumerate() {
		let mut others: Vec<(usize, f64)> = points
			.iter()
			.enumerate()
			.filter(|&(j, _)| j != i)
			.map(|(j, &(ox, oy))| (j, (ox - x).hypot(oy - y)))
			.collect();
		others.sort_by(|a, b| a.1.total_cmp(&b.1));
		let row: Vec<String> = std::iter::once(i)
			.chain(others.into_iter().take(neighbors).map(|(j, _)| j))
			.map(|id| id.to_string())
			.collect();
		out.push_str(&row.join(" "));
		out.push('\n');
	}
	out
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Visualizer page: dataset source, K selector and the graph.
#[component]
pub fn Home() -> impl IntoView {
	let config = use_context::<AppConfig>().unwrap_or_default();
	let source = RwSignal::new(sample_rankings(40, 12));
	let parsed = Memo::new(move |_| source.with(|text| parse_dataset(text)));
	let dataset = Memo::new(move |_| parsed.get().unwrap_or_default());
	let max = Signal::derive(move || max_k(dataset.with(RankingDataset::len)));
	let k = RwSignal::new(config.default_k.max(1));

	view! {
		<div class="renderer-container">
			<details class="dataset-source">
				<summary>"Dataset"</summary>
				<textarea
					rows="10"
					cols="60"
					prop:value=move || source.get()
					on:change=move |ev| source.set(event_target_value(&ev))
				/>
			</details>

			<KSelector max=max k=k />

			<ErrorBoundary fallback=|errors| {
				view! {
					<p class="error">"Error loading data:"</p>
					<ul>
						{move || {
							errors
								.get()
								.into_iter()
								.map(|(_, e)| view! { <li>{e.to_string()}</li> })
								.collect_view()
						}}
					</ul>
				}
			}>
				{move || {
					parsed
						.get()
						.map(|ds| ds.is_empty().then(|| view! { <p>"No data available"</p> }))
				}}
			</ErrorBoundary>

			<KnnGraphCanvas
				data=dataset
				k=k
				zoom=config.default_zoom
				layout=config.layout
				preview=config.preview.clone()
				frame=config.frame
			/>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sample_parses_as_text_rows() {
		let ds = parse_dataset(&sample_rankings(40, 12)).unwrap();
		assert_eq!(ds.len(), 40);
		assert!(ds.rows().iter().all(|r| r.len() == 13));
		assert_eq!(ds.index_of(17), Some(17));
	}

	#[test]
	fn sample_is_deterministic() {
		assert_eq!(sample_rankings(12, 3), sample_rankings(12, 3));
		let text = sample_rankings(4, 2);
		let first = text.lines().nth(1).unwrap();
		assert!(first.starts_with("0 "));
		assert_eq!(first.split(' ').count(), 3);
	}
}
