//! KNN graph construction from neighbor rankings.

use log::debug;

use super::types::{GraphData, GraphLink, GraphNode};
use crate::dataset::RankingDataset;

/// Derive nodes and rank-weighted links from a ranking table.
///
/// Every row becomes a node in row order. Each row with at least one neighbor
/// links to its first `min(k, len - 1)` neighbors that resolve to a row of the
/// dataset; unresolved and self-referencing neighbors are skipped.
pub fn build(dataset: &RankingDataset, k: usize) -> GraphData {
	let k = k.max(1);
	let nodes: Vec<GraphNode> = dataset
		.rows()
		.iter()
		.enumerate()
		.filter_map(|(index, row)| {
			row.id().map(|original_id| GraphNode {
				index,
				original_id,
				label: format!("Node {}", index),
			})
		})
		.collect();

	let mut links = Vec::new();
	let mut dangling = 0usize;
	for (source, row) in dataset.rows().iter().enumerate() {
		for (offset, &neighbor) in row.neighbors().iter().take(k).enumerate() {
			let rank = offset + 1;
			match dataset.index_of(neighbor) {
				Some(target) if target != source => links.push(GraphLink {
					source,
					target,
					weight: 1.0 / (rank as f64 + 1.0),
				}),
				Some(_) => {}
				None => dangling += 1,
			}
		}
	}

	if dangling > 0 {
		debug!("Dropped {} links to identifiers without a row", dangling);
	}
	GraphData { nodes, links }
}
