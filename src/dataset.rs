//! Neighbor-ranking tables and their two accepted encodings.
//!
//! A dataset is an ordered list of rows. Entry 0 of a row is the item's own
//! identifier and the remaining entries are its neighbors, nearest first.
//! Input is either a JSON array of arrays or a whitespace-separated text
//! table (one row per line, `#` comments and blank lines ignored).

use std::collections::HashMap;

use log::{debug, info, warn};
use serde_json::Value;
use thiserror::Error;

/// Dataset-local item identifier.
pub type ItemId = i64;

/// One item's ranked neighbor list, including the item itself at position 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RankingRow(pub Vec<ItemId>);

impl RankingRow {
	/// The row's own identifier.
	pub fn id(&self) -> Option<ItemId> {
		self.0.first().copied()
	}

	/// Neighbors nearest-first (everything after position 0).
	pub fn neighbors(&self) -> &[ItemId] {
		self.0.get(1..).unwrap_or(&[])
	}

	/// Number of entries, the row's own identifier included.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// True when the row carries no identifier.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// Failure to obtain any usable rows from the raw input.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
	/// Input looked like JSON but did not parse.
	#[error("invalid JSON dataset at line {line}, column {column}: {message}")]
	InvalidJson {
		/// Parser message.
		message: String,
		/// 1-based line of the failure.
		line: usize,
		/// 1-based column of the failure.
		column: usize,
	},

	/// Valid JSON whose top level is not an array.
	#[error("JSON dataset must be an array of rows")]
	NotAnArray,

	/// Every row was malformed.
	#[error("no valid rows found ({skipped} malformed rows skipped)")]
	NoValidRows {
		/// Rows that failed to parse.
		skipped: usize,
	},
}

impl From<serde_json::Error> for DatasetError {
	fn from(e: serde_json::Error) -> Self {
		DatasetError::InvalidJson {
			message: e.to_string(),
			line: e.line(),
			column: e.column(),
		}
	}
}

/// Which of the two input encodings a raw string uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
	/// A JSON array of integer arrays.
	Json,
	/// Whitespace-separated integers, one row per line.
	Text,
}

impl Encoding {
	/// JSON when the trimmed input opens with `[`, text otherwise.
	pub fn sniff(input: &str) -> Self {
		if input.trim_start().starts_with('[') {
			Encoding::Json
		} else {
			Encoding::Text
		}
	}
}

/// Rows parsed from either encoding, tagged by where they came from.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedRows {
	/// Rows read from the JSON encoding.
	Json(Vec<RankingRow>),
	/// Rows read from the text encoding.
	Text(Vec<RankingRow>),
}

impl ParsedRows {
	/// Encoding the rows were read from.
	pub fn encoding(&self) -> Encoding {
		match self {
			ParsedRows::Json(_) => Encoding::Json,
			ParsedRows::Text(_) => Encoding::Text,
		}
	}

	/// Index the rows into a dataset.
	pub fn into_dataset(self) -> RankingDataset {
		match self {
			ParsedRows::Json(rows) | ParsedRows::Text(rows) => RankingDataset::new(rows),
		}
	}
}

/// Parse raw input into tagged rows, skipping malformed rows.
pub fn parse_rows(input: &str) -> Result<ParsedRows, DatasetError> {
	let (parsed, skipped) = match Encoding::sniff(input) {
		Encoding::Json => {
			let (rows, skipped) = parse_json_rows(input)?;
			(ParsedRows::Json(rows), skipped)
		}
		Encoding::Text => {
			let (rows, skipped) = parse_text_rows(input);
			(ParsedRows::Text(rows), skipped)
		}
	};

	let accepted = match &parsed {
		ParsedRows::Json(rows) | ParsedRows::Text(rows) => rows.len(),
	};
	if accepted == 0 && skipped > 0 {
		return Err(DatasetError::NoValidRows { skipped });
	}
	info!(
		"Parsed {:?} dataset: {} rows accepted, {} skipped",
		parsed.encoding(),
		accepted,
		skipped
	);
	Ok(parsed)
}

/// Parse raw input straight into a dataset.
pub fn parse_dataset(input: &str) -> Result<RankingDataset, DatasetError> {
	parse_rows(input).map(ParsedRows::into_dataset)
}

fn parse_json_rows(input: &str) -> Result<(Vec<RankingRow>, usize), DatasetError> {
	let Value::Array(items) = serde_json::from_str::<Value>(input)? else {
		return Err(DatasetError::NotAnArray);
	};

	let mut rows = Vec::with_capacity(items.len());
	let mut skipped = 0;
	for (i, item) in items.iter().enumerate() {
		match json_row(item) {
			Some(row) => rows.push(row),
			None => {
				debug!("Skipping malformed JSON row {}: {}", i, item);
				skipped += 1;
			}
		}
	}
	Ok((rows, skipped))
}

fn json_row(item: &Value) -> Option<RankingRow> {
	let entries = item.as_array()?;
	if entries.is_empty() {
		return None;
	}
	entries
		.iter()
		.map(json_id)
		.collect::<Option<Vec<_>>>()
		.map(RankingRow)
}

fn json_id(value: &Value) -> Option<ItemId> {
	if let Some(id) = value.as_i64() {
		return Some(id);
	}
	// Tolerate integral floats such as `3.0`.
	let f = value.as_f64()?;
	(f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as ItemId)
}

fn parse_text_rows(input: &str) -> (Vec<RankingRow>, usize) {
	let mut rows = Vec::new();
	let mut skipped = 0;
	for (lineno, line) in input.lines().enumerate() {
		let line = line.trim();
		if line.is_empty() || line.starts_with('#') {
			continue;
		}
		match line
			.split_whitespace()
			.map(str::parse::<ItemId>)
			.collect::<Result<Vec<_>, _>>()
		{
			Ok(ids) => rows.push(RankingRow(ids)),
			Err(e) => {
				debug!("Skipping malformed text row at line {}: {}", lineno + 1, e);
				skipped += 1;
			}
		}
	}
	(rows, skipped)
}

/// Parsed neighbor-ranking table with identifier lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RankingDataset {
	rows: Vec<RankingRow>,
	index_of: HashMap<ItemId, usize>,
}

impl RankingDataset {
	/// Build a dataset, indexing each identifier by its first row.
	///
	/// Empty rows carry no identifier and are dropped.
	pub fn new(mut rows: Vec<RankingRow>) -> Self {
		let before = rows.len();
		rows.retain(|row| !row.is_empty());
		if rows.len() < before {
			debug!("Dropped {} empty rows", before - rows.len());
		}
		let mut index_of = HashMap::with_capacity(rows.len());
		for (i, row) in rows.iter().enumerate() {
			let Some(id) = row.id() else { continue };
			if let Some(&first) = index_of.get(&id) {
				warn!(
					"Duplicate identifier {} at row {} (first seen at row {}); keeping the first",
					id, i, first
				);
				continue;
			}
			index_of.insert(id, i);
		}
		Self { rows, index_of }
	}

	/// Rows in input order.
	pub fn rows(&self) -> &[RankingRow] {
		&self.rows
	}

	/// Number of rows.
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	/// True when there are no rows.
	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Row index of the first row whose own identifier equals `id`.
	pub fn index_of(&self, id: ItemId) -> Option<usize> {
		self.index_of.get(&id).copied()
	}
}

impl From<Vec<Vec<ItemId>>> for RankingDataset {
	fn from(rows: Vec<Vec<ItemId>>) -> Self {
		Self::new(rows.into_iter().map(RankingRow).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sniffs_json_only_on_leading_bracket() {
		assert_eq!(Encoding::sniff("  \n[[0, 1]]"), Encoding::Json);
		assert_eq!(Encoding::sniff("0 1 2"), Encoding::Text);
		assert_eq!(Encoding::sniff("# [comment]\n0 1"), Encoding::Text);
	}

	#[test]
	fn parses_json_rows() {
		let parsed = parse_rows("[[0,1,2],[1,0,2],[2,0,1]]").unwrap();
		assert_eq!(parsed.encoding(), Encoding::Json);
		let ds = parsed.into_dataset();
		assert_eq!(ds.len(), 3);
		assert_eq!(ds.rows()[1].0, vec![1, 0, 2]);
	}

	#[test]
	fn json_skips_malformed_rows() {
		let ds = parse_dataset(r#"[[0,1], "oops", [], [2, "x"], [3, 4.0]]"#).unwrap();
		assert_eq!(ds.len(), 2);
		assert_eq!(ds.rows()[1].0, vec![3, 4]);
	}

	#[test]
	fn json_rejects_non_array_and_garbage() {
		assert!(matches!(
			parse_dataset("[1"),
			Err(DatasetError::InvalidJson { .. })
		));
		assert!(
			parse_dataset("[1")
				.unwrap_err()
				.to_string()
				.starts_with("invalid JSON dataset")
		);
		assert!(matches!(
			parse_dataset("[{\"a\": 1}]"),
			Err(DatasetError::NoValidRows { skipped: 1 })
		));
	}

	#[test]
	fn text_comment_lines_contribute_no_rows() {
		let input = "0 1 2\n# a comment 9 9 9\n1 0 2\n\n   # indented comment\n2 0 1\n";
		let parsed = parse_rows(input).unwrap();
		assert_eq!(parsed.encoding(), Encoding::Text);
		let ds = parsed.into_dataset();
		assert_eq!(ds.len(), 3);
		assert_eq!(ds.rows()[2].0, vec![2, 0, 1]);
	}

	#[test]
	fn text_skips_malformed_lines() {
		let ds = parse_dataset("0 1\n1 zero\n2\t0  1\n").unwrap();
		assert_eq!(ds.len(), 2);
		assert_eq!(ds.rows()[1].0, vec![2, 0, 1]);
	}

	#[test]
	fn text_with_only_garbage_is_an_error() {
		assert_eq!(
			parse_dataset("a b\nc d\n"),
			Err(DatasetError::NoValidRows { skipped: 2 })
		);
	}

	#[test]
	fn empty_input_is_an_empty_dataset() {
		assert!(parse_dataset("").unwrap().is_empty());
		assert!(parse_dataset("# nothing here\n").unwrap().is_empty());
		assert!(parse_dataset("[]").unwrap().is_empty());
	}

	#[test]
	fn lookup_keeps_first_duplicate() {
		let ds = RankingDataset::from(vec![vec![7, 1], vec![1, 7], vec![7, 1]]);
		assert_eq!(ds.index_of(7), Some(0));
		assert_eq!(ds.index_of(1), Some(1));
		assert_eq!(ds.index_of(99), None);
		assert_eq!(ds.len(), 3);
	}

	#[test]
	fn row_accessors() {
		let row = RankingRow(vec![5]);
		assert_eq!(row.id(), Some(5));
		assert!(row.neighbors().is_empty());
		assert_eq!(RankingRow::default().id(), None);
	}

	#[test]
	fn empty_rows_are_dropped() {
		let ds = RankingDataset::from(vec![vec![0, 1], vec![], vec![1, 0]]);
		assert_eq!(ds.len(), 2);
		assert_eq!(ds.index_of(1), Some(1));
	}
}
