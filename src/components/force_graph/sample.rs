//! Deterministic synthetic dataset for the demo page and tests.

use serde_json::{Value as JsonValue, json};

use super::metadata::{ROLE_LINK_TYPE, ROLE_SOURCE, ROLE_TARGET, ROLE_WEIGHT};
use super::types::{ColumnDescriptor, DataTable, DataType};

const LINK_TYPES: [&str; 3] = ["email", "call", "meeting"];

/// Shape of the synthetic table: `sources` and `targets` categories, the
/// first `overlap` targets reusing source names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleShape {
	pub sources: usize,
	pub targets: usize,
	pub overlap: usize,
}

impl Default for SampleShape {
	fn default() -> Self {
		Self {
			sources: 12,
			targets: 8,
			overlap: 3,
		}
	}
}

impl SampleShape {
	pub fn rows(&self) -> usize {
		self.sources.max(self.targets)
	}

	/// Distinct node identities the table produces.
	pub fn nodes(&self) -> usize {
		if self.sources == 0 || self.targets == 0 {
			return 0;
		}
		self.sources + self.targets - self.overlap()
	}

	fn overlap(&self) -> usize {
		self.overlap.min(self.sources).min(self.targets)
	}
}

/// Deterministic pseudo-random number in `[0, 1)`.
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

fn source_name(i: usize) -> String {
	format!("Person {}", i + 1)
}

fn target_name(shape: &SampleShape, j: usize) -> String {
	if j < shape.overlap() {
		source_name(j)
	} else {
		format!("Team {}", j - shape.overlap() + 1)
	}
}

/// Builds `max(sources, targets)` rows, each a distinct (source, target) pair.
pub fn sample_table(shape: SampleShape) -> DataTable {
	let columns = vec![
		ColumnDescriptor::new("From", ROLE_SOURCE, DataType::Text),
		ColumnDescriptor::new("To", ROLE_TARGET, DataType::Text),
		ColumnDescriptor::new("Messages", ROLE_WEIGHT, DataType::Numeric).with_format("0.00"),
		ColumnDescriptor::new("Channel", ROLE_LINK_TYPE, DataType::Text),
	];
	if shape.sources == 0 || shape.targets == 0 {
		return DataTable {
			columns,
			rows: Vec::new(),
		};
	}
	let rows: Vec<Vec<JsonValue>> = (0..shape.rows())
		.map(|i| {
			let weight = (1.0 + rand_simple(i) * 99.0).round();
			vec![
				json!(source_name(i % shape.sources)),
				json!(target_name(&shape, i % shape.targets)),
				json!(weight),
				json!(LINK_TYPES[(rand_simple(i * 7) * LINK_TYPES.len() as f64) as usize]),
			]
		})
		.collect();
	DataTable { columns, rows }
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;

	#[test]
	fn default_shape_counts() {
		let shape = SampleShape::default();
		let table = sample_table(shape);
		assert_eq!(table.rows.len(), 12);
		let names: HashSet<&str> = table
			.rows
			.iter()
			.flat_map(|r| [r[0].as_str().unwrap(), r[1].as_str().unwrap()])
			.collect();
		assert_eq!(names.len(), shape.nodes());
		assert_eq!(shape.nodes(), 17);
	}

	#[test]
	fn same_shape_same_table() {
		let shape = SampleShape {
			sources: 5,
			targets: 9,
			overlap: 2,
		};
		assert_eq!(sample_table(shape), sample_table(shape));
	}

	#[test]
	fn empty_side_gives_no_rows() {
		let table = sample_table(SampleShape {
			sources: 0,
			targets: 4,
			overlap: 0,
		});
		assert!(table.rows.is_empty());
	}
}
