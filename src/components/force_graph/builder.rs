use std::collections::HashMap;

use log::debug;
use serde_json::{Map, Value as JsonValue};

use super::format::ValueFormatter;
use super::metadata::{
	ROLE_LINK_TYPE, ROLE_SOURCE, ROLE_SOURCE_TYPE, ROLE_TARGET, ROLE_TARGET_TYPE, ROLE_TOOLTIPS,
	ROLE_WEIGHT, column_index_by_role_name,
};
use super::types::{
	DataTable, EdgeKey, Endpoint, GraphData, GraphEdge, GraphNode, InputRow, Value,
};

/// How rows sharing an ordered (source, target) pair combine into one edge weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WeightAggregation {
	#[default]
	Sum,
	Count,
	Last,
}

#[derive(Clone, Debug, Default)]
pub struct GraphBuilder {
	pub aggregation: WeightAggregation,
}

impl GraphBuilder {
	pub fn new(aggregation: WeightAggregation) -> Self {
		Self { aggregation }
	}

	pub fn build(&self, rows: &[InputRow]) -> GraphData {
		let mut graph = GraphData::default();
		let mut node_ids: HashMap<String, usize> = HashMap::new();
		let mut edge_ids: HashMap<EdgeKey, usize> = HashMap::new();

		for row in rows {
			let source = intern(&mut graph.nodes, &mut node_ids, &row.source, ROLE_SOURCE);
			let target = intern(&mut graph.nodes, &mut node_ids, &row.target, ROLE_TARGET);
			let key = EdgeKey {
				source: row.source.id.clone(),
				target: row.target.id.clone(),
			};

			match edge_ids.get(&key) {
				Some(&idx) => {
					let edge = &mut graph.edges[idx];
					edge.rows += 1;
					edge.weight = self.combine(edge.weight, row.weight, edge.rows);
					if edge.link_type.is_none() {
						edge.link_type = row.link_type.clone();
					}
				}
				None => {
					edge_ids.insert(key.clone(), graph.edges.len());
					graph.edges.push(GraphEdge {
						is_self_loop: source == target,
						key,
						source,
						target,
						weight: self.combine(None, row.weight, 1),
						rows: 1,
						link_type: row.link_type.clone(),
						ordinal: 0,
						parallel: 1,
						extras: row.extras.clone(),
					});
				}
			}
		}

		assign_ordinals(&mut graph.edges);
		for edge in &graph.edges {
			graph.nodes[edge.source].degree += 1;
			if !edge.is_self_loop {
				graph.nodes[edge.target].degree += 1;
			}
		}
		debug!(
			"built graph: {} rows, {} nodes, {} edges",
			rows.len(),
			graph.nodes.len(),
			graph.edges.len()
		);
		graph
	}

	fn combine(&self, current: Option<f64>, incoming: Option<f64>, rows: usize) -> Option<f64> {
		match self.aggregation {
			WeightAggregation::Sum => match (current, incoming) {
				(Some(a), Some(b)) => Some(a + b),
				(a, b) => a.or(b),
			},
			WeightAggregation::Count => Some(rows as f64),
			WeightAggregation::Last => incoming.or(current),
		}
	}
}

fn intern(
	nodes: &mut Vec<GraphNode>,
	ids: &mut HashMap<String, usize>,
	endpoint: &Endpoint,
	role: &'static str,
) -> usize {
	if let Some(&idx) = ids.get(&endpoint.id) {
		if nodes[idx].image.is_none() {
			nodes[idx].image = endpoint.image.clone();
		}
		return idx;
	}
	ids.insert(endpoint.id.clone(), nodes.len());
	nodes.push(GraphNode {
		id: endpoint.id.clone(),
		label: endpoint.label.clone(),
		value: endpoint.value.clone(),
		image: endpoint.image.clone(),
		degree: 0,
		first_role: role,
	});
	nodes.len() - 1
}

fn assign_ordinals(edges: &mut [GraphEdge]) {
	let mut groups: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
	for (i, edge) in edges.iter().enumerate() {
		let pair = (edge.source.min(edge.target), edge.source.max(edge.target));
		groups.entry(pair).or_default().push(i);
	}
	for members in groups.values() {
		for (ordinal, &i) in members.iter().enumerate() {
			edges[i].ordinal = ordinal;
			edges[i].parallel = members.len();
		}
	}
}

/// Converts a host table into rows. Rows with an empty endpoint are skipped.
pub fn rows_from_table(table: &DataTable) -> Vec<InputRow> {
	let columns = Some(table.columns.as_slice());
	let (Some(source_col), Some(target_col)) = (
		column_index_by_role_name(columns, Some(ROLE_SOURCE)),
		column_index_by_role_name(columns, Some(ROLE_TARGET)),
	) else {
		debug!("table has no source/target columns");
		return Vec::new();
	};
	let weight_col = column_index_by_role_name(columns, Some(ROLE_WEIGHT));
	let link_type_col = column_index_by_role_name(columns, Some(ROLE_LINK_TYPE));
	let source_type_col = column_index_by_role_name(columns, Some(ROLE_SOURCE_TYPE));
	let target_type_col = column_index_by_role_name(columns, Some(ROLE_TARGET_TYPE));
	let tooltip_cols: Vec<usize> = table
		.columns
		.iter()
		.enumerate()
		.filter(|(_, c)| c.has_role(ROLE_TOOLTIPS))
		.map(|(i, _)| i)
		.collect();

	let source_fmt = ValueFormatter::for_column(table.columns.get(source_col));
	let target_fmt = ValueFormatter::for_column(table.columns.get(target_col));
	let typed = |row: &[JsonValue], col: usize| -> Value {
		match (row.get(col), table.columns.get(col)) {
			(Some(raw), Some(column)) => Value::from_json(raw, column.data_type),
			_ => Value::Null,
		}
	};
	let text = |row: &[JsonValue], col: Option<usize>| -> Option<String> {
		match typed(row, col?) {
			Value::Null => None,
			value => Some(value.identity()).filter(|s| !s.is_empty()),
		}
	};

	let mut out = Vec::with_capacity(table.rows.len());
	for (i, row) in table.rows.iter().enumerate() {
		let row = row.as_slice();
		let source = typed(row, source_col);
		let target = typed(row, target_col);
		if source.is_null() || target.is_null() {
			debug!("skipping row {i}: missing endpoint");
			continue;
		}
		let mut extras = Map::new();
		for &col in &tooltip_cols {
			if let (Some(raw), Some(column)) = (row.get(col), table.columns.get(col)) {
				extras.insert(column.display_name.clone(), raw.clone());
			}
		}
		out.push(InputRow {
			source: Endpoint {
				id: source.identity(),
				label: source_fmt.format(&source),
				value: source,
				image: text(row, source_type_col),
			},
			target: Endpoint {
				id: target.identity(),
				label: target_fmt.format(&target),
				value: target,
				image: text(row, target_type_col),
			},
			weight: weight_col.and_then(|c| typed(row, c).as_f64()),
			link_type: text(row, link_type_col),
			extras,
		});
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{ColumnDescriptor, DataType};
	use serde_json::json;

	#[test]
	fn empty_input_yields_empty_graph() {
		let graph = GraphBuilder::default().build(&[]);
		assert!(graph.nodes.is_empty());
		assert!(graph.edges.is_empty());
	}

	#[test]
	fn shared_identities_resolve_to_one_node() {
		let rows = [InputRow::new("A", "B"), InputRow::new("B", "C"), InputRow::new("C", "A")];
		let graph = GraphBuilder::default().build(&rows);
		assert_eq!(graph.nodes.len(), 3);
		assert_eq!(graph.edges.len(), 3);
		assert!(graph.nodes.iter().all(|n| n.degree == 2));
	}

	#[test]
	fn duplicate_pairs_aggregate_weight() {
		let rows = [
			InputRow::new("A", "B").with_weight(2.0),
			InputRow::new("A", "B").with_weight(3.5),
			InputRow::new("B", "A").with_weight(1.0),
		];
		let graph = GraphBuilder::default().build(&rows);
		assert_eq!(graph.edges.len(), 2);
		assert_eq!(graph.edges[0].weight, Some(5.5));
		assert_eq!(graph.edges[0].rows, 2);
		assert_eq!(graph.edges[0].parallel, 2);
		assert_eq!(graph.edges[0].ordinal, 0);
		assert_eq!(graph.edges[1].ordinal, 1);

		let counted = GraphBuilder::new(WeightAggregation::Count).build(&rows);
		assert_eq!(counted.edges[0].weight, Some(2.0));
		let last = GraphBuilder::new(WeightAggregation::Last).build(&rows);
		assert_eq!(last.edges[0].weight, Some(3.5));
	}

	#[test]
	fn first_link_type_wins() {
		let rows = [
			InputRow::new("A", "B"),
			InputRow::new("A", "B").with_link_type("call"),
			InputRow::new("A", "B").with_link_type("email"),
		];
		let graph = GraphBuilder::default().build(&rows);
		assert_eq!(graph.edges[0].link_type.as_deref(), Some("call"));
	}

	#[test]
	fn self_loops_are_flagged() {
		let rows = [InputRow::new("A", "A"), InputRow::new("A", "B")];
		let graph = GraphBuilder::default().build(&rows);
		assert!(graph.edges[0].is_self_loop);
		assert!(!graph.edges[1].is_self_loop);
		assert_eq!(graph.edges[0].weight, None);
		assert_eq!(graph.nodes[0].degree, 2);
	}

	#[test]
	fn table_rows_are_typed_and_formatted() {
		let table = DataTable {
			columns: vec![
				ColumnDescriptor::new("Day", ROLE_SOURCE, DataType::Date),
				ColumnDescriptor::new("City", ROLE_TARGET, DataType::Text),
				ColumnDescriptor::new("Trips", ROLE_WEIGHT, DataType::Numeric),
				ColumnDescriptor::new("Note", ROLE_TOOLTIPS, DataType::Text),
			],
			rows: vec![
				vec![json!("2024-01-05"), json!("Oslo"), json!(4), json!("first")],
				vec![json!(null), json!("Oslo"), json!(1), json!("skipped")],
				vec![json!("2024-01-05T00:00:00Z"), json!("Bergen"), json!("2.5"), json!(null)],
			],
		};
		let rows = rows_from_table(&table);
		assert_eq!(rows.len(), 2);
		assert_eq!(rows[0].source.id, "2024-01-05T00:00:00");
		assert_eq!(rows[0].source.label, "2024-01-05");
		assert_eq!(rows[0].weight, Some(4.0));
		assert_eq!(rows[0].extras.get("Note"), Some(&json!("first")));
		assert_eq!(rows[1].weight, Some(2.5));

		let graph = GraphBuilder::default().build(&rows);
		assert_eq!(graph.nodes.len(), 3);
	}

	#[test]
	fn table_without_endpoints_yields_no_rows() {
		let table = DataTable {
			columns: vec![ColumnDescriptor::new("City", ROLE_TARGET, DataType::Text)],
			rows: vec![vec![json!("Oslo")]],
		};
		assert!(rows_from_table(&table).is_empty());
	}
}
