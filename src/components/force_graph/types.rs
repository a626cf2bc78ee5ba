use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

/// Declared data type of a column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
	#[default]
	Text,
	Numeric,
	Date,
}

/// Column metadata as supplied by the host on every update.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
	pub display_name: String,
	#[serde(default)]
	pub roles: BTreeSet<String>,
	#[serde(default, rename = "type")]
	pub data_type: DataType,
	#[serde(default)]
	pub format: Option<String>,
}

impl ColumnDescriptor {
	pub fn new(display_name: impl Into<String>, role: &str, data_type: DataType) -> Self {
		Self {
			display_name: display_name.into(),
			roles: BTreeSet::from([role.to_string()]),
			data_type,
			format: None,
		}
	}

	pub fn with_format(mut self, format: impl Into<String>) -> Self {
		self.format = Some(format.into());
		self
	}

	pub fn has_role(&self, role: &str) -> bool {
		self.roles.contains(role)
	}
}

/// Tabular data delivered by the host: one cell per column per row.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DataTable {
	#[serde(default)]
	pub columns: Vec<ColumnDescriptor>,
	#[serde(default)]
	pub rows: Vec<Vec<JsonValue>>,
}

/// A cell value typed by its column.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	Null,
	Text(String),
	Number(f64),
	Date(NaiveDateTime),
}

impl Value {
	/// Types a raw JSON cell according to the column's declared type.
	pub fn from_json(raw: &JsonValue, data_type: DataType) -> Self {
		match (raw, data_type) {
			(JsonValue::Null, _) => Value::Null,
			(JsonValue::String(s), DataType::Date) => parse_date(s)
				.map(Value::Date)
				.unwrap_or_else(|| Value::Text(s.clone())),
			(JsonValue::Number(n), DataType::Date) => n
				.as_i64()
				.and_then(DateTime::from_timestamp_millis)
				.map(|dt| Value::Date(dt.naive_utc()))
				.unwrap_or(Value::Null),
			(JsonValue::String(s), DataType::Numeric) => s
				.trim()
				.parse::<f64>()
				.map(Value::Number)
				.unwrap_or_else(|_| Value::Text(s.clone())),
			(JsonValue::Number(n), _) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
			(JsonValue::String(s), DataType::Text) => Value::Text(s.clone()),
			(JsonValue::Bool(b), _) => Value::Text(b.to_string()),
			(other, _) => Value::Text(other.to_string()),
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Number(n) if n.is_finite() => Some(*n),
			_ => None,
		}
	}

	/// Canonical identity text; dates use ISO-8601 so equal instants dedupe.
	pub fn identity(&self) -> String {
		match self {
			Value::Null => String::new(),
			Value::Text(s) => s.clone(),
			Value::Number(n) => n.to_string(),
			Value::Date(d) => d.format("%Y-%m-%dT%H:%M:%S").to_string(),
		}
	}
}

fn parse_date(s: &str) -> Option<NaiveDateTime> {
	let s = s.trim();
	if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
		return Some(dt.naive_utc());
	}
	if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
		return Some(dt);
	}
	NaiveDate::parse_from_str(s, "%Y-%m-%d")
		.ok()
		.and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// One side of a relational row, already resolved to identity and label.
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoint {
	pub id: String,
	pub label: String,
	pub value: Value,
	pub image: Option<String>,
}

impl Endpoint {
	pub fn text(id: impl Into<String>) -> Self {
		let id = id.into();
		Self {
			label: id.clone(),
			value: Value::Text(id.clone()),
			id,
			image: None,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputRow {
	pub source: Endpoint,
	pub target: Endpoint,
	pub weight: Option<f64>,
	pub link_type: Option<String>,
	/// Extra tooltip fields keyed by column display name, in column order.
	pub extras: Map<String, JsonValue>,
}

impl InputRow {
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: Endpoint::text(source),
			target: Endpoint::text(target),
			weight: None,
			link_type: None,
			extras: Map::new(),
		}
	}

	pub fn with_weight(mut self, weight: f64) -> Self {
		self.weight = Some(weight);
		self
	}

	pub fn with_link_type(mut self, link_type: impl Into<String>) -> Self {
		self.link_type = Some(link_type.into());
		self
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub label: String,
	pub value: Value,
	pub image: Option<String>,
	pub degree: usize,
	/// Role of the first row that introduced this node ("Source" or "Target").
	pub first_role: &'static str,
}

/// Ordered (source, target) identity pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
	pub source: String,
	pub target: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	pub key: EdgeKey,
	pub source: usize,
	pub target: usize,
	pub weight: Option<f64>,
	pub rows: usize,
	pub link_type: Option<String>,
	pub is_self_loop: bool,
	/// Index among edges sharing the same unordered endpoint pair.
	pub ordinal: usize,
	/// Number of edges sharing the same unordered endpoint pair.
	pub parallel: usize,
	pub extras: Map<String, JsonValue>,
}

impl GraphEdge {
	pub fn strength_weight(&self) -> f64 {
		self.weight.filter(|w| w.is_finite()).unwrap_or(1.0)
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
}

impl GraphData {
	pub fn max_weight(&self) -> Option<f64> {
		self.edges
			.iter()
			.filter_map(|e| e.weight)
			.filter(|w| w.is_finite())
			.map(f64::abs)
			.reduce(f64::max)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn date_cells_share_one_identity() {
		let a = Value::from_json(&json!("2024-03-01"), DataType::Date);
		let b = Value::from_json(&json!("2024-03-01T00:00:00Z"), DataType::Date);
		assert_eq!(a.identity(), "2024-03-01T00:00:00");
		assert_eq!(a.identity(), b.identity());
		let millis = Value::from_json(&json!(1_709_251_200_000i64), DataType::Date);
		assert_eq!(millis.identity(), a.identity());
	}

	#[test]
	fn cells_fall_back_to_text() {
		assert_eq!(
			Value::from_json(&json!("n/a"), DataType::Numeric),
			Value::Text("n/a".into())
		);
		assert_eq!(
			Value::from_json(&json!(" 2.5 "), DataType::Numeric).as_f64(),
			Some(2.5)
		);
		assert!(Value::from_json(&JsonValue::Null, DataType::Text).is_null());
		assert_eq!(Value::from_json(&json!(true), DataType::Text).identity(), "true");
	}

	#[test]
	fn table_deserializes_from_host_json() {
		let table: DataTable = serde_json::from_value(json!({
			"columns": [
				{"displayName": "From", "roles": ["Source"], "type": "text"},
				{"displayName": "When", "roles": ["Target"], "type": "date", "format": "%d/%m"}
			],
			"rows": [["A", "2024-03-01"]]
		}))
		.unwrap();
		assert!(table.columns[0].has_role("Source"));
		assert_eq!(table.columns[1].data_type, DataType::Date);
		assert_eq!(table.columns[1].format.as_deref(), Some("%d/%m"));
		assert_eq!(table.rows.len(), 1);
	}
}
