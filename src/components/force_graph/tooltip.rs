use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use super::format::ValueFormatter;
use super::metadata::column_by_role_name;
use super::types::{ColumnDescriptor, DataType, Value};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipItem {
	pub display_name: String,
	pub value: String,
}

/// One item per key of `input`, in the record's own order.
pub fn build(
	input: Option<&Map<String, JsonValue>>,
	columns: Option<&[ColumnDescriptor]>,
) -> Vec<TooltipItem> {
	let Some(input) = input else {
		return Vec::new();
	};
	input
		.iter()
		.map(|(key, raw)| {
			let column = column_by_role_name(columns, Some(key));
			TooltipItem {
				display_name: column
					.map(|c| c.display_name.clone())
					.unwrap_or_else(|| key.clone()),
				value: display_value(raw, column),
			}
		})
		.collect()
}

fn display_value(raw: &JsonValue, column: Option<&ColumnDescriptor>) -> String {
	let data_type = column.map(|c| c.data_type).unwrap_or(match raw {
		JsonValue::Number(_) => DataType::Numeric,
		_ => DataType::Text,
	});
	match Value::from_json(raw, data_type) {
		Value::Text(s) => s,
		value => ValueFormatter::for_column(column).format(&value),
	}
}
