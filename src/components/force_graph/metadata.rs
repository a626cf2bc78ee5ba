use super::types::ColumnDescriptor;

pub const ROLE_SOURCE: &str = "Source";
pub const ROLE_TARGET: &str = "Target";
pub const ROLE_WEIGHT: &str = "Weight";
pub const ROLE_LINK_TYPE: &str = "LinkType";
pub const ROLE_SOURCE_TYPE: &str = "SourceType";
pub const ROLE_TARGET_TYPE: &str = "TargetType";
pub const ROLE_TOOLTIPS: &str = "Tooltips";

/// First column carrying `role_name`, or `None` when either side is absent.
pub fn column_by_role_name<'a>(
	columns: Option<&'a [ColumnDescriptor]>,
	role_name: Option<&str>,
) -> Option<&'a ColumnDescriptor> {
	let role = role_name?;
	columns?.iter().find(|c| c.has_role(role))
}

pub fn column_index_by_role_name(
	columns: Option<&[ColumnDescriptor]>,
	role_name: Option<&str>,
) -> Option<usize> {
	let role = role_name?;
	columns?.iter().position(|c| c.has_role(role))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::DataType;

	fn columns() -> Vec<ColumnDescriptor> {
		vec![
			ColumnDescriptor::new("From", ROLE_SOURCE, DataType::Text),
			ColumnDescriptor::new("To", ROLE_TARGET, DataType::Text),
			ColumnDescriptor::new("Amount", ROLE_WEIGHT, DataType::Numeric),
		]
	}

	#[test]
	fn degenerate_inputs_resolve_to_none() {
		let cols = columns();
		assert!(column_by_role_name(None, None).is_none());
		assert!(column_by_role_name(None, Some(ROLE_SOURCE)).is_none());
		assert!(column_by_role_name(Some(cols.as_slice()), None).is_none());
		assert!(column_by_role_name(Some(&[][..]), Some(ROLE_SOURCE)).is_none());
	}

	#[test]
	fn absent_role_resolves_to_none() {
		let cols = columns();
		assert!(column_by_role_name(Some(cols.as_slice()), Some("Grouping")).is_none());
	}

	#[test]
	fn present_role_resolves_to_first_match() {
		let mut cols = columns();
		cols.push(ColumnDescriptor::new("Other weight", ROLE_WEIGHT, DataType::Numeric));
		let found = column_by_role_name(Some(cols.as_slice()), Some(ROLE_WEIGHT)).unwrap();
		assert_eq!(found.display_name, "Amount");
		assert_eq!(column_index_by_role_name(Some(cols.as_slice()), Some(ROLE_TARGET)), Some(1));
	}
}
