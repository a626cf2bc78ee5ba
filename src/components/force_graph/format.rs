use chrono::Timelike;

use super::types::{ColumnDescriptor, Value};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const MAX_DECIMAL_PLACES: usize = 10;

/// Display units scale; `0` means pick from the magnitude of a reference value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayUnit {
	pub value: f64,
	pub suffix: &'static str,
}

const UNITS: &[DisplayUnit] = &[
	DisplayUnit { value: 1e12, suffix: "T" },
	DisplayUnit { value: 1e9, suffix: "bn" },
	DisplayUnit { value: 1e6, suffix: "M" },
	DisplayUnit { value: 1e3, suffix: "K" },
];

const NONE: DisplayUnit = DisplayUnit {
	value: 1.0,
	suffix: "",
};

impl DisplayUnit {
	pub fn resolve(display_units: u64, reference: f64) -> Self {
		match display_units {
			0 => UNITS
				.iter()
				.copied()
				.find(|u| reference.abs() >= u.value)
				.unwrap_or(NONE),
			1 => NONE,
			n => UNITS
				.iter()
				.copied()
				.find(|u| u.value == n as f64)
				.unwrap_or(DisplayUnit {
					value: n as f64,
					suffix: "",
				}),
		}
	}
}

/// Formats typed values for labels and tooltips.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueFormatter {
	format: Option<String>,
	unit: DisplayUnit,
	precision: Option<usize>,
}

impl Default for ValueFormatter {
	fn default() -> Self {
		Self {
			format: None,
			unit: NONE,
			precision: None,
		}
	}
}

impl ValueFormatter {
	pub fn new(format: Option<&str>, unit: DisplayUnit, precision: Option<usize>) -> Self {
		Self {
			format: format.map(str::to_string),
			unit,
			precision,
		}
	}

	pub fn for_column(column: Option<&ColumnDescriptor>) -> Self {
		Self::new(column.and_then(|c| c.format.as_deref()), NONE, None)
	}

	pub fn format(&self, value: &Value) -> String {
		match value {
			Value::Null => String::new(),
			Value::Text(s) => s.clone(),
			Value::Number(n) => self.format_number(*n),
			Value::Date(d) => {
				let pattern = match self.format.as_deref() {
					Some(f) if f.contains('%') => f,
					_ if d.num_seconds_from_midnight() == 0 => DEFAULT_DATE_FORMAT,
					_ => DEFAULT_DATE_TIME_FORMAT,
				};
				d.format(pattern).to_string()
			}
		}
	}

	pub fn format_number(&self, n: f64) -> String {
		if !n.is_finite() {
			return String::new();
		}
		let scaled = n / self.unit.value;
		let precision = self
			.precision
			.or_else(|| self.format.as_deref().and_then(format_precision))
			.map(|p| p.min(MAX_DECIMAL_PLACES));
		let text = match precision {
			Some(p) => format!("{scaled:.p$}"),
			None => trim_float(scaled),
		};
		let text = if self.format.as_deref().is_some_and(|f| f.contains(',')) {
			group_thousands(&text)
		} else {
			text
		};
		format!("{text}{}", self.unit.suffix)
	}
}

/// Decimal places implied by a `0.00` style pattern.
fn format_precision(format: &str) -> Option<usize> {
	if format.contains('%') && !format.contains('.') {
		return None;
	}
	let pattern = format.split(';').next()?;
	if !pattern.contains(['0', '#']) {
		return None;
	}
	Some(
		pattern
			.split_once('.')
			.map(|(_, frac)| frac.chars().take_while(|c| *c == '0' || *c == '#').count())
			.unwrap_or(0),
	)
}

/// Two decimals at most, trailing zeros dropped.
pub(super) fn trim_float(n: f64) -> String {
	let text = format!("{n:.2}");
	let text = text.trim_end_matches('0').trim_end_matches('.');
	if text == "-0" { "0".into() } else { text.into() }
}

fn group_thousands(text: &str) -> String {
	let (sign, rest) = text
		.strip_prefix('-')
		.map(|r| ("-", r))
		.unwrap_or(("", text));
	let (int, frac) = rest.split_once('.').map_or((rest, None), |(i, f)| (i, Some(f)));
	let mut grouped = String::with_capacity(int.len() + int.len() / 3);
	for (i, c) in int.chars().enumerate() {
		if i > 0 && (int.len() - i) % 3 == 0 {
			grouped.push(',');
		}
		grouped.push(c);
	}
	match frac {
		Some(f) => format!("{sign}{grouped}.{f}"),
		None => format!("{sign}{grouped}"),
	}
}
