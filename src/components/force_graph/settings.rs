use log::warn;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use super::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelSettings {
	pub show: bool,
	pub color: String,
	pub font_size: f64,
}

impl Default for LabelSettings {
	fn default() -> Self {
		Self {
			show: true,
			color: "#777777".into(),
			font_size: 9.0,
		}
	}
}

impl LabelSettings {
	/// Font size converted from points to pixels.
	pub fn font_size_px(&self) -> f64 {
		self.font_size.max(1.0) * 4.0 / 3.0
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkColoring {
	#[default]
	Interactive,
	ByWeight,
	ByLinkType,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkSettings {
	pub show_arrow: bool,
	pub show_label: bool,
	pub color_link: LinkColoring,
	pub thickness_with_weight: bool,
	pub decimal_places: Option<usize>,
	pub display_units: u64,
}

impl Default for LinkSettings {
	fn default() -> Self {
		Self {
			show_arrow: false,
			show_label: false,
			color_link: LinkColoring::Interactive,
			thickness_with_weight: true,
			decimal_places: None,
			display_units: 0,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeSettings {
	pub display_image: bool,
	pub default_image: String,
	pub image_url: String,
	pub image_ext: String,
	pub name_max_length: usize,
	pub highlight_reachable_links: bool,
	pub radius: f64,
}

impl Default for NodeSettings {
	fn default() -> Self {
		Self {
			display_image: false,
			default_image: "Home".into(),
			image_url: String::new(),
			image_ext: ".png".into(),
			name_max_length: 10,
			highlight_reachable_links: false,
			radius: 5.0,
		}
	}
}

impl NodeSettings {
	/// Image href for a node type; absolute and data URLs pass through.
	pub fn image_href(&self, image: Option<&str>) -> String {
		let key = image.filter(|s| !s.is_empty()).unwrap_or(&self.default_image);
		if key.contains("://") || key.starts_with("data:") {
			key.to_string()
		} else {
			format!("{}{}{}", self.image_url, key, self.image_ext)
		}
	}

	pub fn truncate(&self, label: &str) -> String {
		if self.name_max_length == 0 || label.chars().count() <= self.name_max_length {
			return label.to_string();
		}
		let mut out: String = label.chars().take(self.name_max_length).collect();
		out.push('…');
		out
	}
}

/// Formatting options supplied wholesale on every update.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormatSettings {
	pub labels: LabelSettings,
	pub links: LinkSettings,
	pub nodes: NodeSettings,
}

impl FormatSettings {
	/// Every key the renderer reads; each must be declared in the capabilities.
	pub const KEYS: &'static [&'static str] = &[
		"labels.show",
		"labels.color",
		"labels.fontSize",
		"links.showArrow",
		"links.showLabel",
		"links.colorLink",
		"links.thicknessWithWeight",
		"links.decimalPlaces",
		"links.displayUnits",
		"nodes.displayImage",
		"nodes.defaultImage",
		"nodes.imageUrl",
		"nodes.imageExt",
		"nodes.nameMaxLength",
		"nodes.highlightReachableLinks",
		"nodes.radius",
	];

	pub fn parse(json: &str) -> Result<Self> {
		serde_json::from_str(json).map_err(Error::Settings)
	}

	/// Lenient conversion: a malformed section keeps its defaults.
	pub fn from_value(value: Option<&JsonValue>) -> Self {
		let Some(JsonValue::Object(map)) = value else {
			return Self::default();
		};
		Self {
			labels: section(map.get("labels"), "labels"),
			links: section(map.get("links"), "links"),
			nodes: section(map.get("nodes"), "nodes"),
		}
	}
}

fn section<T: DeserializeOwned + Default>(value: Option<&JsonValue>, name: &str) -> T {
	match value {
		None | Some(JsonValue::Null) => T::default(),
		Some(v) => T::deserialize(v).unwrap_or_else(|e| {
			warn!("ignoring malformed `{name}` settings: {e}");
			T::default()
		}),
	}
}

/// Force parameters for the layout simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
	pub alpha_min: f64,
	pub alpha_decay: f64,
	pub velocity_decay: f64,
	pub charge_strength: f64,
	pub charge_distance_min: f64,
	pub theta: f64,
	pub link_distance: f64,
	pub center_strength: f64,
	pub collision_padding: f64,
	pub max_iterations: usize,
	pub seed: u32,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		let alpha_min: f64 = 0.001;
		Self {
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			velocity_decay: 0.4,
			charge_strength: -60.0,
			charge_distance_min: 1.0,
			theta: 0.9,
			link_distance: 60.0,
			center_strength: 0.1,
			collision_padding: 2.0,
			max_iterations: 600,
			seed: 1,
		}
	}
}
