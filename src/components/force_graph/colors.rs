use serde::Deserialize;

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

pub const DEFAULT_NODE_STROKE: &str = "#ffffff";
pub const DEFAULT_LINK_COLOR: &str = "#bbbbbb";

/// Theme colors and accessibility mode from the host.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorContext {
	pub is_high_contrast: bool,
	pub background: String,
	pub foreground: String,
	pub palette: Vec<String>,
}

impl Default for ColorContext {
	fn default() -> Self {
		Self {
			is_high_contrast: false,
			background: "#ffffff".into(),
			foreground: "#000000".into(),
			palette: COLORS.iter().map(|c| c.to_string()).collect(),
		}
	}
}

impl ColorContext {
	pub fn high_contrast(background: &str, foreground: &str) -> Self {
		Self {
			is_high_contrast: true,
			background: background.into(),
			foreground: foreground.into(),
			..Self::default()
		}
	}

	pub fn palette_color(&self, index: usize) -> &str {
		if self.palette.is_empty() {
			return COLORS[index % COLORS.len()];
		}
		&self.palette[index % self.palette.len()]
	}

	pub fn node_fill(&self, index: usize) -> String {
		if self.is_high_contrast {
			return self.foreground.clone();
		}
		self.palette_color(index).to_string()
	}

	pub fn node_stroke(&self) -> String {
		if self.is_high_contrast {
			return self.background.clone();
		}
		DEFAULT_NODE_STROKE.into()
	}

	/// Label fill; configured colors are overridden in high contrast.
	pub fn text_fill(&self, configured: &str) -> String {
		if self.is_high_contrast {
			return self.foreground.clone();
		}
		configured.to_string()
	}

	pub fn link_stroke(&self, themed: &str) -> String {
		if self.is_high_contrast {
			return self.foreground.clone();
		}
		themed.to_string()
	}
}
