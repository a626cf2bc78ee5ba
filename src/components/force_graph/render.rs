use std::collections::{HashMap, HashSet};
use std::f64::consts::FRAC_1_SQRT_2;

use log::trace;

use super::colors::{ColorContext, DEFAULT_LINK_COLOR};
use super::format::{DisplayUnit, ValueFormatter, trim_float};
use super::scene::{Scene, Shape, ShapeKey, Upsert};
use super::settings::{FormatSettings, LinkColoring};
use super::simulation::Body;
use super::types::{EdgeKey, GraphData, GraphEdge, Point};

const IMAGE_SIZE: f64 = 16.0;
const DIMMED_OPACITY: f64 = 0.2;

/// Nodes and edges that stay fully opaque while a node is hovered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Highlight {
	pub nodes: HashSet<usize>,
	pub edges: HashSet<usize>,
}

pub struct RenderFrame<'a> {
	pub graph: &'a GraphData,
	pub bodies: &'a [Body],
	pub settings: &'a FormatSettings,
	pub colors: &'a ColorContext,
	pub highlight: Option<&'a Highlight>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
	pub added: usize,
	pub updated: usize,
	pub unchanged: usize,
	pub removed: usize,
}

impl RenderStats {
	fn record(&mut self, outcome: Upsert) {
		match outcome {
			Upsert::Added => self.added += 1,
			Upsert::Updated => self.updated += 1,
			Upsert::Unchanged => self.unchanged += 1,
		}
	}

	pub fn changed(&self) -> bool {
		self.added + self.updated + self.removed > 0
	}
}

/// Keeps the scene in step with graph, positions and settings.
#[derive(Default)]
pub struct SceneRenderer {
	scene: Scene,
	path_ids: HashMap<EdgeKey, String>,
	next_path_id: u64,
}

impl SceneRenderer {
	pub fn scene(&self) -> &Scene {
		&self.scene
	}

	pub fn scene_mut(&mut self) -> &mut Scene {
		&mut self.scene
	}

	pub fn update(&mut self, frame: &RenderFrame<'_>) -> RenderStats {
		let RenderFrame {
			graph,
			bodies,
			settings,
			colors,
			highlight,
		} = *frame;
		let mut stats = RenderStats::default();
		let mut touched: HashSet<ShapeKey> = HashSet::new();
		let radius = settings.nodes.radius.max(1.0);
		let max_weight = graph.max_weight().unwrap_or(0.0);
		let label_formatter = ValueFormatter::new(
			None,
			DisplayUnit::resolve(settings.links.display_units, max_weight),
			settings.links.decimal_places,
		);
		let link_types = link_type_indices(graph);
		let node_groups = node_group_indices(graph);
		let opacity = |lit: bool| if lit { 1.0 } else { DIMMED_OPACITY };

		self.scene.arrow_fill = colors.link_stroke(DEFAULT_LINK_COLOR);

		for (i, edge) in graph.edges.iter().enumerate() {
			let (Some(s), Some(t)) = (bodies.get(edge.source), bodies.get(edge.target)) else {
				continue;
			};
			let dom_id = self.path_id(&edge.key);
			let d = if edge.is_self_loop {
				self_loop_path(s.point(), radius)
			} else {
				let offset = if edge.parallel > 1 { radius * 0.6 } else { 0.0 };
				link_path(s.point(), t.point(), radius, offset)
			};
			let lit = highlight.is_none_or(|h| h.edges.contains(&i));
			let key = ShapeKey::Link(edge.key.clone());
			stats.record(self.scene.upsert(
				key.clone(),
				Shape::Path {
					dom_id: dom_id.clone(),
					d,
					stroke: colors.link_stroke(&link_color(
						edge,
						settings.links.color_link,
						max_weight,
						&link_types,
						colors,
					)),
					stroke_width: link_width(edge, settings.links.thickness_with_weight, max_weight),
					opacity: opacity(lit),
					arrow: settings.links.show_arrow,
				},
			));
			touched.insert(key);

			if let (true, Some(weight)) = (settings.links.show_label, edge.weight) {
				let key = ShapeKey::LinkLabel(edge.key.clone());
				stats.record(self.scene.upsert(
					key.clone(),
					Shape::TextPath {
						href: dom_id,
						content: label_formatter.format_number(weight),
						fill: colors.text_fill(&settings.labels.color),
						font_size: settings.labels.font_size_px(),
					},
				));
				touched.insert(key);
			}
		}

		for (i, node) in graph.nodes.iter().enumerate() {
			let Some(body) = bodies.get(i) else {
				continue;
			};
			let lit = highlight.is_none_or(|h| h.nodes.contains(&i));
			let key = ShapeKey::Node(node.id.clone());
			stats.record(self.scene.upsert(
				key.clone(),
				Shape::Circle {
					cx: body.x,
					cy: body.y,
					r: radius,
					fill: colors.node_fill(node_groups.get(&i).copied().unwrap_or(0)),
					stroke: colors.node_stroke(),
					opacity: opacity(lit),
				},
			));
			touched.insert(key);

			if settings.nodes.display_image {
				let key = ShapeKey::NodeImage(node.id.clone());
				stats.record(self.scene.upsert(
					key.clone(),
					Shape::Image {
						x: body.x - IMAGE_SIZE / 2.0,
						y: body.y - IMAGE_SIZE / 2.0,
						size: IMAGE_SIZE,
						href: settings.nodes.image_href(node.image.as_deref()),
						title: node.label.clone(),
					},
				));
				touched.insert(key);
			}

			if settings.labels.show {
				let key = ShapeKey::NodeLabel(node.id.clone());
				stats.record(self.scene.upsert(
					key.clone(),
					Shape::Text {
						x: body.x + radius + 3.0,
						y: body.y + 3.0,
						content: settings.nodes.truncate(&node.label),
						fill: colors.text_fill(&settings.labels.color),
						font_size: settings.labels.font_size_px(),
						opacity: opacity(lit),
					},
				));
				touched.insert(key);
			}
		}

		stats.removed = self.scene.retain_keys(&touched);
		self.path_ids.retain(|k, _| touched.contains(&ShapeKey::Link(k.clone())));
		trace!("render: {stats:?}");
		stats
	}

	fn path_id(&mut self, key: &EdgeKey) -> String {
		if let Some(id) = self.path_ids.get(key) {
			return id.clone();
		}
		self.next_path_id += 1;
		let id = format!("force-graph-link-{}", self.next_path_id);
		self.path_ids.insert(key.clone(), id.clone());
		id
	}
}

/// Straight link clipped to both circles, shifted sideways by `offset`.
pub fn link_path(s: Point, t: Point, radius: f64, offset: f64) -> String {
	let (dx, dy) = (t.x - s.x, t.y - s.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 1e-6 {
		return format!(
			"M {} {} L {} {}",
			trim_float(s.x),
			trim_float(s.y),
			trim_float(t.x),
			trim_float(t.y)
		);
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let (px, py) = (-uy * offset, ux * offset);
	let clip = radius.min(dist / 2.0);
	format!(
		"M {} {} L {} {}",
		trim_float(s.x + ux * clip + px),
		trim_float(s.y + uy * clip + py),
		trim_float(t.x - ux * clip + px),
		trim_float(t.y - uy * clip + py)
	)
}

/// Loop leaving and re-entering the node at its upper-right boundary point.
pub fn self_loop_path(c: Point, radius: f64) -> String {
	let (x, y) = (c.x + radius * FRAC_1_SQRT_2, c.y - radius * FRAC_1_SQRT_2);
	let size = (radius * 3.0).max(20.0);
	format!(
		"M {} {} C {} {}, {} {}, {} {}",
		trim_float(x),
		trim_float(y),
		trim_float(x + size),
		trim_float(y),
		trim_float(x),
		trim_float(y - size),
		trim_float(x),
		trim_float(y)
	)
}

fn link_width(edge: &GraphEdge, by_weight: bool, max_weight: f64) -> f64 {
	match edge.weight {
		Some(w) if by_weight && max_weight > 0.0 => 1.0 + 4.0 * (w.abs() / max_weight).min(1.0),
		_ => 1.5,
	}
}

fn link_color(
	edge: &GraphEdge,
	mode: LinkColoring,
	max_weight: f64,
	link_types: &HashMap<&str, usize>,
	colors: &ColorContext,
) -> String {
	match mode {
		LinkColoring::Interactive => DEFAULT_LINK_COLOR.into(),
		LinkColoring::ByWeight => {
			let steps = colors.palette.len().max(1) - 1;
			let ratio = match edge.weight {
				Some(w) if max_weight > 0.0 => (w.abs() / max_weight).min(1.0),
				_ => 0.0,
			};
			colors
				.palette_color((ratio * steps as f64).round() as usize)
				.to_string()
		}
		LinkColoring::ByLinkType => edge
			.link_type
			.as_deref()
			.and_then(|t| link_types.get(t))
			.map(|&i| colors.palette_color(i).to_string())
			.unwrap_or_else(|| DEFAULT_LINK_COLOR.into()),
	}
}

fn link_type_indices(graph: &GraphData) -> HashMap<&str, usize> {
	let mut out = HashMap::new();
	for t in graph.edges.iter().filter_map(|e| e.link_type.as_deref()) {
		let next = out.len();
		out.entry(t).or_insert(next);
	}
	out
}

/// Palette slot per node, grouped by node type in order of appearance.
fn node_group_indices(graph: &GraphData) -> HashMap<usize, usize> {
	let mut groups: HashMap<&str, usize> = HashMap::new();
	let mut out = HashMap::new();
	for (i, node) in graph.nodes.iter().enumerate() {
		if let Some(kind) = node.image.as_deref() {
			let next = groups.len();
			out.insert(i, *groups.entry(kind).or_insert(next));
		}
	}
	out
}
