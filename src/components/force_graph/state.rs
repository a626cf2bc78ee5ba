use std::collections::{HashMap, HashSet, VecDeque};

use log::{debug, info};
use serde_json::{Map, Value as JsonValue};

use super::builder::{GraphBuilder, rows_from_table};
use super::colors::ColorContext;
use super::format::ValueFormatter;
use super::metadata::{ROLE_LINK_TYPE, ROLE_SOURCE, ROLE_TARGET, ROLE_WEIGHT};
use super::render::{Highlight, RenderFrame, RenderStats, SceneRenderer};
use super::settings::{FormatSettings, SimulationConfig};
use super::simulation::{Phase, Simulation};
use super::tooltip::{self, TooltipItem};
use super::types::{ColumnDescriptor, DataTable, GraphData, Point};

pub const HIT_PADDING: f64 = 4.0;
pub const DRAG_ALPHA_TARGET: f64 = 0.3;
pub const RESIZE_ALPHA: f64 = 0.3;

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn to_svg(&self) -> String {
		format!("translate({},{}) scale({})", self.x, self.y, self.k)
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub highlight: Option<Highlight>,
}

/// Pin commands queued by interaction and applied between ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PinCommand {
	Pin { node: usize, x: f64, y: f64 },
	Unpin { node: usize },
}

/// Requests the next frame for a dataset generation.
pub trait FrameScheduler {
	fn request_frame(&self, generation: u64);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
	/// The frame belonged to a superseded dataset and was dropped.
	Stale,
	/// One tick ran and the next frame was requested.
	Scheduled,
	/// The simulation has stopped and the final positions are drawn.
	Settled,
}

pub struct ForceGraphState {
	pub graph: GraphData,
	pub columns: Vec<ColumnDescriptor>,
	pub settings: FormatSettings,
	pub colors: ColorContext,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	simulation: Simulation,
	renderer: SceneRenderer,
	builder: GraphBuilder,
	pending: Vec<PinCommand>,
	generation: u64,
	/// Generation of the one outstanding frame request, if any.
	scheduled: Option<u64>,
	settled: bool,
}

impl ForceGraphState {
	pub fn new(width: f64, height: f64, config: SimulationConfig) -> Self {
		Self {
			graph: GraphData::default(),
			columns: Vec::new(),
			settings: FormatSettings::default(),
			colors: ColorContext::default(),
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			simulation: Simulation::new(config),
			renderer: SceneRenderer::default(),
			builder: GraphBuilder::default(),
			pending: Vec::new(),
			generation: 0,
			scheduled: None,
			settled: false,
		}
	}

	pub fn with_builder(mut self, builder: GraphBuilder) -> Self {
		self.builder = builder;
		self
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn simulation(&self) -> &Simulation {
		&self.simulation
	}

	pub fn renderer(&self) -> &SceneRenderer {
		&self.renderer
	}

	pub fn renderer_mut(&mut self) -> &mut SceneRenderer {
		&mut self.renderer
	}

	fn center(&self) -> Point {
		Point {
			x: self.width / 2.0,
			y: self.height / 2.0,
		}
	}

	fn radii(&self) -> Vec<f64> {
		vec![self.settings.nodes.radius.max(1.0); self.graph.nodes.len()]
	}

	/// Full data update: supersedes any running simulation.
	pub fn set_data(&mut self, table: &DataTable) -> u64 {
		let prior = self.simulation.positions_by_id(&self.graph);
		let rows = rows_from_table(table);
		self.columns = table.columns.clone();
		self.graph = self.builder.build(&rows);
		self.pending.clear();
		self.drag = DragState::default();
		self.hover = HoverState::default();
		let (radii, center) = (self.radii(), self.center());
		self.simulation.reset(&self.graph, radii, center, &prior);
		self.generation += 1;
		self.settled = false;
		info!(
			"data update #{}: {} nodes, {} edges",
			self.generation,
			self.graph.nodes.len(),
			self.graph.edges.len()
		);
		self.render();
		self.generation
	}

	/// Formatting or theme change; the layout keeps running undisturbed.
	pub fn set_format(&mut self, settings: FormatSettings, colors: ColorContext) -> RenderStats {
		let radius_changed = settings.nodes.radius != self.settings.nodes.radius;
		self.settings = settings;
		self.colors = colors;
		if radius_changed {
			let radii = self.radii();
			self.simulation.set_radii(radii);
		}
		if let Some(node) = self.hover.node.take() {
			self.set_hover(Some(node));
		}
		self.render()
	}

	/// Moves the centering target and reheats so the layout follows it.
	pub fn resize(&mut self, width: f64, height: f64, scheduler: &dyn FrameScheduler) {
		self.width = width;
		self.height = height;
		self.simulation.set_center(self.center());
		self.simulation.reheat(RESIZE_ALPHA);
		self.settled = false;
		self.wake(scheduler);
	}

	pub fn render(&mut self) -> RenderStats {
		self.renderer.update(&RenderFrame {
			graph: &self.graph,
			bodies: self.simulation.bodies(),
			settings: &self.settings,
			colors: &self.colors,
			highlight: self.hover.highlight.as_ref(),
		})
	}

	/// Starts ticking the current generation. No-op while a frame is outstanding.
	pub fn start(&mut self, scheduler: &dyn FrameScheduler) {
		self.request(scheduler);
	}

	fn request(&mut self, scheduler: &dyn FrameScheduler) {
		if self.scheduled != Some(self.generation) {
			self.scheduled = Some(self.generation);
			scheduler.request_frame(self.generation);
		}
	}

	/// One scheduled frame: apply queued pins, tick once, draw once.
	pub fn run_frame(&mut self, generation: u64, scheduler: &dyn FrameScheduler) -> FrameOutcome {
		if generation != self.generation {
			debug!("dropping stale frame for generation {generation}");
			return FrameOutcome::Stale;
		}
		self.scheduled = None;
		for command in self.pending.drain(..) {
			match command {
				PinCommand::Pin { node, x, y } => self.simulation.pin(node, x, y),
				PinCommand::Unpin { node } => self.simulation.unpin(node),
			}
		}
		if !self.simulation.is_active() {
			if !self.settled {
				self.render();
				self.settled = true;
			}
			return FrameOutcome::Settled;
		}
		let phase = self.simulation.tick();
		self.render();
		match phase {
			Phase::Converged | Phase::Stopped => {
				self.settled = true;
				FrameOutcome::Settled
			}
			Phase::Initializing | Phase::Running => {
				self.request(scheduler);
				FrameOutcome::Scheduled
			}
		}
	}

	/// Halts the layout; later frames for this generation settle immediately.
	pub fn stop(&mut self) {
		self.simulation.stop();
		self.pending.clear();
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let hit = self.settings.nodes.radius + HIT_PADDING;
		self.simulation
			.bodies()
			.iter()
			.enumerate()
			.rev()
			.find(|(_, b)| ((b.x - gx).powi(2) + (b.y - gy).powi(2)).sqrt() < hit)
			.map(|(i, _)| i)
	}

	/// Last straight link passing within a few screen pixels of the cursor.
	pub fn edge_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let tolerance = HIT_PADDING / self.transform.k;
		let bodies = self.simulation.bodies();
		self.graph
			.edges
			.iter()
			.enumerate()
			.rev()
			.find(|(_, e)| match (bodies.get(e.source), bodies.get(e.target)) {
				(Some(s), Some(t)) if !e.is_self_loop => {
					segment_distance(Point { x: gx, y: gy }, s.point(), t.point()) < tolerance
				}
				_ => false,
			})
			.map(|(i, _)| i)
	}

	/// Begins a drag on the node under the cursor; returns whether one was hit.
	pub fn begin_drag(&mut self, sx: f64, sy: f64, scheduler: &dyn FrameScheduler) -> bool {
		let Some(node) = self.node_at_position(sx, sy) else {
			return false;
		};
		let (x, y) = self.screen_to_graph(sx, sy);
		self.drag = DragState {
			active: true,
			node_idx: Some(node),
		};
		self.pending.push(PinCommand::Pin { node, x, y });
		self.simulation.set_alpha_target(DRAG_ALPHA_TARGET);
		self.wake(scheduler);
		true
	}

	/// Queues the new pin and keeps frames coming until it is applied.
	pub fn drag_to(&mut self, sx: f64, sy: f64, scheduler: &dyn FrameScheduler) {
		if let (true, Some(node)) = (self.drag.active, self.drag.node_idx) {
			let (x, y) = self.screen_to_graph(sx, sy);
			self.pending.push(PinCommand::Pin { node, x, y });
			self.wake(scheduler);
		}
	}

	pub fn end_drag(&mut self) {
		if let (true, Some(node)) = (self.drag.active, self.drag.node_idx) {
			self.pending.push(PinCommand::Unpin { node });
			self.simulation.set_alpha_target(0.0);
		}
		self.drag = DragState::default();
	}

	fn wake(&mut self, scheduler: &dyn FrameScheduler) {
		if !self.simulation.is_active() {
			self.simulation.restart();
			self.settled = false;
		}
		if self.simulation.is_active() {
			self.request(scheduler);
		}
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Zooms by `factor` keeping the screen point under the cursor fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		self.hover.node = node;
		self.hover.highlight = node.map(|idx| {
			if self.settings.nodes.highlight_reachable_links {
				self.reachable_from(idx)
			} else {
				self.neighbors_of(idx)
			}
		});
		self.render();
	}

	fn neighbors_of(&self, idx: usize) -> Highlight {
		let mut highlight = Highlight {
			nodes: HashSet::from([idx]),
			edges: HashSet::new(),
		};
		for (i, edge) in self.graph.edges.iter().enumerate() {
			if edge.source == idx || edge.target == idx {
				highlight.edges.insert(i);
				highlight.nodes.insert(edge.source);
				highlight.nodes.insert(edge.target);
			}
		}
		highlight
	}

	/// Every link reachable by following link direction from `idx`.
	fn reachable_from(&self, idx: usize) -> Highlight {
		let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
		for (i, edge) in self.graph.edges.iter().enumerate() {
			outgoing.entry(edge.source).or_default().push(i);
		}
		let mut highlight = Highlight {
			nodes: HashSet::from([idx]),
			edges: HashSet::new(),
		};
		let mut queue = VecDeque::from([idx]);
		while let Some(node) = queue.pop_front() {
			for &e in outgoing.get(&node).into_iter().flatten() {
				if highlight.edges.insert(e) {
					let target = self.graph.edges[e].target;
					if highlight.nodes.insert(target) {
						queue.push_back(target);
					}
				}
			}
		}
		highlight
	}

	pub fn node_tooltip(&self, idx: usize) -> Vec<TooltipItem> {
		let Some(node) = self.graph.nodes.get(idx) else {
			return Vec::new();
		};
		let mut record = Map::new();
		record.insert(node.first_role.to_string(), JsonValue::String(node.label.clone()));
		tooltip::build(Some(&record), Some(self.columns.as_slice()))
	}

	pub fn edge_tooltip(&self, idx: usize) -> Vec<TooltipItem> {
		let Some(edge) = self.graph.edges.get(idx) else {
			return Vec::new();
		};
		let label = |i: usize| JsonValue::String(self.graph.nodes[i].label.clone());
		let mut record = Map::new();
		record.insert(ROLE_SOURCE.into(), label(edge.source));
		record.insert(ROLE_TARGET.into(), label(edge.target));
		if let Some(weight) = edge.weight {
			let text = ValueFormatter::default().format_number(weight);
			record.insert(ROLE_WEIGHT.into(), JsonValue::String(text));
		}
		if let Some(link_type) = &edge.link_type {
			record.insert(ROLE_LINK_TYPE.into(), JsonValue::String(link_type.clone()));
		}
		for (k, v) in &edge.extras {
			record.insert(k.clone(), v.clone());
		}
		tooltip::build(Some(&record), Some(self.columns.as_slice()))
	}
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len2 = dx * dx + dy * dy;
	let t = if len2 == 0.0 {
		0.0
	} else {
		(((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0)
	};
	((p.x - a.x - t * dx).powi(2) + (p.y - a.y - t * dy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::builder::WeightAggregation;
	use crate::components::force_graph::types::DataType;
	use serde_json::json;
	use std::cell::RefCell;

	#[derive(Default)]
	struct ManualScheduler {
		requested: RefCell<Vec<u64>>,
	}

	impl FrameScheduler for ManualScheduler {
		fn request_frame(&self, generation: u64) {
			self.requested.borrow_mut().push(generation);
		}
	}

	fn table(pairs: &[(&str, &str, f64)]) -> DataTable {
		DataTable {
			columns: vec![
				ColumnDescriptor::new("From", ROLE_SOURCE, DataType::Text),
				ColumnDescriptor::new("To", ROLE_TARGET, DataType::Text),
				ColumnDescriptor::new("Amount", ROLE_WEIGHT, DataType::Numeric),
			],
			rows: pairs
				.iter()
				.map(|(s, t, w)| vec![json!(s), json!(t), json!(w)])
				.collect(),
		}
	}

	fn state() -> ForceGraphState {
		ForceGraphState::new(1000.0, 500.0, SimulationConfig::default())
	}

	/// Answers every outstanding request once; returns how many there were.
	fn answer(s: &mut ForceGraphState, scheduler: &ManualScheduler) -> usize {
		let requested = std::mem::take(&mut *scheduler.requested.borrow_mut());
		for &generation in &requested {
			s.run_frame(generation, scheduler);
		}
		requested.len()
	}

	fn centroid(s: &ForceGraphState) -> (f64, f64) {
		let bodies = s.simulation().bodies();
		let n = bodies.len() as f64;
		let (x, y) = bodies.iter().fold((0.0, 0.0), |(x, y), b| (x + b.x, y + b.y));
		(x / n, y / n)
	}

	fn square() -> DataTable {
		table(&[("A", "B", 1.0), ("B", "C", 1.0), ("C", "A", 1.0), ("C", "D", 1.0)])
	}

	#[test]
	fn stale_frames_are_ignored() {
		let scheduler = ManualScheduler::default();
		let mut s = state();
		let first = s.set_data(&table(&[("A", "B", 1.0)]));
		s.start(&scheduler);
		let second = s.set_data(&table(&[("C", "D", 1.0), ("D", "E", 2.0)]));
		assert_ne!(first, second);

		let before: Vec<_> = s.simulation().bodies().to_vec();
		assert_eq!(s.run_frame(first, &scheduler), FrameOutcome::Stale);
		assert_eq!(s.simulation().bodies(), before.as_slice());
		assert_eq!(s.run_frame(second, &scheduler), FrameOutcome::Scheduled);
		assert_eq!(scheduler.requested.borrow().as_slice(), &[first, second]);
	}

	#[test]
	fn frames_run_until_settled() {
		let scheduler = ManualScheduler::default();
		let mut s = state();
		let generation = s.set_data(&table(&[("A", "B", 1.0), ("B", "C", 1.0)]));
		let mut frames = 0;
		while s.run_frame(generation, &scheduler) == FrameOutcome::Scheduled {
			frames += 1;
			assert!(frames < 10_000);
		}
		assert!(!s.simulation().is_active());
		assert_eq!(s.run_frame(generation, &scheduler), FrameOutcome::Settled);
		assert_eq!(scheduler.requested.borrow().len(), frames);
	}

	#[test]
	fn drag_pins_between_ticks_and_releases() {
		let scheduler = ManualScheduler::default();
		let mut s = state();
		let generation = s.set_data(&table(&[("A", "B", 1.0), ("B", "C", 1.0)]));
		let body = s.simulation().bodies()[0];
		assert!(s.begin_drag(body.x, body.y, &scheduler));
		s.drag_to(300.0, 200.0, &scheduler);
		s.drag_to(310.0, 210.0, &scheduler);
		assert!(!s.simulation().bodies()[0].pinned());

		s.run_frame(generation, &scheduler);
		let pinned = s.simulation().bodies()[0];
		assert!(pinned.pinned());
		assert_eq!((pinned.x, pinned.y), (310.0, 210.0));

		s.end_drag();
		s.run_frame(generation, &scheduler);
		assert!(!s.simulation().bodies()[0].pinned());
	}

	#[test]
	fn drag_reheats_a_settled_layout() {
		let scheduler = ManualScheduler::default();
		let mut s = state();
		let generation = s.set_data(&table(&[("A", "B", 1.0)]));
		while s.run_frame(generation, &scheduler) == FrameOutcome::Scheduled {}
		let requested = scheduler.requested.borrow().len();
		let body = s.simulation().bodies()[1];
		assert!(s.begin_drag(body.x, body.y, &scheduler));
		assert!(s.simulation().is_active());
		assert_eq!(scheduler.requested.borrow().len(), requested + 1);
		assert!(!s.begin_drag(-500.0, -500.0, &scheduler));
	}

	#[test]
	fn long_drag_outlasts_iteration_cap() {
		let scheduler = ManualScheduler::default();
		let mut s = state();
		s.set_data(&table(&[("A", "B", 1.0), ("B", "C", 1.0)]));
		let body = s.simulation().bodies()[0];
		assert!(s.begin_drag(body.x, body.y, &scheduler));

		let mut frames = 0;
		for step in 0..2000 {
			s.drag_to(100.0 + step as f64 * 0.1, 100.0, &scheduler);
			frames += answer(&mut s, &scheduler);
		}
		assert!(frames > SimulationConfig::default().max_iterations);
		let dragged = s.simulation().bodies()[0];
		assert_eq!((dragged.x, dragged.y), (100.0 + 1999.0 * 0.1, 100.0));
	}

	#[test]
	fn repeated_start_keeps_one_frame_chain() {
		let scheduler = ManualScheduler::default();
		let mut s = state();
		s.set_data(&square());
		s.start(&scheduler);
		s.start(&scheduler);
		s.resize(1200.0, 600.0, &scheduler);
		s.start(&scheduler);
		assert_eq!(scheduler.requested.borrow().len(), 1);
		for _ in 0..5 {
			assert_eq!(answer(&mut s, &scheduler), 1);
			s.start(&scheduler);
		}
		assert_eq!(scheduler.requested.borrow().len(), 1);
	}

	#[test]
	fn settled_layout_is_centered() {
		let scheduler = ManualScheduler::default();
		let mut s = state();
		let generation = s.set_data(&square());
		while s.run_frame(generation, &scheduler) == FrameOutcome::Scheduled {}
		let (x, y) = centroid(&s);
		assert!((x - 500.0).abs() < 1.0 && (y - 250.0).abs() < 1.0, "centroid at ({x}, {y})");
	}

	#[test]
	fn resize_recenters_a_settled_layout() {
		let scheduler = ManualScheduler::default();
		let mut s = state();
		let generation = s.set_data(&square());
		while s.run_frame(generation, &scheduler) == FrameOutcome::Scheduled {}
		scheduler.requested.borrow_mut().clear();

		s.resize(3000.0, 1500.0, &scheduler);
		assert_eq!(scheduler.requested.borrow().as_slice(), &[generation]);
		assert_eq!(s.run_frame(generation, &scheduler), FrameOutcome::Scheduled);
		while s.run_frame(generation, &scheduler) == FrameOutcome::Scheduled {}
		let (x, y) = centroid(&s);
		assert!((x - 1500.0).abs() < 1.0 && (y - 750.0).abs() < 1.0, "centroid at ({x}, {y})");
	}

	#[test]
	fn positions_survive_data_updates() {
		let scheduler = ManualScheduler::default();
		let mut s = state();
		let generation = s.set_data(&table(&[("A", "B", 1.0)]));
		while s.run_frame(generation, &scheduler) == FrameOutcome::Scheduled {}
		let a = s.simulation().bodies()[0].point();
		s.set_data(&table(&[("A", "B", 1.0), ("B", "C", 3.0)]));
		assert_eq!(s.simulation().bodies()[0].point(), a);
	}

	#[test]
	fn hover_highlights_neighbors_or_reachable_links() {
		let mut s = state();
		s.set_data(&table(&[("A", "B", 1.0), ("B", "C", 1.0), ("D", "A", 1.0)]));
		s.set_hover(Some(0));
		let h = s.hover.highlight.clone().unwrap();
		assert_eq!(h.edges, HashSet::from([0, 2]));

		let mut settings = FormatSettings::default();
		settings.nodes.highlight_reachable_links = true;
		s.set_format(settings, ColorContext::default());
		let h = s.hover.highlight.clone().unwrap();
		assert_eq!(h.edges, HashSet::from([0, 1]));
		assert_eq!(h.nodes, HashSet::from([0, 1, 2]));

		s.set_hover(None);
		assert!(s.hover.highlight.is_none());
	}

	#[test]
	fn tooltips_use_column_names() {
		let mut s = state();
		s.set_data(&table(&[("A", "B", 2.5)]));
		let items = s.edge_tooltip(0);
		let pairs: Vec<_> = items
			.iter()
			.map(|i| (i.display_name.as_str(), i.value.as_str()))
			.collect();
		assert_eq!(pairs, [("From", "A"), ("To", "B"), ("Amount", "2.5")]);
		assert_eq!(s.node_tooltip(1)[0].display_name, "To");
		assert!(s.edge_tooltip(7).is_empty());
	}

	#[test]
	fn zoom_keeps_cursor_point_fixed() {
		let mut s = state();
		let before = s.screen_to_graph(200.0, 100.0);
		s.zoom_at(200.0, 100.0, 1.1);
		let after = s.screen_to_graph(200.0, 100.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
		let (x, y) = (s.transform.x, s.transform.y);
		s.begin_pan(0.0, 0.0);
		s.pan_to(10.0, -5.0);
		s.end_pan();
		assert_eq!((s.transform.x, s.transform.y), (x + 10.0, y - 5.0));
		s.pan_to(50.0, 50.0);
		assert_eq!((s.transform.x, s.transform.y), (x + 10.0, y - 5.0));
	}

	#[test]
	fn edge_hit_test_follows_the_segment() {
		let mut s = state();
		s.set_data(&table(&[("A", "B", 1.0), ("B", "B", 1.0)]));
		let (a, b) = (s.simulation().bodies()[0], s.simulation().bodies()[1]);
		let mid = ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
		assert_eq!(s.edge_at_position(mid.0, mid.1), Some(0));
		assert_eq!(s.edge_at_position(mid.0 + 500.0, mid.1 + 500.0), None);
		let d = segment_distance(
			Point { x: 5.0, y: 3.0 },
			Point::default(),
			Point { x: 10.0, y: 0.0 },
		);
		assert!((d - 3.0).abs() < 1e-12);
	}

	#[test]
	fn stopped_layout_settles_on_next_frame() {
		let scheduler = ManualScheduler::default();
		let mut s = state();
		let generation = s.set_data(&table(&[("A", "B", 1.0)]));
		assert_eq!(s.generation(), generation);
		s.stop();
		assert_eq!(s.run_frame(generation, &scheduler), FrameOutcome::Settled);
		assert_eq!(s.simulation().phase(), Phase::Stopped);
		assert!(scheduler.requested.borrow().is_empty());
	}

	#[test]
	fn builder_policy_applies_to_table_updates() {
		let mut s = state().with_builder(GraphBuilder::new(WeightAggregation::Count));
		s.set_data(&table(&[("A", "B", 2.0), ("A", "B", 3.0)]));
		assert_eq!(s.graph.edges[0].weight, Some(2.0));
	}
}
