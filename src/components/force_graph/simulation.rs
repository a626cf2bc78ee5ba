use std::collections::HashMap;
use std::f64::consts::PI;

use log::debug;

use super::quadtree::QuadTree;
use super::settings::SimulationConfig;
use super::types::{GraphData, Point};

const INITIAL_RADIUS: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	Initializing,
	Running,
	Converged,
	Stopped,
}

/// Position and velocity of one node; `fx`/`fy` are set while pinned.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub fx: Option<f64>,
	pub fy: Option<f64>,
}

impl Body {
	pub fn pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}

	pub fn point(&self) -> Point {
		Point {
			x: self.x,
			y: self.y,
		}
	}
}

#[derive(Clone, Copy, Debug)]
struct Spring {
	source: usize,
	target: usize,
	strength: f64,
	bias: f64,
}

/// Linear congruential generator; keeps layouts reproducible.
#[derive(Clone, Debug)]
struct Lcg(u32);

impl Lcg {
	fn next(&mut self) -> f64 {
		self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
		self.0 as f64 / 4_294_967_296.0
	}

	fn jiggle(&mut self) -> f64 {
		(self.next() - 0.5) * 1e-6
	}
}

pub struct Simulation {
	config: SimulationConfig,
	bodies: Vec<Body>,
	radii: Vec<f64>,
	springs: Vec<Spring>,
	center: Point,
	alpha: f64,
	alpha_target: f64,
	iterations: usize,
	phase: Phase,
	rng: Lcg,
}

impl Simulation {
	pub fn new(config: SimulationConfig) -> Self {
		let rng = Lcg(config.seed);
		Self {
			config,
			bodies: Vec::new(),
			radii: Vec::new(),
			springs: Vec::new(),
			center: Point::default(),
			alpha: 1.0,
			alpha_target: 0.0,
			iterations: 0,
			phase: Phase::Initializing,
			rng,
		}
	}

	/// Replaces the node set. Identities found in `prior` keep their position.
	pub fn reset(
		&mut self,
		graph: &GraphData,
		radii: Vec<f64>,
		center: Point,
		prior: &HashMap<String, Point>,
	) {
		let golden = PI * (3.0 - 5f64.sqrt());
		self.bodies = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| match prior.get(&node.id) {
				Some(p) => Body {
					x: p.x,
					y: p.y,
					..Body::default()
				},
				None => {
					let r = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
					let angle = i as f64 * golden;
					Body {
						x: center.x + r * angle.cos(),
						y: center.y + r * angle.sin(),
						..Body::default()
					}
				}
			})
			.collect();
		self.radii = radii;
		self.radii.resize(self.bodies.len(), 0.0);
		self.center = center;
		self.springs = springs(graph);
		self.alpha = 1.0;
		self.alpha_target = 0.0;
		self.iterations = 0;
		self.rng = Lcg(self.config.seed);
		self.phase = Phase::Initializing;
		debug!(
			"simulation reset: {} bodies, {} springs",
			self.bodies.len(),
			self.springs.len()
		);
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn iterations(&self) -> usize {
		self.iterations
	}

	pub fn bodies(&self) -> &[Body] {
		&self.bodies
	}

	pub fn is_active(&self) -> bool {
		matches!(self.phase, Phase::Initializing | Phase::Running)
	}

	pub fn set_center(&mut self, center: Point) {
		self.center = center;
	}

	pub fn set_radii(&mut self, radii: Vec<f64>) {
		self.radii = radii;
		self.radii.resize(self.bodies.len(), 0.0);
	}

	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.clamp(0.0, 1.0);
	}

	/// Re-enters `Running` with a fresh iteration budget.
	pub fn restart(&mut self) {
		if !self.bodies.is_empty() {
			self.phase = Phase::Running;
			self.iterations = 0;
		}
	}

	/// Raises alpha to at least `alpha` and restarts.
	pub fn reheat(&mut self, alpha: f64) {
		self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
		self.restart();
	}

	pub fn stop(&mut self) {
		self.phase = Phase::Stopped;
	}

	pub fn pin(&mut self, index: usize, x: f64, y: f64) {
		if let Some(body) = self.bodies.get_mut(index) {
			body.fx = Some(x);
			body.fy = Some(y);
		}
	}

	pub fn unpin(&mut self, index: usize) {
		if let Some(body) = self.bodies.get_mut(index) {
			body.fx = None;
			body.fy = None;
		}
	}

	pub fn positions_by_id(&self, graph: &GraphData) -> HashMap<String, Point> {
		graph
			.nodes
			.iter()
			.zip(&self.bodies)
			.map(|(node, body)| (node.id.clone(), body.point()))
			.collect()
	}

	/// Advances one step. Returns the phase after the step.
	pub fn tick(&mut self) -> Phase {
		match self.phase {
			Phase::Converged | Phase::Stopped => return self.phase,
			Phase::Initializing if self.bodies.is_empty() => {
				self.phase = Phase::Converged;
				return self.phase;
			}
			_ => self.phase = Phase::Running,
		}

		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		self.apply_links();
		self.apply_charge();
		self.apply_center();
		self.apply_collision();
		self.integrate();
		self.iterations += 1;

		if self.alpha < self.config.alpha_min {
			self.phase = Phase::Converged;
			debug!("simulation converged after {} ticks", self.iterations);
		} else if self.iterations >= self.config.max_iterations {
			self.phase = Phase::Stopped;
			debug!("simulation stopped at iteration cap ({})", self.iterations);
		}
		self.phase
	}

	fn apply_links(&mut self) {
		let distance = self.config.link_distance;
		for spring in &self.springs {
			let (s, t) = (self.bodies[spring.source], self.bodies[spring.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = self.rng.jiggle();
			}
			if y == 0.0 {
				y = self.rng.jiggle();
			}
			let len = (x * x + y * y).sqrt();
			let l = (len - distance) / len * self.alpha * spring.strength;
			let (x, y) = (x * l, y * l);
			let target = &mut self.bodies[spring.target];
			target.vx -= x * spring.bias;
			target.vy -= y * spring.bias;
			let source = &mut self.bodies[spring.source];
			source.vx += x * (1.0 - spring.bias);
			source.vy += y * (1.0 - spring.bias);
		}
	}

	fn apply_charge(&mut self) {
		let points: Vec<(f64, f64)> = self.bodies.iter().map(|b| (b.x, b.y)).collect();
		let tree = QuadTree::build(&points);
		let strength = self.config.charge_strength * self.alpha;
		let rng = &mut self.rng;
		let mut jiggle = || rng.jiggle();
		for (i, body) in self.bodies.iter_mut().enumerate() {
			let (dvx, dvy) = tree.accumulate(
				i,
				&points,
				strength,
				self.config.theta,
				self.config.charge_distance_min,
				&mut jiggle,
			);
			body.vx += dvx;
			body.vy += dvy;
		}
	}

	fn apply_center(&mut self) {
		let n = self.bodies.len() as f64;
		let (sx, sy) = self
			.bodies
			.iter()
			.fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
		let dx = (sx / n - self.center.x) * self.config.center_strength;
		let dy = (sy / n - self.center.y) * self.config.center_strength;
		for body in self.bodies.iter_mut().filter(|b| !b.pinned()) {
			body.x -= dx;
			body.y -= dy;
		}
	}

	/// Pairwise separation; candidates come from a quadtree over predicted positions.
	fn apply_collision(&mut self) {
		let padding = self.config.collision_padding;
		let points: Vec<(f64, f64)> = self
			.bodies
			.iter()
			.map(|b| (b.x + b.vx, b.y + b.vy))
			.collect();
		let tree = QuadTree::build(&points);
		let widest = self.radii.iter().copied().fold(0.0, f64::max) + padding;
		for i in 0..self.bodies.len() {
			let ri = self.radii[i] + padding;
			let (px, py) = points[i];
			for j in tree.within(px, py, ri + widest, &points) {
				if j <= i {
					continue;
				}
				let rj = self.radii[j] + padding;
				let (a, b) = (self.bodies[i], self.bodies[j]);
				let r = ri + rj;
				let mut x = (a.x + a.vx) - (b.x + b.vx);
				let mut y = (a.y + a.vy) - (b.y + b.vy);
				let mut l = x * x + y * y;
				if l >= r * r {
					continue;
				}
				if x == 0.0 {
					x = self.rng.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = self.rng.jiggle();
					l += y * y;
				}
				let len = l.sqrt();
				let push = (r - len) / len;
				let (x, y) = (x * push, y * push);
				let share = rj * rj / (ri * ri + rj * rj);
				self.bodies[i].vx += x * share;
				self.bodies[i].vy += y * share;
				self.bodies[j].vx -= x * (1.0 - share);
				self.bodies[j].vy -= y * (1.0 - share);
			}
		}
	}

	fn integrate(&mut self) {
		let keep = 1.0 - self.config.velocity_decay;
		for body in &mut self.bodies {
			match (body.fx, body.fy) {
				(Some(fx), Some(fy)) => {
					body.x = fx;
					body.y = fy;
					body.vx = 0.0;
					body.vy = 0.0;
				}
				_ => {
					body.vx *= keep;
					body.vy *= keep;
					body.x += body.vx;
					body.y += body.vy;
				}
			}
		}
	}
}

/// Springs for every non-loop edge; strength falls with the lighter endpoint's degree.
fn springs(graph: &GraphData) -> Vec<Spring> {
	let mut count = vec![0usize; graph.nodes.len()];
	for edge in graph.edges.iter().filter(|e| !e.is_self_loop) {
		count[edge.source] += 1;
		count[edge.target] += 1;
	}
	let max_weight = graph
		.edges
		.iter()
		.filter(|e| !e.is_self_loop)
		.map(|e| e.strength_weight().abs())
		.fold(0.0, f64::max);

	graph
		.edges
		.iter()
		.filter(|e| !e.is_self_loop)
		.map(|e| {
			let (cs, ct) = (count[e.source] as f64, count[e.target] as f64);
			let weight_scale = if max_weight > 0.0 {
				0.5 + 0.5 * (e.strength_weight().abs() / max_weight)
			} else {
				1.0
			};
			Spring {
				source: e.source,
				target: e.target,
				strength: weight_scale / cs.min(ct),
				bias: cs / (cs + ct),
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::builder::GraphBuilder;
	use crate::components::force_graph::types::InputRow;

	fn graph(pairs: &[(&str, &str)]) -> GraphData {
		let rows: Vec<InputRow> = pairs.iter().map(|(s, t)| InputRow::new(*s, *t)).collect();
		GraphBuilder::default().build(&rows)
	}

	fn simulation(graph: &GraphData) -> Simulation {
		let mut sim = Simulation::new(SimulationConfig::default());
		sim.reset(
			graph,
			vec![5.0; graph.nodes.len()],
			Point { x: 500.0, y: 250.0 },
			&HashMap::new(),
		);
		sim
	}

	fn run(sim: &mut Simulation) -> usize {
		let mut ticks = 0;
		while sim.tick() == Phase::Running {
			ticks += 1;
		}
		ticks
	}

	#[test]
	fn converges_before_iteration_cap() {
		let g = graph(&[("A", "B"), ("B", "C"), ("C", "A"), ("C", "D")]);
		let mut sim = simulation(&g);
		assert_eq!(sim.phase(), Phase::Initializing);
		run(&mut sim);
		assert_eq!(sim.phase(), Phase::Converged);
		assert!(sim.iterations() < SimulationConfig::default().max_iterations);
		assert!(sim.alpha() < SimulationConfig::default().alpha_min);
		assert!(sim.bodies().iter().all(|b| b.x.is_finite() && b.y.is_finite()));
	}

	#[test]
	fn iteration_cap_stops_reheated_simulation() {
		let g = graph(&[("A", "B")]);
		let mut sim = simulation(&g);
		sim.set_alpha_target(0.5);
		run(&mut sim);
		assert_eq!(sim.phase(), Phase::Stopped);
		assert_eq!(sim.iterations(), SimulationConfig::default().max_iterations);
	}

	#[test]
	fn collision_keeps_nodes_apart() {
		let g = graph(&[("A", "B"), ("A", "C"), ("A", "D"), ("B", "C")]);
		let mut sim = simulation(&g);
		run(&mut sim);
		let bodies = sim.bodies();
		for i in 0..bodies.len() {
			for j in (i + 1)..bodies.len() {
				let (dx, dy) = (bodies[i].x - bodies[j].x, bodies[i].y - bodies[j].y);
				let d = (dx * dx + dy * dy).sqrt();
				assert!(d > 10.0, "nodes {i} and {j} overlap at distance {d}");
			}
		}
	}

	#[test]
	fn pinned_node_stays_put() {
		let g = graph(&[("A", "B"), ("B", "C")]);
		let mut sim = simulation(&g);
		sim.pin(1, 42.0, 24.0);
		for _ in 0..50 {
			sim.tick();
		}
		assert_eq!(sim.bodies()[1].point(), Point { x: 42.0, y: 24.0 });
		sim.unpin(1);
		assert!(!sim.bodies()[1].pinned());
	}

	#[test]
	fn self_loops_add_no_spring() {
		let g = graph(&[("A", "A"), ("A", "B")]);
		assert_eq!(springs(&g).len(), 1);
		let mut sim = simulation(&g);
		run(&mut sim);
		assert!(sim.bodies().iter().all(|b| b.x.is_finite()));
	}

	#[test]
	fn layout_is_deterministic_and_reuses_positions() {
		let g = graph(&[("A", "B"), ("B", "C")]);
		let (mut a, mut b) = (simulation(&g), simulation(&g));
		run(&mut a);
		run(&mut b);
		assert_eq!(a.bodies(), b.bodies());

		let prior = a.positions_by_id(&g);
		let mut c = Simulation::new(SimulationConfig::default());
		c.reset(&g, vec![5.0; 3], Point::default(), &prior);
		assert_eq!(c.bodies()[2].point(), prior["C"]);
		assert_eq!(c.phase(), Phase::Initializing);
	}

	#[test]
	fn reheat_runs_a_converged_layout_again() {
		let g = graph(&[("A", "B"), ("B", "C")]);
		let mut sim = simulation(&g);
		run(&mut sim);
		assert_eq!(sim.phase(), Phase::Converged);
		sim.reheat(0.3);
		assert_eq!(sim.alpha(), 0.3);
		let ticks = run(&mut sim);
		assert!(ticks > 100, "only {ticks} ticks after reheat");
		assert_eq!(sim.phase(), Phase::Converged);
	}

	#[test]
	fn empty_graph_converges_immediately() {
		let g = GraphData::default();
		let mut sim = simulation(&g);
		assert_eq!(sim.tick(), Phase::Converged);
	}
}
