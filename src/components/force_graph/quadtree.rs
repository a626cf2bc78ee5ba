//! Barnes–Hut quadtree for the many-body force.

const MAX_DEPTH: usize = 24;

#[derive(Clone, Debug)]
struct Cell {
	x0: f64,
	y0: f64,
	size: f64,
	children: [Option<usize>; 4],
	points: Vec<usize>,
	count: usize,
	cx: f64,
	cy: f64,
}

impl Cell {
	fn new(x0: f64, y0: f64, size: f64) -> Self {
		Self {
			x0,
			y0,
			size,
			children: [None; 4],
			points: Vec::new(),
			count: 0,
			cx: 0.0,
			cy: 0.0,
		}
	}

	fn is_leaf(&self) -> bool {
		self.children.iter().all(Option::is_none)
	}
}

/// Arena quadtree over a point set; every point carries the same charge.
pub struct QuadTree {
	cells: Vec<Cell>,
}

impl QuadTree {
	pub fn build(points: &[(f64, f64)]) -> Self {
		let (mut x0, mut y0, mut x1, mut y1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
		for &(x, y) in points {
			x0 = x0.min(x);
			y0 = y0.min(y);
			x1 = x1.max(x);
			y1 = y1.max(y);
		}
		if points.is_empty() {
			(x0, y0, x1, y1) = (0.0, 0.0, 1.0, 1.0);
		}
		let size = (x1 - x0).max(y1 - y0).max(1.0);
		let mut tree = Self {
			cells: vec![Cell::new(x0, y0, size)],
		};
		for (i, &p) in points.iter().enumerate() {
			tree.insert(0, i, p, points, 0);
		}
		tree.summarize(0, points);
		tree
	}

	fn insert(&mut self, cell: usize, i: usize, p: (f64, f64), points: &[(f64, f64)], depth: usize) {
		if self.cells[cell].is_leaf() {
			if self.cells[cell].points.is_empty() || depth >= MAX_DEPTH {
				self.cells[cell].points.push(i);
				return;
			}
			// split: push the resident points one level down
			let resident = std::mem::take(&mut self.cells[cell].points);
			for j in resident {
				let q = self.child_for(cell, points[j]);
				self.insert(q, j, points[j], points, depth + 1);
			}
		}
		let q = self.child_for(cell, p);
		self.insert(q, i, p, points, depth + 1);
	}

	fn child_for(&mut self, cell: usize, (x, y): (f64, f64)) -> usize {
		let c = &self.cells[cell];
		let half = c.size / 2.0;
		let (right, bottom) = (x >= c.x0 + half, y >= c.y0 + half);
		let quadrant = usize::from(right) | (usize::from(bottom) << 1);
		if let Some(existing) = c.children[quadrant] {
			return existing;
		}
		let (nx, ny) = (
			c.x0 + if right { half } else { 0.0 },
			c.y0 + if bottom { half } else { 0.0 },
		);
		self.cells.push(Cell::new(nx, ny, half));
		let idx = self.cells.len() - 1;
		self.cells[cell].children[quadrant] = Some(idx);
		idx
	}

	fn summarize(&mut self, cell: usize, points: &[(f64, f64)]) -> (usize, f64, f64) {
		let (mut count, mut sx, mut sy) = (0, 0.0, 0.0);
		for &i in &self.cells[cell].points {
			count += 1;
			sx += points[i].0;
			sy += points[i].1;
		}
		let children = self.cells[cell].children;
		for child in children.into_iter().flatten() {
			let (n, cx, cy) = self.summarize(child, points);
			count += n;
			sx += cx * n as f64;
			sy += cy * n as f64;
		}
		let c = &mut self.cells[cell];
		c.count = count;
		if count > 0 {
			c.cx = sx / count as f64;
			c.cy = sy / count as f64;
		}
		(count, c.cx, c.cy)
	}

	/// Indices of the points within `radius` of `(x, y)`, ascending.
	pub fn within(&self, x: f64, y: f64, radius: f64, points: &[(f64, f64)]) -> Vec<usize> {
		let r2 = radius * radius;
		let mut found = Vec::new();
		let mut stack = vec![0];
		while let Some(cell) = stack.pop() {
			let c = &self.cells[cell];
			if c.count == 0
				|| x + radius < c.x0
				|| x - radius > c.x0 + c.size
				|| y + radius < c.y0
				|| y - radius > c.y0 + c.size
			{
				continue;
			}
			found.extend(c.points.iter().copied().filter(|&j| {
				let (dx, dy) = (points[j].0 - x, points[j].1 - y);
				dx * dx + dy * dy <= r2
			}));
			stack.extend(c.children.iter().flatten());
		}
		found.sort_unstable();
		found
	}

	/// Velocity delta for point `i` from every other point, scaled by `strength * alpha`.
	///
	/// Cells whose `size / distance` falls below `theta` are treated as a single body.
	/// `jiggle` separates coincident points.
	pub fn accumulate(
		&self,
		i: usize,
		points: &[(f64, f64)],
		strength: f64,
		theta: f64,
		distance_min: f64,
		jiggle: &mut dyn FnMut() -> f64,
	) -> (f64, f64) {
		let theta2 = theta * theta;
		let distance_min2 = distance_min * distance_min;
		let (px, py) = points[i];
		let (mut fx, mut fy) = (0.0, 0.0);
		let mut stack = vec![0];

		while let Some(cell) = stack.pop() {
			let c = &self.cells[cell];
			if c.count == 0 {
				continue;
			}
			let (mut dx, mut dy) = (c.cx - px, c.cy - py);
			let mut l = dx * dx + dy * dy;

			if !c.is_leaf() {
				if c.size * c.size / theta2 < l {
					if l < distance_min2 {
						l = (distance_min2 * l).sqrt();
					}
					let w = strength * c.count as f64 / l;
					fx += dx * w;
					fy += dy * w;
				} else {
					stack.extend(c.children.iter().flatten());
				}
				continue;
			}

			for &j in &c.points {
				if j == i {
					continue;
				}
				dx = points[j].0 - px;
				dy = points[j].1 - py;
				if dx == 0.0 {
					dx = jiggle();
				}
				if dy == 0.0 {
					dy = jiggle();
				}
				l = dx * dx + dy * dy;
				if l < distance_min2 {
					l = (distance_min2 * l).sqrt();
				}
				let w = strength / l;
				fx += dx * w;
				fy += dy * w;
			}
		}
		(fx, fy)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn brute(i: usize, points: &[(f64, f64)], strength: f64) -> (f64, f64) {
		let (mut fx, mut fy) = (0.0, 0.0);
		for (j, &(x, y)) in points.iter().enumerate() {
			if j == i {
				continue;
			}
			let (dx, dy) = (x - points[i].0, y - points[i].1);
			let l = dx * dx + dy * dy;
			fx += dx * strength / l;
			fy += dy * strength / l;
		}
		(fx, fy)
	}

	#[test]
	fn zero_theta_matches_pairwise_sum() {
		let points: Vec<(f64, f64)> = (0..40)
			.map(|i| {
				let a = i as f64 * 0.7;
				(a.cos() * (10.0 + i as f64), a.sin() * (10.0 + i as f64))
			})
			.collect();
		let tree = QuadTree::build(&points);
		let mut jiggle = || 1e-6;
		for i in [0, 7, 39] {
			let (fx, fy) = tree.accumulate(i, &points, -30.0, 0.0, 1.0, &mut jiggle);
			let (bx, by) = brute(i, &points, -30.0);
			assert!((fx - bx).abs() < 1e-9 && (fy - by).abs() < 1e-9);
		}
	}

	#[test]
	fn repulsion_points_away_from_cluster() {
		let points = [(0.0, 0.0), (100.0, 0.0), (101.0, 1.0), (102.0, -1.0)];
		let tree = QuadTree::build(&points);
		let mut jiggle = || 1e-6;
		let (fx, _) = tree.accumulate(0, &points, -30.0, 0.9, 1.0, &mut jiggle);
		assert!(fx < 0.0);
	}

	#[test]
	fn within_matches_linear_scan() {
		let points: Vec<(f64, f64)> = (0..60)
			.map(|i| ((i * 37 % 101) as f64, (i * 53 % 89) as f64))
			.collect();
		let tree = QuadTree::build(&points);
		for (x, y, r) in [(50.0, 40.0, 20.0), (0.0, 0.0, 5.0), (100.0, 88.0, 300.0)] {
			let expected: Vec<usize> = (0..points.len())
				.filter(|&j| (points[j].0 - x).powi(2) + (points[j].1 - y).powi(2) <= r * r)
				.collect();
			assert_eq!(tree.within(x, y, r, &points), expected);
		}
		assert!(QuadTree::build(&[]).within(0.0, 0.0, 10.0, &[]).is_empty());
	}

	#[test]
	fn coincident_points_do_not_blow_up() {
		let points = [(5.0, 5.0); 30];
		let tree = QuadTree::build(&points);
		let mut jiggle = || 1e-3;
		let (fx, fy) = tree.accumulate(0, &points, -30.0, 0.9, 1.0, &mut jiggle);
		assert!(fx.is_finite() && fy.is_finite());
	}
}
