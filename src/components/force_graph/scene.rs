//! Retained scene: keyed shapes, a patch log for the DOM binding, and SVG output.

use std::collections::HashSet;
use std::fmt::Write;

use htmlize::{escape_attribute, escape_text};
use indexmap::IndexMap;

use super::format::trim_float;
use super::types::EdgeKey;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const ARROW_MARKER_ID: &str = "force-graph-arrow";

/// Identity of a rendered shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKey {
	Link(EdgeKey),
	LinkLabel(EdgeKey),
	Node(String),
	NodeImage(String),
	NodeLabel(String),
}

/// Paint order; later layers draw on top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
	Links,
	LinkLabels,
	Nodes,
	Images,
	Labels,
}

impl Layer {
	pub const ALL: [Layer; 5] = [
		Layer::Links,
		Layer::LinkLabels,
		Layer::Nodes,
		Layer::Images,
		Layer::Labels,
	];

	pub fn class_name(self) -> &'static str {
		match self {
			Layer::Links => "links",
			Layer::LinkLabels => "link-labels",
			Layer::Nodes => "nodes",
			Layer::Images => "images",
			Layer::Labels => "labels",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
	Circle {
		cx: f64,
		cy: f64,
		r: f64,
		fill: String,
		stroke: String,
		opacity: f64,
	},
	Path {
		dom_id: String,
		d: String,
		stroke: String,
		stroke_width: f64,
		opacity: f64,
		arrow: bool,
	},
	Text {
		x: f64,
		y: f64,
		content: String,
		fill: String,
		font_size: f64,
		opacity: f64,
	},
	/// Text laid out along the path with `href` as its DOM id.
	TextPath {
		href: String,
		content: String,
		fill: String,
		font_size: f64,
	},
	Image {
		x: f64,
		y: f64,
		size: f64,
		href: String,
		title: String,
	},
}

/// Element description shared by the SVG writer and the DOM binding.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
	pub tag: &'static str,
	pub attrs: Vec<(&'static str, String)>,
	pub text: Option<String>,
	pub children: Vec<Element>,
}

impl Shape {
	pub fn element(&self) -> Element {
		match self {
			Shape::Circle {
				cx,
				cy,
				r,
				fill,
				stroke,
				opacity,
			} => Element {
				tag: "circle",
				attrs: vec![
					("cx", trim_float(*cx)),
					("cy", trim_float(*cy)),
					("r", trim_float(*r)),
					("fill", fill.clone()),
					("stroke", stroke.clone()),
					("stroke-width", "1.5".into()),
					("opacity", trim_float(*opacity)),
				],
				text: None,
				children: Vec::new(),
			},
			Shape::Path {
				dom_id,
				d,
				stroke,
				stroke_width,
				opacity,
				arrow,
			} => Element {
				tag: "path",
				attrs: vec![
					("id", dom_id.clone()),
					("d", d.clone()),
					("fill", "none".into()),
					("stroke", stroke.clone()),
					("stroke-width", trim_float(*stroke_width)),
					("opacity", trim_float(*opacity)),
					(
						"marker-end",
						if *arrow {
							format!("url(#{ARROW_MARKER_ID})")
						} else {
							"none".into()
						},
					),
				],
				text: None,
				children: Vec::new(),
			},
			Shape::Text {
				x,
				y,
				content,
				fill,
				font_size,
				opacity,
			} => Element {
				tag: "text",
				attrs: vec![
					("x", trim_float(*x)),
					("y", trim_float(*y)),
					("fill", fill.clone()),
					("font-size", format!("{}px", trim_float(*font_size))),
					("opacity", trim_float(*opacity)),
				],
				text: Some(content.clone()),
				children: Vec::new(),
			},
			Shape::TextPath {
				href,
				content,
				fill,
				font_size,
			} => Element {
				tag: "text",
				attrs: vec![
					("fill", fill.clone()),
					("font-size", format!("{}px", trim_float(*font_size))),
					("dy", "-3".into()),
				],
				text: None,
				children: vec![Element {
					tag: "textPath",
					attrs: vec![
						("href", format!("#{href}")),
						("startOffset", "50%".into()),
						("text-anchor", "middle".into()),
					],
					text: Some(content.clone()),
					children: Vec::new(),
				}],
			},
			Shape::Image {
				x,
				y,
				size,
				href,
				title,
			} => Element {
				tag: "image",
				attrs: vec![
					("href", href.clone()),
					("x", trim_float(*x)),
					("y", trim_float(*y)),
					("width", trim_float(*size)),
					("height", trim_float(*size)),
				],
				text: None,
				children: vec![Element {
					tag: "title",
					attrs: Vec::new(),
					text: Some(title.clone()),
					children: Vec::new(),
				}],
			},
		}
	}
}

impl ShapeKey {
	pub fn layer(&self) -> Layer {
		match self {
			ShapeKey::Link(_) => Layer::Links,
			ShapeKey::LinkLabel(_) => Layer::LinkLabels,
			ShapeKey::Node(_) => Layer::Nodes,
			ShapeKey::NodeImage(_) => Layer::Images,
			ShapeKey::NodeLabel(_) => Layer::Labels,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
	Insert(ShapeKey, Element),
	Update(ShapeKey, Element),
	Remove(ShapeKey),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
	Added,
	Updated,
	Unchanged,
}

#[derive(Default)]
pub struct Scene {
	shapes: IndexMap<ShapeKey, Shape>,
	patches: Vec<Patch>,
	pub arrow_fill: String,
}

impl Scene {
	pub fn upsert(&mut self, key: ShapeKey, shape: Shape) -> Upsert {
		match self.shapes.get_mut(&key) {
			Some(existing) if *existing == shape => Upsert::Unchanged,
			Some(existing) => {
				self.patches.push(Patch::Update(key, shape.element()));
				*existing = shape;
				Upsert::Updated
			}
			None => {
				self.patches.push(Patch::Insert(key.clone(), shape.element()));
				self.shapes.insert(key, shape);
				Upsert::Added
			}
		}
	}

	/// Drops every shape whose key is not in `keep`; returns how many went.
	pub fn retain_keys(&mut self, keep: &HashSet<ShapeKey>) -> usize {
		let stale: Vec<ShapeKey> = self
			.shapes
			.keys()
			.filter(|k| !keep.contains(*k))
			.cloned()
			.collect();
		for key in &stale {
			self.shapes.shift_remove(key);
			self.patches.push(Patch::Remove(key.clone()));
		}
		stale.len()
	}

	pub fn get(&self, key: &ShapeKey) -> Option<&Shape> {
		self.shapes.get(key)
	}

	pub fn len(&self) -> usize {
		self.shapes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.shapes.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&ShapeKey, &Shape)> {
		self.shapes.iter()
	}

	pub fn count(&self, layer: Layer) -> usize {
		self.shapes.keys().filter(|k| k.layer() == layer).count()
	}

	pub fn take_patches(&mut self) -> Vec<Patch> {
		std::mem::take(&mut self.patches)
	}

	pub fn to_svg(&self, width: f64, height: f64, transform: &str) -> String {
		let mut out = String::new();
		let _ = write!(
			out,
			r#"<svg xmlns="{SVG_NS}" width="{}" height="{}" viewBox="0 0 {} {}">"#,
			trim_float(width),
			trim_float(height),
			trim_float(width),
			trim_float(height)
		);
		let _ = write!(
			out,
			r#"<defs><marker id="{ARROW_MARKER_ID}" viewBox="0 -5 10 10" refX="10" refY="0" markerWidth="6" markerHeight="6" orient="auto"><path d="M0,-5L10,0L0,5" fill="{}"/></marker></defs>"#,
			escape_attribute(self.arrow_fill.as_str())
		);
		let _ = write!(out, r#"<g transform="{}">"#, escape_attribute(transform));
		for layer in Layer::ALL {
			let _ = write!(out, r#"<g class="{}">"#, layer.class_name());
			for (_, shape) in self.shapes.iter().filter(|(k, _)| k.layer() == layer) {
				write_element(&mut out, &shape.element());
			}
			out.push_str("</g>");
		}
		out.push_str("</g></svg>");
		out
	}
}

fn write_element(out: &mut String, el: &Element) {
	let _ = write!(out, "<{}", el.tag);
	for (name, value) in &el.attrs {
		let _ = write!(out, r#" {name}="{}""#, escape_attribute(value.as_str()));
	}
	out.push('>');
	if let Some(text) = &el.text {
		out.push_str(&escape_text(text.as_str()));
	}
	for child in &el.children {
		write_element(out, child);
	}
	let _ = write!(out, "</{}>", el.tag);
}
