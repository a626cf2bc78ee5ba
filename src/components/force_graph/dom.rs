//! Applies scene patches to live SVG elements.

use std::collections::HashMap;

use log::{debug, warn};
use web_sys::{Document, Element};

use super::error::{Error, Result};
use super::scene::{self, ARROW_MARKER_ID, Layer, Patch, SVG_NS, ShapeKey};

pub struct DomScene {
	document: Document,
	svg: Element,
	viewport: Element,
	arrow: Element,
	layers: HashMap<Layer, Element>,
	elements: HashMap<ShapeKey, Element>,
}

impl DomScene {
	/// Creates the `<svg>` root, arrow marker and one group per layer inside `host`.
	pub fn mount(host: &Element, width: f64, height: f64) -> Result<Self> {
		let document = web_sys::window()
			.and_then(|w| w.document())
			.ok_or_else(|| Error::Dom("no document".into()))?;
		let create = |tag: &str| document.create_element_ns(Some(SVG_NS), tag);

		let svg = create("svg")?;
		svg.set_attribute("class", "force-graph-svg")?;
		let defs = create("defs")?;
		let marker = create("marker")?;
		for (name, value) in [
			("id", ARROW_MARKER_ID),
			("viewBox", "0 -5 10 10"),
			("refX", "10"),
			("refY", "0"),
			("markerWidth", "6"),
			("markerHeight", "6"),
			("orient", "auto"),
		] {
			marker.set_attribute(name, value)?;
		}
		let arrow = create("path")?;
		arrow.set_attribute("d", "M0,-5L10,0L0,5")?;
		marker.append_child(&arrow)?;
		defs.append_child(&marker)?;
		svg.append_child(&defs)?;

		let viewport = create("g")?;
		svg.append_child(&viewport)?;
		let mut layers = HashMap::new();
		for layer in Layer::ALL {
			let group = create("g")?;
			group.set_attribute("class", layer.class_name())?;
			viewport.append_child(&group)?;
			layers.insert(layer, group);
		}
		host.append_child(&svg)?;

		let dom = Self {
			document,
			svg,
			viewport,
			arrow,
			layers,
			elements: HashMap::new(),
		};
		dom.resize(width, height)?;
		Ok(dom)
	}

	pub fn resize(&self, width: f64, height: f64) -> Result<()> {
		self.svg.set_attribute("width", &width.to_string())?;
		self.svg.set_attribute("height", &height.to_string())?;
		self.svg
			.set_attribute("viewBox", &format!("0 0 {width} {height}"))?;
		Ok(())
	}

	pub fn set_transform(&self, transform: &str) -> Result<()> {
		self.viewport.set_attribute("transform", transform)?;
		Ok(())
	}

	pub fn set_arrow_fill(&self, fill: &str) -> Result<()> {
		self.arrow.set_attribute("fill", fill)?;
		Ok(())
	}

	pub fn apply(&mut self, patches: Vec<Patch>) -> Result<()> {
		if patches.is_empty() {
			return Ok(());
		}
		debug!("applying {} scene patches", patches.len());
		for patch in patches {
			match patch {
				Patch::Insert(key, el) => {
					let node = self.create(&el)?;
					if let Some(group) = self.layers.get(&key.layer()) {
						group.append_child(&node)?;
					}
					if let Some(old) = self.elements.insert(key, node) {
						old.remove();
					}
				}
				Patch::Update(key, el) => match self.elements.get(&key) {
					Some(node) => self.fill(node, &el)?,
					None => warn!("update for unknown shape {key:?}"),
				},
				Patch::Remove(key) => {
					if let Some(node) = self.elements.remove(&key) {
						node.remove();
					}
				}
			}
		}
		Ok(())
	}

	fn create(&self, el: &scene::Element) -> Result<Element> {
		let node = self.document.create_element_ns(Some(SVG_NS), el.tag)?;
		self.fill(&node, el)?;
		Ok(node)
	}

	fn fill(&self, node: &Element, el: &scene::Element) -> Result<()> {
		for (name, value) in &el.attrs {
			node.set_attribute(name, value)?;
		}
		node.set_text_content(el.text.as_deref());
		for child in &el.children {
			let child = self.create(child)?;
			node.append_child(&child)?;
		}
		Ok(())
	}
}
