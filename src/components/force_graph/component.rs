use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, info};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, MouseEvent, WheelEvent, Window};

use super::capabilities::Capabilities;
use super::colors::ColorContext;
use super::dom::DomScene;
use super::error::Result;
use super::settings::{FormatSettings, SimulationConfig};
use super::state::{ForceGraphState, FrameScheduler};
use super::tooltip::TooltipItem;
use super::types::DataTable;

/// Shared handle between the effects, the event handlers and animation frames.
#[derive(Clone, Default)]
struct Host {
	state: Rc<RefCell<Option<ForceGraphState>>>,
	dom: Rc<RefCell<Option<DomScene>>>,
}

impl Host {
	fn is_mounted(&self) -> bool {
		self.state.borrow().is_some()
	}

	fn with_state<R>(&self, f: impl FnOnce(&mut ForceGraphState) -> R) -> Option<R> {
		let mut state = self.state.try_borrow_mut().ok()?;
		state.as_mut().map(f)
	}

	fn flush(&self) {
		if let Err(e) = self.try_flush() {
			error!("{e}");
		}
	}

	/// Pushes pending scene patches and the view transform to the DOM.
	fn try_flush(&self) -> Result<()> {
		let (Ok(mut state), Ok(mut dom)) = (self.state.try_borrow_mut(), self.dom.try_borrow_mut())
		else {
			return Ok(());
		};
		let (Some(state), Some(dom)) = (state.as_mut(), dom.as_mut()) else {
			return Ok(());
		};
		let transform = state.transform.to_svg();
		let scene = state.renderer_mut().scene_mut();
		dom.set_arrow_fill(&scene.arrow_fill)?;
		dom.apply(scene.take_patches())?;
		dom.set_transform(&transform)
	}
}

impl FrameScheduler for Host {
	fn request_frame(&self, generation: u64) {
		let host = self.clone();
		let callback = Closure::once_into_js(move || {
			host.with_state(|s| s.run_frame(generation, &host));
			host.flush();
		});
		if let Some(window) = web_sys::window() {
			if let Err(e) = window.request_animation_frame(callback.unchecked_ref()) {
				error!("requestAnimationFrame failed: {e:?}");
			}
		}
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn local_position(ev: &MouseEvent) -> Option<(f64, f64)> {
	let target: HtmlElement = ev.current_target()?.dyn_into().ok()?;
	let rect = target.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

#[component]
pub fn ForceGraphVisual(
	#[prop(into)] table: Signal<DataTable>,
	#[prop(into, default = Signal::derive(FormatSettings::default))] settings: Signal<
		FormatSettings,
	>,
	#[prop(into, default = Signal::derive(ColorContext::default))] colors: Signal<ColorContext>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let host = Host::default();
	let tooltip: RwSignal<Option<(f64, f64, Vec<TooltipItem>)>> = RwSignal::new(None);
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	if let Err(e) = Capabilities::bundled() {
		error!("{e}");
	}

	let host_mount = host.clone();
	Effect::new(move |_| {
		let Some(container) = container_ref.get() else {
			return;
		};
		if host_mount.is_mounted() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| match container.client_width() {
					0 => 800.0,
					cw => cw as f64,
				}),
				height.unwrap_or_else(|| match container.client_height() {
					0 => 600.0,
					ch => ch as f64,
				}),
			)
		};

		match DomScene::mount(&container, w, h) {
			Ok(dom) => *host_mount.dom.borrow_mut() = Some(dom),
			Err(e) => {
				error!("{e}");
				return;
			}
		}
		let mut state = ForceGraphState::new(w, h, SimulationConfig::default());
		state.set_format(settings.get_untracked(), colors.get_untracked());
		state.set_data(&table.get_untracked());
		*host_mount.state.borrow_mut() = Some(state);
		host_mount.with_state(|s| s.start(&host_mount));
		host_mount.flush();
		info!("force graph mounted at {w}x{h}");

		if fullscreen {
			let host_resize = host_mount.clone();
			*resize_cb.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				host_resize.with_state(|s| s.resize(nw, nh, &host_resize));
				if let Some(dom) = host_resize.dom.borrow().as_ref() {
					if let Err(e) = dom.resize(nw, nh) {
						error!("{e}");
					}
				}
			}));
			if let Some(ref cb) = *resize_cb.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}
	});

	// The mount effect applies the initial table and format; these follow changes.
	let host_data = host.clone();
	Effect::new(move |prev: Option<()>| {
		let table = table.get();
		if prev.is_none() || !host_data.is_mounted() {
			return;
		}
		tooltip.set(None);
		host_data.with_state(|s| {
			s.set_data(&table);
			s.start(&host_data);
		});
		host_data.flush();
	});

	let host_format = host.clone();
	Effect::new(move |prev: Option<()>| {
		let (settings, colors) = (settings.get(), colors.get());
		if prev.is_none() || !host_format.is_mounted() {
			return;
		}
		host_format.with_state(|s| s.set_format(settings, colors));
		host_format.flush();
	});

	let host_md = host.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(&ev) else {
			return;
		};
		host_md.with_state(|s| {
			if !s.begin_drag(x, y, &host_md) {
				s.begin_pan(x, y);
			}
		});
		tooltip.set(None);
	};

	let host_mm = host.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(&ev) else {
			return;
		};
		let items = host_mm.with_state(|s| {
			if s.drag.active {
				s.drag_to(x, y, &host_mm);
				return None;
			}
			if s.pan.active {
				s.pan_to(x, y);
				return None;
			}
			let hovered = s.node_at_position(x, y);
			s.set_hover(hovered);
			match hovered {
				Some(node) => Some(s.node_tooltip(node)),
				None => s.edge_at_position(x, y).map(|edge| s.edge_tooltip(edge)),
			}
		});
		tooltip.set(items.flatten().filter(|i| !i.is_empty()).map(|i| (x, y, i)));
		host_mm.flush();
	};

	let host_mu = host.clone();
	let on_mouseup = move |_: MouseEvent| {
		host_mu.with_state(|s| {
			s.end_drag();
			s.end_pan();
		});
	};

	let host_ml = host.clone();
	let on_mouseleave = move |_: MouseEvent| {
		host_ml.with_state(|s| {
			s.end_drag();
			s.end_pan();
			s.set_hover(None);
		});
		tooltip.set(None);
		host_ml.flush();
	};

	let host_wh = host.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_position(&ev) else {
			return;
		};
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		host_wh.with_state(|s| s.zoom_at(x, y, factor));
		host_wh.flush();
	};

	view! {
		<div
			class="force-graph-visual"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="position: relative; width: 100%; height: 100%; cursor: grab;"
		>
			<div node_ref=container_ref class="force-graph-surface" style="width: 100%; height: 100%;" />
			{move || {
				tooltip
					.get()
					.map(|(x, y, items)| {
						view! {
							<div
								class="force-graph-tooltip"
								style=format!(
									"position: absolute; left: {}px; top: {}px; pointer-events: none;",
									x + 12.0,
									y + 12.0,
								)
							>
								{items
									.into_iter()
									.map(|item| {
										view! {
											<div class="tooltip-row">
												<span class="tooltip-name">{item.display_name}</span>
												": "
												<span class="tooltip-value">{item.value}</span>
											</div>
										}
									})
									.collect_view()}
							</div>
						}
					})
			}}
		</div>
	}
}
