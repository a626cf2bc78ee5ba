use leptos::prelude::*;

use crate::components::force_graph::sample::{SampleShape, sample_table};
use crate::components::force_graph::{ColorContext, FormatSettings, ForceGraphVisual};

/// Live visual over the synthetic dataset with a few format toggles
#[component]
pub fn Home() -> impl IntoView {
	let shape = RwSignal::new(SampleShape::default());
	let table = Signal::derive(move || sample_table(shape.get()));
	let show_labels = RwSignal::new(true);
	let show_weights = RwSignal::new(false);
	let high_contrast = RwSignal::new(false);

	let settings = Signal::derive(move || {
		let mut settings = FormatSettings::default();
		settings.labels.show = show_labels.get();
		settings.links.show_label = show_weights.get();
		settings.links.show_arrow = true;
		settings
	});
	let colors = Signal::derive(move || {
		if high_contrast.get() {
			ColorContext::high_contrast("#000000", "#ffff00")
		} else {
			ColorContext::default()
		}
	});

	view! {
		<div class="fullscreen-graph">
			<ForceGraphVisual table=table settings=settings colors=colors fullscreen=true />
			<div class="graph-overlay">
				<h1>"Force-Directed Graph"</h1>
				<p class="subtitle">
					"Drag nodes to reposition. Scroll to zoom. Drag background to pan."
				</p>
				<label>
					<input
						type="checkbox"
						prop:checked=move || show_labels.get()
						on:change=move |_| show_labels.update(|v| *v = !*v)
					/>
					"Labels"
				</label>
				<label>
					<input
						type="checkbox"
						prop:checked=move || show_weights.get()
						on:change=move |_| show_weights.update(|v| *v = !*v)
					/>
					"Weights"
				</label>
				<label>
					<input
						type="checkbox"
						prop:checked=move || high_contrast.get()
						on:change=move |_| high_contrast.update(|v| *v = !*v)
					/>
					"High contrast"
				</label>
				<button on:click=move |_| {
					shape
						.update(|s| {
							s.sources += 1;
							s.targets += 1;
						})
				}>"More data"</button>
			</div>
		</div>
	}
}
