use leptos::prelude::*;
use log::info;

use crate::components::force_graph::sample::{SampleShape, sample_table};
use crate::components::force_graph::{
	ForceGraphState, FrameOutcome, FrameScheduler, SimulationConfig,
};

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 500.0;

/// Runs frames synchronously; each request is answered by the loop below.
struct Inline;

impl FrameScheduler for Inline {
	fn request_frame(&self, _generation: u64) {}
}

/// Lays the sample graph out to completion and serializes the scene.
fn settled_svg(shape: SampleShape) -> String {
	let mut state = ForceGraphState::new(WIDTH, HEIGHT, SimulationConfig::default());
	let generation = state.set_data(&sample_table(shape));
	let mut frames = 0;
	while state.run_frame(generation, &Inline) == FrameOutcome::Scheduled {
		frames += 1;
	}
	info!("snapshot settled after {frames} frames");
	state
		.renderer()
		.scene()
		.to_svg(WIDTH, HEIGHT, &state.transform.to_svg())
}

/// Static SVG of the settled sample layout
#[component]
pub fn Snapshot() -> impl IntoView {
	let svg = settled_svg(SampleShape::default());

	view! {
		<div class="graph-snapshot">
			<h1>"Settled layout"</h1>
			<div inner_html=svg />
		</div>
	}
}
