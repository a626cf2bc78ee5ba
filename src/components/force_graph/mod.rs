pub mod builder;
pub mod capabilities;
pub mod colors;
mod component;
mod dom;
pub mod error;
pub mod format;
pub mod metadata;
pub mod quadtree;
pub mod render;
pub mod sample;
pub mod scene;
pub mod settings;
pub mod simulation;
pub mod state;
pub mod tooltip;
pub mod types;

pub use builder::{GraphBuilder, WeightAggregation};
pub use colors::ColorContext;
pub use component::ForceGraphVisual;
pub use error::{Error, Result};
pub use settings::{FormatSettings, SimulationConfig};
pub use state::{ForceGraphState, FrameOutcome, FrameScheduler};
pub use types::{ColumnDescriptor, DataTable, DataType, GraphData, GraphEdge, GraphNode};
