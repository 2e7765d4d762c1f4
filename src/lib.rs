// Library exports for filterchart

pub mod data;
pub mod error;
pub mod model;
pub mod palette;
pub mod parser;

// Pipeline
pub mod lookup;
pub mod aggregate;

// Renderer-facing pieces
pub mod format;
pub mod render;
pub mod tooltip;

pub mod config;
pub mod session;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use aggregate::{chart_data_for_selections, processed_output_data, AggregationRequest};
pub use config::ChartConfig;
pub use error::{ChartError, ChartResult};
pub use lookup::{to_filter_label_lookup, LabelBuilder, LabelLookup};
pub use model::{
    ChartReadyData, Dataset, ErrorBar, Filter, FilterOption, Indicator, Row, Scalar, Selections,
};
pub use palette::Palette;
pub use session::{ChartSession, ChartView, SelectionUpdate, ViewState};
