// Renderer configuration that accompanies the chart-ready data

use crate::model::ChartReadyData;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub scales: Scales,
    pub legend: Legend,
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
    pub plugins: Plugins,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scales {
    pub y_axes: Vec<YAxis>,
    pub x_axes: Vec<XAxis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleLabel {
    pub display: bool,
    pub label_string: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YAxis {
    pub scale_label: ScaleLabel,
    pub ticks: Ticks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XAxis {
    pub scale_label: ScaleLabel,
}

/// The y axis always starts at zero and reaches at least the highest error bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticks {
    pub suggested_max: f64,
    pub begin_at_zero: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Top,
    Bottom,
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub position: LegendPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugins {
    #[serde(rename = "chartJsPluginErrorBars")]
    pub error_bars: ErrorBarsPlugin,
}

/// Error bar styling. `absolute_values` tells the renderer the bounds are not offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBarsPlugin {
    pub color: String,
    pub width: String,
    pub line_width: String,
    pub absolute_values: bool,
}

impl Default for ErrorBarsPlugin {
    fn default() -> Self {
        Self {
            color: "#000".to_string(),
            width: "2px".to_string(),
            line_width: "2px".to_string(),
            absolute_values: true,
        }
    }
}

fn scale_label(text: &str) -> ScaleLabel {
    ScaleLabel {
        display: true,
        label_string: text.to_string(),
    }
}

/// Build the renderer options for a chart
pub fn chart_options(
    data: &ChartReadyData,
    x_label: &str,
    y_label: &str,
    legend_position: LegendPosition,
) -> ChartOptions {
    ChartOptions {
        scales: Scales {
            y_axes: vec![YAxis {
                scale_label: scale_label(y_label),
                ticks: Ticks {
                    suggested_max: data.max_value_plus_error,
                    begin_at_zero: true,
                },
            }],
            x_axes: vec![XAxis {
                scale_label: scale_label(x_label),
            }],
        },
        legend: Legend {
            position: legend_position,
        },
        responsive: true,
        maintain_aspect_ratio: false,
        plugins: Plugins {
            error_bars: ErrorBarsPlugin::default(),
        },
    }
}
