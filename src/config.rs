use crate::model::{Filter, Indicator, Selections};
use crate::palette::Palette;
use crate::render::LegendPosition;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Behaviour of one axis selector. `fixed` locks the chosen filter, `hide_filter`
/// drops that filter from the visible filter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AxisConfig {
    pub fixed: bool,
    pub hide_filter: bool,
}

/// Chart configuration: the filter and indicator catalogs plus display settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub indicators: Vec<Indicator>,
    /// Starting selections; defaults are derived from the catalogs when absent
    #[serde(default)]
    pub selections: Option<Selections>,
    #[serde(default)]
    pub no_data_message: Option<String>,
    #[serde(default = "default_show_error_range")]
    pub show_error_range: bool,
    #[serde(default)]
    pub palette: Palette,
    #[serde(default)]
    pub legend_position: LegendPosition,
    /// `null` or absent means neither fixed nor hidden
    #[serde(default)]
    pub x_axis_config: Option<AxisConfig>,
    #[serde(default)]
    pub disaggregate_by_config: Option<AxisConfig>,
}

fn default_show_error_range() -> bool {
    true
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            indicators: Vec::new(),
            selections: None,
            no_data_message: None,
            show_error_range: default_show_error_range(),
            palette: Palette::default(),
            legend_position: LegendPosition::default(),
            x_axis_config: None,
            disaggregate_by_config: None,
        }
    }
}

impl ChartConfig {
    pub fn x_axis(&self) -> AxisConfig {
        self.x_axis_config.unwrap_or_default()
    }

    pub fn disaggregate_by(&self) -> AxisConfig {
        self.disaggregate_by_config.unwrap_or_default()
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let config: ChartConfig =
            serde_json::from_str(input).context("Failed to parse chart configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    /// Filter and indicator ids must be unique, and option ids unique within a filter
    pub fn validate(&self) -> Result<()> {
        let mut filter_ids = HashSet::new();
        for filter in &self.filters {
            if !filter_ids.insert(filter.id.as_str()) {
                bail!("Duplicate filter id '{}'", filter.id);
            }
            let mut option_ids = HashSet::new();
            for option in &filter.options {
                if !option_ids.insert(option.id.as_str()) {
                    bail!("Duplicate option id '{}' in filter '{}'", option.id, filter.id);
                }
            }
        }

        let mut indicator_ids = HashSet::new();
        for indicator in &self.indicators {
            if !indicator_ids.insert(indicator.indicator.as_str()) {
                bail!("Duplicate indicator id '{}'", indicator.indicator);
            }
        }

        Ok(())
    }
}
