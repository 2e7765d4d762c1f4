// Selection state and the recompute loop around the pipeline

use crate::aggregate::chart_data_for_selections;
use crate::config::ChartConfig;
use crate::error::{ChartError, ChartResult};
use crate::format::{format_indicator_value, value_formatter};
use crate::lookup::LabelBuilder;
use crate::model::{ChartReadyData, Filter, FilterOption, Indicator, Row, Selections};
use crate::render::{chart_options, ChartOptions};
use crate::tooltip::{tooltip_label, TooltipItem};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A single control change, serialised as a one-key object such as `{"xAxisId": "age"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionUpdate {
    IndicatorId(String),
    XAxisId(String),
    DisaggregateById(String),
    SelectedFilterOptions(IndexMap<String, Vec<FilterOption>>),
}

impl SelectionUpdate {
    pub fn apply_to(self, selections: &mut Selections) {
        match self {
            SelectionUpdate::IndicatorId(id) => selections.indicator_id = id,
            SelectionUpdate::XAxisId(id) => selections.x_axis_id = id,
            SelectionUpdate::DisaggregateById(id) => selections.disaggregate_by_id = id,
            SelectionUpdate::SelectedFilterOptions(options) => {
                selections.selected_filter_options = options
            }
        }
    }
}

/// Updates that fill every empty selection field with a default.
///
/// Defaults: the first indicator, the first filter on the x axis, the second
/// filter (or the first when there is only one) for disaggregation, and the
/// first option of every filter.
pub fn default_selections(
    current: &Selections,
    filters: &[Filter],
    indicators: &[Indicator],
) -> Vec<SelectionUpdate> {
    let mut updates = Vec::new();

    if current.indicator_id.is_empty() {
        if let Some(indicator) = indicators.first() {
            updates.push(SelectionUpdate::IndicatorId(indicator.indicator.clone()));
        }
    }
    if current.x_axis_id.is_empty() {
        if let Some(filter) = filters.first() {
            updates.push(SelectionUpdate::XAxisId(filter.id.clone()));
        }
    }
    if current.disaggregate_by_id.is_empty() {
        if let Some(filter) = filters.get(1).or_else(|| filters.first()) {
            updates.push(SelectionUpdate::DisaggregateById(filter.id.clone()));
        }
    }
    if current.selected_filter_options.is_empty() && !filters.is_empty() {
        let options: IndexMap<String, Vec<FilterOption>> = filters
            .iter()
            .map(|f| (f.id.clone(), f.options.first().cloned().into_iter().collect()))
            .collect();
        updates.push(SelectionUpdate::SelectedFilterOptions(options));
    }

    updates
}

/// Indicator as a `{id, label}` option for a selector
pub fn normalize_indicator(indicator: &Indicator) -> FilterOption {
    FilterOption::new(indicator.indicator.clone(), indicator.name.clone())
}

/// Everything a renderer needs for one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartView {
    pub chart_data: ChartReadyData,
    pub x_label: String,
    pub y_label: String,
    pub options: ChartOptions,
    pub show_error_range: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_data_message: Option<String>,
}

/// Result of the latest recompute
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// Selections incomplete, nothing is drawn
    Uninitialised,
    Ready(ChartView),
    Failed(ChartError),
}

pub type ValueFormat = Box<dyn Fn(f64, &Indicator) -> String>;
pub type Subscriber = Box<dyn FnMut(&ViewState)>;

/// Owns the inputs and selections, and recomputes the chart from scratch on every change.
pub struct ChartSession {
    rows: Vec<Row>,
    config: ChartConfig,
    selections: Selections,
    format: ValueFormat,
    state: ViewState,
    subscribers: Vec<Subscriber>,
}

impl ChartSession {
    pub fn new(rows: Vec<Row>, config: ChartConfig) -> Self {
        let selections = config.selections.clone().unwrap_or_default();
        let mut session = Self {
            rows,
            config,
            selections,
            format: Box::new(format_indicator_value),
            state: ViewState::Uninitialised,
            subscribers: Vec::new(),
        };
        session.recompute();
        session
    }

    /// Replace the value formatter used by tooltips and `format_value`
    pub fn with_format<F>(mut self, format: F) -> Self
    where
        F: Fn(f64, &Indicator) -> String + 'static,
    {
        self.format = Box::new(format);
        self
    }

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&ViewState) + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn view(&self) -> Option<&ChartView> {
        match &self.state {
            ViewState::Ready(view) => Some(view),
            _ => None,
        }
    }

    pub fn is_initialised(&self) -> bool {
        self.selections.is_initialised()
    }

    pub fn indicator(&self) -> Option<&Indicator> {
        self.config
            .indicators
            .iter()
            .find(|i| i.indicator == self.selections.indicator_id)
    }

    pub fn indicator_options(&self) -> Vec<FilterOption> {
        self.config.indicators.iter().map(normalize_indicator).collect()
    }

    pub fn filters_as_options(&self) -> Vec<FilterOption> {
        LabelBuilder::new(&self.config.filters, &self.selections.selected_filter_options)
            .filters_as_options()
    }

    /// Fill empty selection fields with defaults, one update per field.
    pub fn initialise(&mut self) -> Vec<SelectionUpdate> {
        let updates =
            default_selections(&self.selections, &self.config.filters, &self.config.indicators);
        for update in &updates {
            self.apply(update.clone());
        }
        updates
    }

    /// Filters the panel shows, without the ones hidden by an axis config.
    pub fn visible_filters(&self) -> Vec<&Filter> {
        let hidden_x = self.config.x_axis().hide_filter;
        let hidden_disaggregate = self.config.disaggregate_by().hide_filter;
        self.config
            .filters
            .iter()
            .filter(|f| !(hidden_x && f.id == self.selections.x_axis_id))
            .filter(|f| !(hidden_disaggregate && f.id == self.selections.disaggregate_by_id))
            .collect()
    }

    /// The "Filters" header is only drawn when at least one filter is visible.
    pub fn show_filters_header(&self) -> bool {
        !self.visible_filters().is_empty()
    }

    /// Apply one change. Changing a fixed axis that is already chosen is ignored.
    pub fn apply(&mut self, update: SelectionUpdate) {
        let locked = match &update {
            SelectionUpdate::XAxisId(_) => {
                self.config.x_axis().fixed && !self.selections.x_axis_id.is_empty()
            }
            SelectionUpdate::DisaggregateById(_) => {
                self.config.disaggregate_by().fixed
                    && !self.selections.disaggregate_by_id.is_empty()
            }
            _ => false,
        };
        if locked {
            warn!(?update, "Axis is fixed, ignoring update");
            return;
        }
        debug!(?update, "Applying selection update");
        update.apply_to(&mut self.selections);
        self.recompute();
    }

    pub fn set_selections(&mut self, selections: Selections) {
        self.selections = selections;
        self.recompute();
    }

    /// Replace the selected options of one filter; the other filters keep theirs.
    pub fn change_filter(
        &mut self,
        filter_id: &str,
        options: Vec<FilterOption>,
    ) -> ChartResult<SelectionUpdate> {
        if !self.config.filters.iter().any(|f| f.id == filter_id) {
            return Err(ChartError::UnknownFilter(filter_id.to_string()));
        }
        let mut selected = self.selections.selected_filter_options.clone();
        selected.insert(filter_id.to_string(), options);
        let update = SelectionUpdate::SelectedFilterOptions(selected);
        self.apply(update.clone());
        Ok(update)
    }

    /// Select options of a filter by id, resolving labels from the catalog.
    /// Repeated ids are selected once.
    pub fn select_options(
        &mut self,
        filter_id: &str,
        option_ids: &[String],
    ) -> ChartResult<SelectionUpdate> {
        let filter = self
            .config
            .filters
            .iter()
            .find(|f| f.id == filter_id)
            .ok_or_else(|| ChartError::UnknownFilter(filter_id.to_string()))?;

        let mut seen = HashSet::new();
        let options = option_ids
            .iter()
            .filter(|id| seen.insert(*id))
            .map(|id| {
                filter.option(id).cloned().ok_or_else(|| ChartError::UnknownOption {
                    filter: filter_id.to_string(),
                    option: id.clone(),
                })
            })
            .collect::<ChartResult<Vec<_>>>()?;

        self.change_filter(filter_id, options)
    }

    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.recompute();
    }

    pub fn set_filters(&mut self, filters: Vec<Filter>) {
        self.config.filters = filters;
        self.recompute();
    }

    pub fn set_indicators(&mut self, indicators: Vec<Indicator>) {
        self.config.indicators = indicators;
        self.recompute();
    }

    /// Format a value with the current indicator; plain display when there is none
    pub fn format_value(&self, value: f64) -> String {
        match self.indicator() {
            Some(indicator) => (self.format)(value, indicator),
            None => value.to_string(),
        }
    }

    pub fn tooltip(&self, item: &TooltipItem) -> String {
        let datasets = self.view().map(|v| v.chart_data.datasets.as_slice());
        match self.indicator() {
            Some(indicator) => tooltip_label(
                item,
                datasets,
                value_formatter(&*self.format, indicator),
                self.config.show_error_range,
            ),
            None => tooltip_label(item, datasets, |v: f64| v.to_string(), false),
        }
    }

    fn recompute(&mut self) {
        self.state = self.build_state();
        if let ViewState::Failed(err) = &self.state {
            warn!(error = %err, "Chart recompute failed");
        }
        for subscriber in &mut self.subscribers {
            subscriber(&self.state);
        }
    }

    fn build_state(&self) -> ViewState {
        if !self.selections.is_initialised() {
            return ViewState::Uninitialised;
        }

        let chart_data = match chart_data_for_selections(
            &self.rows,
            &self.config.filters,
            &self.config.indicators,
            &self.selections,
            &self.config.palette,
        ) {
            Ok(data) => data,
            Err(err) => return ViewState::Failed(err),
        };

        let labels = LabelBuilder::new(&self.config.filters, &self.selections.selected_filter_options);
        let x_label = labels
            .filter_label(&self.selections.x_axis_id)
            .unwrap_or_default()
            .to_string();
        let y_label = self.indicator().map(|i| i.name.clone()).unwrap_or_default();
        let options =
            chart_options(&chart_data, &x_label, &y_label, self.config.legend_position);
        let no_data_message = if chart_data.is_empty() {
            self.config.no_data_message.clone()
        } else {
            None
        };

        ViewState::Ready(ChartView {
            chart_data,
            x_label,
            y_label,
            options,
            show_error_range: self.config.show_error_range,
            no_data_message,
        })
    }
}
