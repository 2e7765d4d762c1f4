// Turns filtered indicator rows into chart-ready datasets

use crate::error::{ChartError, ChartResult};
use crate::lookup::{LabelBuilder, LabelLookup};
use crate::model::{
    ChartReadyData, Dataset, ErrorBar, Filter, FilterOption, Indicator, Row, Selections,
};
use crate::palette::Palette;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Everything the aggregator reads. Label and value slices are positionally paired.
#[derive(Debug, Clone, Copy)]
pub struct AggregationRequest<'a> {
    pub rows: &'a [Row],
    pub x_axis_filter_id: &'a str,
    pub disaggregate_filter_id: &'a str,
    pub indicator: &'a Indicator,
    pub filters: &'a [Filter],
    pub selected_filter_options: &'a IndexMap<String, Vec<FilterOption>>,
    pub bar_label_lookup: &'a LabelLookup,
    pub x_axis_label_lookup: &'a LabelLookup,
    pub x_axis_labels: &'a [String],
    pub x_axis_values: &'a [String],
}

/// One (disaggregation value, x axis value) cell
#[derive(Debug, Clone, Copy)]
struct Cell {
    value: f64,
    plus: Option<f64>,
    minus: Option<f64>,
}

impl Cell {
    /// Bounds are absolute, so the top of the error bar is the upper bound itself.
    fn upper(&self) -> f64 {
        self.plus.map_or(self.value, |plus| plus.max(self.value))
    }
}

/// Build the chart-ready structure for one combination of indicator, axes and filters.
///
/// One dataset is emitted per disaggregation id in `bar_label_lookup`, in lookup
/// order, even when none of its cells matched. Cells without a row are left out
/// of `data` and `errorBars` rather than padded. Two admitted rows landing in the
/// same cell are rejected with [`ChartError::DuplicateCell`].
pub fn processed_output_data(
    request: &AggregationRequest<'_>,
    palette: &Palette,
) -> ChartResult<ChartReadyData> {
    let admitted: Vec<&Row> = request
        .rows
        .iter()
        .filter(|row| {
            is_admitted(
                row,
                request.indicator,
                request.filters,
                request.selected_filter_options,
            )
        })
        .collect();

    debug!(
        indicator = %request.indicator.indicator,
        total = request.rows.len(),
        admitted = admitted.len(),
        "Applied admission filter"
    );

    let cells = group_cells(&admitted, request)?;

    let mut max_upper: Option<f64> = None;
    let mut datasets = Vec::with_capacity(request.bar_label_lookup.len());

    for (index, (disaggregation_id, label)) in request.bar_label_lookup.iter().enumerate() {
        let group = cells.get(disaggregation_id.as_str());
        let mut data = Vec::new();
        let mut error_bars = IndexMap::new();
        let mut emitted = HashSet::new();

        for (x_label, x_value) in request.x_axis_labels.iter().zip(request.x_axis_values) {
            let Some(cell) = group.and_then(|g| g.get(x_value.as_str())) else {
                continue;
            };
            // a repeated x value keeps data and errorBars the same length
            if !emitted.insert(x_value.as_str()) {
                continue;
            }

            data.push(cell.value);
            let key = request
                .x_axis_label_lookup
                .get(x_value)
                .unwrap_or(x_label)
                .clone();
            error_bars.insert(
                key,
                ErrorBar {
                    plus: cell.plus,
                    minus: cell.minus,
                },
            );

            let upper = cell.upper();
            max_upper = Some(max_upper.map_or(upper, |m| m.max(upper)));
        }

        datasets.push(Dataset {
            label: label.clone(),
            background_color: palette.color(index).to_string(),
            data,
            error_bars,
        });
    }

    Ok(ChartReadyData {
        labels: request.x_axis_labels.to_vec(),
        datasets,
        max_value_plus_error: max_upper.unwrap_or(0.0),
    })
}

/// Index admitted rows by disaggregation value, then x axis value.
///
/// Only cells that can be emitted are indexed, so duplicates outside the
/// selected combination do not fail the request.
fn group_cells(
    admitted: &[&Row],
    request: &AggregationRequest<'_>,
) -> ChartResult<HashMap<String, HashMap<String, Cell>>> {
    let mut cells: HashMap<String, HashMap<String, Cell>> = HashMap::new();

    let x_filter = find_filter(request.filters, request.x_axis_filter_id);
    let disaggregate_filter = find_filter(request.filters, request.disaggregate_filter_id);
    let (Some(x_filter), Some(disaggregate_filter)) = (x_filter, disaggregate_filter) else {
        debug!(
            x_axis = request.x_axis_filter_id,
            disaggregate_by = request.disaggregate_filter_id,
            "Axis filter not in catalog, no cells can match"
        );
        return Ok(cells);
    };

    for row in admitted {
        let Some(disaggregation) = row
            .get(&disaggregate_filter.column_id)
            .and_then(|v| v.normalized())
        else {
            continue;
        };
        let Some(x_value) = row.get(&x_filter.column_id).and_then(|v| v.normalized()) else {
            continue;
        };

        if !request.bar_label_lookup.contains_key(&*disaggregation)
            || !request.x_axis_values.iter().any(|v| *v == x_value)
        {
            continue;
        }

        // admission guarantees a numeric value
        let Some(value) = row.number(&request.indicator.value_column) else {
            continue;
        };
        let cell = Cell {
            value,
            plus: row.number(&request.indicator.error_high_column),
            minus: row.number(&request.indicator.error_low_column),
        };

        let group = cells.entry(disaggregation.to_string()).or_default();
        if group.insert(x_value.to_string(), cell).is_some() {
            return Err(ChartError::DuplicateCell {
                disaggregation: disaggregation.into_owned(),
                x_axis: x_value.into_owned(),
            });
        }
    }

    Ok(cells)
}

/// The admission filter: indicator discriminator, every selected dimension, and a present value.
pub fn is_admitted(
    row: &Row,
    indicator: &Indicator,
    filters: &[Filter],
    selected: &IndexMap<String, Vec<FilterOption>>,
) -> bool {
    if !row.matches(&indicator.indicator_column, &indicator.indicator_value) {
        return false;
    }

    let passes_filters = filters.iter().all(|filter| match selected.get(&filter.id) {
        // an empty selection admits nothing
        Some(options) => options.iter().any(|o| row.matches(&filter.column_id, &o.id)),
        None => true,
    });
    if !passes_filters {
        return false;
    }

    match row.get(&indicator.value_column) {
        None => false,
        Some(value) if value.is_null() => false,
        Some(value) => {
            if value.as_f64().is_none() {
                warn!(
                    column = %indicator.value_column,
                    value = ?value,
                    "Dropping row with non-numeric value"
                );
                return false;
            }
            true
        }
    }
}

fn find_filter<'a>(filters: &'a [Filter], id: &str) -> Option<&'a Filter> {
    filters.iter().find(|f| f.id == id)
}

/// Run both stages for a full set of selections.
///
/// Selections must be initialised. The indicator is looked up by id; unknown
/// axis filters simply produce empty datasets.
pub fn chart_data_for_selections(
    rows: &[Row],
    filters: &[Filter],
    indicators: &[Indicator],
    selections: &Selections,
    palette: &Palette,
) -> ChartResult<ChartReadyData> {
    if !selections.is_initialised() {
        return Err(ChartError::Uninitialised);
    }

    let indicator = indicators
        .iter()
        .find(|i| i.indicator == selections.indicator_id)
        .ok_or_else(|| ChartError::UnknownIndicator(selections.indicator_id.clone()))?;

    let labels = LabelBuilder::new(filters, &selections.selected_filter_options);
    let x_axis_labels = labels.axis_labels(&selections.x_axis_id);
    let x_axis_values = labels.axis_values(&selections.x_axis_id);
    let x_axis_label_lookup = labels.label_lookup(&selections.x_axis_id);
    let bar_label_lookup = labels.label_lookup(&selections.disaggregate_by_id);

    let request = AggregationRequest {
        rows,
        x_axis_filter_id: &selections.x_axis_id,
        disaggregate_filter_id: &selections.disaggregate_by_id,
        indicator,
        filters,
        selected_filter_options: &selections.selected_filter_options,
        bar_label_lookup: &bar_label_lookup,
        x_axis_label_lookup: &x_axis_label_lookup,
        x_axis_labels: &x_axis_labels,
        x_axis_values: &x_axis_values,
    };

    processed_output_data(&request, palette)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{art_coverage, filters, null_value_row, prevalence, rows};
    use pretty_assertions::assert_eq;

    fn selected(entries: &[(&str, &[(&str, &str)])]) -> IndexMap<String, Vec<FilterOption>> {
        entries
            .iter()
            .map(|(filter, options)| {
                (
                    filter.to_string(),
                    options
                        .iter()
                        .map(|(id, label)| FilterOption::new(*id, *label))
                        .collect(),
                )
            })
            .collect()
    }

    fn lookup(entries: &[(&str, &str)]) -> LabelLookup {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn reference_selection() -> IndexMap<String, Vec<FilterOption>> {
        selected(&[
            ("region", &[("1", "Northern")]),
            ("age", &[("5:9", "5-9")]),
            ("sex", &[("female", "female"), ("male", "male")]),
        ])
    }

    fn run(
        rows: &[Row],
        indicator: &Indicator,
        selected: &IndexMap<String, Vec<FilterOption>>,
        bar_label_lookup: &LabelLookup,
    ) -> ChartResult<ChartReadyData> {
        let filters = filters();
        let x_axis_label_lookup = lookup(&[("0:4", "0-4"), ("5:9", "5-9")]);
        let x_axis_labels = vec!["5-9".to_string()];
        let x_axis_values = vec!["5:9".to_string()];
        let request = AggregationRequest {
            rows,
            x_axis_filter_id: "age",
            disaggregate_filter_id: "sex",
            indicator,
            filters: &filters,
            selected_filter_options: selected,
            bar_label_lookup,
            x_axis_label_lookup: &x_axis_label_lookup,
            x_axis_labels: &x_axis_labels,
            x_axis_values: &x_axis_values,
        };
        processed_output_data(&request, &Palette::default())
    }

    fn error_bars(entries: &[(&str, f64, f64)]) -> IndexMap<String, ErrorBar> {
        entries
            .iter()
            .map(|(k, plus, minus)| {
                (
                    k.to_string(),
                    ErrorBar {
                        plus: Some(*plus),
                        minus: Some(*minus),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_processed_output_data_reference() {
        let result = run(
            &rows(),
            &art_coverage(),
            &reference_selection(),
            &lookup(&[("female", "female"), ("male", "male")]),
        )
        .unwrap();

        assert_eq!(
            result,
            ChartReadyData {
                labels: vec!["5-9".to_string()],
                datasets: vec![
                    Dataset {
                        label: "female".to_string(),
                        background_color: "#e41a1c".to_string(),
                        data: vec![0.20],
                        error_bars: error_bars(&[("5-9", 0.24, 0.16)]),
                    },
                    Dataset {
                        label: "male".to_string(),
                        background_color: "#377eb8".to_string(),
                        data: vec![0.25],
                        error_bars: error_bars(&[("5-9", 0.28, 0.21)]),
                    },
                ],
                max_value_plus_error: 0.28,
            }
        );
    }

    #[test]
    fn test_omits_rows_with_null_or_missing_values() {
        let missing = Row::new()
            .with("area_id", 1)
            .with("age_group", "5:9")
            .with("sex", "female")
            .with("indicator", 2)
            .with("high", 0.43)
            .with("low", 0.38);
        let rows = vec![missing, null_value_row()];

        let result = run(
            &rows,
            &art_coverage(),
            &reference_selection(),
            &lookup(&[("female", "female")]),
        )
        .unwrap();

        assert_eq!(
            result,
            ChartReadyData {
                labels: vec!["5-9".to_string()],
                datasets: vec![Dataset {
                    label: "female".to_string(),
                    background_color: "#e41a1c".to_string(),
                    data: vec![],
                    error_bars: IndexMap::new(),
                }],
                max_value_plus_error: 0.0,
            }
        );
    }

    #[test]
    fn test_every_disaggregation_value_gets_a_dataset() {
        let result = run(
            &rows(),
            &art_coverage(),
            &selected(&[
                ("region", &[("2", "Central")]),
                ("age", &[("5:9", "5-9")]),
                ("sex", &[("female", "female"), ("male", "male")]),
            ]),
            &lookup(&[("female", "female"), ("male", "male")]),
        )
        .unwrap();

        assert_eq!(result.datasets.len(), 2);
        assert_eq!(result.datasets[0].data, vec![0.25]);
        assert!(result.datasets[1].data.is_empty());
        assert!(result.datasets[1].error_bars.is_empty());
        assert_eq!(result.max_value_plus_error, 0.29);
    }

    #[test]
    fn test_dataset_order_follows_selection_not_catalog() {
        let result = run(
            &rows(),
            &art_coverage(),
            &selected(&[
                ("region", &[("1", "Northern")]),
                ("age", &[("5:9", "5-9")]),
                ("sex", &[("male", "male"), ("female", "female")]),
            ]),
            &lookup(&[("male", "male"), ("female", "female")]),
        )
        .unwrap();

        assert_eq!(result.datasets[0].label, "male");
        assert_eq!(result.datasets[0].background_color, "#e41a1c");
        assert_eq!(result.datasets[0].data, vec![0.25]);
        assert_eq!(result.datasets[1].label, "female");
        assert_eq!(result.datasets[1].background_color, "#377eb8");
    }

    #[test]
    fn test_empty_selection_admits_nothing() {
        let result = run(
            &rows(),
            &art_coverage(),
            &selected(&[
                ("region", &[("1", "Northern")]),
                ("age", &[("5:9", "5-9")]),
                ("sex", &[]),
            ]),
            &lookup(&[]),
        )
        .unwrap();

        assert!(result.datasets.is_empty());
        assert_eq!(result.labels, vec!["5-9"]);
        assert_eq!(result.max_value_plus_error, 0.0);
    }

    #[test]
    fn test_other_indicator_rows_are_excluded() {
        let result = run(
            &rows(),
            &prevalence(),
            &reference_selection(),
            &lookup(&[("female", "female"), ("male", "male")]),
        )
        .unwrap();

        assert_eq!(result.datasets[0].data, vec![0.10]);
        assert_eq!(result.datasets[1].data, vec![0.15]);
        assert_eq!(result.max_value_plus_error, 0.2);
    }

    #[test]
    fn test_missing_cells_are_not_padded() {
        let filters = filters();
        let selected = selected(&[
            ("age", &[("0:4", "0-4"), ("10:14", "10-14"), ("5:9", "5-9")]),
            ("sex", &[("female", "female")]),
        ]);
        let x_axis_label_lookup = lookup(&[("0:4", "0-4"), ("10:14", "10-14"), ("5:9", "5-9")]);
        let bar_label_lookup = lookup(&[("female", "female")]);
        let x_axis_labels: Vec<String> = vec!["0-4".into(), "10-14".into(), "5-9".into()];
        let x_axis_values: Vec<String> = vec!["0:4".into(), "10:14".into(), "5:9".into()];
        let rows: Vec<Row> = rows()
            .into_iter()
            .filter(|r| r.matches("area_id", "1"))
            .collect();
        let indicator = art_coverage();

        let request = AggregationRequest {
            rows: &rows,
            x_axis_filter_id: "age",
            disaggregate_filter_id: "sex",
            indicator: &indicator,
            filters: &filters,
            selected_filter_options: &selected,
            bar_label_lookup: &bar_label_lookup,
            x_axis_label_lookup: &x_axis_label_lookup,
            x_axis_labels: &x_axis_labels,
            x_axis_values: &x_axis_values,
        };
        let result = processed_output_data(&request, &Palette::default()).unwrap();

        assert_eq!(result.labels.len(), 3);
        assert_eq!(result.datasets[0].data, vec![0.40, 0.20]);
        assert_eq!(
            result.datasets[0].error_bars.keys().collect::<Vec<_>>(),
            vec!["0-4", "5-9"]
        );
        assert_eq!(result.max_value_plus_error, 0.43);
    }

    #[test]
    fn test_duplicate_cell_is_rejected() {
        // without a region constraint both areas land in the same cell
        let result = run(
            &rows(),
            &art_coverage(),
            &selected(&[("age", &[("5:9", "5-9")]), ("sex", &[("female", "female")])]),
            &lookup(&[("female", "female")]),
        );

        assert_eq!(
            result,
            Err(ChartError::DuplicateCell {
                disaggregation: "female".to_string(),
                x_axis: "5:9".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_axis_filter_gives_empty_datasets() {
        let filters = filters();
        let selected = reference_selection();
        let bar_label_lookup = lookup(&[("female", "female")]);
        let x_axis_label_lookup = lookup(&[]);
        let x_axis_labels = vec!["5-9".to_string()];
        let x_axis_values = vec!["5:9".to_string()];
        let rows = rows();
        let indicator = art_coverage();

        let request = AggregationRequest {
            rows: &rows,
            x_axis_filter_id: "no_such_filter",
            disaggregate_filter_id: "sex",
            indicator: &indicator,
            filters: &filters,
            selected_filter_options: &selected,
            bar_label_lookup: &bar_label_lookup,
            x_axis_label_lookup: &x_axis_label_lookup,
            x_axis_labels: &x_axis_labels,
            x_axis_values: &x_axis_values,
        };
        let result = processed_output_data(&request, &Palette::default()).unwrap();

        assert_eq!(result.datasets.len(), 1);
        assert!(result.is_empty());
        assert_eq!(result.max_value_plus_error, 0.0);
    }

    #[test]
    fn test_filter_on_absent_column_admits_nothing() {
        let mut filters = filters();
        filters.push(Filter {
            id: "district".to_string(),
            label: "District".to_string(),
            column_id: "nope".to_string(),
            options: vec![FilterOption::new("x", "X")],
        });
        let mut selected_filter_options = reference_selection();
        selected_filter_options.insert("district".to_string(), vec![FilterOption::new("x", "X")]);
        let selections = Selections {
            indicator_id: "art_cov".to_string(),
            x_axis_id: "age".to_string(),
            disaggregate_by_id: "sex".to_string(),
            selected_filter_options,
        };

        let result = chart_data_for_selections(
            &rows(),
            &filters,
            &[art_coverage()],
            &selections,
            &Palette::default(),
        )
        .unwrap();

        assert_eq!(result.labels, vec!["5-9"]);
        assert_eq!(result.datasets.len(), 2);
        for dataset in &result.datasets {
            assert!(dataset.data.is_empty());
            assert!(dataset.error_bars.is_empty());
        }
        assert_eq!(result.max_value_plus_error, 0.0);
    }

    #[test]
    fn test_repeated_x_value_is_emitted_once() {
        let filters = filters();
        let selected = reference_selection();
        let bar_label_lookup = lookup(&[("female", "female")]);
        let x_axis_label_lookup = lookup(&[("5:9", "5-9")]);
        let x_axis_labels = vec!["5-9".to_string(), "5-9".to_string()];
        let x_axis_values = vec!["5:9".to_string(), "5:9".to_string()];
        let rows = rows();
        let indicator = art_coverage();

        let request = AggregationRequest {
            rows: &rows,
            x_axis_filter_id: "age",
            disaggregate_filter_id: "sex",
            indicator: &indicator,
            filters: &filters,
            selected_filter_options: &selected,
            bar_label_lookup: &bar_label_lookup,
            x_axis_label_lookup: &x_axis_label_lookup,
            x_axis_labels: &x_axis_labels,
            x_axis_values: &x_axis_values,
        };
        let result = processed_output_data(&request, &Palette::default()).unwrap();

        assert_eq!(result.datasets[0].data, vec![0.20]);
        assert_eq!(result.datasets[0].error_bars, error_bars(&[("5-9", 0.24, 0.16)]));
    }

    #[test]
    fn test_is_admitted_loose_indicator_match() {
        let indicator = art_coverage();
        let filters = filters();
        let none = IndexMap::new();
        let text_discriminator = Row::new().with("indicator", "2").with("mean", 0.1);
        let number_discriminator = Row::new().with("indicator", 2).with("mean", "0.1");
        let other = Row::new().with("indicator", 3).with("mean", 0.1);
        let not_numeric = Row::new().with("indicator", 2).with("mean", "n/a");

        assert!(is_admitted(&text_discriminator, &indicator, &filters, &none));
        assert!(is_admitted(&number_discriminator, &indicator, &filters, &none));
        assert!(!is_admitted(&other, &indicator, &filters, &none));
        assert!(!is_admitted(&not_numeric, &indicator, &filters, &none));
    }

    #[test]
    fn test_chart_data_for_selections() {
        let selections = Selections {
            indicator_id: "art_cov".to_string(),
            x_axis_id: "region".to_string(),
            disaggregate_by_id: "age".to_string(),
            selected_filter_options: selected(&[
                ("region", &[("1", "Northern")]),
                ("age", &[("0:4", "0-4")]),
                ("sex", &[("female", "female")]),
            ]),
        };
        let result = chart_data_for_selections(
            &rows(),
            &filters(),
            &[art_coverage(), prevalence()],
            &selections,
            &Palette::default(),
        )
        .unwrap();

        assert_eq!(
            result,
            ChartReadyData {
                labels: vec!["Northern".to_string()],
                datasets: vec![Dataset {
                    label: "0-4".to_string(),
                    background_color: "#e41a1c".to_string(),
                    data: vec![0.40],
                    error_bars: error_bars(&[("Northern", 0.43, 0.38)]),
                }],
                max_value_plus_error: 0.43,
            }
        );
    }

    #[test]
    fn test_chart_data_for_selections_errors() {
        let uninitialised = chart_data_for_selections(
            &rows(),
            &filters(),
            &[art_coverage()],
            &Selections::default(),
            &Palette::default(),
        );
        assert_eq!(uninitialised, Err(ChartError::Uninitialised));

        let selections = Selections {
            indicator_id: "missing".to_string(),
            x_axis_id: "region".to_string(),
            disaggregate_by_id: "age".to_string(),
            selected_filter_options: reference_selection(),
        };
        let unknown = chart_data_for_selections(
            &rows(),
            &filters(),
            &[art_coverage()],
            &selections,
            &Palette::default(),
        );
        assert_eq!(unknown, Err(ChartError::UnknownIndicator("missing".to_string())));
    }
}
