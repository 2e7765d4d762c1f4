use crate::model::Dataset;

/// What the renderer knows about the hovered bar. Any part may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TooltipItem {
    pub dataset_index: Option<usize>,
    pub x_label: Option<String>,
    pub y_label: Option<f64>,
}

/// Tooltip text for a bar: `"<dataset>: <value>"`, plus `" (<minus> - <plus>)"` when
/// error ranges are shown and both bounds for the x label are numeric.
///
/// Never fails: a missing dataset index, dataset list or value just shortens the text.
pub fn tooltip_label<F>(
    item: &TooltipItem,
    datasets: Option<&[Dataset]>,
    format: F,
    show_error_range: bool,
) -> String
where
    F: Fn(f64) -> String,
{
    let dataset = item
        .dataset_index
        .zip(datasets)
        .and_then(|(index, datasets)| datasets.get(index));

    let mut label = dataset.map(|d| d.label.clone()).unwrap_or_default();
    if !label.is_empty() {
        label.push_str(": ");
    }

    let Some(value) = item.y_label else {
        return label;
    };
    label.push_str(&format(value));

    if show_error_range {
        let bounds = dataset
            .zip(item.x_label.as_deref())
            .and_then(|(d, x)| d.error_bars.get(x));
        if let Some((minus, plus)) = bounds.and_then(|b| b.minus.zip(b.plus)) {
            label.push_str(&format!(" ({} - {})", format(minus), format(plus)));
        }
    }

    label
}
