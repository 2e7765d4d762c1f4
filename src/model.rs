// Value types shared by the lookup builder, the aggregator and the session

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A single cell of an observational row.
///
/// Rows come from JSON or CSV, so a cell may hold text where a number is
/// expected (and the other way round). Comparisons between cells and option
/// ids always go through [`Scalar::normalized`], which coerces both sides to
/// their string form: `2`, `2.0` and `"2"` are the same discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// String form used for every equality check. `None` for null cells.
    pub fn normalized(&self) -> Option<Cow<'_, str>> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(b) => Some(Cow::Owned(b.to_string())),
            Scalar::Number(n) => Some(Cow::Owned(n.to_string())),
            Scalar::Text(s) => Some(Cow::Borrowed(s.as_str())),
        }
    }

    /// Numeric reading of the cell. Text is parsed, blank text is null.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
            Scalar::Null | Scalar::Bool(_) => None,
        }
    }

    /// Loose equality against an option id.
    pub fn matches(&self, id: &str) -> bool {
        self.normalized().is_some_and(|v| v == id)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Number(f64::from(value))
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

/// One observational record, keyed by column name. Never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(IndexMap<String, Scalar>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for fixtures.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.0.get(column)
    }

    /// Numeric value of a column; missing, null and unparseable cells are `None`.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Scalar::as_f64)
    }

    /// Loose equality of a column against an id. Missing columns never match.
    pub fn matches(&self, column: &str, id: &str) -> bool {
        self.get(column).is_some_and(|v| v.matches(id))
    }
}

impl<K: Into<String>> FromIterator<(K, Scalar)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Scalar)>>(iter: I) -> Self {
        Row(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// One selectable value of a filter dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub id: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A filterable dimension and the row column it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub id: String,
    pub label: String,
    pub column_id: String,
    #[serde(default)]
    pub options: Vec<FilterOption>,
}

impl Filter {
    pub fn option(&self, id: &str) -> Option<&FilterOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

/// Which rows belong to an indicator and which columns hold its value and bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub indicator: String,
    pub value_column: String,
    pub indicator_column: String,
    pub indicator_value: String,
    pub name: String,
    pub error_low_column: String,
    pub error_high_column: String,
    /// Display pattern such as `0.00` or `0.0%`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// Current state of the control panel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Selections {
    pub indicator_id: String,
    pub x_axis_id: String,
    pub disaggregate_by_id: String,
    pub selected_filter_options: IndexMap<String, Vec<FilterOption>>,
}

impl Selections {
    /// All four fields are non-empty. The pipeline must not run otherwise.
    pub fn is_initialised(&self) -> bool {
        !self.indicator_id.is_empty()
            && !self.x_axis_id.is_empty()
            && !self.disaggregate_by_id.is_empty()
            && !self.selected_filter_options.is_empty()
    }
}

/// Lower and upper bound drawn around a bar. Bounds are absolute values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorBar {
    pub plus: Option<f64>,
    pub minus: Option<f64>,
}

/// One chart series: all bars of one disaggregation value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub background_color: String,
    pub data: Vec<f64>,
    pub error_bars: IndexMap<String, ErrorBar>,
}

/// Output of the aggregator, handed to the renderer as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartReadyData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub max_value_plus_error: f64,
}

impl ChartReadyData {
    /// True when no dataset received a single cell.
    pub fn is_empty(&self) -> bool {
        self.datasets.iter().all(|d| d.data.is_empty())
    }
}
