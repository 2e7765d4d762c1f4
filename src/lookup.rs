// Axis labels and id -> label lookups derived from the current selections

use crate::model::{Filter, FilterOption};
use indexmap::IndexMap;

/// Ordered id -> label map. Iteration order is insertion order.
pub type LabelLookup = IndexMap<String, String>;

/// Convert any option list to an id -> label map. Duplicate ids keep the last label.
pub fn to_filter_label_lookup(options: &[FilterOption]) -> LabelLookup {
    let mut lookup = LabelLookup::with_capacity(options.len());
    for option in options {
        lookup.insert(option.id.clone(), option.label.clone());
    }
    lookup
}

/// Derives axis labels and lookups from the filter catalog and the selected options.
///
/// Everything is read in selection order, not catalog order. Unknown filter ids
/// give empty results.
#[derive(Debug, Clone, Copy)]
pub struct LabelBuilder<'a> {
    filters: &'a [Filter],
    selected: &'a IndexMap<String, Vec<FilterOption>>,
}

impl<'a> LabelBuilder<'a> {
    pub fn new(filters: &'a [Filter], selected: &'a IndexMap<String, Vec<FilterOption>>) -> Self {
        Self { filters, selected }
    }

    fn selected_options(&self, filter_id: &str) -> &'a [FilterOption] {
        self.selected
            .get(filter_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn axis_labels(&self, filter_id: &str) -> Vec<String> {
        self.selected_options(filter_id)
            .iter()
            .map(|o| o.label.clone())
            .collect()
    }

    pub fn axis_values(&self, filter_id: &str) -> Vec<String> {
        self.selected_options(filter_id)
            .iter()
            .map(|o| o.id.clone())
            .collect()
    }

    pub fn label_lookup(&self, filter_id: &str) -> LabelLookup {
        to_filter_label_lookup(self.selected_options(filter_id))
    }

    /// The whole catalog as `{id, label}` pairs, for a "which dimension" selector.
    pub fn filters_as_options(&self) -> Vec<FilterOption> {
        self.filters
            .iter()
            .map(|f| FilterOption::new(f.id.clone(), f.label.clone()))
            .collect()
    }

    /// Catalog label of a filter, used for the axis titles.
    pub fn filter_label(&self, filter_id: &str) -> Option<&'a str> {
        self.filters
            .iter()
            .find(|f| f.id == filter_id)
            .map(|f| f.label.as_str())
    }
}
