// Reference dataset shared by the unit tests

use crate::model::{Filter, FilterOption, Indicator, Row, Scalar};

fn row(area: i64, age: &str, sex: &str, indicator: i64, mean: f64, high: f64, low: f64) -> Row {
    Row::new()
        .with("area_id", area)
        .with("age_group", age)
        .with("sex", sex)
        .with("indicator", indicator)
        .with("mean", mean)
        .with("high", high)
        .with("low", low)
}

pub(crate) fn rows() -> Vec<Row> {
    vec![
        row(1, "0:4", "female", 2, 0.40, 0.43, 0.38),
        row(1, "5:9", "female", 2, 0.20, 0.24, 0.16),
        row(1, "0:4", "male", 2, 0.35, 0.40, 0.34),
        row(1, "5:9", "male", 2, 0.25, 0.28, 0.21),
        row(1, "0:4", "female", 3, 0.20, 0.22, 0.18),
        row(1, "5:9", "female", 3, 0.10, 0.14, 0.06),
        row(1, "0:4", "male", 3, 0.25, 0.30, 0.21),
        row(1, "5:9", "male", 3, 0.15, 0.2, 0.13),
        row(2, "0:4", "female", 2, 0.50, 0.53, 0.48),
        row(2, "5:9", "female", 2, 0.25, 0.29, 0.21),
    ]
}

pub(crate) fn filters() -> Vec<Filter> {
    vec![
        Filter {
            id: "region".to_string(),
            label: "Region".to_string(),
            column_id: "area_id".to_string(),
            options: vec![FilterOption::new("1", "Northern"), FilterOption::new("2", "Central")],
        },
        Filter {
            id: "age".to_string(),
            label: "Age group".to_string(),
            column_id: "age_group".to_string(),
            options: vec![FilterOption::new("0:4", "0-4"), FilterOption::new("5:9", "5-9")],
        },
        Filter {
            id: "sex".to_string(),
            label: "Sex".to_string(),
            column_id: "sex".to_string(),
            options: vec![
                FilterOption::new("female", "female"),
                FilterOption::new("both", "both"),
                FilterOption::new("male", "male"),
            ],
        },
    ]
}

pub(crate) fn art_coverage() -> Indicator {
    Indicator {
        indicator: "art_cov".to_string(),
        value_column: "mean".to_string(),
        indicator_column: "indicator".to_string(),
        indicator_value: "2".to_string(),
        name: "ART coverage".to_string(),
        error_low_column: "low".to_string(),
        error_high_column: "high".to_string(),
        format: Some("0.00".to_string()),
        scale: Some(1.0),
        accuracy: None,
    }
}

pub(crate) fn prevalence() -> Indicator {
    Indicator {
        indicator: "prevalence".to_string(),
        indicator_value: "3".to_string(),
        name: "Prevalence".to_string(),
        format: None,
        scale: None,
        ..art_coverage()
    }
}

/// Row with an explicit null value column
pub(crate) fn null_value_row() -> Row {
    Row::new()
        .with("area_id", 1)
        .with("age_group", "5:9")
        .with("sex", "female")
        .with("indicator", 2)
        .with("mean", Scalar::Null)
        .with("high", 0.24)
        .with("low", 0.16)
}
