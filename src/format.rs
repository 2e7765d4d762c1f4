use crate::model::Indicator;

/// Format a value for display according to the indicator's scale, accuracy and format.
///
/// The value is multiplied by `scale`, rounded to the nearest multiple of
/// `accuracy`, then rendered with `format`: the number of digits after the `.`
/// gives the decimal places and a trailing `%` renders a percentage.
pub fn format_indicator_value(value: f64, indicator: &Indicator) -> String {
    let scaled = value * indicator.scale.unwrap_or(1.0);
    let rounded = match indicator.accuracy {
        Some(accuracy) if accuracy > 0.0 => (scaled / accuracy).round() * accuracy,
        _ => scaled,
    };

    match indicator.format.as_deref() {
        Some(pattern) if !pattern.trim().is_empty() => apply_pattern(rounded, pattern.trim()),
        _ => rounded.to_string(),
    }
}

fn apply_pattern(value: f64, pattern: &str) -> String {
    let (number_pattern, percent) = match pattern.strip_suffix('%') {
        Some(rest) => (rest, true),
        None => (pattern, false),
    };

    let decimals = number_pattern
        .split_once('.')
        .map_or(0, |(_, fraction)| {
            fraction.chars().filter(|c| matches!(c, '0' | '#')).count()
        });

    if percent {
        format!("{:.*}%", decimals, value * 100.0)
    } else {
        format!("{:.*}", decimals, value)
    }
}

/// Bind the formatter to one indicator, giving the `value -> text` function the renderer expects
pub fn value_formatter<'a, F>(format: &'a F, indicator: &'a Indicator) -> impl Fn(f64) -> String + 'a
where
    F: Fn(f64, &Indicator) -> String + ?Sized,
{
    move |value| format(value, indicator)
}
