//! Unicode sparkline of recent closes.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Trailing days rendered in the summary sparkline.
pub const SPARKLINE_LENGTH: usize = 30;

/// Render the trailing `length` values as a bar sparkline.
///
/// A flat window renders as full bars; an empty series as an empty string.
pub fn build_sparkline(values: &[Decimal], length: usize) -> String {
    if values.is_empty() {
        return String::new();
    }
    let window = &values[values.len().saturating_sub(length)..];
    if window.len() == 1 {
        return BARS[0].to_string();
    }

    let minimum = window.iter().min().copied().unwrap_or_default();
    let maximum = window.iter().max().copied().unwrap_or_default();
    if minimum == maximum {
        return BARS[BARS.len() - 1].to_string().repeat(window.len());
    }

    let span = (maximum - minimum)
        .to_f64()
        .unwrap_or(f64::INFINITY);
    let scale = (BARS.len() - 1) as f64 / span;
    window
        .iter()
        .map(|value| {
            let offset = (*value - minimum).to_f64().unwrap_or(0.0);
            let idx = ((offset * scale) as usize).min(BARS.len() - 1);
            BARS[idx]
        })
        .collect()
}
