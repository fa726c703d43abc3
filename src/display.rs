//! Presentation-time rounding. Summaries keep full precision; these helpers
//! are only applied when a value is turned into text.

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10_f64.powi(places as i32);
    (value * scale).round() / scale
}

pub fn one_decimal(value: f64) -> String {
    format!("{:.1}", round_to(value, 1))
}

pub fn two_decimals(value: f64) -> String {
    format!("{:.2}", round_to(value, 2))
}

pub fn whole(value: f64) -> String {
    format!("{}", value.round() as i64)
}

pub fn opt_one_decimal(value: Option<f64>) -> String {
    value.map(one_decimal).unwrap_or_else(|| "-".to_string())
}

pub fn opt_whole(value: Option<f64>) -> String {
    value.map(whole).unwrap_or_else(|| "-".to_string())
}
