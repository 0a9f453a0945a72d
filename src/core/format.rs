use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serializer;

/// Format a monetary figure or rate with exactly two decimal places.
///
/// Rounds half to even, like every other amount in this crate.
pub fn format_amount(d: Decimal) -> String {
    let scaled = d.round_dp(2);
    format!("{:.2}", scaled)
}

/// Format a rate for alert messages: normalized, with at least one
/// fractional digit ("18.0", "7.5", "4.0").
pub fn format_rate(rate: Decimal) -> String {
    let n = rate.normalize();
    if n.scale() == 0 {
        format!("{n}.0")
    } else {
        n.to_string()
    }
}

/// Serde adapter: write a decimal as a two-decimal string.
pub(crate) fn serialize_amount<S: Serializer>(d: &Decimal, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_amount(*d))
}

/// Serde adapter: write a date as `DD/MM/YYYY`.
pub(crate) fn serialize_br_date<S: Serializer>(d: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&super::due_date::format_due_date(*d))
}
