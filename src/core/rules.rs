//! Fixed parameters of the MG inter-state differential scenario.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Destination state. Invoices emitted from here never owe a differential.
pub const EXCLUDED_STATE: &str = "MG";

/// CFOP 6101/6102: inter-state sale of own production / of goods acquired
/// from third parties.
pub const ACCEPTED_CFOPS: [&str; 2] = ["6101", "6102"];

/// Inter-state ICMS rates expected on accepted items (percent).
pub const ACCEPTED_RATES: [Decimal; 2] = [dec!(4), dec!(12)];

/// Internal MG rate applied to the recomputed base.
pub const DESTINATION_RATE: Decimal = dec!(0.18);

/// `1 - DESTINATION_RATE`: grosses the net value up to an 18% inclusive base.
pub const GROSS_UP_FACTOR: Decimal = dec!(0.82);

/// True if the CFOP takes part in the differential.
pub fn is_accepted_cfop(cfop: &str) -> bool {
    ACCEPTED_CFOPS.contains(&cfop)
}

/// True if the rate is one of the accepted inter-state rates.
///
/// Compares by value, so `12.00` is accepted.
pub fn is_accepted_rate(rate: Decimal) -> bool {
    ACCEPTED_RATES.contains(&rate)
}
