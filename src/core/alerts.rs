//! Human-readable warnings collected while processing a batch.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::format::format_rate;
use super::rules::ACCEPTED_RATES;

/// A single warning surfaced next to the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alert {
    pub message: String,
}

impl Alert {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// An item's ICMS rate is neither of the accepted inter-state rates.
    pub fn rate_policy(invoice_number: &str, rate: Decimal) -> Self {
        let accepted: Vec<String> = ACCEPTED_RATES
            .iter()
            .map(|r| format!("{}%", r.normalize()))
            .collect();
        Self::new(format!(
            "Invoice {invoice_number}: rate {}% differs from {}.",
            format_rate(rate),
            accepted.join(" or ")
        ))
    }

    /// A document could not be processed; `error` is the raw failure text.
    pub fn document_failure(document: &str, error: impl std::fmt::Display) -> Self {
        Self::new(format!("Error processing {document}: {error}"))
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Append-only alert accumulator for one batch run.
///
/// Alerts keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertLog {
    alerts: Vec<Alert>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one alert.
    pub fn push(&mut self, alert: Alert) {
        tracing::warn!(alert = %alert, "alert raised");
        self.alerts.push(alert);
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    /// Alert messages as plain strings, in insertion order.
    pub fn messages(&self) -> Vec<String> {
        self.alerts.iter().map(|a| a.message.clone()).collect()
    }

    pub fn into_vec(self) -> Vec<Alert> {
        self.alerts
    }
}

impl Extend<Alert> for AlertLog {
    fn extend<T: IntoIterator<Item = Alert>>(&mut self, iter: T) {
        for alert in iter {
            self.push(alert);
        }
    }
}
