//! ICMS differential aggregation.
//!
//! For every client, every invoice and every distinct ICMS rate on that
//! invoice, the collected tax is compared with what the same operation would
//! owe at the MG internal rate:
//!
//! ```text
//! recomputed_base = (Σ vBC - Σ vICMS) / 0.82
//! recomputed_tax  = recomputed_base * 0.18
//! differential    = recomputed_tax - Σ vICMS
//! ```
//!
//! All arithmetic is exact, checked [`Decimal`]; a figure that leaves the
//! decimal range is reported as [`DifalError::Overflow`]. Rounding to cents
//! happens only when a figure is rendered (see
//! [`format_amount`](super::format_amount)) or turned into an obligation
//! amount.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::due_date::due_date;
use super::error::DifalError;
use super::{serialize_amount, serialize_br_date};
use super::rules::{DESTINATION_RATE, GROSS_UP_FACTOR};
use super::types::{ClientKey, InvoiceRecord, ObligationDraft};

/// Sums of all items sharing one rate on one invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateGroup {
    pub rate: Decimal,
    pub total_base: Decimal,
    pub total_tax: Decimal,
}

impl RateGroup {
    fn new(rate: Decimal) -> Self {
        Self {
            rate,
            total_base: Decimal::ZERO,
            total_tax: Decimal::ZERO,
        }
    }

    /// Base grossed up to the MG internal rate.
    pub fn recomputed_base(&self) -> Result<Decimal, DifalError> {
        self.total_base
            .checked_sub(self.total_tax)
            .and_then(|net| net.checked_div(GROSS_UP_FACTOR))
            .ok_or_else(|| self.overflow())
    }

    /// Apply the recomputation formula.
    pub fn evaluate(&self) -> Result<DifferentialResult, DifalError> {
        let recomputed_tax = self
            .recomputed_base()?
            .checked_mul(DESTINATION_RATE)
            .ok_or_else(|| self.overflow())?;
        let differential = recomputed_tax
            .checked_sub(self.total_tax)
            .ok_or_else(|| self.overflow())?;
        Ok(DifferentialResult {
            rate: self.rate,
            total_base: self.total_base,
            total_tax: self.total_tax,
            recomputed_tax,
            differential,
        })
    }

    fn overflow(&self) -> DifalError {
        DifalError::Overflow(format!("differential at rate {}", self.rate))
    }
}

/// Outcome of the recomputation for one rate group.
///
/// Values are exact; serialization renders them with two decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DifferentialResult {
    #[serde(serialize_with = "serialize_amount")]
    pub rate: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    pub total_base: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    pub total_tax: Decimal,
    /// Tax owed at the MG internal rate.
    #[serde(serialize_with = "serialize_amount")]
    pub recomputed_tax: Decimal,
    /// `recomputed_tax - total_tax`; may be negative.
    #[serde(serialize_with = "serialize_amount")]
    pub differential: Decimal,
}

/// Per-invoice section of a client report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceSummary {
    pub number: String,
    /// Raw `dhEmi` as found in the document.
    pub emitted_at: String,
    #[serde(serialize_with = "serialize_br_date")]
    pub due_date: NaiveDate,
    /// One entry per distinct rate, ascending by rate.
    pub results: Vec<DifferentialResult>,
    #[serde(serialize_with = "serialize_amount")]
    pub total_differential: Decimal,
}

/// All invoices of one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientReport {
    pub tax_id: String,
    pub name: String,
    pub invoices: Vec<InvoiceSummary>,
    #[serde(serialize_with = "serialize_amount")]
    pub total_differential: Decimal,
}

/// Result of [`aggregate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// One report per client that had at least one invoice with items.
    pub reports: BTreeMap<ClientKey, ClientReport>,
    /// Sum of every rate group's differential.
    pub grand_total: Decimal,
    /// One draft per summarized invoice, in report order.
    pub obligations: Vec<ObligationDraft>,
}

/// Group an invoice's items by rate, summing base and tax.
///
/// Rates are compared by value.
pub fn group_by_rate(invoice: &InvoiceRecord) -> Result<Vec<RateGroup>, DifalError> {
    let label = format!("rate groups of invoice {}", invoice.number);
    let mut groups: BTreeMap<Decimal, RateGroup> = BTreeMap::new();
    for item in &invoice.items {
        let group = groups
            .entry(item.tax_rate)
            .or_insert_with(|| RateGroup::new(item.tax_rate));
        group.total_base = checked_sum(group.total_base, item.tax_base, &label)?;
        group.total_tax = checked_sum(group.total_tax, item.tax_amount, &label)?;
    }
    Ok(groups.into_values().collect())
}

fn checked_sum(acc: Decimal, value: Decimal, what: &str) -> Result<Decimal, DifalError> {
    acc.checked_add(value)
        .ok_or_else(|| DifalError::Overflow(what.to_string()))
}

/// Summarize one invoice. Returns `Ok(None)` for an invoice without items.
pub fn summarize_invoice(invoice: &InvoiceRecord) -> Result<Option<InvoiceSummary>, DifalError> {
    if invoice.items.is_empty() {
        return Ok(None);
    }

    let results = group_by_rate(invoice)?
        .iter()
        .map(RateGroup::evaluate)
        .collect::<Result<Vec<_>, _>>()?;
    let label = format!("invoice {}", invoice.number);
    let total_differential = results
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| checked_sum(acc, r.differential, &label))?;

    Ok(Some(InvoiceSummary {
        number: invoice.number.clone(),
        emitted_at: invoice.emitted_at.clone(),
        due_date: due_date(invoice.emission_date),
        results,
        total_differential,
    }))
}

/// Description stored on the obligation generated for an invoice.
pub fn obligation_description(invoice_number: &str) -> String {
    format!("ICMS-MG differential - Invoice {invoice_number}")
}

/// Compute per-client reports, the grand total and obligation drafts.
///
/// Invoices without items contribute nothing. Every rate group's
/// differential (including negative ones) is added to its invoice, client
/// and grand total.
///
/// # Errors
///
/// [`DifalError::Overflow`] when any sum or quotient leaves the decimal range.
pub fn aggregate(
    groups: &BTreeMap<ClientKey, Vec<InvoiceRecord>>,
) -> Result<Aggregation, DifalError> {
    let mut out = Aggregation::default();

    for (key, invoices) in groups {
        let mut report = ClientReport {
            tax_id: key.tax_id.clone(),
            name: key.name.clone(),
            invoices: Vec::new(),
            total_differential: Decimal::ZERO,
        };

        for invoice in invoices {
            let Some(summary) = summarize_invoice(invoice)? else {
                continue;
            };

            report.total_differential = checked_sum(
                report.total_differential,
                summary.total_differential,
                &format!("total of client {key}"),
            )?;
            out.grand_total =
                checked_sum(out.grand_total, summary.total_differential, "grand total")?;
            out.obligations.push(ObligationDraft {
                tax_id: key.tax_id.clone(),
                invoice_number: summary.number.clone(),
                description: obligation_description(&summary.number),
                due_date: summary.due_date,
                amount: summary.total_differential.round_dp(2),
            });
            report.invoices.push(summary);
        }

        tracing::debug!(
            client = %key,
            invoices = report.invoices.len(),
            total = %report.total_differential,
            "client aggregated"
        );
        if !report.invoices.is_empty() {
            out.reports.insert(key.clone(), report);
        }
    }

    Ok(out)
}
