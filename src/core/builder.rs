use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::due_date::emission_date;
use super::error::DifalError;
use super::rules::{EXCLUDED_STATE, is_accepted_cfop};
use super::types::{InvoiceRecord, LineItem};

/// Builder for [`InvoiceRecord`], for callers that already hold invoice data
/// outside of XML (fixtures, imports from other systems).
///
/// Items with a CFOP outside the accepted set are dropped, matching what
/// the NF-e parser does.
///
/// # Example
///
/// ```
/// use difal::core::*;
/// use rust_decimal_macros::dec;
///
/// let record = InvoiceRecordBuilder::new("1001", "2024-01-05T09:00:00-03:00")
///     .destination("11222333000181", "Cliente Ltda")
///     .origin_state("SP")
///     .add_item(LineItem::new("1", "6102", dec!(1000), dec!(120), dec!(12)))
///     .add_item(LineItem::new("2", "5102", dec!(50), dec!(9), dec!(18)))
///     .build()
///     .unwrap();
///
/// assert_eq!(record.items.len(), 1);
/// ```
pub struct InvoiceRecordBuilder {
    number: String,
    emitted_at: String,
    destination_tax_id: Option<String>,
    destination_name: Option<String>,
    origin_state: Option<String>,
    items: Vec<LineItem>,
}

impl InvoiceRecordBuilder {
    /// Start a record with invoice number and raw `dhEmi` timestamp.
    pub fn new(number: impl Into<String>, emitted_at: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            emitted_at: emitted_at.into(),
            destination_tax_id: None,
            destination_name: None,
            origin_state: None,
            items: Vec::new(),
        }
    }

    /// Set destination CNPJ and name.
    pub fn destination(mut self, tax_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.destination_tax_id = Some(tax_id.into());
        self.destination_name = Some(name.into());
        self
    }

    /// Set the emitter's state code (UF).
    pub fn origin_state(mut self, uf: impl Into<String>) -> Self {
        self.origin_state = Some(uf.into());
        self
    }

    /// Add an item. Ignored unless its CFOP is accepted.
    pub fn add_item(mut self, item: LineItem) -> Self {
        if is_accepted_cfop(&item.cfop) {
            self.items.push(item);
        }
        self
    }

    /// Shorthand for a CFOP 6102 item.
    pub fn item(self, index: &str, base: Decimal, tax: Decimal, rate: Decimal) -> Self {
        self.add_item(LineItem::new(index, "6102", base, tax, rate))
    }

    /// Validate and build.
    ///
    /// An origin in the destination state is rejected with
    /// [`DifalError::ExcludedOrigin`]: such invoices owe no differential.
    pub fn build(self) -> Result<InvoiceRecord, DifalError> {
        if self.number.is_empty() {
            return Err(DifalError::Field("nNF".into()));
        }
        if self.origin_state.as_deref() == Some(EXCLUDED_STATE) {
            return Err(DifalError::ExcludedOrigin(self.number));
        }
        let emission_date: NaiveDate = emission_date(&self.emitted_at)?;
        Ok(InvoiceRecord {
            number: self.number,
            emitted_at: self.emitted_at,
            emission_date,
            destination_tax_id: self
                .destination_tax_id
                .ok_or_else(|| DifalError::Field("dest/CNPJ".into()))?,
            destination_name: self
                .destination_name
                .ok_or_else(|| DifalError::Field("dest/xNome".into()))?,
            origin_state: self
                .origin_state
                .ok_or_else(|| DifalError::Field("emit/enderEmit/UF".into()))?,
            items: self.items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn builds_with_all_fields() {
        let rec = InvoiceRecordBuilder::new("42", "2024-02-10T12:00:00-03:00")
            .destination("11222333000181", "ACME")
            .origin_state("PR")
            .item("1", dec!(10), dec!(1.2), dec!(12))
            .build()
            .unwrap();
        assert_eq!(rec.emission_date, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert_eq!(rec.items.len(), 1);
        assert_eq!(rec.client_key().tax_id, "11222333000181");
    }

    #[test]
    fn missing_destination_rejected() {
        let err = InvoiceRecordBuilder::new("42", "2024-02-10")
            .origin_state("PR")
            .build()
            .unwrap_err();
        assert!(matches!(err, DifalError::Field(ref f) if f == "dest/CNPJ"));
    }

    #[test]
    fn bad_timestamp_rejected() {
        let err = InvoiceRecordBuilder::new("42", "10/02/2024")
            .destination("1", "A")
            .origin_state("PR")
            .build()
            .unwrap_err();
        assert!(matches!(err, DifalError::Date(_)));
    }

    #[test]
    fn destination_state_origin_rejected() {
        let err = InvoiceRecordBuilder::new("42", "2024-02-10T12:00:00-03:00")
            .destination("11222333000181", "ACME")
            .origin_state("MG")
            .item("1", dec!(1000), dec!(120), dec!(12))
            .build()
            .unwrap_err();
        assert!(matches!(err, DifalError::ExcludedOrigin(ref n) if n == "42"));
        assert_eq!(
            err.to_string(),
            "invoice 42 was emitted in the destination state"
        );
    }
}
