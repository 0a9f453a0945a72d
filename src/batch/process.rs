use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

use super::config::BatchConfig;
use super::store::{RecordStore, ensure_client};
use crate::core::*;
use crate::nfe::{ParseOutcome, ParsedInvoice, parse_nfe};

/// One uploaded document: its file name and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Successful batch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Per-client reports, serialized as a list.
    #[serde(serialize_with = "serialize_results")]
    pub results: BTreeMap<ClientKey, ClientReport>,
    #[serde(serialize_with = "serialize_amount")]
    pub grand_total: Decimal,
    pub alerts: Vec<Alert>,
    /// Obligations persisted during this run.
    #[serde(skip)]
    pub obligations: Vec<Obligation>,
}

impl BatchReport {
    /// Render the report as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn serialize_results<S: Serializer>(
    results: &BTreeMap<ClientKey, ClientReport>,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.collect_seq(results.values())
}

/// Why a batch produced no report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BatchError {
    /// No document had an invoice with an accepted-CFOP item.
    #[error("no item with CFOP 6101 or 6102 found")]
    NoQualifyingItems,

    /// A differential or total could not be computed.
    #[error("failed to aggregate differentials: {0}")]
    Aggregation(#[from] DifalError),

    /// Persisting an obligation failed.
    #[error("failed to store obligation: {0}")]
    Store(#[from] StoreError),
}

/// Failed batch: the error plus every alert collected before it.
#[derive(Debug, Error, Serialize)]
#[error("{error}")]
pub struct BatchFailure {
    #[source]
    #[serde(serialize_with = "serialize_display")]
    pub error: BatchError,
    pub alerts: Vec<Alert>,
}

impl BatchFailure {
    /// Render as `{"error": ..., "alerts": [...]}`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn serialize_display<S: Serializer>(e: &BatchError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(e)
}

/// Run the whole pipeline over a batch of uploaded documents.
///
/// 1. Documents not matching `config.document_suffix` are ignored.
/// 2. Each remaining document is parsed on its own. Malformed and
///    MG-emitted documents are skipped silently; a store failure while
///    registering the destination client becomes an alert.
/// 3. Invoices with at least one accepted item are grouped by client.
/// 4. If nothing qualifies the batch fails with
///    [`BatchError::NoQualifyingItems`], keeping the alerts.
/// 5. Differentials are aggregated and, when enabled, one obligation is
///    stored per summarized invoice whose client exists. An arithmetic
///    overflow fails the batch with [`BatchError::Aggregation`], keeping
///    the alerts.
pub fn process_batch<S: RecordStore + ?Sized>(
    store: &mut S,
    documents: &[Document],
    config: &BatchConfig,
) -> Result<BatchReport, BatchFailure> {
    let mut alerts = AlertLog::new();
    let mut groups: BTreeMap<ClientKey, Vec<InvoiceRecord>> = BTreeMap::new();

    for doc in documents {
        if !config.accepts(&doc.name) {
            tracing::debug!(document = %doc.name, "ignored: not an NF-e file");
            continue;
        }

        match process_document(store, doc) {
            Ok(Some(parsed)) => {
                alerts.extend(parsed.alerts);
                if !parsed.record.items.is_empty() {
                    groups
                        .entry(parsed.record.client_key())
                        .or_default()
                        .push(parsed.record);
                }
            }
            Ok(None) => {}
            Err(e) => alerts.push(Alert::document_failure(&doc.name, &e)),
        }
    }

    if groups.is_empty() {
        tracing::info!(alerts = alerts.len(), "batch has no qualifying items");
        return Err(BatchFailure {
            error: BatchError::NoQualifyingItems,
            alerts: alerts.into_vec(),
        });
    }

    let aggregation = match aggregate(&groups) {
        Ok(aggregation) => aggregation,
        Err(e) => {
            tracing::warn!(error = %e, "aggregation failed");
            return Err(BatchFailure {
                error: BatchError::Aggregation(e),
                alerts: alerts.into_vec(),
            });
        }
    };

    let mut obligations = Vec::new();
    if config.create_obligations {
        for draft in &aggregation.obligations {
            match store_obligation(store, draft) {
                Ok(Some(o)) => obligations.push(o),
                Ok(None) => {}
                Err(e) => {
                    return Err(BatchFailure {
                        error: BatchError::Store(e),
                        alerts: alerts.into_vec(),
                    });
                }
            }
        }
    }

    tracing::info!(
        clients = aggregation.reports.len(),
        grand_total = %format_amount(aggregation.grand_total),
        obligations = obligations.len(),
        alerts = alerts.len(),
        "batch processed"
    );

    Ok(BatchReport {
        results: aggregation.reports,
        grand_total: aggregation.grand_total,
        alerts: alerts.into_vec(),
        obligations,
    })
}

/// Parse one document and register its destination client.
///
/// `Ok(None)` means the document was skipped (malformed or MG-emitted).
fn process_document<S: RecordStore + ?Sized>(
    store: &mut S,
    doc: &Document,
) -> Result<Option<ParsedInvoice>, DifalError> {
    match parse_nfe(&doc.bytes) {
        ParseOutcome::Parsed(parsed) => {
            ensure_client(store, &parsed.client)?;
            tracing::debug!(
                document = %doc.name,
                invoice = %parsed.record.number,
                items = parsed.record.items.len(),
                "document parsed"
            );
            Ok(Some(parsed))
        }
        ParseOutcome::Excluded { number } => {
            tracing::debug!(document = %doc.name, invoice = %number, "skipped: emitted in MG");
            Ok(None)
        }
        // Unreadable documents are dropped without an alert.
        ParseOutcome::Malformed(e) => {
            tracing::debug!(document = %doc.name, error = %e, "skipped: malformed");
            Ok(None)
        }
    }
}

/// Persist a draft if its client is registered; `Ok(None)` otherwise.
fn store_obligation<S: RecordStore + ?Sized>(
    store: &mut S,
    draft: &ObligationDraft,
) -> Result<Option<Obligation>, StoreError> {
    let Some(client) = store.find_client_by_cnpj(&draft.tax_id)? else {
        tracing::debug!(cnpj = %draft.tax_id, invoice = %draft.invoice_number, "no client; obligation skipped");
        return Ok(None);
    };
    let created = store.create_obligation(NewObligation::from_draft(client.id, draft))?;
    Ok(Some(created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::MemoryStore;

    fn nfe(number: &str, uf: &str, cnpj: &str, rate: &str) -> Vec<u8> {
        format!(
            r#"<NFe xmlns="http://www.portalfiscal.inf.br/nfe"><infNFe>
<ide><nNF>{number}</nNF><dhEmi>2024-01-05T10:00:00-03:00</dhEmi></ide>
<emit><enderEmit><UF>{uf}</UF></enderEmit></emit>
<dest><CNPJ>{cnpj}</CNPJ><xNome>Cliente {cnpj}</xNome></dest>
<det nItem="1"><prod><CFOP>6102</CFOP></prod><imposto><ICMS><ICMS00>
<vBC>1000.00</vBC><pICMS>{rate}</pICMS><vICMS>120.00</vICMS></ICMS00></ICMS></imposto></det>
</infNFe></NFe>"#
        )
        .into_bytes()
    }

    #[test]
    fn failure_keeps_alerts() {
        let mut store = MemoryStore::new();
        let docs = vec![
            Document::new("a.xml", nfe("1", "MG", "1", "12")),
            Document::new("b.xml", b"not xml".to_vec()),
        ];
        let err = process_batch(&mut store, &docs, &BatchConfig::default()).unwrap_err();
        assert!(matches!(err.error, BatchError::NoQualifyingItems));
        assert!(err.alerts.is_empty());
        assert_eq!(
            err.to_json().unwrap(),
            r#"{"error":"no item with CFOP 6101 or 6102 found","alerts":[]}"#
        );
    }

    #[test]
    fn obligations_can_be_disabled() {
        let mut store = MemoryStore::new();
        let docs = vec![Document::new("a.xml", nfe("1", "SP", "1", "12"))];
        let config = crate::batch::BatchConfigBuilder::new()
            .create_obligations(false)
            .build();
        let report = process_batch(&mut store, &docs, &config).unwrap();
        assert!(report.obligations.is_empty());
        assert!(store.list_obligations().unwrap().is_empty());
        // The client touch still happened.
        assert_eq!(store.list_clients().unwrap().len(), 1);
    }

    #[test]
    fn rate_alerts_flow_into_report() {
        let mut store = MemoryStore::new();
        let docs = vec![Document::new("a.xml", nfe("55", "SP", "1", "7.00"))];
        let report = process_batch(&mut store, &docs, &BatchConfig::default()).unwrap();
        assert_eq!(
            report.alerts,
            vec![Alert::new("Invoice 55: rate 7.0% differs from 4% or 12%.")]
        );
    }

    #[test]
    fn overflow_fails_batch_and_keeps_alerts() {
        let mut store = MemoryStore::new();
        let huge = String::from_utf8(nfe("1", "SP", "1", "12"))
            .unwrap()
            .replace("<vBC>1000.00</vBC>", "<vBC>70000000000000000000000000000</vBC>");
        let docs = vec![
            Document::new("a.xml", nfe("2", "SP", "2", "7.00")),
            Document::new("b.xml", huge.into_bytes()),
        ];
        let err = process_batch(&mut store, &docs, &BatchConfig::default()).unwrap_err();
        assert!(matches!(
            err.error,
            BatchError::Aggregation(DifalError::Overflow(_))
        ));
        assert_eq!(
            err.alerts,
            vec![Alert::new("Invoice 2: rate 7.0% differs from 4% or 12%.")]
        );
        assert!(store.list_obligations().unwrap().is_empty());
    }
}
