use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::NFE_NAMESPACE;
use crate::core::rules::EXCLUDED_STATE;
use crate::core::*;

/// Result of reading one NF-e document.
#[derive(Debug)]
pub enum ParseOutcome {
    /// The document was read. `record.items` may be empty when no item
    /// carries an accepted CFOP.
    Parsed(ParsedInvoice),
    /// Emitted from the destination state; never owes a differential.
    Excluded {
        /// `nNF` of the skipped invoice.
        number: String,
    },
    /// Not well-formed, or a required field is missing or unreadable.
    ///
    /// Callers skip these documents without raising an alert.
    Malformed(DifalError),
}

impl ParseOutcome {
    /// The parsed invoice, if any.
    pub fn parsed(&self) -> Option<&ParsedInvoice> {
        match self {
            Self::Parsed(p) => Some(p),
            _ => None,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parsed(_) => "parsed",
            Self::Excluded { .. } => "excluded",
            Self::Malformed(_) => "malformed",
        }
    }
}

/// A successfully read invoice plus what the caller has to act on.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInvoice {
    pub record: InvoiceRecord,
    /// Rate-policy warnings, one per offending item, in document order.
    pub alerts: Vec<Alert>,
    /// Client that must exist for this invoice's destination.
    pub client: ClientTouch,
}

/// Parse an NF-e document from raw bytes.
///
/// Non-UTF-8 input is reported as [`ParseOutcome::Malformed`].
pub fn parse_nfe(bytes: &[u8]) -> ParseOutcome {
    match std::str::from_utf8(bytes) {
        Ok(xml) => parse_nfe_str(xml),
        Err(e) => ParseOutcome::Malformed(DifalError::Xml(format!("invalid UTF-8: {e}"))),
    }
}

/// Parse an NF-e document.
pub fn parse_nfe_str(xml: &str) -> ParseOutcome {
    match read_document(xml) {
        Ok(parsed) => parsed.into_outcome(),
        Err(e) => ParseOutcome::Malformed(e),
    }
}

fn read_document(xml: &str) -> Result<NfeParsed, DifalError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let nfe_ns = ResolveResult::Bound(Namespace(NFE_NAMESPACE.as_bytes()));
    let mut p = NfeParsed::default();
    let mut seen_root = false;

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(e))) => {
                seen_root = true;
                let name = local_name(&e, ns == nfe_ns);
                p.open(name, &e)?;
            }
            Ok((ns, Event::Empty(e))) => {
                seen_root = true;
                let name = local_name(&e, ns == nfe_ns);
                p.open(name, &e)?;
                p.close();
            }
            Ok((_, Event::Text(e))) => {
                let text = e
                    .unescape()
                    .map_err(|e| DifalError::Xml(format!("XML text error: {e}")))?;
                p.text.push_str(&text);
            }
            Ok((_, Event::CData(e))) => {
                let raw = e.into_inner();
                let text = std::str::from_utf8(&raw)
                    .map_err(|e| DifalError::Xml(format!("CDATA is not UTF-8: {e}")))?;
                p.text.push_str(text.trim());
            }
            Ok((_, Event::End(_))) => p.close(),
            Ok((_, Event::Eof)) => break,
            Err(e) => return Err(DifalError::Xml(format!("XML parse error: {e}"))),
            _ => {}
        }
    }

    if !seen_root {
        return Err(DifalError::Xml("document has no root element".into()));
    }
    if !p.path.is_empty() {
        return Err(DifalError::Xml("unexpected end of document".into()));
    }
    Ok(p)
}

/// Local name of an element in the NF-e namespace; `None` for foreign elements.
fn local_name(e: &BytesStart<'_>, in_nfe_ns: bool) -> Option<String> {
    if !in_nfe_ns {
        return None;
    }
    std::str::from_utf8(e.local_name().as_ref())
        .ok()
        .map(str::to_string)
}

#[derive(Default)]
struct NfeParsed {
    number: Option<String>,
    emitted_at: Option<String>,
    dest_cnpj: Option<String>,
    dest_name: Option<String>,
    origin_state: Option<String>,

    dets: Vec<DetParsed>,
    current_det: Option<DetParsed>,

    // Temp state
    path: Vec<Option<String>>,
    text: String,
}

#[derive(Default)]
struct DetParsed {
    index: Option<String>,
    cfop: Option<String>,
    base: Option<String>,
    amount: Option<String>,
    rate: Option<String>,
    /// Path depth of the first `ICMS` block while it is open.
    icms_depth: Option<usize>,
    icms_done: bool,
}

impl NfeParsed {
    fn open(&mut self, name: Option<String>, e: &BytesStart<'_>) -> Result<(), DifalError> {
        self.text.clear();

        match name.as_deref() {
            Some("det") => {
                let index = e
                    .try_get_attribute("nItem")
                    .map_err(|e| DifalError::Xml(format!("attribute error: {e}")))?
                    .map(|a| a.unescape_value().map(|v| v.trim().to_string()))
                    .transpose()
                    .map_err(|e| DifalError::Xml(format!("attribute error: {e}")))?;
                self.current_det = Some(DetParsed {
                    index,
                    ..Default::default()
                });
            }
            Some("ICMS") => {
                let depth = self.path.len();
                if let Some(det) = self.current_det.as_mut() {
                    if det.icms_depth.is_none() && !det.icms_done {
                        det.icms_depth = Some(depth);
                    }
                }
            }
            _ => {}
        }

        self.path.push(name);
        Ok(())
    }

    fn close(&mut self) {
        let Some(ended) = self.path.pop() else {
            return;
        };
        let text = std::mem::take(&mut self.text);
        let Some(ended) = ended else {
            return;
        };

        // Empty elements are passed on too: `<vBC/>` is present, not absent.
        self.handle_text(&ended, text);

        if ended == "ICMS" {
            let depth = self.path.len();
            if let Some(det) = self.current_det.as_mut() {
                if det.icms_depth == Some(depth) {
                    det.icms_depth = None;
                    det.icms_done = true;
                }
            }
        }
        if ended == "det" {
            if let Some(det) = self.current_det.take() {
                self.dets.push(det);
            }
        }
    }

    fn ancestor(&self, up: usize) -> &str {
        self.path
            .len()
            .checked_sub(up)
            .and_then(|i| self.path.get(i))
            .and_then(|n| n.as_deref())
            .unwrap_or("")
    }

    /// Dispatch the text of a just-closed leaf. The first occurrence of
    /// every field wins.
    fn handle_text(&mut self, leaf: &str, text: String) {
        let parent = self.ancestor(1).to_string();

        match leaf {
            "nNF" => set_first(&mut self.number, text),
            "dhEmi" => set_first(&mut self.emitted_at, text),
            "CNPJ" if parent == "dest" => set_first(&mut self.dest_cnpj, text),
            "xNome" if parent == "dest" => set_first(&mut self.dest_name, text),
            "UF" if parent == "enderEmit" && self.ancestor(2) == "emit" => {
                set_first(&mut self.origin_state, text)
            }
            _ => {
                let depth = self.path.len();
                let Some(det) = self.current_det.as_mut() else {
                    return;
                };
                if leaf == "CFOP" && parent == "prod" {
                    set_first(&mut det.cfop, text);
                    return;
                }
                // Inside the item's first ICMS block, at any depth.
                if det.icms_depth.is_some_and(|d| depth > d) {
                    match leaf {
                        "vBC" => set_first(&mut det.base, text),
                        "vICMS" => set_first(&mut det.amount, text),
                        "pICMS" => set_first(&mut det.rate, text),
                        _ => {}
                    }
                }
            }
        }
    }

    fn into_outcome(self) -> ParseOutcome {
        match self.into_invoice() {
            Ok(outcome) => outcome,
            Err(e) => ParseOutcome::Malformed(e),
        }
    }

    fn into_invoice(self) -> Result<ParseOutcome, DifalError> {
        let number = required(self.number, "nNF")?;
        let emitted_at = required(self.emitted_at, "dhEmi")?;
        let destination_tax_id = required(self.dest_cnpj, "dest/CNPJ")?;
        let destination_name = required(self.dest_name, "dest/xNome")?;
        let origin_state = required(self.origin_state, "emit/enderEmit/UF")?;

        if origin_state == EXCLUDED_STATE {
            return Ok(ParseOutcome::Excluded { number });
        }

        let emission_date = emission_date(&emitted_at)?;

        let mut items = Vec::new();
        let mut alerts = Vec::new();
        for det in self.dets {
            let index = det.index.ok_or_else(|| DifalError::Field("det/@nItem".into()))?;
            let cfop = required(det.cfop, "prod/CFOP")?;
            if !is_accepted_cfop(&cfop) {
                continue;
            }
            if !det.icms_done {
                return Err(DifalError::Field(format!("det[{index}]/imposto/ICMS")));
            }

            let tax_base = parse_decimal(det.base.as_deref(), "vBC")?;
            let tax_amount = parse_decimal(det.amount.as_deref(), "vICMS")?;
            let tax_rate = parse_decimal(det.rate.as_deref(), "pICMS")?;

            if !is_accepted_rate(tax_rate) {
                alerts.push(Alert::rate_policy(&number, tax_rate));
            }
            items.push(LineItem {
                index,
                cfop,
                tax_base,
                tax_amount,
                tax_rate,
            });
        }

        let client = ClientTouch {
            tax_id: destination_tax_id.clone(),
            name: destination_name.clone(),
        };

        Ok(ParseOutcome::Parsed(ParsedInvoice {
            record: InvoiceRecord {
                number,
                emitted_at,
                emission_date,
                destination_tax_id,
                destination_name,
                origin_state,
                items,
            },
            alerts,
            client,
        }))
    }
}

fn set_first(slot: &mut Option<String>, text: String) {
    if slot.is_none() {
        *slot = Some(text);
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, DifalError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DifalError::Field(field.into()))
}

/// Read an ICMS value. An absent element counts as zero; an empty one is
/// an error.
fn parse_decimal(value: Option<&str>, field: &str) -> Result<Decimal, DifalError> {
    let Some(s) = value else {
        return Ok(Decimal::ZERO);
    };
    if s.is_empty() {
        return Err(DifalError::Decimal {
            field: field.into(),
            value: String::new(),
        });
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|_| DifalError::Decimal {
            field: field.into(),
            value: s.into(),
        })
}
