use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An NF-e reduced to the fields the differential calculation needs.
///
/// Only produced for invoices that parsed cleanly and whose emitter is
/// outside the destination state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// `ide/nNF`: invoice number.
    pub number: String,
    /// `ide/dhEmi`: raw emission timestamp, e.g. "2024-01-05T10:30:00-03:00".
    pub emitted_at: String,
    /// Calendar date taken from the first 10 characters of `emitted_at`.
    pub emission_date: NaiveDate,
    /// `dest/CNPJ`: destination (client) tax id.
    pub destination_tax_id: String,
    /// `dest/xNome`: destination (client) legal name.
    pub destination_name: String,
    /// `emit/enderEmit/UF`: emitter's state code.
    pub origin_state: String,
    /// Items with an accepted CFOP, in document order.
    pub items: Vec<LineItem>,
}

impl InvoiceRecord {
    /// Grouping key for this invoice's destination.
    pub fn client_key(&self) -> ClientKey {
        ClientKey::new(&self.destination_tax_id, &self.destination_name)
    }
}

/// One `det` element with an accepted CFOP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// `det/@nItem`.
    pub index: String,
    /// `prod/CFOP`.
    pub cfop: String,
    /// `ICMS/*/vBC`: tax base, 0 when absent.
    pub tax_base: Decimal,
    /// `ICMS/*/vICMS`: tax already charged, 0 when absent.
    pub tax_amount: Decimal,
    /// `ICMS/*/pICMS`: rate in percent, 0 when absent.
    pub tax_rate: Decimal,
}

impl LineItem {
    /// Create a line item.
    pub fn new(
        index: impl Into<String>,
        cfop: impl Into<String>,
        tax_base: Decimal,
        tax_amount: Decimal,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            index: index.into(),
            cfop: cfop.into(),
            tax_base,
            tax_amount,
            tax_rate,
        }
    }
}

/// Client identity used to group invoices: (CNPJ, legal name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientKey {
    /// Destination CNPJ.
    pub tax_id: String,
    /// Destination legal name as written on the invoice.
    pub name: String,
}

impl ClientKey {
    /// Create a key.
    pub fn new(tax_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tax_id: tax_id.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.tax_id)
    }
}

/// Request to make sure a client record exists for an invoice destination.
///
/// Returned by the parser and applied by the batch layer, so parsing never
/// needs store access. Applying it twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTouch {
    /// CNPJ to look up.
    pub tax_id: String,
    /// Name used if the client has to be created.
    pub name: String,
}

/// A registered client (company served by the accounting office).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Store-assigned id.
    pub id: u64,
    /// Razão social.
    pub legal_name: String,
    /// 14-digit CNPJ, unique.
    pub cnpj: String,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
}

/// Fields for creating a [`Client`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub legal_name: String,
    pub cnpj: String,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
}

impl NewClient {
    /// Client with only the mandatory fields.
    pub fn new(cnpj: impl Into<String>, legal_name: impl Into<String>) -> Self {
        Self {
            legal_name: legal_name.into(),
            cnpj: cnpj.into(),
            email: None,
            whatsapp: None,
        }
    }
}

/// Whether an accountant is registered as a person or a firm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountantKind {
    /// Pessoa física, identified by CPF.
    #[serde(rename = "PF")]
    Individual,
    /// Pessoa jurídica, identified by CNPJ.
    #[serde(rename = "PJ")]
    Company,
}

impl AccountantKind {
    /// Two-letter code used on registration forms.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Individual => "PF",
            Self::Company => "PJ",
        }
    }

    /// Parse from "PF"/"PJ".
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PF" => Some(Self::Individual),
            "PJ" => Some(Self::Company),
            _ => None,
        }
    }
}

/// Accounting office (contabilidade) record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accountant {
    pub id: u64,
    pub kind: AccountantKind,
    /// CPF or CNPJ depending on `kind`, unique.
    pub tax_id: String,
    /// Nome or razão social.
    pub name: String,
    /// CRC registration number.
    pub crc: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
}

/// Fields for creating an [`Accountant`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccountant {
    pub kind: AccountantKind,
    pub tax_id: String,
    pub name: String,
    pub crc: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
}

/// Staff member of the accounting office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: u64,
    pub name: String,
    /// CPF, unique when present.
    pub cpf: Option<String>,
    pub whatsapp: Option<String>,
}

/// Fields for creating an [`Employee`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub cpf: Option<String>,
    pub whatsapp: Option<String>,
}

/// Lifecycle state of an [`Obligation`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObligationStatus {
    /// Not yet paid. Every obligation generated here starts (and stays) pending.
    #[default]
    Pending,
    /// Settled.
    Paid,
}

impl ObligationStatus {
    /// Label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Paid => "Pago",
        }
    }
}

/// A payable owed by a client, persisted by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: u64,
    /// Owning [`Client::id`].
    pub client_id: u64,
    pub description: String,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub status: ObligationStatus,
}

/// Obligation computed by the aggregator, not yet bound to a stored client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationDraft {
    /// Destination CNPJ the obligation belongs to.
    pub tax_id: String,
    /// Invoice the differential was computed for.
    pub invoice_number: String,
    pub description: String,
    pub due_date: NaiveDate,
    /// Invoice differential, rounded to cents.
    pub amount: Decimal,
}

/// Fields for creating an [`Obligation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewObligation {
    pub client_id: u64,
    pub description: String,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub status: ObligationStatus,
}

impl NewObligation {
    /// Bind a draft to a stored client, in `Pending` state.
    pub fn from_draft(client_id: u64, draft: &ObligationDraft) -> Self {
        Self {
            client_id,
            description: draft.description.clone(),
            due_date: draft.due_date,
            amount: draft.amount,
            status: ObligationStatus::Pending,
        }
    }
}
