//! ReceitaWS REST client for CNPJ registry lookups.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::format::validate_cnpj;

/// Default ReceitaWS endpoint; the CNPJ digits are appended as a path segment.
pub const RECEITAWS_URL: &str = "https://receitaws.com.br/v1/cnpj";

/// Environment variable holding the ReceitaWS API token.
pub const RECEITAWS_TOKEN_ENV: &str = "RECEITAWS_TOKEN";

/// Connection settings for [`lookup_cnpj`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceitaWsConfig {
    pub base_url: String,
    /// Bearer token; anonymous (rate-limited) access when `None`.
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ReceitaWsConfig {
    fn default() -> Self {
        Self {
            base_url: RECEITAWS_URL.into(),
            token: None,
            timeout_secs: 30,
        }
    }
}

impl ReceitaWsConfig {
    /// Defaults plus the token from `RECEITAWS_TOKEN`, if set and non-empty.
    pub fn from_env() -> Self {
        Self {
            token: std::env::var(RECEITAWS_TOKEN_ENV)
                .ok()
                .filter(|t| !t.trim().is_empty()),
            ..Self::default()
        }
    }

    fn url_for(&self, digits: &str) -> String {
        format!("{}/{digits}", self.base_url.trim_end_matches('/'))
    }
}

/// Registry data for a CNPJ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CnpjInfo {
    pub cnpj: String,
    /// Razão social.
    pub name: String,
    /// Nome fantasia, if registered.
    pub trade_name: Option<String>,
    /// UF of the registered address.
    pub state: Option<String>,
    pub city: Option<String>,
    /// Registration status, e.g. "ATIVA".
    pub status: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Opening date as returned by the registry (DD/MM/YYYY).
    pub opened_on: Option<String>,
}

/// Error from a ReceitaWS lookup.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum CnpjLookupError {
    /// The CNPJ failed local validation; no request was sent.
    InvalidCnpj(String),
    /// Network or HTTP transport error.
    Network(String),
    /// The service answered with an error status or an `ERROR` body.
    ApiError(String),
    /// The response body could not be read.
    ParseError(String),
}

impl fmt::Display for CnpjLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCnpj(e) => write!(f, "CNPJ lookup rejected: {e}"),
            Self::Network(e) => write!(f, "ReceitaWS network error: {e}"),
            Self::ApiError(e) => write!(f, "ReceitaWS API error: {e}"),
            Self::ParseError(e) => write!(f, "ReceitaWS parse error: {e}"),
        }
    }
}

impl std::error::Error for CnpjLookupError {}

/// ReceitaWS response structure.
#[derive(Debug, Deserialize)]
struct ReceitaWsResponse {
    status: Option<String>,
    message: Option<String>,
    cnpj: Option<String>,
    nome: Option<String>,
    fantasia: Option<String>,
    uf: Option<String>,
    municipio: Option<String>,
    situacao: Option<String>,
    email: Option<String>,
    telefone: Option<String>,
    abertura: Option<String>,
}

/// Look a CNPJ up in the ReceitaWS registry.
///
/// The CNPJ may be punctuated; it is validated locally before any request.
///
/// # Errors
///
/// `CnpjLookupError::InvalidCnpj` for malformed input,
/// `CnpjLookupError::Network` on connection issues,
/// `CnpjLookupError::ApiError` on non-2xx answers or an `ERROR` status,
/// `CnpjLookupError::ParseError` on unexpected response formats.
pub async fn lookup_cnpj(
    cnpj: &str,
    config: &ReceitaWsConfig,
) -> Result<CnpjInfo, CnpjLookupError> {
    let digits = validate_cnpj(cnpj).map_err(|e| CnpjLookupError::InvalidCnpj(e.to_string()))?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| CnpjLookupError::Network(e.to_string()))?;

    let mut req = client.get(config.url_for(&digits));
    if let Some(token) = config.token.as_deref() {
        req = req.bearer_auth(token);
    }

    tracing::debug!(cnpj = %digits, "querying ReceitaWS");
    let resp = req
        .send()
        .await
        .map_err(|e| CnpjLookupError::Network(e.to_string()))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| CnpjLookupError::Network(e.to_string()))?;

    if !status.is_success() {
        return Err(CnpjLookupError::ApiError(format!("HTTP {status}: {body}")));
    }

    parse_response(&body)
}

fn parse_response(body: &str) -> Result<CnpjInfo, CnpjLookupError> {
    let resp: ReceitaWsResponse = serde_json::from_str(body)
        .map_err(|e: serde_json::Error| CnpjLookupError::ParseError(e.to_string()))?;

    if resp.status.as_deref() == Some("ERROR") {
        return Err(CnpjLookupError::ApiError(
            resp.message.unwrap_or_else(|| "unknown error".into()),
        ));
    }

    let cnpj = resp
        .cnpj
        .ok_or_else(|| CnpjLookupError::ParseError("missing field 'cnpj'".into()))?;
    let name = resp
        .nome
        .ok_or_else(|| CnpjLookupError::ParseError("missing field 'nome'".into()))?;

    Ok(CnpjInfo {
        cnpj,
        name,
        trade_name: non_empty(resp.fantasia),
        state: non_empty(resp.uf),
        city: non_empty(resp.municipio),
        status: non_empty(resp.situacao),
        email: non_empty(resp.email),
        phone: non_empty(resp.telefone),
        opened_on: non_empty(resp.abertura),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
