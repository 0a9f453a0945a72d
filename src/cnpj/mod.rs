//! CNPJ/CPF validation and ReceitaWS registry lookup.
//!
//! # Example
//!
//! ```ignore
//! use difal::cnpj::*;
//!
//! // Format-only validation (no network)
//! assert_eq!(validate_cnpj("11.222.333/0001-81")?, "11222333000181");
//!
//! // Registry lookup (async, requires network)
//! let info = lookup_cnpj("11222333000181", &ReceitaWsConfig::from_env()).await?;
//! println!("{}", info.name);
//! ```

mod format;
mod receitaws;

pub use format::{CnpjFormatError, format_cnpj, normalize_cnpj, validate_cnpj, validate_cpf};
pub use receitaws::{
    CnpjInfo, CnpjLookupError, RECEITAWS_TOKEN_ENV, RECEITAWS_URL, ReceitaWsConfig, lookup_cnpj,
};
