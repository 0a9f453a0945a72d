//! NF-e (Nota Fiscal eletrônica) XML extraction.
//!
//! Reads the handful of fields the ICMS differential needs from an NF-e or
//! `nfeProc` document. Elements are matched by local name inside the
//! [`NFE_NAMESPACE`], so both default-namespace and prefixed documents work;
//! elements from any other namespace are ignored.
//!
//! # Example
//!
//! ```no_run
//! use difal::nfe::{parse_nfe, ParseOutcome};
//!
//! let bytes = std::fs::read("35240111222333000181550010000010011000010010.xml").unwrap();
//! match parse_nfe(&bytes) {
//!     ParseOutcome::Parsed(parsed) => println!("{} items", parsed.record.items.len()),
//!     ParseOutcome::Excluded { number } => println!("{number}: emitted in MG"),
//!     ParseOutcome::Malformed(e) => println!("skipped: {e}"),
//! }
//! ```

mod parse;

pub use parse::{ParseOutcome, ParsedInvoice, parse_nfe, parse_nfe_str};

/// Portal Fiscal NF-e namespace URI.
pub const NFE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";
