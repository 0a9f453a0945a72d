//! # difal
//!
//! ICMS rate-differential (DIFAL) engine for Brazilian NF-e invoices bought
//! into Minas Gerais: reads NF-e XML, keeps the inter-state sale items
//! (CFOP 6101/6102), recomputes the tax at the MG internal rate and reports
//! the differential per client and per invoice, together with the payable
//! obligation and its due date.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use difal::core::*;
//! use rust_decimal_macros::dec;
//!
//! let invoice = InvoiceRecordBuilder::new("1001", "2024-01-05T10:30:00-03:00")
//!     .destination("11222333000181", "Cliente Ltda")
//!     .origin_state("SP")
//!     .item("1", dec!(1000), dec!(120), dec!(12))
//!     .build()
//!     .unwrap();
//!
//! let mut groups = BTreeMap::new();
//! groups.insert(invoice.client_key(), vec![invoice]);
//!
//! let agg = aggregate(&groups).unwrap();
//! assert_eq!(format_amount(agg.grand_total), "73.17");
//! assert_eq!(format_due_date(agg.obligations[0].due_date), "15/03/2024");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Types, due-date rule, differential aggregation, alerts |
//! | `nfe` | NF-e XML extraction |
//! | `batch` | Batch orchestration, record store, JSON report |
//! | `cnpj` | CNPJ/CPF validation, ReceitaWS lookup |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "nfe")]
pub mod nfe;

#[cfg(feature = "batch")]
pub mod batch;

#[cfg(feature = "cnpj")]
pub mod cnpj;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
