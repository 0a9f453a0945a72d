//! Core types, the due-date rule, the differential aggregator and alerts.
//!
//! Everything here is pure: no XML, no store access. The `nfe` module feeds
//! [`InvoiceRecord`]s in; the `batch` module persists what comes out.

mod aggregate;
mod alerts;
mod builder;
mod due_date;
mod error;
mod format;
pub mod rules;
mod types;

pub use aggregate::*;
pub use alerts::*;
pub use builder::*;
pub use due_date::*;
pub use error::*;
pub use format::{format_amount, format_rate};
pub(crate) use format::{serialize_amount, serialize_br_date};
pub use rules::{is_accepted_cfop, is_accepted_rate};
pub use types::*;
