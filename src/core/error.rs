use thiserror::Error;

/// Errors that can occur while reading invoices or talking to the record store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DifalError {
    /// The document is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// A required field is missing or empty.
    #[error("missing field: {0}")]
    Field(String),

    /// A monetary or rate value could not be read as a decimal.
    #[error("invalid decimal '{value}' in {field}")]
    Decimal {
        /// Element the value was read from.
        field: String,
        /// The raw text.
        value: String,
    },

    /// The emission timestamp does not start with a `YYYY-MM-DD` date.
    #[error("invalid emission date '{0}'")]
    Date(String),

    /// A total left the range a decimal can hold.
    #[error("arithmetic overflow while computing {0}")]
    Overflow(String),

    /// The invoice was emitted in the destination state and owes no differential.
    #[error("invoice {0} was emitted in the destination state")]
    ExcludedOrigin(String),

    /// The record store rejected an operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors reported by a [`RecordStore`](crate::batch::RecordStore) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// A record with the same unique key already exists.
    #[error("duplicate {entity}: {key}")]
    Duplicate {
        /// Entity kind, e.g. "client".
        entity: &'static str,
        /// The conflicting key value.
        key: String,
    },

    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. "client".
        entity: &'static str,
        /// The missing id.
        id: u64,
    },

    /// Backend-specific failure (connection, constraint, I/O).
    #[error("store backend error: {0}")]
    Backend(String),
}
