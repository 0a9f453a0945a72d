use serde::{Deserialize, Serialize};

/// Options for [`process_batch`](super::process_batch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Only documents whose name ends with this suffix are parsed;
    /// everything else is ignored without an alert.
    pub document_suffix: String,
    /// Persist an obligation for every summarized invoice whose client exists.
    pub create_obligations: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            document_suffix: ".xml".into(),
            create_obligations: true,
        }
    }
}

impl BatchConfig {
    /// Whether a document with this name takes part in the batch.
    pub fn accepts(&self, document_name: &str) -> bool {
        document_name.ends_with(&self.document_suffix)
    }
}

/// Builder for [`BatchConfig`].
///
/// # Example
///
/// ```
/// use difal::batch::BatchConfigBuilder;
///
/// let config = BatchConfigBuilder::new()
///     .create_obligations(false)
///     .build();
/// assert!(config.accepts("nota.xml"));
/// ```
#[derive(Debug, Default)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the accepted file-name suffix (default ".xml").
    pub fn document_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.document_suffix = suffix.into();
        self
    }

    /// Enable or disable obligation persistence (default: enabled).
    pub fn create_obligations(mut self, enabled: bool) -> Self {
        self.config.create_obligations = enabled;
        self
    }

    pub fn build(self) -> BatchConfig {
        self.config
    }
}
