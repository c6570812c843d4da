//! Error-reason catalog model.
//!
//! A file that declares an enum literally named [`ERROR_REASON_ENUM`] gets a
//! typed error bridge generated from its values. Files without one get none.

use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;

/// Enum name that marks an error-reason catalog.
pub const ERROR_REASON_ENUM: &str = "ErrorReason";

/// One declared error reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReasonEntry {
    /// Value name as declared (e.g., `USER_NOT_FOUND`).
    pub symbolic_name: String,
    /// Declared numeric value; travels on the wire as the reason code.
    pub number: i32,
    /// Leading comment, or the trailing comment when no leading one exists.
    pub documentation: Option<String>,
}

impl ErrorReasonEntry {
    pub fn new(symbolic_name: impl Into<String>, number: i32) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            number,
            documentation: None,
        }
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }
}

/// Ordered error reasons of one file.
///
/// ## Examples
///
/// ```
/// use grain_define::{ErrorReasonCatalog, ErrorReasonEntry};
///
/// let catalog = ErrorReasonCatalog::new(vec![
///     ErrorReasonEntry::new("USER_NOT_FOUND", 0).with_documentation("no such user"),
///     ErrorReasonEntry::new("QUOTA_EXCEEDED", 7),
/// ])
/// .unwrap();
///
/// assert_eq!(catalog.name, "ErrorReason");
/// assert_eq!(catalog.find(7).map(|e| e.symbolic_name.as_str()), Some("QUOTA_EXCEEDED"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReasonCatalog {
    /// Enum name the catalog was read from.
    pub name: String,
    /// Entries in declaration order.
    pub entries: Vec<ErrorReasonEntry>,
}

impl ErrorReasonCatalog {
    /// Builds a catalog named [`ERROR_REASON_ENUM`].
    ///
    /// ## Errors
    ///
    /// Returns [`DefinitionError::EmptyName`] if an entry has no symbolic name.
    pub fn new(entries: Vec<ErrorReasonEntry>) -> Result<Self, DefinitionError> {
        if entries.iter().any(|e| e.symbolic_name.is_empty()) {
            return Err(DefinitionError::EmptyName {
                what: "error reason",
            });
        }
        Ok(Self {
            name: ERROR_REASON_ENUM.to_string(),
            entries,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the first entry declared with `number`.
    pub fn find(&self, number: i32) -> Option<&ErrorReasonEntry> {
        self.entries.iter().find(|e| e.number == number)
    }
}
