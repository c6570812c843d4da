//! Errors raised while building service definitions.

use thiserror::Error;

/// A definition violates a model invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// Two methods of the same service claim the same wire index.
    #[error("service '{service}' declares method index {index} more than once")]
    DuplicateMethodIndex {
        /// Service name.
        service: String,
        /// The repeated index.
        index: u32,
    },

    /// A service, method or catalog entry has an empty name.
    #[error("{what} name must not be empty")]
    EmptyName {
        /// Which kind of element was unnamed.
        what: &'static str,
    },
}
