//! Error types for the grain generator.

use grain_define::DefinitionError;
use thiserror::Error;

/// Errors that can occur during code generation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The compiler handed us bytes that are not a descriptor request or set
    #[error("Failed to decode descriptor input: {0}")]
    DescriptorDecode(#[from] prost::DecodeError),

    /// A descriptor is structurally unusable (missing names, unknown file)
    #[error("Failed to parse service definition: {0}")]
    ParseError(String),

    /// The extracted model violates a definition invariant
    #[error("Invalid grain definition: {0}")]
    Definition(#[from] DefinitionError),

    /// Failed to generate code
    #[error("Code generation failed: {0}")]
    CodeGenError(String),

    /// Failed to read an input file
    #[error("Failed to read input file '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("Failed to write output file '{path}': {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid plugin parameter or CLI configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
