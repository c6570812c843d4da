//! Core types for grain service definitions.
//!
//! This module provides the statically-typed model the generator renders from:
//!
//! - [`FileDefinition`] - Everything generated for one input `.proto` file
//! - [`ServiceDefinition`] - A grain service and its callable methods
//! - [`MethodDefinition`] - One RPC method with its stable wire index
//! - [`DispatchMode`] - Blocking or reentrant invocation
//! - [`BridgeVersion`] - Which wire error shape the generated code speaks

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::catalog::ErrorReasonCatalog;
use crate::error::DefinitionError;

/// How a grain method is invoked on its owning execution context.
///
/// ## Examples
///
/// ```
/// use std::str::FromStr;
/// use grain_define::DispatchMode;
///
/// assert_eq!(DispatchMode::from_str("reentrant").unwrap(), DispatchMode::Reentrant);
/// assert_eq!(DispatchMode::Blocking.to_string(), "blocking");
/// assert_eq!(DispatchMode::default(), DispatchMode::Blocking);
/// ```
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DispatchMode {
    /// The business method runs to completion and its return value is the response.
    #[default]
    Blocking,
    /// The business method returns immediately and responds later through a
    /// `Responder` that re-enters the grain's own execution context.
    Reentrant,
}

/// Version of the wire error shape shared by dispatcher and client.
///
/// The two shapes are not interchangeable. A client generated for one
/// version reports a mismatch when it receives the other.
///
/// ## Examples
///
/// ```
/// use std::str::FromStr;
/// use grain_define::BridgeVersion;
///
/// assert_eq!(BridgeVersion::from_str("v1").unwrap(), BridgeVersion::V1);
/// assert_eq!(BridgeVersion::default(), BridgeVersion::V2);
/// ```
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BridgeVersion {
    /// Plain message string only.
    V1,
    /// Reason name, numeric code, message and string metadata.
    #[default]
    V2,
}

/// A single RPC method that survived extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDefinition {
    /// Method name as declared (e.g., `SayHello`).
    pub name: String,
    /// Rust path of the request message, relative to the generated module.
    pub input_type: String,
    /// Rust path of the response message, relative to the generated module.
    pub output_type: String,
    /// Position of the method in the service's full, unfiltered method list.
    ///
    /// Clients and dispatchers generated from the same service agree on this
    /// value. Gaps appear where streaming or unannotated methods were skipped.
    pub index: u32,
    /// Invocation strategy.
    pub dispatch_mode: DispatchMode,
    /// Idle timeout to re-arm after this method is dispatched.
    pub deactivation_timeout: Option<Duration>,
    /// Whether the client also gets a future-returning call for this method.
    pub future: bool,
    /// Mirrors `deprecated = true` on the method.
    pub deprecated: bool,
    /// Leading comment from the proto source.
    pub documentation: Option<String>,
}

impl MethodDefinition {
    /// Creates a blocking method with no extra options.
    ///
    /// ## Examples
    ///
    /// ```
    /// use grain_define::{DispatchMode, MethodDefinition};
    ///
    /// let method = MethodDefinition::new("Dowork", "DoworkRequest", "DoworkResponse", 1)
    ///     .with_dispatch_mode(DispatchMode::Reentrant);
    /// assert_eq!(method.index, 1);
    /// assert_eq!(method.dispatch_mode, DispatchMode::Reentrant);
    /// assert!(!method.future);
    /// ```
    pub fn new(
        name: impl Into<String>,
        input_type: impl Into<String>,
        output_type: impl Into<String>,
        index: u32,
    ) -> Self {
        Self {
            name: name.into(),
            input_type: input_type.into(),
            output_type: output_type.into(),
            index,
            dispatch_mode: DispatchMode::Blocking,
            deactivation_timeout: None,
            future: false,
            deprecated: false,
            documentation: None,
        }
    }

    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    pub fn with_future(mut self, future: bool) -> Self {
        self.future = future;
        self
    }

    pub fn with_deactivation_timeout(mut self, timeout: Duration) -> Self {
        self.deactivation_timeout = Some(timeout);
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    /// Returns true when the method responds through a `Responder`.
    pub fn is_reentrant(&self) -> bool {
        self.dispatch_mode == DispatchMode::Reentrant
    }
}

/// A grain service: one kind, one business trait, one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Declared service name. Also the kind name registered with the cluster.
    pub name: String,
    /// Surviving methods in source order.
    pub methods: Vec<MethodDefinition>,
    /// Mirrors `deprecated = true` on the service.
    pub deprecated: bool,
    /// Leading comment from the proto source.
    pub documentation: Option<String>,
}

impl ServiceDefinition {
    /// Creates a service definition, rejecting empty names and repeated indices.
    ///
    /// ## Errors
    ///
    /// - [`DefinitionError::EmptyName`] if the service or a method has no name
    /// - [`DefinitionError::DuplicateMethodIndex`] if two methods share an index
    ///
    /// ## Examples
    ///
    /// ```
    /// use grain_define::{MethodDefinition, ServiceDefinition};
    ///
    /// let service = ServiceDefinition::new(
    ///     "Hello",
    ///     vec![
    ///         MethodDefinition::new("SayHello", "SayHelloRequest", "SayHelloResponse", 0),
    ///         MethodDefinition::new("Dowork", "DoworkRequest", "DoworkResponse", 2),
    ///     ],
    /// )
    /// .unwrap();
    /// assert_eq!(service.methods.len(), 2);
    ///
    /// let clash = ServiceDefinition::new(
    ///     "Hello",
    ///     vec![
    ///         MethodDefinition::new("A", "Req", "Resp", 0),
    ///         MethodDefinition::new("B", "Req", "Resp", 0),
    ///     ],
    /// );
    /// assert!(clash.is_err());
    /// ```
    pub fn new(
        name: impl Into<String>,
        methods: Vec<MethodDefinition>,
    ) -> Result<Self, DefinitionError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DefinitionError::EmptyName { what: "service" });
        }

        let mut seen = HashSet::new();
        for method in &methods {
            if method.name.is_empty() {
                return Err(DefinitionError::EmptyName { what: "method" });
            }
            if !seen.insert(method.index) {
                return Err(DefinitionError::DuplicateMethodIndex {
                    service: name,
                    index: method.index,
                });
            }
        }

        Ok(Self {
            name,
            methods,
            deprecated: false,
            documentation: None,
        })
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    /// Looks up a method by its wire index.
    pub fn method_by_index(&self, index: u32) -> Option<&MethodDefinition> {
        self.methods.iter().find(|m| m.index == index)
    }
}

/// Everything derived from one input `.proto` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDefinition {
    /// Source path as handed to the compiler (e.g., `hello/hello.proto`).
    pub path: String,
    /// Proto package (e.g., `hello`). Empty for package-less files.
    pub package: String,
    /// Mirrors `option deprecated = true;` on the file.
    pub deprecated: bool,
    /// Services with at least one surviving method.
    pub services: Vec<ServiceDefinition>,
    /// Present only when the file declares an `ErrorReason` enum.
    pub error_reasons: Option<ErrorReasonCatalog>,
}

impl FileDefinition {
    /// Name of the generated file: the source path with `.proto` replaced by
    /// `_grain.rs`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use grain_define::FileDefinition;
    ///
    /// let file = FileDefinition {
    ///     path: "testdata/hello.proto".to_string(),
    ///     package: "hello".to_string(),
    ///     deprecated: false,
    ///     services: vec![],
    ///     error_reasons: None,
    /// };
    /// assert_eq!(file.generated_file_name(), "testdata/hello_grain.rs");
    /// ```
    pub fn generated_file_name(&self) -> String {
        let prefix = self.path.strip_suffix(".proto").unwrap_or(&self.path);
        format!("{prefix}_grain.rs")
    }

    /// Returns true when generation should produce a unit for this file.
    pub fn has_services(&self) -> bool {
        !self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn dispatch_mode_round_trips_through_strings() {
        for mode in DispatchMode::iter() {
            assert_eq!(DispatchMode::from_str(&mode.to_string()).unwrap(), mode);
        }
        assert!(DispatchMode::from_str("Reentrant").is_err());
    }

    #[test]
    fn dispatch_mode_serializes_snake_case() {
        let json = serde_json::to_string(&DispatchMode::Reentrant).unwrap();
        assert_eq!(json, "\"reentrant\"");
    }

    #[test]
    fn bridge_version_parses_lowercase_only() {
        assert_eq!(BridgeVersion::from_str("v2").unwrap(), BridgeVersion::V2);
        assert!(BridgeVersion::from_str("v3").is_err());
        assert!(BridgeVersion::from_str("V1").is_err());
    }

    #[test]
    fn service_allows_index_gaps() {
        let service = ServiceDefinition::new(
            "Hello",
            vec![
                MethodDefinition::new("A", "Req", "Resp", 0),
                MethodDefinition::new("C", "Req", "Resp", 2),
                MethodDefinition::new("E", "Req", "Resp", 4),
            ],
        )
        .unwrap();

        assert_eq!(service.method_by_index(2).map(|m| m.name.as_str()), Some("C"));
        assert!(service.method_by_index(1).is_none());
    }

    #[test]
    fn service_rejects_duplicate_index() {
        let err = ServiceDefinition::new(
            "Hello",
            vec![
                MethodDefinition::new("A", "Req", "Resp", 3),
                MethodDefinition::new("B", "Req", "Resp", 3),
            ],
        )
        .unwrap_err();

        assert_eq!(
            err,
            DefinitionError::DuplicateMethodIndex {
                service: "Hello".to_string(),
                index: 3
            }
        );
    }

    #[test]
    fn service_rejects_empty_names() {
        assert!(ServiceDefinition::new("", vec![]).is_err());
        let err = ServiceDefinition::new("Hello", vec![MethodDefinition::new("", "A", "B", 0)]);
        assert_eq!(err.unwrap_err(), DefinitionError::EmptyName { what: "method" });
    }

    #[test]
    fn generated_file_name_without_proto_suffix() {
        let file = FileDefinition {
            path: "odd_name".to_string(),
            package: String::new(),
            deprecated: false,
            services: vec![],
            error_reasons: None,
        };
        assert_eq!(file.generated_file_name(), "odd_name_grain.rs");
        assert!(!file.has_services());
    }
}
