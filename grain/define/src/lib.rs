//! Grain Definition Library
//!
//! This crate provides the statically-typed intermediate model that sits
//! between a compiled `.proto` descriptor and the generated grain code. The
//! `grain-gen` extractor builds these values once per run; the renderers read
//! them and never look at descriptors again.
//!
//! ## Core Types
//!
//! - [`FileDefinition`] - One input file: its services and optional error catalog
//! - [`ServiceDefinition`] - A grain service with its surviving methods
//! - [`MethodDefinition`] - Name, message types, stable wire index and options
//! - [`DispatchMode`] - Blocking or reentrant invocation
//! - [`ErrorReasonCatalog`] - Values of an `ErrorReason` enum
//! - [`BridgeVersion`] - Wire error shape (`v1` plain message, `v2` reason + metadata)
//!
//! ## Naming
//!
//! [`naming::to_camel`] and [`naming::to_snake`] derive generated identifiers.
//!
//! ## Examples
//!
//! ```
//! use grain_define::{DispatchMode, MethodDefinition, ServiceDefinition};
//!
//! let service = ServiceDefinition::new(
//!     "Hello",
//!     vec![
//!         MethodDefinition::new("SayHello", "SayHelloRequest", "SayHelloResponse", 0)
//!             .with_dispatch_mode(DispatchMode::Reentrant),
//!         // index 1 was a streaming method and got skipped
//!         MethodDefinition::new("Dowork", "DoworkRequest", "DoworkResponse", 2)
//!             .with_future(true),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(service.methods[1].index, 2);
//! ```

pub mod catalog;
pub mod error;
pub mod naming;
pub mod types;

pub use catalog::{ERROR_REASON_ENUM, ErrorReasonCatalog, ErrorReasonEntry};
pub use error::DefinitionError;
pub use types::{BridgeVersion, DispatchMode, FileDefinition, MethodDefinition, ServiceDefinition};
