//! Grain code generator library.
//!
//! This crate turns protobuf service definitions into grain (virtual actor)
//! code for the `grain` runtime. For every service with methods annotated
//! with the `(grain.method)` extension it generates:
//!
//! - A business trait with one method per grain method plus life-cycle hooks
//! - An actor that decodes requests and dispatches them by stable method index
//! - Kind constructors to register the grain with a `KindRegistry`
//! - A typed client with blocking and, where enabled, future-returning calls
//! - An `ErrorReasonKind` view of the file's `ErrorReason` enum, if any
//!
//! ## Modules
//!
//! - [`descriptor`] - Wire descriptor messages, including the raw extension
//! - [`extract`] - Descriptor to `grain-define` model extraction
//! - [`codegen`] - Token generation for each part of a unit
//! - [`output`] - Assembly, header, validation, formatting and file writing
//! - [`plugin`] - The protoc plugin request/response protocol
//! - [`config`] - Plugin parameter parsing
//! - [`errors`] - Error types for the generator
//!
//! ## Example Usage
//!
//! ```
//! use grain_gen::config::GeneratorConfig;
//! use grain_gen::descriptor::{FileDescriptor, GrainMethodOptions, MethodDescriptor, ServiceDescriptor};
//! use grain_gen::plugin::generate_units;
//!
//! let file = FileDescriptor::new("hello.proto", "hello").with_service(
//!     ServiceDescriptor::new("Hello").with_method(
//!         MethodDescriptor::new("SayHello", ".hello.SayHelloRequest", ".hello.SayHelloResponse")
//!             .with_grain_options(&GrainMethodOptions::reentrant()),
//!     ),
//! );
//!
//! let units = generate_units(&[file], &[], &GeneratorConfig::default(), None).unwrap();
//! assert_eq!(units[0].name, "hello_grain.rs");
//! assert!(units[0].content.contains("pub struct HelloGrainClient"));
//! ```

pub mod codegen;
pub mod config;
pub mod descriptor;
pub mod errors;
pub mod extract;
pub mod output;
pub mod plugin;

#[cfg(test)]
pub mod test_utils;

pub use config::GeneratorConfig;
pub use errors::GeneratorError;
pub use output::{GeneratedUnit, generate_file, write_atomic};
pub use plugin::{generate_units, respond};
