//! Code generation modules for grain services.
//!
//! Each submodule renders one part of a generated unit from the
//! `grain-define` model:
//!
//! - [`error_bridge`] - `ErrorReasonKind` and per-reason constructors
//! - [`service`] - The business trait implemented by users
//! - [`actor`] - The dispatching actor and kind constructors
//! - [`client`] - The typed client stub
//!
//! All generators return `proc_macro2::TokenStream`; [`crate::output`]
//! validates, formats and writes the assembled file.

pub mod actor;
pub mod client;
pub mod error_bridge;
pub mod service;

use std::collections::HashSet;
use std::time::Duration;

use grain_define::naming::{to_camel, to_snake};
use grain_define::{BridgeVersion, ServiceDefinition};
use proc_macro2::{Ident, Literal, Span, TokenStream};
use quote::{format_ident, quote};

use crate::config::GeneratorConfig;
use crate::errors::GeneratorError;

pub use actor::{generate_actor, generate_kind_functions};
pub use client::generate_client;
pub use error_bridge::generate_error_bridge;
pub use service::generate_service_trait;

/// Trait methods the generated trait already defines.
const HOOKS: [&str; 3] = ["init", "terminate", "receive_default"];

/// Client methods the generated client already defines.
const CLIENT_METHODS: [&str; 3] = ["new", "with_options", "identity"];

/// Everything the renderers need besides the model itself.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Runtime crate path tokens, e.g. `::grain`.
    pub runtime: TokenStream,
    pub bridge: BridgeVersion,
    pub default_timeout: Duration,
}

impl RenderContext {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        Ok(Self {
            runtime: config.runtime_tokens()?,
            bridge: config.bridge,
            default_timeout: config.default_timeout,
        })
    }

    /// `::grain::BridgeVersion::V2` (or `V1`).
    pub fn bridge_tokens(&self) -> TokenStream {
        let runtime = &self.runtime;
        match self.bridge {
            BridgeVersion::V1 => quote! { #runtime::BridgeVersion::V1 },
            BridgeVersion::V2 => quote! { #runtime::BridgeVersion::V2 },
        }
    }
}

/// Identifiers derived from a service name.
#[derive(Debug, Clone)]
pub struct ServiceNames {
    /// Business trait, e.g. `Hello`.
    pub service: Ident,
    /// `HelloActor`
    pub actor: Ident,
    /// `HelloGrainClient`
    pub client: Ident,
    /// `HELLO_KIND`
    pub kind_const: Ident,
    /// `HELLO_BRIDGE`
    pub bridge_const: Ident,
    /// `hello_kind`
    pub kind_fn: Ident,
    /// `new_hello_kind`
    pub new_kind_fn: Ident,
    /// `register_hello_kind`
    pub register_fn: Ident,
}

impl ServiceNames {
    pub fn new(service_name: &str) -> Self {
        let camel = to_camel(service_name);
        let snake = to_snake(service_name);
        let upper = snake.to_uppercase();
        Self {
            service: rust_ident(&camel),
            actor: format_ident!("{}Actor", camel),
            client: format_ident!("{}GrainClient", camel),
            kind_const: format_ident!("{}_KIND", upper),
            bridge_const: format_ident!("{}_BRIDGE", upper),
            kind_fn: format_ident!("{}_kind", snake),
            new_kind_fn: format_ident!("new_{}_kind", snake),
            register_fn: format_ident!("register_{}_kind", snake),
        }
    }
}

/// Makes `name` usable as an identifier, escaping keywords.
///
/// Keywords that cannot be raw identifiers (`self`, `super`, `crate`, `Self`)
/// get a trailing underscore instead.
pub fn rust_ident(name: &str) -> Ident {
    if syn::parse_str::<Ident>(name).is_ok() {
        return Ident::new(name, Span::call_site());
    }
    match name {
        "self" | "super" | "crate" | "Self" | "_" => format_ident!("{}_", name),
        _ => Ident::new_raw(name, Span::call_site()),
    }
}

/// Snake-case method identifier, e.g. `SayHello` -> `say_hello`.
pub fn method_ident(method_name: &str) -> Ident {
    rust_ident(&to_snake(method_name))
}

/// Parses a resolved message path into a type.
pub fn type_tokens(path: &str) -> Result<syn::Type, GeneratorError> {
    syn::parse_str(path)
        .map_err(|e| GeneratorError::CodeGenError(format!("invalid message type '{path}': {e}")))
}

/// `#[doc = "..."]` attributes, one per line.
pub fn doc_attrs(doc: Option<&str>) -> TokenStream {
    let Some(doc) = doc else {
        return TokenStream::new();
    };
    let lines = doc.lines().map(|line| {
        let line = if line.is_empty() {
            String::new()
        } else {
            format!(" {line}")
        };
        quote! { #[doc = #line] }
    });
    quote! { #(#lines)* }
}

pub fn deprecated_attr(deprecated: bool) -> TokenStream {
    if deprecated {
        quote! { #[deprecated] }
    } else {
        TokenStream::new()
    }
}

/// Silences deprecation warnings where generated code names a deprecated service.
pub fn allow_deprecated(deprecated: bool) -> TokenStream {
    if deprecated {
        quote! { #[allow(deprecated)] }
    } else {
        TokenStream::new()
    }
}

/// `::std::time::Duration` constructor expression for `duration`.
pub fn duration_tokens(duration: Duration) -> TokenStream {
    if duration.subsec_nanos() % 1_000_000 == 0 {
        let millis = Literal::u64_unsuffixed(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));
        quote! { ::std::time::Duration::from_millis(#millis) }
    } else {
        let nanos = Literal::u64_unsuffixed(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX));
        quote! { ::std::time::Duration::from_nanos(#nanos) }
    }
}

/// Rejects services whose generated identifiers would clash.
///
/// ## Errors
///
/// Returns [`GeneratorError::CodeGenError`] when a method shadows a
/// life-cycle hook or a client method, or when the identifiers generated
/// for two methods (the method, its `_future` twin, its private
/// `decode_` helper) overlap.
pub fn check_service_names(service: &ServiceDefinition) -> Result<(), GeneratorError> {
    let mut seen = HashSet::new();
    for method in &service.methods {
        let ident = to_snake(&method.name);
        if HOOKS.contains(&ident.as_str()) || CLIENT_METHODS.contains(&ident.as_str()) {
            return Err(GeneratorError::CodeGenError(format!(
                "method '{}.{}' collides with generated '{}'",
                service.name, method.name, ident
            )));
        }
        let mut generated = vec![ident.clone(), format!("decode_{ident}")];
        if method.future {
            generated.push(format!("{ident}_future"));
        }
        if let Some(clash) = generated.into_iter().find(|name| !seen.insert(name.clone())) {
            return Err(GeneratorError::CodeGenError(format!(
                "method '{}.{}' collides with another method's generated '{}'",
                service.name, method.name, clash
            )));
        }
    }
    Ok(())
}
