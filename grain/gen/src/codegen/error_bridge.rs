//! Error reason bridge generation.
//!
//! A file that declares `enum ErrorReason` gets a typed view of those reasons
//! on top of the runtime's wire error. Business code builds errors with the
//! generated constructors and callers match on `ErrorReasonKind`:
//!
//! ```ignore
//! // grain side
//! return Err(error_user_not_found("no user 42").into());
//!
//! // caller side
//! match ErrorReasonKind::from_error(&err) {
//!     Some(ErrorReasonKind::UserNotFound) => { .. }
//!     _ => { .. }
//! }
//! ```

use std::collections::HashSet;

use grain_define::ErrorReasonCatalog;
use grain_define::naming::{to_camel, to_snake};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use tracing::warn;

use super::{RenderContext, doc_attrs, rust_ident};

/// Generates `ErrorReasonKind` and one `error_<reason>` constructor per entry.
///
/// Returns empty tokens for an empty catalog. Entries whose names normalize
/// to an identifier already taken (enum aliases) are skipped.
pub fn generate_error_bridge(catalog: &ErrorReasonCatalog, ctx: &RenderContext) -> TokenStream {
    let runtime = &ctx.runtime;

    let mut seen = HashSet::new();
    let entries: Vec<_> = catalog
        .entries
        .iter()
        .filter_map(|entry| {
            let variant = rust_ident(&to_camel(&entry.symbolic_name));
            if !seen.insert(variant.to_string()) {
                warn!(reason = %entry.symbolic_name, "duplicate error reason name skipped");
                return None;
            }
            Some((entry, variant))
        })
        .collect();

    if entries.is_empty() {
        return TokenStream::new();
    }

    let variants = entries.iter().map(|(entry, variant)| {
        let docs = doc_attrs(entry.documentation.as_deref());
        quote! {
            #docs
            #variant,
        }
    });
    let all = entries.iter().map(|(_, variant)| quote! { Self::#variant });
    let codes = entries.iter().map(|(entry, variant)| {
        let number = entry.number;
        quote! { Self::#variant => #number, }
    });
    let names = entries.iter().map(|(entry, variant)| {
        let name = &entry.symbolic_name;
        quote! { Self::#variant => #name, }
    });
    let descriptions = entries.iter().map(|(entry, variant)| match &entry.documentation {
        Some(doc) => quote! { Self::#variant => ::std::option::Option::Some(#doc), },
        None => quote! { Self::#variant => ::std::option::Option::None, },
    });
    let constructors = entries
        .iter()
        .map(|(entry, variant)| constructor(&entry.symbolic_name, entry.documentation.as_deref(), variant, ctx));

    quote! {
        /// Reasons declared by this file's `ErrorReason` enum.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ErrorReasonKind {
            #(#variants)*
        }

        impl ErrorReasonKind {
            pub const ALL: &'static [Self] = &[#(#all),*];

            /// Numeric value of the reason, carried as the error code.
            pub fn code(self) -> i32 {
                match self {
                    #(#codes)*
                }
            }

            /// Symbolic name, carried as the error reason.
            pub fn name(self) -> &'static str {
                match self {
                    #(#names)*
                }
            }

            pub fn description(self) -> ::std::option::Option<&'static str> {
                match self {
                    #(#descriptions)*
                }
            }

            pub fn from_code(code: i32) -> ::std::option::Option<Self> {
                Self::ALL.iter().copied().find(|reason| reason.code() == code)
            }

            /// Recovers the reason from an error returned by a generated client.
            pub fn from_error(err: &#runtime::GrainError) -> ::std::option::Option<Self> {
                let remote = err.remote()?;
                Self::ALL
                    .iter()
                    .copied()
                    .find(|reason| reason.name() == remote.reason && reason.code() == remote.code)
            }

            /// Builds the wire error for this reason.
            pub fn error(self, message: impl ::std::convert::Into<::std::string::String>) -> #runtime::GrainErrorResponse {
                #runtime::GrainErrorResponse::with_reason(self.name(), self.code(), message)
            }
        }

        #(#constructors)*
    }
}

fn constructor(symbolic_name: &str, doc: Option<&str>, variant: &Ident, ctx: &RenderContext) -> TokenStream {
    let runtime = &ctx.runtime;
    let ident = format_ident!("error_{}", to_snake(symbolic_name));
    let docs = match doc {
        Some(doc) => doc_attrs(Some(doc)),
        None => {
            let line = format!(" Builds a `{symbolic_name}` error.");
            quote! { #[doc = #line] }
        }
    };
    quote! {
        #docs
        pub fn #ident(message: impl ::std::convert::Into<::std::string::String>) -> #runtime::GrainErrorResponse {
            ErrorReasonKind::#variant.error(message)
        }
    }
}
