//! Business trait generation.
//!
//! Users implement the generated trait; the generated actor owns one
//! instance per activation and calls into it.

use grain_define::ServiceDefinition;
use proc_macro2::TokenStream;
use quote::quote;

use super::{
    RenderContext, ServiceNames, check_service_names, deprecated_attr, doc_attrs, method_ident,
    type_tokens,
};
use crate::errors::GeneratorError;

/// Generates the business trait for `service`.
///
/// Blocking methods return the response. Reentrant methods receive a
/// `Responder` and return as soon as the work is handed off; an `Err`
/// returned synchronously still answers the caller.
///
/// ## Generated Code
///
/// ```ignore
/// pub trait Hello: Send + 'static {
///     fn init(&mut self, _ctx: &::grain::GrainContext) {}
///     fn terminate(&mut self, _ctx: &::grain::GrainContext) {}
///     fn receive_default(&mut self, _message: ::grain::UserMessage, _ctx: &::grain::GrainContext) {}
///
///     fn say_hello(
///         &mut self,
///         request: SayHelloRequest,
///         responder: ::grain::Responder<SayHelloResponse>,
///         ctx: &::grain::GrainContext,
///     ) -> Result<(), ::grain::BoxError>;
///
///     fn dowork(&mut self, request: DoworkRequest, ctx: &::grain::GrainContext)
///         -> Result<DoworkResponse, ::grain::BoxError>;
/// }
/// ```
pub fn generate_service_trait(
    service: &ServiceDefinition,
    ctx: &RenderContext,
) -> Result<TokenStream, GeneratorError> {
    check_service_names(service)?;

    let runtime = &ctx.runtime;
    let names = ServiceNames::new(&service.name);
    let trait_ident = &names.service;
    let service_doc = match service.documentation.as_deref() {
        Some(doc) => doc_attrs(Some(doc)),
        None => {
            let line = format!(" Business logic of the `{}` grain.", service.name);
            quote! { #[doc = #line] }
        }
    };
    let deprecated = deprecated_attr(service.deprecated);

    let methods = service
        .methods
        .iter()
        .map(|method| {
            let ident = method_ident(&method.name);
            let input = type_tokens(&method.input_type)?;
            let output = type_tokens(&method.output_type)?;
            let docs = doc_attrs(method.documentation.as_deref());
            let deprecated = deprecated_attr(method.deprecated);

            Ok(if method.is_reentrant() {
                quote! {
                    #docs
                    #deprecated
                    fn #ident(
                        &mut self,
                        request: #input,
                        responder: #runtime::Responder<#output>,
                        ctx: &#runtime::GrainContext,
                    ) -> ::std::result::Result<(), #runtime::BoxError>;
                }
            } else {
                quote! {
                    #docs
                    #deprecated
                    fn #ident(
                        &mut self,
                        request: #input,
                        ctx: &#runtime::GrainContext,
                    ) -> ::std::result::Result<#output, #runtime::BoxError>;
                }
            })
        })
        .collect::<Result<Vec<_>, GeneratorError>>()?;

    Ok(quote! {
        #service_doc
        #deprecated
        pub trait #trait_ident: ::std::marker::Send + 'static {
            /// Called once per activation, before the first request.
            fn init(&mut self, _ctx: &#runtime::GrainContext) {}

            /// Called once when the activation stops.
            fn terminate(&mut self, _ctx: &#runtime::GrainContext) {}

            /// Receives messages that are not requests.
            fn receive_default(
                &mut self,
                _message: #runtime::UserMessage,
                _ctx: &#runtime::GrainContext,
            ) {
            }

            #(#methods)*
        }
    })
}
