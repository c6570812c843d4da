//! Client stub generation.
//!
//! The generated client addresses one identity of one kind. Every method
//! encodes the request with its stable index, sends it through the cluster,
//! and reads the tagged response:
//!
//! - a message of the expected type becomes `Ok(Some(response))`
//! - a wire error is converted back through the bridge into `Err`
//! - an empty response becomes `Ok(None)`
//! - a message of any other type is `GrainError::UnexpectedResponse`

use grain_define::{MethodDefinition, ServiceDefinition};
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};

use super::{
    RenderContext, ServiceNames, allow_deprecated, check_service_names, deprecated_attr,
    doc_attrs, method_ident, type_tokens,
};
use crate::errors::GeneratorError;

/// Generates `<Svc>GrainClient` for `service`.
pub fn generate_client(
    service: &ServiceDefinition,
    ctx: &RenderContext,
) -> Result<TokenStream, GeneratorError> {
    check_service_names(service)?;

    let runtime = &ctx.runtime;
    let names = ServiceNames::new(&service.name);
    let client = &names.client;
    let deprecated = deprecated_attr(service.deprecated);
    let allow = allow_deprecated(service.deprecated);
    let client_doc = format!(" Calls `{}` grains through a cluster.", service.name);

    let methods = service
        .methods
        .iter()
        .map(|method| client_method(method, &names, ctx))
        .collect::<Result<Vec<_>, GeneratorError>>()?;

    Ok(quote! {
        #[doc = #client_doc]
        #deprecated
        #[derive(Debug, Clone)]
        pub struct #client {
            cluster: #runtime::Cluster,
            identity: ::std::string::String,
            options: #runtime::CallOptions,
        }

        #allow
        impl #client {
            /// Creates a client for `identity`, using the cluster's default call options.
            ///
            /// ## Errors
            ///
            /// Fails immediately for an empty identity or a stopped cluster.
            pub fn new(
                cluster: &#runtime::Cluster,
                identity: impl ::std::convert::Into<::std::string::String>,
            ) -> ::std::result::Result<Self, #runtime::GrainError> {
                let identity = identity.into();
                cluster.check_client(&identity)?;
                ::std::result::Result::Ok(Self {
                    cluster: cluster.clone(),
                    identity,
                    options: cluster.config().call_options,
                })
            }

            pub fn with_options(mut self, options: #runtime::CallOptions) -> Self {
                self.options = options;
                self
            }

            pub fn identity(&self) -> &str {
                &self.identity
            }

            #(#methods)*
        }
    })
}

/// The call method, its optional `_future` twin, and the private decoder.
fn client_method(
    method: &MethodDefinition,
    names: &ServiceNames,
    ctx: &RenderContext,
) -> Result<TokenStream, GeneratorError> {
    let runtime = &ctx.runtime;
    let ServiceNames {
        kind_const,
        bridge_const,
        ..
    } = names;

    let ident = method_ident(&method.name);
    let decode_ident = format_ident!("decode_{}", ident.to_string().trim_start_matches("r#"));
    let index = Literal::u32_suffixed(method.index);
    let name = &method.name;
    let input = type_tokens(&method.input_type)?;
    let output = type_tokens(&method.output_type)?;
    let docs = doc_attrs(method.documentation.as_deref());
    let deprecated = deprecated_attr(method.deprecated);

    let future = method.future.then(|| {
        let future_ident = format_ident!("{}_future", ident.to_string().trim_start_matches("r#"));
        let future_doc = format!(" Sends `{name}` without waiting; await the returned future for the reply.");
        quote! {
            #[doc = #future_doc]
            ///
            /// ## Errors
            ///
            /// Fails immediately when the request cannot be routed.
            #deprecated
            pub fn #future_ident(
                &self,
                request: &#input,
            ) -> ::std::result::Result<#runtime::GrainFuture<#output>, #runtime::GrainError> {
                let message = #runtime::GrainRequest::from_message(#index, request);
                let pending = self
                    .cluster
                    .request_future(&self.identity, #kind_const, message, self.options)
                    .map_err(|source| #runtime::GrainError::request_future(#name, source))?;
                ::std::result::Result::Ok(pending.decode_with(Self::#decode_ident))
            }
        }
    });

    Ok(quote! {
        #docs
        #deprecated
        pub async fn #ident(
            &self,
            request: &#input,
        ) -> ::std::result::Result<::std::option::Option<#output>, #runtime::GrainError> {
            let message = #runtime::GrainRequest::from_message(#index, request);
            let response = self
                .cluster
                .request(&self.identity, #kind_const, message, &self.options)
                .await
                .map_err(|source| #runtime::GrainError::request(#name, source))?;
            Self::#decode_ident(response)
        }

        #future

        fn #decode_ident(
            response: #runtime::GrainResponse,
        ) -> ::std::result::Result<::std::option::Option<#output>, #runtime::GrainError> {
            match response.into_reply::<#output>()? {
                #runtime::GrainReply::Message(message) => ::std::result::Result::Ok(::std::option::Option::Some(message)),
                #runtime::GrainReply::WireError(err) => ::std::result::Result::Err(#runtime::bridge::from_wire(#bridge_const, err)),
                #runtime::GrainReply::Empty => ::std::result::Result::Ok(::std::option::Option::None),
                #runtime::GrainReply::Unexpected(type_name) => ::std::result::Result::Err(#runtime::GrainError::UnexpectedResponse(type_name)),
            }
        }
    })
}
