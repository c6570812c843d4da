//! Dispatching actor and kind constructor generation.
//!
//! The generated actor is the glue between the runtime's life-cycle messages
//! and the business trait:
//!
//! | Message | Action |
//! |---------|--------|
//! | `Init` | build the business object, call `init`, arm the idle timeout |
//! | `ReceiveTimeout` | poison the activation |
//! | `Stopped` | call `terminate` |
//! | `Request` | decode and dispatch on the method index |
//! | `User` | call `receive_default` |

use grain_define::{MethodDefinition, ServiceDefinition};
use proc_macro2::{Literal, TokenStream};
use quote::quote;

use super::{
    RenderContext, ServiceNames, allow_deprecated, duration_tokens, method_ident, type_tokens,
};
use crate::errors::GeneratorError;

/// Generates the `<Svc>Actor<G>` struct and its `Actor` implementation.
pub fn generate_actor(
    service: &ServiceDefinition,
    ctx: &RenderContext,
) -> Result<TokenStream, GeneratorError> {
    let runtime = &ctx.runtime;
    let names = ServiceNames::new(&service.name);
    let ServiceNames {
        service: trait_ident,
        actor,
        kind_const,
        bridge_const,
        ..
    } = &names;

    let arms = service
        .methods
        .iter()
        .map(|method| dispatch_arm(method, &names, ctx))
        .collect::<Result<Vec<_>, GeneratorError>>()?;

    let allow = allow_deprecated(service.deprecated);
    let actor_doc = format!(
        " Runs a [`{}`] implementation inside a grain activation.",
        trait_ident
    );

    Ok(quote! {
        #[doc = #actor_doc]
        #allow
        pub struct #actor<G: #trait_ident> {
            factory: ::std::sync::Arc<dyn Fn() -> G + ::std::marker::Send + ::std::marker::Sync>,
            inner: ::std::option::Option<G>,
            timeout: ::std::time::Duration,
        }

        #allow
        impl<G: #trait_ident> #actor<G> {
            /// A zero `timeout` disables idle deactivation.
            pub fn new(
                factory: ::std::sync::Arc<dyn Fn() -> G + ::std::marker::Send + ::std::marker::Sync>,
                timeout: ::std::time::Duration,
            ) -> Self {
                Self {
                    factory,
                    inner: ::std::option::Option::None,
                    timeout,
                }
            }

            #[allow(deprecated)]
            fn dispatch(&mut self, ctx: &mut #runtime::ActorContext, request: #runtime::GrainRequest) {
                let ::std::option::Option::Some(inner) = self.inner.as_mut() else {
                    ctx.respond(#runtime::bridge::encode(
                        #bridge_const,
                        #runtime::GrainErrorResponse::new(
                            #runtime::ErrorReason::Unavailable,
                            "grain is not initialized",
                        ),
                    ));
                    return;
                };

                match request.method_index {
                    #(#arms)*
                    index => {
                        ctx.respond(#runtime::bridge::unimplemented(#bridge_const, #kind_const, index));
                    }
                }
            }
        }

        #allow
        impl<G: #trait_ident> #runtime::Actor for #actor<G> {
            fn receive(&mut self, ctx: &mut #runtime::ActorContext, message: #runtime::Message) {
                match message {
                    #runtime::Message::Init => {
                        let mut inner = (self.factory)();
                        inner.init(ctx.grain());
                        self.inner = ::std::option::Option::Some(inner);
                        if !self.timeout.is_zero() {
                            ctx.set_receive_timeout(self.timeout);
                        }
                    }
                    #runtime::Message::ReceiveTimeout => ctx.poison(),
                    #runtime::Message::Stopped => {
                        if let ::std::option::Option::Some(inner) = self.inner.as_mut() {
                            inner.terminate(ctx.grain());
                        }
                    }
                    #runtime::Message::Request(request) => self.dispatch(ctx, request),
                    #runtime::Message::User(message) => {
                        if let ::std::option::Option::Some(inner) = self.inner.as_mut() {
                            inner.receive_default(message, ctx.grain());
                        }
                    }
                }
            }
        }
    })
}

/// One `match` arm of the dispatcher.
fn dispatch_arm(
    method: &MethodDefinition,
    names: &ServiceNames,
    ctx: &RenderContext,
) -> Result<TokenStream, GeneratorError> {
    let runtime = &ctx.runtime;
    let bridge_const = &names.bridge_const;
    let index = Literal::u32_suffixed(method.index);
    let ident = method_ident(&method.name);
    let input = type_tokens(&method.input_type)?;
    let output = type_tokens(&method.output_type)?;
    let decode_failed = format!(
        "[Grain] {}({}) failed to decode request",
        method.name, method.input_type
    );

    let invoke = if method.is_reentrant() {
        quote! {
            let responder = ctx.responder::<#output>(#bridge_const);
            if let ::std::result::Result::Err(err) = inner.#ident(message, responder, ctx.grain()) {
                ctx.respond(#runtime::bridge::to_wire(#bridge_const, err));
            }
        }
    } else {
        quote! {
            match inner.#ident(message, ctx.grain()) {
                ::std::result::Result::Ok(response) => {
                    ctx.respond(#runtime::GrainResponse::message(&response));
                }
                ::std::result::Result::Err(err) => {
                    ctx.respond(#runtime::bridge::to_wire(#bridge_const, err));
                }
            }
        }
    };

    let rearm = method.deactivation_timeout.map(|timeout| {
        let timeout = duration_tokens(timeout);
        quote! { ctx.set_receive_timeout(#timeout); }
    });

    Ok(quote! {
        #index => {
            let message = match request.decode::<#input>() {
                ::std::result::Result::Ok(message) => message,
                ::std::result::Result::Err(err) => {
                    #runtime::__private::tracing::error!(
                        grain = %ctx.grain().cluster_identity(),
                        error = %err,
                        #decode_failed
                    );
                    ctx.respond(#runtime::bridge::invalid_argument(#bridge_const, &request.payload, &err));
                    return;
                }
            };
            #invoke
            #rearm
        }
    })
}

/// Generates the kind name, bridge version and kind constructors.
///
/// ## Generated Code
///
/// ```ignore
/// pub const HELLO_KIND: &str = "Hello";
/// pub const HELLO_BRIDGE: ::grain::BridgeVersion = ::grain::BridgeVersion::V2;
///
/// pub fn hello_kind<G, F>(factory: F) -> ::grain::Kind { .. }
/// pub fn new_hello_kind<G, F>(factory: F, timeout: Duration) -> ::grain::Kind { .. }
/// pub fn register_hello_kind<G, F>(registry: &mut ::grain::KindRegistry, factory: F)
///     -> Option<::grain::Kind> { .. }
/// ```
pub fn generate_kind_functions(service: &ServiceDefinition, ctx: &RenderContext) -> TokenStream {
    let runtime = &ctx.runtime;
    let ServiceNames {
        service: trait_ident,
        actor,
        kind_const,
        bridge_const,
        kind_fn,
        new_kind_fn,
        register_fn,
        ..
    } = ServiceNames::new(&service.name);
    let kind_name = &service.name;
    let allow = allow_deprecated(service.deprecated);
    let bridge = ctx.bridge_tokens();
    let default_timeout = duration_tokens(ctx.default_timeout);

    let kind_doc = format!(" Kind name `{}` grains are registered under.", kind_name);
    let bridge_doc = format!(" Wire error shape spoken by `{}` actors and clients.", kind_name);
    let kind_fn_doc = format!(
        " Builds the `{}` kind with the default idle timeout ({:?}).",
        kind_name, ctx.default_timeout
    );

    quote! {
        #[doc = #kind_doc]
        pub const #kind_const: &str = #kind_name;

        #[doc = #bridge_doc]
        pub const #bridge_const: #runtime::BridgeVersion = #bridge;

        #[doc = #kind_fn_doc]
        #allow
        pub fn #kind_fn<G, F>(factory: F) -> #runtime::Kind
        where
            G: #trait_ident,
            F: Fn() -> G + ::std::marker::Send + ::std::marker::Sync + 'static,
        {
            #new_kind_fn(factory, #default_timeout)
        }

        /// Builds the kind with an explicit idle timeout. Zero disables deactivation.
        #allow
        pub fn #new_kind_fn<G, F>(factory: F, timeout: ::std::time::Duration) -> #runtime::Kind
        where
            G: #trait_ident,
            F: Fn() -> G + ::std::marker::Send + ::std::marker::Sync + 'static,
        {
            let factory: ::std::sync::Arc<dyn Fn() -> G + ::std::marker::Send + ::std::marker::Sync> =
                ::std::sync::Arc::new(factory);
            #runtime::Kind::new(#kind_const, move || {
                let actor: ::std::boxed::Box<dyn #runtime::Actor> =
                    ::std::boxed::Box::new(#actor::new(::std::sync::Arc::clone(&factory), timeout));
                actor
            })
        }

        /// Registers the kind with the default idle timeout, returning any kind it replaced.
        #allow
        pub fn #register_fn<G, F>(
            registry: &mut #runtime::KindRegistry,
            factory: F,
        ) -> ::std::option::Option<#runtime::Kind>
        where
            G: #trait_ident,
            F: Fn() -> G + ::std::marker::Send + ::std::marker::Sync + 'static,
        {
            registry.register(#kind_fn(factory))
        }
    }
}
