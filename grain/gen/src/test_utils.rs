//! Shared test utilities for grain-gen tests.
//!
//! Descriptor fixtures built in code, so unit tests never need `protoc`.

use grain_define::{DispatchMode, FileDefinition, MethodDefinition, ServiceDefinition};
use prost_types::{EnumDescriptorProto, EnumValueDescriptorProto};

use crate::descriptor::{FileDescriptor, GrainMethodOptions, MethodDescriptor, ServiceDescriptor};

/// A unary method on `.hello.<Name>Request` / `.hello.<Name>Response`
/// carrying the grain extension.
pub fn annotated(name: &str, options: GrainMethodOptions) -> MethodDescriptor {
    MethodDescriptor::new(
        name,
        format!(".hello.{name}Request"),
        format!(".hello.{name}Response"),
    )
    .with_grain_options(&options)
}

/// `hello.proto` with one `Hello` service:
///
/// | index | method | grain options |
/// |-------|--------|---------------|
/// | 0 | SayHello | reentrant |
/// | 1 | Dowork | blocking, future |
/// | 2 | Watch | server streaming (skipped) |
/// | 3 | Plain | none (skipped) |
///
/// plus an `ErrorReason` enum with `USER_NOT_FOUND = 0`.
pub fn hello_file() -> FileDescriptor {
    FileDescriptor::new("hello.proto", "hello")
        .with_service(
            ServiceDescriptor::new("Hello")
                .with_method(annotated("SayHello", GrainMethodOptions::reentrant()))
                .with_method(annotated("Dowork", GrainMethodOptions::blocking().with_future(true)))
                .with_method(
                    annotated("Watch", GrainMethodOptions::blocking()).with_streaming(false, true),
                )
                .with_method(MethodDescriptor::new("Plain", ".hello.PlainRequest", ".hello.PlainResponse")),
        )
        .with_enum(EnumDescriptorProto {
            name: Some("ErrorReason".to_string()),
            value: vec![EnumValueDescriptorProto {
                name: Some("USER_NOT_FOUND".to_string()),
                number: Some(0),
                ..Default::default()
            }],
            ..Default::default()
        })
        .with_comment(vec![6, 0], Some(" Greets people.\n"), None)
        .with_comment(vec![6, 0, 2, 0], Some(" Says hello.\n"), None)
        .with_comment(vec![5, 0, 2, 0], Some(" The user does not exist.\n"), None)
}

/// A service definition with one method per dispatch mode.
pub fn make_service(name: &str) -> ServiceDefinition {
    ServiceDefinition::new(
        name,
        vec![
            MethodDefinition::new("SayHello", "SayHelloRequest", "SayHelloResponse", 0)
                .with_dispatch_mode(DispatchMode::Reentrant),
            MethodDefinition::new("Dowork", "DoworkRequest", "DoworkResponse", 2).with_future(true),
        ],
    )
    .expect("valid fixture")
}

pub fn make_file(services: Vec<ServiceDefinition>) -> FileDefinition {
    FileDefinition {
        path: "hello.proto".to_string(),
        package: "hello".to_string(),
        deprecated: false,
        services,
        error_reasons: None,
    }
}

/// Drops all whitespace so assertions survive prettyplease line breaking.
pub fn squash(code: &str) -> String {
    code.split_whitespace().collect()
}
