//! Generates `hello_grain.rs` into `OUT_DIR`.
//!
//! The descriptor mirrors what `protoc` would produce for:
//!
//! ```proto
//! package hello;
//!
//! // Greets people and counts work.
//! service Hello {
//!   // Says hello.
//!   rpc SayHello(SayHelloRequest) returns (SayHelloResponse) {
//!     option (grain.method) = { dispatch_mode: REENTRANT };
//!   }
//!   rpc Dowork(DoworkRequest) returns (DoworkResponse) {
//!     option (grain.method) = { future: true };
//!   }
//!   rpc Watch(DoworkRequest) returns (stream DoworkResponse);
//!   rpc Plain(DoworkRequest) returns (DoworkResponse);
//!   rpc Rest(DoworkRequest) returns (DoworkResponse) {
//!     option (grain.method) = { deactivation_timeout: { seconds: 2 } };
//!   }
//!   rpc Legacy(DoworkRequest) returns (DoworkResponse) {
//!     option deprecated = true;
//!     option (grain.method) = {};
//!   }
//! }
//!
//! enum ErrorReason {
//!   // The user does not exist.
//!   USER_NOT_FOUND = 0;
//!   QUOTA_EXCEEDED = 1;
//! }
//! ```

use std::env;
use std::path::PathBuf;

use grain_gen::config::GeneratorConfig;
use grain_gen::descriptor::{FileDescriptor, GrainMethodOptions, MethodDescriptor, ServiceDescriptor};
use grain_gen::extract::extract_file;
use grain_gen::output::{generate_file, write_atomic};
use prost_types::{EnumDescriptorProto, EnumValueDescriptorProto};

fn unary(name: &str, input: &str, output: &str) -> MethodDescriptor {
    MethodDescriptor::new(name, format!(".hello.{input}"), format!(".hello.{output}"))
}

fn reason(name: &str, number: i32) -> EnumValueDescriptorProto {
    EnumValueDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        ..Default::default()
    }
}

fn hello_descriptor() -> FileDescriptor {
    let service = ServiceDescriptor::new("Hello")
        .with_method(
            unary("SayHello", "SayHelloRequest", "SayHelloResponse")
                .with_grain_options(&GrainMethodOptions::reentrant()),
        )
        .with_method(
            unary("Dowork", "DoworkRequest", "DoworkResponse")
                .with_grain_options(&GrainMethodOptions::blocking().with_future(true)),
        )
        .with_method(
            unary("Watch", "DoworkRequest", "DoworkResponse")
                .with_grain_options(&GrainMethodOptions::blocking())
                .with_streaming(false, true),
        )
        .with_method(unary("Plain", "DoworkRequest", "DoworkResponse"))
        .with_method(
            unary("Rest", "DoworkRequest", "DoworkResponse")
                .with_grain_options(&GrainMethodOptions::blocking().with_deactivation_timeout(2, 0)),
        )
        .with_method(
            unary("Legacy", "DoworkRequest", "DoworkResponse")
                .with_grain_options(&GrainMethodOptions::blocking())
                .with_deprecated(true),
        );

    FileDescriptor::new("hello.proto", "hello")
        .with_service(service)
        .with_enum(EnumDescriptorProto {
            name: Some("ErrorReason".to_string()),
            value: vec![reason("USER_NOT_FOUND", 0), reason("QUOTA_EXCEEDED", 1)],
            ..Default::default()
        })
        .with_comment(vec![6, 0], Some(" Greets people and counts work.\n"), None)
        .with_comment(vec![6, 0, 2, 0], Some(" Says hello.\n"), None)
        .with_comment(vec![5, 0, 2, 0], Some(" The user does not exist.\n"), None)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let definition = extract_file(&hello_descriptor())?;
    let unit = generate_file(&definition, &GeneratorConfig::default(), None)?
        .ok_or("hello.proto produced no grain unit")?;

    write_atomic(&out_dir.join(&unit.name), &unit.content)?;
    Ok(())
}
