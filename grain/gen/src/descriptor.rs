//! Wire-level descriptor messages read by the generator.
//!
//! These mirror the subset of `google/protobuf/descriptor.proto` and
//! `google/protobuf/compiler/plugin.proto` that generation needs. prost drops
//! unknown fields on decode, so `prost_types::MethodOptions` would lose the
//! grain extension; [`MethodOptions`] instead declares the extension field
//! and keeps its bytes for [`GrainMethodOptions`] to decode later.
//!
//! The builder helpers exist for tests and for build scripts that construct
//! descriptors without running `protoc`.

use prost::Message;
use prost_types::SourceCodeInfo;
use prost_types::compiler::Version;

/// Field number of the grain extension on `google.protobuf.MethodOptions`.
pub const GRAIN_EXTENSION_FIELD: u32 = 50001;

/// Field numbers used in `SourceCodeInfo` location paths.
pub mod path {
    pub const FILE_ENUM_TYPE: i32 = 5;
    pub const FILE_SERVICE: i32 = 6;
    pub const ENUM_VALUE: i32 = 2;
    pub const SERVICE_METHOD: i32 = 2;
}

/// `google.protobuf.compiler.CodeGeneratorRequest`
#[derive(Clone, PartialEq, Message)]
pub struct CodeGeneratorRequest {
    #[prost(string, repeated, tag = "1")]
    pub file_to_generate: Vec<String>,
    #[prost(string, optional, tag = "2")]
    pub parameter: Option<String>,
    #[prost(message, optional, tag = "3")]
    pub compiler_version: Option<Version>,
    #[prost(message, repeated, tag = "15")]
    pub proto_file: Vec<FileDescriptor>,
}

/// `google.protobuf.FileDescriptorSet`, as written by `protoc --descriptor_set_out`.
#[derive(Clone, PartialEq, Message)]
pub struct FileDescriptorSet {
    #[prost(message, repeated, tag = "1")]
    pub file: Vec<FileDescriptor>,
}

/// `google.protobuf.FileDescriptorProto`
#[derive(Clone, PartialEq, Message)]
pub struct FileDescriptor {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub package: Option<String>,
    #[prost(message, repeated, tag = "5")]
    pub enum_type: Vec<prost_types::EnumDescriptorProto>,
    #[prost(message, repeated, tag = "6")]
    pub service: Vec<ServiceDescriptor>,
    #[prost(message, optional, tag = "8")]
    pub options: Option<FileOptions>,
    #[prost(message, optional, tag = "9")]
    pub source_code_info: Option<SourceCodeInfo>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FileOptions {
    #[prost(bool, optional, tag = "23")]
    pub deprecated: Option<bool>,
}

/// `google.protobuf.ServiceDescriptorProto`
#[derive(Clone, PartialEq, Message)]
pub struct ServiceDescriptor {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    pub method: Vec<MethodDescriptor>,
    #[prost(message, optional, tag = "3")]
    pub options: Option<ServiceOptions>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ServiceOptions {
    #[prost(bool, optional, tag = "33")]
    pub deprecated: Option<bool>,
}

/// `google.protobuf.MethodDescriptorProto`
#[derive(Clone, PartialEq, Message)]
pub struct MethodDescriptor {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub input_type: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub output_type: Option<String>,
    #[prost(message, optional, tag = "4")]
    pub options: Option<MethodOptions>,
    #[prost(bool, optional, tag = "5")]
    pub client_streaming: Option<bool>,
    #[prost(bool, optional, tag = "6")]
    pub server_streaming: Option<bool>,
}

/// `google.protobuf.MethodOptions` plus the raw grain extension.
#[derive(Clone, PartialEq, Message)]
pub struct MethodOptions {
    #[prost(bool, optional, tag = "33")]
    pub deprecated: Option<bool>,
    /// Encoded [`GrainMethodOptions`], when the method carries the extension.
    #[prost(bytes = "vec", optional, tag = "50001")]
    pub grain: Option<Vec<u8>>,
}

/// Payload of the `(grain.method)` extension.
///
/// ```proto
/// extend google.protobuf.MethodOptions {
///   GrainMethodOptions method = 50001;
/// }
/// ```
#[derive(Clone, PartialEq, Message)]
pub struct GrainMethodOptions {
    #[prost(enumeration = "DispatchModeOption", tag = "1")]
    pub dispatch_mode: i32,
    #[prost(bool, tag = "2")]
    pub future: bool,
    #[prost(message, optional, tag = "3")]
    pub deactivation_timeout: Option<prost_types::Duration>,
}

/// `grain.DispatchMode` as declared in `grain/options.proto`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DispatchModeOption {
    Blocking = 0,
    Reentrant = 1,
}

impl GrainMethodOptions {
    pub fn blocking() -> Self {
        Self::default()
    }

    pub fn reentrant() -> Self {
        Self {
            dispatch_mode: DispatchModeOption::Reentrant as i32,
            ..Self::default()
        }
    }

    pub fn with_future(mut self, future: bool) -> Self {
        self.future = future;
        self
    }

    pub fn with_deactivation_timeout(mut self, seconds: i64, nanos: i32) -> Self {
        self.deactivation_timeout = Some(prost_types::Duration { seconds, nanos });
        self
    }
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            package: Some(package.into()),
            ..Self::default()
        }
    }

    pub fn with_service(mut self, service: ServiceDescriptor) -> Self {
        self.service.push(service);
        self
    }

    pub fn with_enum(mut self, enum_type: prost_types::EnumDescriptorProto) -> Self {
        self.enum_type.push(enum_type);
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.options = Some(FileOptions {
            deprecated: Some(deprecated),
        });
        self
    }

    /// Attaches a leading and trailing comment to the element at `path`.
    pub fn with_comment(
        mut self,
        path: Vec<i32>,
        leading: Option<&str>,
        trailing: Option<&str>,
    ) -> Self {
        let info = self.source_code_info.get_or_insert_with(SourceCodeInfo::default);
        info.location.push(prost_types::source_code_info::Location {
            path,
            leading_comments: leading.map(str::to_string),
            trailing_comments: trailing.map(str::to_string),
            ..Default::default()
        });
        self
    }

    pub fn is_deprecated(&self) -> bool {
        self.options
            .as_ref()
            .and_then(|o| o.deprecated)
            .unwrap_or(false)
    }
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.method.push(method);
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.options = Some(ServiceOptions {
            deprecated: Some(deprecated),
        });
        self
    }

    pub fn is_deprecated(&self) -> bool {
        self.options
            .as_ref()
            .and_then(|o| o.deprecated)
            .unwrap_or(false)
    }
}

impl MethodDescriptor {
    /// A unary method. Type names are fully qualified (`.hello.SayHelloRequest`).
    pub fn new(
        name: impl Into<String>,
        input_type: impl Into<String>,
        output_type: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            input_type: Some(input_type.into()),
            output_type: Some(output_type.into()),
            ..Self::default()
        }
    }

    pub fn with_grain_options(self, options: &GrainMethodOptions) -> Self {
        self.with_raw_grain_options(options.encode_to_vec())
    }

    /// Stores extension bytes as-is, valid or not.
    pub fn with_raw_grain_options(mut self, bytes: Vec<u8>) -> Self {
        self.options.get_or_insert_with(MethodOptions::default).grain = Some(bytes);
        self
    }

    pub fn with_streaming(mut self, client: bool, server: bool) -> Self {
        self.client_streaming = Some(client);
        self.server_streaming = Some(server);
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.options.get_or_insert_with(MethodOptions::default).deprecated = Some(deprecated);
        self
    }

    pub fn is_streaming(&self) -> bool {
        self.client_streaming.unwrap_or(false) || self.server_streaming.unwrap_or(false)
    }

    pub fn is_deprecated(&self) -> bool {
        self.options
            .as_ref()
            .and_then(|o| o.deprecated)
            .unwrap_or(false)
    }

    /// Raw extension bytes, if the method carries `(grain.method)`.
    pub fn grain_extension(&self) -> Option<&[u8]> {
        self.options.as_ref()?.grain.as_deref()
    }
}
