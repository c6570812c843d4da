//! Descriptor and option extraction.
//!
//! Turns wire descriptors into the `grain-define` model. This is the only
//! place that looks at descriptors; everything downstream renders from
//! [`FileDefinition`].
//!
//! ## Method indices
//!
//! A method's wire index is its position in the service's *full* method
//! list. Streaming and unannotated methods are skipped but still consume an
//! index, so adding or removing grain annotations never renumbers the
//! methods that stay.

use std::collections::HashMap;
use std::time::Duration;

use grain_define::naming::to_snake;
use grain_define::{
    DispatchMode, ERROR_REASON_ENUM, ErrorReasonCatalog, ErrorReasonEntry, FileDefinition,
    MethodDefinition, ServiceDefinition,
};
use prost::Message;
use prost_types::source_code_info::Location;
use tracing::{debug, warn};

use crate::descriptor::{
    DispatchModeOption, FileDescriptor, GrainMethodOptions, MethodDescriptor, ServiceDescriptor,
    path,
};
use crate::errors::GeneratorError;

/// Leading and trailing comments keyed by `SourceCodeInfo` path.
#[derive(Debug, Default)]
pub struct Comments<'a> {
    locations: HashMap<&'a [i32], &'a Location>,
}

impl<'a> Comments<'a> {
    pub fn new(file: &'a FileDescriptor) -> Self {
        let locations = file
            .source_code_info
            .iter()
            .flat_map(|info| info.location.iter())
            .map(|location| (location.path.as_slice(), location))
            .collect();
        Self { locations }
    }

    /// Leading comment at `path`, trimmed. Empty comments count as absent.
    pub fn leading(&self, path: &[i32]) -> Option<String> {
        self.locations
            .get(path)
            .and_then(|l| l.leading_comments.as_deref())
            .and_then(clean_comment)
    }

    /// Leading comment, falling back to the trailing one.
    pub fn leading_or_trailing(&self, path: &[i32]) -> Option<String> {
        self.leading(path).or_else(|| {
            self.locations
                .get(path)
                .and_then(|l| l.trailing_comments.as_deref())
                .and_then(clean_comment)
        })
    }
}

fn clean_comment(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw
        .lines()
        .map(|line| line.strip_prefix(' ').unwrap_or(line).trim_end())
        .collect();
    let joined = lines.join("\n");
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Decodes the `(grain.method)` extension of `method`.
///
/// Returns `None` for an absent extension and for a malformed one: bytes
/// that do not decode or an unknown dispatch mode.
pub fn read_grain_options(method: &MethodDescriptor) -> Option<GrainMethodOptions> {
    let bytes = method.grain_extension()?;
    let options = match GrainMethodOptions::decode(bytes) {
        Ok(options) => options,
        Err(err) => {
            warn!(method = method.name(), error = %err, "malformed grain extension; method skipped");
            return None;
        }
    };
    if DispatchModeOption::try_from(options.dispatch_mode).is_err() {
        warn!(
            method = method.name(),
            dispatch_mode = options.dispatch_mode,
            "unknown dispatch mode; method skipped"
        );
        return None;
    }
    Some(options)
}

/// Converts a proto `Duration` into a positive `Duration`.
fn positive_duration(duration: &prost_types::Duration) -> Option<Duration> {
    if duration.seconds < 0 || duration.nanos < 0 || (duration.seconds == 0 && duration.nanos == 0)
    {
        return None;
    }
    let seconds = u64::try_from(duration.seconds).ok()?;
    let nanos = u32::try_from(duration.nanos).ok()?;
    Some(Duration::new(seconds, nanos))
}

/// Collects the grain methods of `service`.
///
/// Streaming methods and methods without the grain extension are skipped.
/// The surviving methods keep their full-list position as wire index.
///
/// ## Errors
///
/// Returns [`GeneratorError::ParseError`] if a method has no name or types.
pub fn extract_methods(
    service: &ServiceDescriptor,
    package: &str,
    comments: &Comments<'_>,
    service_index: usize,
) -> Result<Vec<MethodDefinition>, GeneratorError> {
    let mut methods = Vec::new();

    for (position, method) in service.method.iter().enumerate() {
        let name = method.name();
        if method.is_streaming() {
            debug!(service = service.name(), method = name, "streaming method skipped");
            continue;
        }
        let Some(options) = read_grain_options(method) else {
            debug!(service = service.name(), method = name, "no grain extension; method skipped");
            continue;
        };

        let index = u32::try_from(position).map_err(|_| {
            GeneratorError::ParseError(format!("service '{}' has too many methods", service.name()))
        })?;
        let input = method.input_type.as_deref().ok_or_else(|| missing(service, name, "input type"))?;
        let output = method
            .output_type
            .as_deref()
            .ok_or_else(|| missing(service, name, "output type"))?;

        let dispatch_mode = match DispatchModeOption::try_from(options.dispatch_mode) {
            Ok(DispatchModeOption::Reentrant) => DispatchMode::Reentrant,
            _ => DispatchMode::Blocking,
        };

        let mut definition = MethodDefinition::new(
            name,
            resolve_type_path(input, package),
            resolve_type_path(output, package),
            index,
        )
        .with_dispatch_mode(dispatch_mode)
        .with_future(options.future);

        if let Some(timeout) = options.deactivation_timeout.as_ref() {
            match positive_duration(timeout) {
                Some(timeout) => definition = definition.with_deactivation_timeout(timeout),
                None => debug!(method = name, "non-positive deactivation timeout ignored"),
            }
        }

        let method_path = [
            path::FILE_SERVICE,
            service_index as i32,
            path::SERVICE_METHOD,
            position as i32,
        ];
        if let Some(doc) = comments.leading(&method_path) {
            definition = definition.with_documentation(doc);
        }
        definition.deprecated = method.is_deprecated();

        methods.push(definition);
    }

    Ok(methods)
}

fn missing(service: &ServiceDescriptor, method: &str, what: &str) -> GeneratorError {
    GeneratorError::ParseError(format!(
        "method '{}.{}' has no {}",
        service.name(),
        method,
        what
    ))
}

/// Builds the grain service for the service at `service_index` of `file`.
///
/// Returns `Ok(None)` when no method survives extraction.
pub fn extract_service(
    file: &FileDescriptor,
    service_index: usize,
    comments: &Comments<'_>,
) -> Result<Option<ServiceDefinition>, GeneratorError> {
    let Some(service) = file.service.get(service_index) else {
        return Ok(None);
    };

    let methods = extract_methods(service, file.package(), comments, service_index)?;
    if methods.is_empty() {
        debug!(service = service.name(), "no grain methods; service skipped");
        return Ok(None);
    }

    let mut definition =
        ServiceDefinition::new(service.name(), methods)?.with_deprecated(service.is_deprecated());
    if let Some(doc) = comments.leading(&[path::FILE_SERVICE, service_index as i32]) {
        definition = definition.with_documentation(doc);
    }
    Ok(Some(definition))
}

/// Reads the file's top-level `ErrorReason` enum, if it has one.
///
/// Each entry's documentation is its leading comment, or the trailing comment
/// when there is no leading one.
pub fn extract_error_reasons(
    file: &FileDescriptor,
    comments: &Comments<'_>,
) -> Result<Option<ErrorReasonCatalog>, GeneratorError> {
    let Some((enum_index, reasons)) = file
        .enum_type
        .iter()
        .enumerate()
        .find(|(_, e)| e.name() == ERROR_REASON_ENUM)
    else {
        return Ok(None);
    };

    let entries = reasons
        .value
        .iter()
        .enumerate()
        .map(|(value_index, value)| {
            let entry = ErrorReasonEntry::new(value.name(), value.number());
            let value_path = [
                path::FILE_ENUM_TYPE,
                enum_index as i32,
                path::ENUM_VALUE,
                value_index as i32,
            ];
            match comments.leading_or_trailing(&value_path) {
                Some(doc) => entry.with_documentation(doc),
                None => entry,
            }
        })
        .collect();

    Ok(Some(ErrorReasonCatalog::new(entries)?))
}

/// Builds the complete model for one input file.
///
/// ## Errors
///
/// Fails on a nameless file, a malformed method, or a definition invariant
/// violation (duplicate method index, empty names).
pub fn extract_file(file: &FileDescriptor) -> Result<FileDefinition, GeneratorError> {
    if file.name().is_empty() {
        return Err(GeneratorError::ParseError("file descriptor has no name".to_string()));
    }
    let comments = Comments::new(file);

    let mut services = Vec::new();
    for index in 0..file.service.len() {
        if let Some(service) = extract_service(file, index, &comments)? {
            services.push(service);
        }
    }

    Ok(FileDefinition {
        path: file.name().to_string(),
        package: file.package().to_string(),
        deprecated: file.is_deprecated(),
        services,
        error_reasons: extract_error_reasons(file, &comments)?,
    })
}

/// Resolves a fully qualified proto type name to a Rust path relative to the
/// module generated for `package`, following prost-build's layout.
///
/// ## Examples
///
/// ```
/// use grain_gen::extract::resolve_type_path;
///
/// assert_eq!(resolve_type_path(".hello.SayHelloRequest", "hello"), "SayHelloRequest");
/// assert_eq!(resolve_type_path(".hello.Outer.Inner", "hello"), "outer::Inner");
/// assert_eq!(resolve_type_path(".common.v1.Id", "hello"), "super::common::v1::Id");
/// assert_eq!(resolve_type_path(".google.protobuf.Timestamp", "hello"), "::prost_types::Timestamp");
/// ```
pub fn resolve_type_path(type_name: &str, package: &str) -> String {
    let name = type_name.trim_start_matches('.');

    if let Some(well_known) = name.strip_prefix("google.protobuf.") {
        return format!("::prost_types::{well_known}");
    }

    let local = if package.is_empty() {
        Some(name)
    } else {
        name.strip_prefix(package).and_then(|rest| rest.strip_prefix('.'))
    };

    if let Some(local) = local {
        return message_path(&local.split('.').collect::<Vec<_>>());
    }

    let depth = if package.is_empty() {
        0
    } else {
        package.split('.').count()
    };
    let parts: Vec<&str> = name.split('.').collect();
    // Package segments are the leading lowercase ones.
    let package_len = parts
        .iter()
        .take(parts.len().saturating_sub(1))
        .take_while(|part| part.starts_with(|c: char| c.is_lowercase()))
        .count();

    let mut segments: Vec<String> = std::iter::repeat_n("super".to_string(), depth).collect();
    segments.extend(parts[..package_len].iter().map(|part| to_snake(part)));
    segments.push(message_path(&parts[package_len..]));
    segments.join("::")
}

/// `["Outer", "Inner"]` becomes `outer::Inner`.
fn message_path(parts: &[&str]) -> String {
    match parts.split_last() {
        Some((last, parents)) => parents
            .iter()
            .map(|parent| to_snake(parent))
            .chain(std::iter::once(last.to_string()))
            .collect::<Vec<_>>()
            .join("::"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{annotated, hello_file};
    use prost_types::{EnumDescriptorProto, EnumValueDescriptorProto};
    use tracing_test::traced_test;

    fn reason_enum(values: &[(&str, i32)]) -> EnumDescriptorProto {
        EnumDescriptorProto {
            name: Some(ERROR_REASON_ENUM.to_string()),
            value: values
                .iter()
                .map(|(name, number)| EnumValueDescriptorProto {
                    name: Some(name.to_string()),
                    number: Some(*number),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    // === extract_methods ===

    #[test]
    fn indices_count_skipped_methods() {
        let service = ServiceDescriptor::new("Hello")
            .with_method(annotated("A", GrainMethodOptions::blocking()))
            .with_method(MethodDescriptor::new("Stream", ".hello.A", ".hello.A").with_streaming(false, true))
            .with_method(MethodDescriptor::new("Plain", ".hello.A", ".hello.A"))
            .with_method(annotated("B", GrainMethodOptions::reentrant()));

        let methods = extract_methods(&service, "hello", &Comments::default(), 0).unwrap();

        let names: Vec<_> = methods.iter().map(|m| (m.name.as_str(), m.index)).collect();
        assert_eq!(names, vec![("A", 0), ("B", 3)]);
        assert_eq!(methods[1].dispatch_mode, DispatchMode::Reentrant);
    }

    #[test]
    fn annotated_streaming_method_is_still_skipped() {
        let service = ServiceDescriptor::new("Hello").with_method(
            annotated("Watch", GrainMethodOptions::blocking()).with_streaming(true, true),
        );
        assert!(extract_methods(&service, "hello", &Comments::default(), 0).unwrap().is_empty());
    }

    #[test]
    #[traced_test]
    fn malformed_extension_is_treated_as_unannotated() {
        let service = ServiceDescriptor::new("Hello")
            .with_method(
                MethodDescriptor::new("Broken", ".hello.A", ".hello.A")
                    .with_raw_grain_options(vec![0xff, 0xff, 0xff]),
            )
            .with_method(annotated("Ok", GrainMethodOptions::blocking()));

        let methods = extract_methods(&service, "hello", &Comments::default(), 0).unwrap();

        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].index, 1);
        assert!(logs_contain("malformed grain extension"));
    }

    #[test]
    fn unknown_dispatch_mode_is_malformed() {
        let options = GrainMethodOptions {
            dispatch_mode: 7,
            ..GrainMethodOptions::default()
        };
        let method = annotated("Odd", options);
        assert!(read_grain_options(&method).is_none());
    }

    #[test]
    fn future_flag_and_timeout_are_carried() {
        let service = ServiceDescriptor::new("Hello").with_method(annotated(
            "Slow",
            GrainMethodOptions::blocking()
                .with_future(true)
                .with_deactivation_timeout(5, 500_000_000),
        ));

        let method = &extract_methods(&service, "hello", &Comments::default(), 0).unwrap()[0];
        assert!(method.future);
        assert_eq!(method.deactivation_timeout, Some(Duration::from_millis(5500)));
    }

    #[test]
    fn non_positive_timeout_is_ignored() {
        let service = ServiceDescriptor::new("Hello")
            .with_method(annotated("Zero", GrainMethodOptions::blocking().with_deactivation_timeout(0, 0)))
            .with_method(annotated("Neg", GrainMethodOptions::blocking().with_deactivation_timeout(-3, 0)));

        let methods = extract_methods(&service, "hello", &Comments::default(), 0).unwrap();
        assert!(methods.iter().all(|m| m.deactivation_timeout.is_none()));
    }

    #[test]
    fn method_without_types_is_an_error() {
        let mut method = annotated("NoTypes", GrainMethodOptions::blocking());
        method.input_type = None;
        let service = ServiceDescriptor::new("Hello").with_method(method);

        let err = extract_methods(&service, "hello", &Comments::default(), 0).unwrap_err();
        assert!(err.to_string().contains("Hello.NoTypes"), "got: {err}");
    }

    // === extract_service / extract_file ===

    #[test]
    fn service_without_grain_methods_is_dropped() {
        let file = FileDescriptor::new("plain.proto", "plain").with_service(
            ServiceDescriptor::new("Plain").with_method(MethodDescriptor::new("A", ".plain.A", ".plain.A")),
        );
        let definition = extract_file(&file).unwrap();
        assert!(!definition.has_services());
    }

    #[test]
    fn hello_file_extracts_services_and_comments() {
        let definition = extract_file(&hello_file()).unwrap();

        assert_eq!(definition.path, "hello.proto");
        assert_eq!(definition.package, "hello");
        assert_eq!(definition.services.len(), 1);

        let service = &definition.services[0];
        assert_eq!(service.name, "Hello");
        assert_eq!(service.documentation.as_deref(), Some("Greets people."));

        let say_hello = service.method_by_index(0).unwrap();
        assert_eq!(say_hello.input_type, "SayHelloRequest");
        assert_eq!(say_hello.documentation.as_deref(), Some("Says hello."));
    }

    #[test]
    fn deprecation_is_carried() {
        let file = FileDescriptor::new("old.proto", "old")
            .with_deprecated(true)
            .with_service(
                ServiceDescriptor::new("Old")
                    .with_deprecated(true)
                    .with_method(annotated("A", GrainMethodOptions::blocking()).with_deprecated(true)),
            );
        let definition = extract_file(&file).unwrap();
        assert!(definition.deprecated);
        assert!(definition.services[0].deprecated);
        assert!(definition.services[0].methods[0].deprecated);
    }

    #[test]
    fn nameless_file_is_rejected() {
        let file = FileDescriptor::default();
        assert!(matches!(extract_file(&file), Err(GeneratorError::ParseError(_))));
    }

    // === extract_error_reasons ===

    #[test]
    fn file_without_error_reason_has_no_catalog() {
        let file = FileDescriptor::new("a.proto", "a").with_enum(EnumDescriptorProto {
            name: Some("Color".to_string()),
            ..Default::default()
        });
        assert!(extract_error_reasons(&file, &Comments::new(&file)).unwrap().is_none());
    }

    #[test]
    fn reason_docs_prefer_leading_then_trailing() {
        let file = FileDescriptor::new("a.proto", "a")
            .with_enum(reason_enum(&[("USER_NOT_FOUND", 0), ("QUOTA", 1), ("BARE", 2)]))
            .with_comment(vec![5, 0, 2, 0], Some(" The user does not exist.\n"), Some(" ignored"))
            .with_comment(vec![5, 0, 2, 1], None, Some(" Out of quota "))
            .with_comment(vec![5, 0, 2, 2], Some("  \n"), None);

        let catalog = extract_error_reasons(&file, &Comments::new(&file)).unwrap().unwrap();

        assert_eq!(catalog.entries.len(), 3);
        assert_eq!(catalog.entries[0].documentation.as_deref(), Some("The user does not exist."));
        assert_eq!(catalog.entries[1].documentation.as_deref(), Some("Out of quota"));
        assert_eq!(catalog.entries[2].documentation, None);
        assert_eq!(catalog.find(1).unwrap().symbolic_name, "QUOTA");
    }

    // === resolve_type_path ===

    #[test]
    fn package_less_files_resolve_bare_names() {
        assert_eq!(resolve_type_path(".Ping", ""), "Ping");
        assert_eq!(resolve_type_path(".Outer.Inner", ""), "outer::Inner");
    }

    #[test]
    fn other_packages_climb_out_of_nested_packages() {
        assert_eq!(resolve_type_path(".shared.Id", "acme.hello"), "super::super::shared::Id");
        assert_eq!(resolve_type_path(".acme.other.Id", "acme.hello"), "super::super::acme::other::Id");
    }

    #[test]
    fn similar_package_prefix_is_not_same_package() {
        assert_eq!(resolve_type_path(".hello2.Msg", "hello"), "super::hello2::Msg");
    }
}
