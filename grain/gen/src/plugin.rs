//! protoc plugin protocol.
//!
//! protoc writes a `CodeGeneratorRequest` to the plugin's stdin and reads a
//! `CodeGeneratorResponse` from its stdout. Generation failures travel back
//! in the response's `error` field; the process itself still succeeds.

use prost::Message;
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorResponse, Version};
use tracing::{debug, error};

use crate::config::GeneratorConfig;
use crate::descriptor::{CodeGeneratorRequest, FileDescriptor, FileDescriptorSet};
use crate::errors::GeneratorError;
use crate::extract::extract_file;
use crate::output::{GeneratedUnit, generate_file};

/// Generates units for the named files among `files`.
///
/// An empty `to_generate` selects every file. Files with no grain service
/// produce nothing.
///
/// ## Errors
///
/// Fails if a requested file is missing from `files`, or if extraction or
/// rendering of any file fails.
pub fn generate_units(
    files: &[FileDescriptor],
    to_generate: &[String],
    config: &GeneratorConfig,
    compiler_version: Option<&Version>,
) -> Result<Vec<GeneratedUnit>, GeneratorError> {
    let selected: Vec<&FileDescriptor> = if to_generate.is_empty() {
        files.iter().collect()
    } else {
        to_generate
            .iter()
            .map(|name| {
                files.iter().find(|f| f.name() == name.as_str()).ok_or_else(|| {
                    GeneratorError::ParseError(format!("file '{name}' is not among the descriptors"))
                })
            })
            .collect::<Result<_, _>>()?
    };

    let mut units = Vec::new();
    for file in selected {
        let definition = extract_file(file)?;
        match generate_file(&definition, config, compiler_version)? {
            Some(unit) => units.push(unit),
            None => debug!(file = file.name(), "no grain services; nothing generated"),
        }
    }
    Ok(units)
}

/// Runs generation for a decoded plugin request.
pub fn generate(request: &CodeGeneratorRequest) -> Result<Vec<GeneratedUnit>, GeneratorError> {
    let config = GeneratorConfig::parse(request.parameter.as_deref().unwrap_or_default())?;
    generate_units(
        &request.proto_file,
        &request.file_to_generate,
        &config,
        request.compiler_version.as_ref(),
    )
}

/// Answers a plugin request. Never fails; errors become the response's `error`.
pub fn respond(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    let mut response = CodeGeneratorResponse {
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    };

    match generate(request) {
        Ok(units) => {
            response.file = units
                .into_iter()
                .map(|unit| File {
                    name: Some(unit.name),
                    content: Some(unit.content),
                    ..Default::default()
                })
                .collect();
        }
        Err(err) => {
            error!(error = %err, "generation failed");
            response.error = Some(err.to_string());
        }
    }

    response
}

/// Runs generation over a `protoc --descriptor_set_out` file.
///
/// ## Errors
///
/// Fails if the bytes are not a descriptor set or generation fails.
pub fn generate_from_descriptor_set(
    bytes: &[u8],
    to_generate: &[String],
    config: &GeneratorConfig,
) -> Result<Vec<GeneratedUnit>, GeneratorError> {
    let set = FileDescriptorSet::decode(bytes)?;
    generate_units(&set.file, to_generate, config, None)
}
