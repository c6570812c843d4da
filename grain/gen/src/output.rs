//! Output assembly and file writing for generated code.
//!
//! This module handles the final phase of code generation: assembling all
//! generated pieces for one input file, validating the output, formatting it,
//! and writing it to disk atomically.
//!
//! ## Output Structure
//!
//! One unit per input file that has at least one grain service:
//! ```text
//! hello/hello.proto  ->  hello/hello_grain.rs
//! ```
//!
//! The unit is meant to be `include!`d next to the prost-generated messages
//! of the same package, so it carries no inner attributes and refers to
//! message types by their prost-build paths.
//!
//! ## Safety Guarantees
//!
//! - **Validation**: All generated code is validated with `syn` before writing
//! - **Formatting**: Output is formatted with `prettyplease` for consistent style
//! - **Atomic writes**: Uses temp file + rename pattern to prevent partial writes

use std::fs;
use std::path::Path;

use grain_define::FileDefinition;
use proc_macro2::TokenStream;
use prost_types::compiler::Version;
use quote::quote;
use tracing::info;

use crate::codegen::{
    RenderContext, generate_actor, generate_client, generate_error_bridge, generate_kind_functions,
    generate_service_trait,
};
use crate::config::GeneratorConfig;
use crate::errors::GeneratorError;

/// Name the generator reports in file headers.
pub const GENERATOR_NAME: &str = "protoc-gen-grain";

/// One generated output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    /// Output path relative to the output root, e.g. `hello/hello_grain.rs`.
    pub name: String,
    pub content: String,
}

/// Assembles the code for one input file.
///
/// Order: error reason bridge, then for each service its business trait,
/// kind functions, actor and client.
pub fn assemble_file(
    file: &FileDefinition,
    config: &GeneratorConfig,
) -> Result<TokenStream, GeneratorError> {
    let ctx = RenderContext::new(config)?;

    let error_bridge = file
        .error_reasons
        .as_ref()
        .map(|catalog| generate_error_bridge(catalog, &ctx))
        .unwrap_or_default();

    let mut services = TokenStream::new();
    for service in &file.services {
        let service_trait = generate_service_trait(service, &ctx)?;
        let kind_functions = generate_kind_functions(service, &ctx);
        let actor = generate_actor(service, &ctx)?;
        let client = generate_client(service, &ctx)?;
        services.extend(quote! {
            #service_trait
            #kind_functions
            #actor
            #client
        });
    }

    Ok(quote! {
        #error_bridge
        #services
    })
}

/// Renders the header comment block.
///
/// ## Examples
///
/// ```
/// use grain_gen::output::render_header;
///
/// let header = render_header("hello.proto", false, None);
/// assert!(header.starts_with("// Code generated by protoc-gen-grain. DO NOT EDIT.\n"));
/// assert!(header.contains("//  protoc           (unknown)\n"));
/// assert!(header.ends_with("// source: hello.proto\n"));
/// ```
pub fn render_header(path: &str, deprecated: bool, compiler_version: Option<&Version>) -> String {
    let protoc = match compiler_version {
        Some(version) => {
            let mut rendered = format!(
                "v{}.{}.{}",
                version.major(),
                version.minor(),
                version.patch()
            );
            let suffix = version.suffix();
            if !suffix.is_empty() {
                rendered.push('-');
                rendered.push_str(suffix);
            }
            rendered
        }
        None => "(unknown)".to_string(),
    };
    let source = if deprecated {
        format!("// {path} is a deprecated file.")
    } else {
        format!("// source: {path}")
    };

    format!(
        "// Code generated by {GENERATOR_NAME}. DO NOT EDIT.\n\
         // versions:\n\
         //  {GENERATOR_NAME} v{}\n\
         //  protoc           {protoc}\n\
         {source}\n",
        env!("CARGO_PKG_VERSION"),
    )
}

/// Generates the unit for one input file.
///
/// Returns `Ok(None)` when the file has no grain service; nothing is emitted
/// for it, not even the error reason bridge.
///
/// ## Errors
///
/// Fails if a renderer rejects the model or the assembled code does not parse.
pub fn generate_file(
    file: &FileDefinition,
    config: &GeneratorConfig,
    compiler_version: Option<&Version>,
) -> Result<Option<GeneratedUnit>, GeneratorError> {
    if !file.has_services() {
        return Ok(None);
    }

    let tokens = assemble_file(file, config)?;
    let parsed = validate_code(&tokens)?;
    let header = render_header(&file.path, file.deprecated, compiler_version);
    let name = file.generated_file_name();

    info!(source = %file.path, output = %name, services = file.services.len(), "generated grain unit");

    Ok(Some(GeneratedUnit {
        name,
        content: format_code(&parsed, &header),
    }))
}

/// Validates generated code by parsing it with syn.
///
/// ## Errors
///
/// Returns `GeneratorError::CodeGenError` if the code is not valid Rust syntax.
pub fn validate_code(tokens: &TokenStream) -> Result<syn::File, GeneratorError> {
    syn::parse2(tokens.clone())
        .map_err(|e| GeneratorError::CodeGenError(format!("Generated code is invalid: {}", e)))
}

/// Formats generated code using prettyplease, prepending `header`.
pub fn format_code(file: &syn::File, header: &str) -> String {
    let formatted = prettyplease::unparse(file);
    format!("{header}\n{formatted}")
}

/// Formats a fragment for inspection; invalid tokens are returned unformatted.
pub fn format_generated_code(tokens: &TokenStream) -> String {
    match syn::parse2::<syn::File>(tokens.clone()) {
        Ok(file) => prettyplease::unparse(&file),
        Err(_) => tokens.to_string(),
    }
}

/// Writes content to a file atomically using temp file + rename.
///
/// ## Errors
///
/// Returns `GeneratorError::WriteError` if:
/// - Parent directories cannot be created
/// - The temp file cannot be written
/// - The rename fails
pub fn write_atomic(path: &Path, content: &str) -> Result<(), GeneratorError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| GeneratorError::WriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|e| GeneratorError::WriteError {
        path: temp_path.display().to_string(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| GeneratorError::WriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Writes every unit below `output_dir`. With `dry_run`, prints them instead.
pub fn write_units(
    units: &[GeneratedUnit],
    output_dir: &Path,
    dry_run: bool,
) -> Result<(), GeneratorError> {
    for unit in units {
        if dry_run {
            println!("// ===== {} =====\n{}", unit.name, unit.content);
            continue;
        }
        write_atomic(&output_dir.join(&unit.name), &unit.content)?;
    }
    Ok(())
}
