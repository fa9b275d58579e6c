//! Subcommand implementations.
//!
//! Each command returns the text to print so `main` owns all output.

use crate::config::Config;
use crate::error::CliError;
use quarry_engine::{
    CompileOptions, CompiledPredicate, Placeholder, PredicateDocument, Schema,
};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Inputs shared by `compile` and `check`.
#[derive(Debug, Clone, Default)]
pub struct Input {
    /// Document file; stdin when absent
    pub document: Option<PathBuf>,
    /// Schema file; falls back to the configured one
    pub schema: Option<PathBuf>,
    /// Placeholder style; falls back to the configured one
    pub placeholder: Option<Placeholder>,
}

/// Output format for `compile`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputFormat {
    /// Substitute arguments into the filter
    pub inline: bool,
    /// Pretty-print the JSON output
    pub pretty: bool,
}

pub fn compile(input: &Input, format: OutputFormat, config: &Config) -> Result<String, CliError> {
    let compiled = compile_input(input, config)?;
    render(&compiled, format)
}

pub fn check(input: &Input, config: &Config) -> Result<String, CliError> {
    let compiled = compile_input(input, config)?;
    info!(arguments = compiled.arguments.len(), "predicate is valid");
    Ok("ok".to_string())
}

fn compile_input(input: &Input, config: &Config) -> Result<CompiledPredicate, CliError> {
    let source = read_document(input.document.as_deref())?;

    let schema = match input.schema.as_ref().or(config.schema_path.as_ref()) {
        Some(path) => Some(load_schema(path)?),
        None => None,
    };

    let options = CompileOptions {
        placeholder: input.placeholder.unwrap_or(config.placeholder),
    };

    compile_source(&source, schema.as_ref(), options)
}

/// Parse and compile a document held in memory.
pub fn compile_source(
    source: &str,
    schema: Option<&Schema>,
    options: CompileOptions,
) -> Result<CompiledPredicate, CliError> {
    let document = PredicateDocument::from_json(source)?;
    Ok(document.compile(schema, options)?)
}

pub fn parse_schema(source: &str) -> Result<Schema, CliError> {
    let schema: Schema = serde_json::from_str(source).map_err(CliError::Schema)?;
    schema.validate().map_err(CliError::InvalidSchema)?;
    Ok(schema)
}

fn load_schema(path: &Path) -> Result<Schema, CliError> {
    let source = read_file(path)?;
    let schema = parse_schema(&source)?;
    info!(
        path = %path.display(),
        version = schema.version,
        objects = schema.objects.len(),
        "loaded schema"
    );
    Ok(schema)
}

fn read_document(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) => read_file(path),
        None => {
            debug!("reading document from stdin");
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .map_err(CliError::Stdin)?;
            Ok(source)
        }
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    debug!(path = %path.display(), "reading file");
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn render(compiled: &CompiledPredicate, format: OutputFormat) -> Result<String, CliError> {
    if format.inline {
        return Ok(compiled.render_inline());
    }
    let json = if format.pretty {
        serde_json::to_string_pretty(compiled)?
    } else {
        serde_json::to_string(compiled)?
    };
    Ok(json)
}
