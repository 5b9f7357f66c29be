//! Schema Bind CLI
//!
//! Command-line interface for inspecting model schemas and binding instances.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use schema_bind::{
    bind_model, get_model, load_document_auto, FieldFilter, ModelClass, SchemaInstance,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-bind")]
#[command(about = "Inspect model schemas and bind instances to them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized model description of a schema
    Inspect {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Only fields whose required flag matches
        #[arg(long)]
        required: Option<bool>,

        /// Only fields whose hidden flag matches
        #[arg(long)]
        hidden: Option<bool>,

        /// Only fields whose readonly flag matches
        #[arg(long)]
        readonly: Option<bool>,

        /// Only fields whose deprecated flag matches
        #[arg(long)]
        deprecated: Option<bool>,

        /// Only fields with this field_type annotation
        #[arg(long)]
        field_type: Option<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Bind an instance document to a schema, apply assignments, and validate
    Bind {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Instance document (JSON object): file path or URL
        instance: String,

        /// Assignment as name=value; value is parsed as JSON, falling back to a string
        #[arg(long = "set", value_name = "NAME=VALUE")]
        assignments: Vec<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect {
            schema,
            required,
            hidden,
            readonly,
            deprecated,
            field_type,
            pretty,
        } => {
            let filter = FieldFilter {
                required,
                hidden,
                readonly,
                deprecated,
                field_type,
            };
            run_inspect(&schema, &filter, pretty)
        }

        Commands::Bind {
            schema,
            instance,
            assignments,
            pretty,
        } => run_bind(&schema, &instance, &assignments, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_inspect(schema_source: &str, filter: &FieldFilter, pretty: bool) -> Result<(), u8> {
    let schema = load_document_auto(schema_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let model = get_model(&ModelClass::from(schema)).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let output = if filter.is_empty() {
        serde_json::to_value(&model)
    } else {
        serde_json::to_value(model.get_fields(filter))
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    print_json(&output, pretty)
}

fn run_bind(
    schema_source: &str,
    instance_source: &str,
    assignments: &[String],
    pretty: bool,
) -> Result<(), u8> {
    let schema = load_document_auto(schema_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let data = load_document_auto(instance_source).map_err(|e| {
        eprintln!("Error loading instance: {}", e);
        e.exit_code() as u8
    })?;

    let instance = SchemaInstance::new(schema, data).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let mut binding = bind_model(instance).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    for assignment in assignments {
        let (name, value) = parse_assignment(assignment).ok_or_else(|| {
            eprintln!("Error: invalid assignment '{}': expected NAME=VALUE", assignment);
            2u8
        })?;
        let field = binding.get_field_binding(name).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
        field.set_value(value).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
    }

    let result = binding.validate();
    let values = binding.values().map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let output = json!({
        "values": values,
        "valid": result.is_valid,
        "errors": result.field_errors,
        "global_errors": result.global_errors,
    });
    print_json(&output, pretty)?;

    if result.is_valid {
        Ok(())
    } else {
        Err(1)
    }
}

/// Split `name=value`, parsing the value as JSON and falling back to a plain string.
fn parse_assignment(assignment: &str) -> Option<(&str, Value)> {
    let (name, raw) = assignment.split_once('=')?;
    if name.is_empty() {
        return None;
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Some((name, value))
}

fn print_json(value: &Value, pretty: bool) -> Result<(), u8> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", text);
    Ok(())
}
