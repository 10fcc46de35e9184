//! Offline schema commands

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use form_engine::{is_field_disabled, parse_schema, resolve_options, DynamicForm, FieldValues, ProductSchema};
use serde_json::{json, Value};

use crate::{output::OutputFormat, SchemaCommands};

pub fn handle(action: SchemaCommands, format: OutputFormat) -> Result<()> {
    match action {
        SchemaCommands::Validate { file } => {
            let schema = load(&file)?;
            match format {
                OutputFormat::Json => format.print(&summary(&schema)),
                OutputFormat::Table => {
                    println!("{} {} is valid", "✓".green(), schema.product_code.bold());
                    format.print_item(&summary(&schema));
                }
            }
        }
        SchemaCommands::Generate { file, rooms } => {
            let schema = load(&file)?;
            format.print(&generate(schema, rooms.into())?);
        }
        SchemaCommands::Options { file, property, set } => {
            let schema = load(&file)?;
            let context: FieldValues = set.into_iter().map(|(k, v)| (k, Value::String(v))).collect();

            if schema.enum_entry(&property).is_none() {
                eprintln!("{} {} has no enum entry", "warning:".yellow(), property);
            }
            if is_field_disabled(&schema, &property, Some(&context)) {
                eprintln!("{} {} is disabled in this context", "note:".cyan(), property);
            }

            let options = resolve_options(&schema, &property, Some(&context));
            format.print_list(&serde_json::to_value(options)?, &["code", "label", "note", "disabled"]);
        }
    }
    Ok(())
}

fn load(file: &Path) -> Result<ProductSchema> {
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    parse_schema(&text).with_context(|| format!("invalid schema {}", file.display()))
}

fn summary(schema: &ProductSchema) -> Value {
    let count = |block: Option<&form_engine::SectionBlock>| block.map_or(0, |b| b.properties.len());
    json!({
        "product_code": schema.product_code,
        "zahlavi": count(schema.header()),
        "form_body": schema.form_body.properties.len(),
        "zapati": count(schema.footer()),
        "enums": schema.enums.len(),
        "dependencies": schema.dependencies.len(),
    })
}

/// Initial `form_json` with `rooms` rooms (at least one)
fn generate(schema: ProductSchema, rooms: usize) -> Result<Value> {
    let mut form = DynamicForm::generate(Arc::new(schema));
    for _ in 1..rooms {
        form = form.add_room(None);
    }
    Ok(form.to_form_json()?)
}

/// `CODE=VALUE` argument of `--set`
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((code, value)) if !code.trim().is_empty() => Ok((code.trim().to_string(), value.to_string())),
        _ => Err(format!("expected CODE=VALUE, got `{raw}`")),
    }
}
