//! Forms commands

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use form_engine::{parse_schema, DynamicForm, FormSubmission, FormUpdate};
use serde_json::Value;

use super::ApiClient;
use crate::{output::OutputFormat, FormCommands};

const COLUMNS: &[&str] = &["id", "form_type", "order_id", "owner"];

pub async fn handle(action: FormCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match action {
        FormCommands::List { order_id } => {
            let query: Vec<_> = order_id.map(|id| ("order_id", id.to_string())).into_iter().collect();
            let forms = client.get("/forms", &query).await?;
            format.print_list(&forms, COLUMNS);
        }
        FormCommands::Get { id } => {
            let form = client.get(&format!("/forms/{id}"), &[]).await?;
            format.print_item(&form);
        }
        FormCommands::Submit {
            file,
            form_type,
            order_id,
            schema,
        } => {
            let form_json = read_form_json(&file)?;
            let submission = build_submission(form_json, form_type, order_id, schema.as_deref())?;
            let created = client.post("/forms", &submission).await?;
            match created.get("id") {
                Some(id) => println!("{} form {}", "Created".green(), id),
                None => println!("{} form", "Created".green()),
            }
        }
        FormCommands::Update { id, file } => {
            let update = FormUpdate {
                form_json: read_form_json(&file)?,
            };
            client.put(&format!("/forms/{id}"), &update).await?;
            println!("{} form {}", "Updated".green(), id);
        }
    }
    Ok(())
}

fn read_form_json(file: &Path) -> Result<Value> {
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let value: Value = serde_json::from_str(&text).with_context(|| format!("parsing {}", file.display()))?;
    if !value.is_object() {
        bail!("{} must contain a JSON object", file.display());
    }
    Ok(value)
}

/// With a schema, the stored form is rehydrated so stale fields are dropped
/// and missing ones defaulted before submission.
fn build_submission(
    form_json: Value,
    form_type: String,
    order_id: Option<i64>,
    schema: Option<&Path>,
) -> Result<FormSubmission> {
    let Some(schema_file) = schema else {
        return Ok(FormSubmission {
            form_type,
            form_json,
            order_id,
        });
    };

    let text = fs::read_to_string(schema_file)
        .with_context(|| format!("reading {}", schema_file.display()))?;
    let schema = parse_schema(&text).with_context(|| format!("invalid schema {}", schema_file.display()))?;
    let form = DynamicForm::from_form_json(Arc::new(schema), form_json)?;
    Ok(form.submission(form_type, order_id)?)
}
