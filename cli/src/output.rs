//! Output formatting

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    /// Parse the `default_format` config value
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }

    /// Print backend records, `columns` picked for the table view
    pub fn print_list(&self, records: &Value, columns: &[&str]) {
        match self {
            OutputFormat::Json => print_json(records),
            OutputFormat::Table => println!("{}", render_list(&as_rows(records), columns)),
        }
    }

    pub fn print_item(&self, record: &Value) {
        match self {
            OutputFormat::Json => print_json(record),
            OutputFormat::Table => println!("{}", render_item(record)),
        }
    }

    pub fn print<T: Serialize>(&self, data: &T) {
        print_json(data)
    }
}

fn print_json<T: Serialize + ?Sized>(data: &T) {
    println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
}

/// Lists come back either bare or as `{ items: [...] }`
pub fn as_rows(records: &Value) -> Vec<Value> {
    match records {
        Value::Array(items) => items.clone(),
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => items.clone(),
            _ => vec![records.clone()],
        },
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

pub fn render_list(rows: &[Value], columns: &[&str]) -> String {
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.to_string()));
    for row in rows {
        builder.push_record(columns.iter().map(|c| cell(row.get(*c))));
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Two-column field/value view of one record
pub fn render_item(record: &Value) -> String {
    let mut builder = Builder::default();
    builder.push_record(["field".to_string(), "value".to_string()]);
    match record.as_object() {
        Some(map) => {
            for (key, value) in map {
                builder.push_record([key.clone(), cell(Some(value))]);
            }
        }
        None => builder.push_record(["value".to_string(), cell(Some(record))]),
    }
    builder.build().with(Style::rounded()).to_string()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".into(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(_)) | Some(Value::Array(_)) => "{…}".into(),
        Some(other) => other.to_string(),
    }
}
