use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use udpmux_value::{encode, Value};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ValueOutput<'a> {
    channel: u32,
    #[serde(rename = "type")]
    type_name: &'a str,
    value: serde_json::Value,
    timestamp: String,
}

pub fn print_value(value: &Value, channel: u32, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ValueOutput {
                channel,
                type_name: type_name(value),
                value: value_to_json(value),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "TYPE", "VALUE"])
                .add_row(vec![
                    channel.to_string(),
                    type_name(value).to_string(),
                    value_to_json(value).to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "channel={} type={} value={}",
                channel,
                type_name(value),
                value_to_json(value)
            );
        }
        OutputFormat::Raw => {
            // Raw emits the canonical wire encoding; encoded_len always fits
            // its own size, so the capacity check cannot fail here.
            if let Ok(wire) = encode(value, usize::MAX) {
                let mut out = std::io::stdout();
                let _ = out.write_all(&wire);
                let _ = out.flush();
            }
        }
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Int8(_) => "int8",
        Value::Int16(_) => "int16",
        Value::Int32(_) => "int32",
        Value::Int64(_) => "int64",
        Value::UInt8(_) => "uint8",
        Value::UInt16(_) => "uint16",
        Value::UInt32(_) => "uint32",
        Value::UInt64(_) => "uint64",
    }
}

/// Lossless mapping of a wire value onto JSON for display.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => (*b).into(),
        Value::String(s) => s.clone().into(),
        Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
        Value::Int8(v) => (*v).into(),
        Value::Int16(v) => (*v).into(),
        Value::Int32(v) => (*v).into(),
        Value::Int64(v) => (*v).into(),
        Value::UInt8(v) => (*v).into(),
        Value::UInt16(v) => (*v).into(),
        Value::UInt32(v) => (*v).into(),
        Value::UInt64(v) => (*v).into(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
