use sahm_core::Envelope;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

const NAME_WIDTH: usize = 40;

pub fn render(envelope: &Envelope<Value>, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(envelope)),
    }

    Ok(())
}

fn render_table(envelope: &Envelope<Value>) -> String {
    let mut out = String::new();

    let rows = envelope
        .data
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    out.push_str(&format!(
        "{:<8} {:<NAME_WIDTH$} {:<6} {:<6}\n",
        "TICKER", "NAME", "TYPE", "EXCH"
    ));
    for row in rows {
        out.push_str(&format!(
            "{:<8} {:<NAME_WIDTH$} {:<6} {:<6}\n",
            field(row, "ticker"),
            truncate(field(row, "name"), NAME_WIDTH),
            field(row, "type"),
            field(row, "primary_exchange"),
        ));
    }
    if rows.is_empty() {
        out.push_str("(no results)\n");
    }

    out.push('\n');
    for (label, key) in [("next_cursor", "next_cursor"), ("has_more", "has_more"), ("view", "view")] {
        if let Some(value) = envelope.data.get(key).filter(|value| !value.is_null()) {
            out.push_str(&format!("{label:<12}: {}\n", scalar(value)));
        }
    }
    out.push_str(&format!("{:<12}: {}\n", "latency_ms", envelope.meta.latency_ms));
    out.push_str(&format!(
        "{:<12}: size={} hits={} misses={}\n",
        "cache", envelope.meta.cache.size, envelope.meta.cache.hits, envelope.meta.cache.misses
    ));

    if !envelope.meta.warnings.is_empty() {
        out.push_str("warnings:\n");
        for warning in &envelope.meta.warnings {
            out.push_str(&format!("  - {warning}\n"));
        }
    }

    if !envelope.errors.is_empty() {
        out.push_str("errors:\n");
        for error in &envelope.errors {
            out.push_str(&format!("  - {}: {}\n", error.code, error.message));
        }
    }

    out
}

fn field<'a>(row: &'a Value, key: &str) -> &'a str {
    row.get(key).and_then(Value::as_str).unwrap_or("")
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    let mut shortened = text.chars().take(width.saturating_sub(3)).collect::<String>();
    shortened.push_str("...");
    shortened
}
