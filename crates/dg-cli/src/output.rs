//! Output formatting utilities.

use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text and tables.
    #[default]
    Text,
    /// JSON.
    Json,
}

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Outputs rows in the specified format.
///
/// ## Errors
///
/// Returns an error if JSON serialization fails.
pub fn output<T: Tabled + Serialize>(data: &[T], format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Text => {
            if data.is_empty() {
                info("No results found.");
            } else {
                println!("{}", Table::new(data).with(Style::rounded()));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
    }
    Ok(())
}

/// Outputs a single item.
///
/// ## Errors
///
/// Returns an error if serialization fails.
pub fn output_single<T: Serialize>(item: &T, format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Text => print_value(&serde_json::to_value(item)?, 0),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
    }
    Ok(())
}

/// Prints a JSON value as indented `key: value` lines.
fn print_value(value: &serde_json::Value, indent: usize) {
    let prefix = "  ".repeat(indent);

    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                if item.is_object() || item.is_array() {
                    println!("{prefix}-");
                    print_value(item, indent + 1);
                } else {
                    println!("{prefix}- {}", scalar(item));
                }
            }
        }
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                match val {
                    serde_json::Value::Null => {}
                    serde_json::Value::Array(items) if items.is_empty() => {}
                    serde_json::Value::Object(inner) if inner.is_empty() => {}
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        println!("{prefix}{}:", key.bold());
                        print_value(val, indent + 1);
                    }
                    _ => println!("{prefix}{}: {}", key.bold(), scalar(val)),
                }
            }
        }
        other => println!("{prefix}{}", scalar(other)),
    }
}

fn scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
