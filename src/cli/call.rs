use anyhow::{Context, Result};
use serde_json::Value;

use memdash::tools::{catalog, Dispatcher};

/// Run one operation from the command line and print its JSON payload.
///
/// `args` is a JSON object; omitted means no arguments.
pub fn call(dispatcher: &Dispatcher, tool: &str, args: Option<&str>) -> Result<()> {
    let args = match args {
        None => None,
        Some(raw) => match serde_json::from_str::<Value>(raw).context("arguments must be JSON")? {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => anyhow::bail!("arguments must be a JSON object, got {other}"),
        },
    };

    let body = dispatcher.dispatch(tool, args)?;
    println!("{}", pretty(&body));
    Ok(())
}

/// Print the operation catalog.
pub fn list_tools() {
    println!("Available operations");
    println!("{}", "=".repeat(40));
    for tool in catalog() {
        let required = if tool.required.is_empty() {
            String::new()
        } else {
            format!(" (requires: {})", tool.required.join(", "))
        };
        println!("  {:<26} {}{}", tool.name, tool.description, required);
    }
}

fn pretty(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| body.to_string())
}
