use anyhow::Result;
use serde_json::Value;

use memdash::tools::Dispatcher;

/// Display memory statistics in the terminal.
pub fn stats(dispatcher: &Dispatcher) -> Result<()> {
    let response: Value = serde_json::from_str(&dispatcher.dispatch("get_stats", None)?)?;

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total memories:      {}", response["total_memories"]);
    println!("  Unique tags:         {}", response["unique_tags"]);
    if let Some(err) = response["error"].as_str() {
        println!();
        println!("  Error: {err}");
    }
    Ok(())
}

/// Check the store and print its health report.
pub fn health(dispatcher: &Dispatcher) -> Result<()> {
    let response: Value =
        serde_json::from_str(&dispatcher.dispatch("check_database_health", None)?)?;

    println!("Store Health");
    println!("{}", "=".repeat(40));
    println!("  Status:              {}", response["status"].as_str().unwrap_or("unknown"));
    println!("  Health:              {}", response["health"]);
    println!("  Avg query time (ms): {}", response["avg_query_time"]);
    if let Some(err) = response["error"].as_str() {
        println!("  Error:               {err}");
    }
    Ok(())
}

pub fn backup(dispatcher: &Dispatcher) -> Result<()> {
    let body = dispatcher.dispatch("create_backup", None)?;
    let response: Value = serde_json::from_str(&body)?;
    if response["status"] == "success" {
        println!(
            "Backup written to {} ({} MB)",
            response["path"].as_str().unwrap_or_default(),
            response["size_mb"]
        );
    } else {
        anyhow::bail!(
            "backup failed: {}",
            response["message"].as_str().unwrap_or("unknown error")
        );
    }
    Ok(())
}
