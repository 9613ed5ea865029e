// ABOUTME: Plugin listing command.
// ABOUTME: Prints every registered strategy with its origin and description.

use data_deploy::error::Result;
use data_deploy::output::{Output, OutputMode};
use data_deploy::plugin::Registry;
use serde::Serialize;

#[derive(Serialize)]
struct PluginRow<'a> {
    name: &'a str,
    origin: &'a str,
    source: String,
    description: String,
}

pub async fn list_plugins(registry: &Registry, output: &Output) -> Result<()> {
    let mut rows = Vec::with_capacity(registry.len());
    for descriptor in registry.list() {
        // An external plugin that cannot describe itself is still listed.
        let description = match registry.describe(&descriptor.name).await {
            Ok(description) => description,
            Err(e) => {
                tracing::warn!("could not load plugin '{}': {}", descriptor.name, e);
                format!("<unavailable: {}>", e)
            }
        };
        rows.push(PluginRow {
            name: &descriptor.name,
            origin: &descriptor.origin,
            source: descriptor.source.to_string(),
            description,
        });
    }

    if output.mode() == OutputMode::Json {
        for row in &rows {
            if let Ok(json) = serde_json::to_string(row) {
                println!("{json}");
            }
        }
        return Ok(());
    }

    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for row in &rows {
        println!(
            "{:<width$}  {:<8}  {}",
            row.name,
            row.origin,
            row.description,
            width = width
        );
    }
    Ok(())
}
