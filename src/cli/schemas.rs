//! Schemas subcommand: list the known config versions.

use crate::schema::SCHEMA_VERSIONS;
use anyhow::Result;

pub fn run_schemas() -> Result<()> {
    for line in schema_lines() {
        println!("{line}");
    }
    Ok(())
}

fn schema_lines() -> Vec<String> {
    let latest = SCHEMA_VERSIONS.len().saturating_sub(1);
    SCHEMA_VERSIONS
        .iter()
        .enumerate()
        .map(|(index, version)| {
            if index == latest {
                format!("{} (latest)", version.api_version)
            } else {
                version.api_version.to_string()
            }
        })
        .collect()
}
