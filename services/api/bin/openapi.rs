//! Writes the OpenAPI document of the bot API, by default to `openapi.json`.
//!
//! Usage: `openapi [OUTPUT_PATH]`

use anyhow::Context;
use std::path::PathBuf;
use techbot_api::router::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi.json"));

    let spec_json = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI document")?;
    std::fs::write(&path, spec_json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
