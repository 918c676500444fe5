//! services/api/src/bin/openapi.rs
//!
//! Writes the checklist API's OpenAPI document for the presentation layer's client
//! generator.
//!
//! Usage: `openapi [OUTPUT]`, where `OUTPUT` defaults to `openapi.json`.

use scripture_api_lib::web::rest::ApiDoc;
use std::path::PathBuf;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

/// The document served at `/api-docs/openapi.json`, stamped with this crate's version.
fn checklist_document() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let doc = checklist_document();
    std::fs::write(&output, doc.to_pretty_json()?)?;
    println!(
        "Wrote {} checklist endpoints to {}",
        doc.paths.paths.len(),
        output.display()
    );
    Ok(())
}
