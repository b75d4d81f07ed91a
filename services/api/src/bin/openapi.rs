//! services/api/src/bin/openapi.rs
//!
//! Writes the REST API's OpenAPI 3.0 document to disk, for consumption by
//! client generators and API tooling.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Output path defaults to ./openapi.json; an argument overrides it.
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());

    let document = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(&path, document)?;
    println!("Wrote OpenAPI document to {path}");
    Ok(())
}
