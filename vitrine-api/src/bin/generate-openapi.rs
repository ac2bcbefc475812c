//! OpenAPI Specification Generator Binary
//!
//! Writes the Vitrine OpenAPI document as JSON to stdout, for client
//! generation and the docs site.
//!
//! Usage:
//!   cargo run -p vitrine-api --bin generate-openapi --features openapi > openapi.json

use vitrine_api::ApiDoc;

fn main() {
    match ApiDoc::to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize OpenAPI spec: {}", e);
            std::process::exit(1);
        }
    }
}
