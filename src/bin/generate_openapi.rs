//! Prints the OpenAPI spec as pretty JSON.
//!
//! Usage:
//!   cargo run --bin generate_openapi > openapi.json

use smart_home_api::api::handlers::ApiDoc;
use utoipa::OpenApi;

fn main() {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .expect("Failed to serialise OpenAPI spec");
    println!("{json}");
}
