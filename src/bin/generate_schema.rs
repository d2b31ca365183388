//! Generate JSON Schema for projtree configuration
//!
//! Usage:
//!   cargo run --features dev-bins --bin generate_schema > config-schema.json

use projtree::config::Config;
use schemars::schema_for;

fn main() {
    let schema = schema_for!(Config);
    let output = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema");
    println!("{}", output);
}
