//! Example checkout CLI.
//!
//! Places one order against a small in-memory inventory (`lamp`: 3,
//! `desk`: 1) and prints the result.
//!
//! # Usage
//!
//! ```bash
//! checkout <sku> <quantity> <card> [--dry-run] [--json]
//! ```
//!
//! # Example
//!
//! ```bash
//! checkout lamp 2 4242424242424242
//! checkout lamp 2 4000000000000002     # declined
//! checkout lamp 1 0000000000000000     # gateway timeout
//! RUST_LOG=debug checkout desk 1 4242424242424242 --dry-run
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use example::{Inventory, Storefront};
use sextant_pipeline::prelude::*;
use sextant_tracing::{TracingConfig, TracingFormat};
use tracing::Level;

#[expect(clippy::print_stdout, clippy::print_stderr, reason = "CLI output")]
fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let flags: Vec<&str> = args
        .iter()
        .filter(|arg| arg.starts_with("--"))
        .map(String::as_str)
        .collect();
    let positional: Vec<&String> = args.iter().filter(|arg| !arg.starts_with("--")).collect();

    let [sku, quantity, card] = positional.as_slice() else {
        eprintln!("Usage: <sku> <quantity> <card> [--dry-run] [--json]");
        eprintln!("Example: lamp 2 4242424242424242");
        return ExitCode::FAILURE;
    };
    let Ok(quantity) = quantity.parse::<u32>() else {
        eprintln!("Error: quantity must be a non-negative integer, got {quantity}");
        return ExitCode::FAILURE;
    };

    let format = if flags.contains(&"--json") {
        TracingFormat::Json
    } else {
        TracingFormat::Compact
    };
    let mut tracing = TracingConfig::new().with_format(format);
    if let Ok(filter) = std::env::var("RUST_LOG") {
        tracing = tracing.with_level(Level::DEBUG).with_env_filter(filter);
    }
    tracing.init();

    let store = Storefront::new(Arc::new(Inventory::with_stock([("lamp", 3), ("desk", 1)])));

    let mut inputs = Fields::new();
    inputs.insert("sku".to_owned(), sku.as_str().into());
    inputs.insert("quantity".to_owned(), quantity.into());
    inputs.insert("card".to_owned(), card.as_str().into());
    if flags.contains(&"--dry-run") {
        inputs.insert("dry_run".to_owned(), true.into());
    }

    let result = store.checkout(&example::executor(), inputs);
    println!("{result}");

    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
