//! `redraft-diff` — print the steps turning one document into another.
//!
//! Usage:
//!   redraft-diff <from.json> <to.json> [--words] [--flat]
//!
//! Both files hold documents of the built-in basic schema. The steps are
//! written to stdout as a JSON array. Set `RUST_LOG=redraft=debug` to see
//! the phases.

use std::io::{self, Write};

use redraft::{diff, DiffOptions, Granularity, Node, Schema};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

fn read_doc(schema: &Schema, path: &str) -> Result<Node, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
    let json: Value = serde_json::from_str(&text).map_err(|e| format!("{path}: {e}"))?;
    let doc = schema.node_from_json(&json).map_err(|e| format!("{path}: {e}"))?;
    doc.check().map_err(|e| format!("{path}: {e}"))?;
    Ok(doc)
}

fn run(args: &[String]) -> Result<String, String> {
    let mut options = DiffOptions::new();
    let mut files = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--words" => options = options.granularity(Granularity::Word),
            "--flat" => options = options.structural_steps(false),
            flag if flag.starts_with("--") => return Err(format!("unknown flag: {flag}")),
            file => files.push(file),
        }
    }
    let [from, to] = files.as_slice() else {
        return Err("Usage: redraft-diff <from.json> <to.json> [--words] [--flat]".to_string());
    };

    let schema = Schema::basic();
    let from = read_doc(&schema, from)?;
    let to = read_doc(&schema, to)?;
    let tr = diff(&from, &to, &options).map_err(|e| e.to_string())?;
    let steps = Value::Array(tr.steps().iter().map(|s| s.to_json()).collect());
    serde_json::to_string_pretty(&steps).map_err(|e| e.to_string())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(out) => {
            let mut stdout = io::stdout();
            if writeln!(stdout, "{out}").is_err() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
