//! `lso-unarchive`: decode a binary plist (optionally gzipped) and resolve
//! its keyed archive to JSON.
//!
//! Usage:
//!   lso-unarchive <file> [--max-depth <n>] [--max-nodes <n>] [--max-inflated <bytes>]

use std::io::{self, Write};

use lso::cli::{parse_size, unarchive_json, CliError};
use lso_pack::DecodeOptions;

fn run(args: &[String]) -> Result<String, CliError> {
    let mut options = DecodeOptions::default();
    let mut path = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--max-depth" => {
                i += 1;
                options.resolve.max_depth = parse_size("--max-depth", args.get(i))?;
            }
            "--max-nodes" => {
                i += 1;
                let max_nodes = parse_size("--max-nodes", args.get(i))?;
                options.max_nodes = max_nodes;
                options.resolve.max_nodes = max_nodes;
            }
            "--max-inflated" => {
                i += 1;
                options.max_inflated_len = parse_size("--max-inflated", args.get(i))?;
            }
            other => path = Some(other.to_string()),
        }
        i += 1;
    }
    let path = path.ok_or_else(|| CliError::Usage("usage: lso-unarchive <file>".into()))?;
    let bytes = std::fs::read(&path)?;
    unarchive_json(&bytes, &options)
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(json) => {
            if let Err(e) = writeln!(io::stdout(), "{json}") {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
