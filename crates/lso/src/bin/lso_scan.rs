//! `lso-scan`: extract JSON documents embedded in a binary file.
//!
//! Usage:
//!   lso-scan <file> [--max-span <bytes>]

use std::io::{self, Write};

use lso::cli::{parse_size, scan_json, CliError};
use lso_pack::ScanOptions;

fn run(args: &[String]) -> Result<String, CliError> {
    let mut options = ScanOptions::default();
    let mut path = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--max-span" => {
                i += 1;
                options.max_span = parse_size("--max-span", args.get(i))?;
            }
            other => path = Some(other.to_string()),
        }
        i += 1;
    }
    let path = path.ok_or_else(|| CliError::Usage("usage: lso-scan <file>".into()))?;
    let bytes = std::fs::read(&path)?;
    scan_json(&bytes, &options)
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
