//! `lso-chunks`: list the chunk records of a project container as JSON.
//!
//! Usage:
//!   lso-chunks <file> [--documents] [--events] [--max-span <bytes>]

use std::io::{self, Write};

use lso::cli::{chunks_json, parse_size, ChunksOptions, CliError};

fn run(args: &[String]) -> Result<String, CliError> {
    let mut options = ChunksOptions::default();
    let mut path = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--documents" => options.documents = true,
            "--events" => options.events = true,
            "--max-span" => {
                i += 1;
                options.scan.max_span = parse_size("--max-span", args.get(i))?;
            }
            other => path = Some(other.to_string()),
        }
        i += 1;
    }
    let path = path.ok_or_else(|| CliError::Usage("usage: lso-chunks <file>".into()))?;
    let bytes = std::fs::read(&path)?;
    log::info!("read {} bytes from {path}", bytes.len());
    chunks_json(&bytes, &options)
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
