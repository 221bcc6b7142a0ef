//! Octant -- training-data conversion CLI.
//!
//! Converts directories of game files into fixed-size training records.
//!
//! Usage:
//!   octant --input DIR --output DIR [OPTIONS]
//!
//! Options:
//!   --input DIR     Directory with game files to convert (required)
//!   --output DIR    Directory to write training files into (required)
//!   --threads N     Number of worker threads (default: 1)
//!   --format F      Input planes: classical, castling, canonical
//!                   (default: classical)
//!   --fill P        History fill policy: no, fen-only, always
//!                   (default: no)
//!   --subs FILE     JSON outcome-substitution table
//!   --delete-files  Delete input files after successful processing
//!   --quiet         Suppress per-file progress output

use std::env;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use octant::nn::encoding::{FillEmptyHistory, InputFormat};
use octant::pipeline::{self, PipelineConfig, TextGameSource};

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut config = PipelineConfig::default();
    let mut have_input = false;
    let mut have_output = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                config.input_dir = PathBuf::from(&args[i]);
                have_input = true;
            }
            "--output" => {
                i += 1;
                config.output_dir = PathBuf::from(&args[i]);
                have_output = true;
            }
            "--threads" => {
                i += 1;
                config.threads = args[i].parse().expect("invalid --threads value");
            }
            "--format" => {
                i += 1;
                config.input_format = match args[i].as_str() {
                    "classical" => InputFormat::Classical,
                    "castling" => InputFormat::CastlingPlane,
                    "canonical" => InputFormat::Canonical,
                    other => {
                        eprintln!("Unsupported input format: {}", other);
                        process::exit(1);
                    }
                };
            }
            "--fill" => {
                i += 1;
                config.fill_empty_history = match args[i].as_str() {
                    "no" => FillEmptyHistory::No,
                    "fen-only" => FillEmptyHistory::FenOnly,
                    "always" => FillEmptyHistory::Always,
                    other => {
                        eprintln!("Unsupported fill policy: {}", other);
                        process::exit(1);
                    }
                };
            }
            "--subs" => {
                i += 1;
                config.subs_path = Some(PathBuf::from(&args[i]));
            }
            "--delete-files" => {
                config.delete_files = true;
            }
            "--quiet" => {
                config.quiet = true;
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    if !have_input || !have_output {
        eprintln!("Both --input and --output are required.");
        print_usage();
        process::exit(1);
    }

    if !config.quiet {
        eprintln!(
            "Converting {} -> {} with {} thread(s), format {:?}",
            config.input_dir.display(),
            config.output_dir.display(),
            config.threads,
            config.input_format,
        );
    }

    let start = Instant::now();
    match pipeline::run(&config, &TextGameSource) {
        Ok(stats) => {
            if !config.quiet {
                eprintln!("Finished in {:.1}s", start.elapsed().as_secs_f64());
            }
            println!("{}", stats);
        }
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: octant --input DIR --output DIR [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --input DIR     Directory with game files to convert");
    eprintln!("  --output DIR    Directory to write training files into");
    eprintln!("  --threads N     Number of worker threads (default: 1)");
    eprintln!("  --format F      classical | castling | canonical");
    eprintln!("  --fill P        no | fen-only | always");
    eprintln!("  --subs FILE     JSON outcome-substitution table");
    eprintln!("  --delete-files  Delete input files after processing");
    eprintln!("  --quiet         Suppress per-file progress output");
}
