//! Synthetic data generator, ported from `original_source/generate_dummy.py`.
//!
//! Not part of the library — a standalone companion binary used to build
//! large fixture files for manual load testing and for the integration
//! tests, the same role the Python script played alongside the original
//! Flask app (spec.md §1 names the synthetic-data generator an external
//! collaborator, out of THE CORE's scope).

use bpaf::Bpaf;
use std::io::{BufWriter, Write};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
struct Opts {
    /// Number of lines to generate
    #[bpaf(positional("NUM_LINES"))]
    num_lines: u64,

    /// Output file path
    #[bpaf(positional("OUTPUT"), fallback("dummy.txt".to_string()))]
    output: String,
}

fn main() -> std::io::Result<()> {
    let opts = opts().run();

    let file = std::fs::File::create(&opts.output)?;
    let mut out = BufWriter::new(file);
    for n in 0..opts.num_lines {
        writeln!(out, "Linha: {n}")?;
    }
    out.flush()?;

    println!("Generated {} lines in {}", opts.num_lines, opts.output);
    Ok(())
}
