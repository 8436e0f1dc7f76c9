use clap::Parser;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

#[derive(Parser)]
struct Args {
    /// patterns file (one regex per line)
    patterns: PathBuf,
    /// inputs to match (one per line)
    inputs: PathBuf,
    #[arg(short, long, default_value_t = 1)]
    repetitions: usize,
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Args {
        patterns,
        inputs,
        repetitions,
        quiet,
    } = Args::parse();

    let start = std::time::Instant::now();
    let patterns = BufReader::new(std::fs::File::open(patterns)?)
        .lines()
        .collect::<Result<Vec<String>, _>>()?;

    let index = regex_tagged::Builder::new().push_all(&patterns)?.build()?;
    eprintln!(
        "{} patterns in {}s",
        patterns.len(),
        start.elapsed().as_secs_f32()
    );

    let start = std::time::Instant::now();
    let inputs = BufReader::new(std::fs::File::open(inputs)?)
        .lines()
        .collect::<Result<Vec<String>, _>>()?;
    eprintln!(
        "{} inputs in {}s",
        inputs.len(),
        start.elapsed().as_secs_f32()
    );

    for _ in 0..repetitions {
        for input in inputs.iter() {
            let ids = index.matching(input);
            if !quiet {
                if ids.is_empty() {
                    println!();
                } else {
                    println!("{ids:?}");
                }
            }
        }
    }

    Ok(())
}
