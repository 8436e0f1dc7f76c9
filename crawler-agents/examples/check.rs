use clap::Parser;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// file of User-Agent strings, one per line
    user_agents: PathBuf,
    /// number of repetitions through the user agent file
    #[arg(short, long, default_value_t = 1)]
    repetitions: usize,
    /// print the matching catalog indices for every line
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Args {
        user_agents,
        repetitions,
        verbose,
    } = Args::parse();

    let uas = BufReader::new(std::fs::File::open(user_agents)?)
        .lines()
        .collect::<Result<Vec<String>, _>>()?;

    let duration = std::time::Instant::now();
    let mut detected = 0usize;
    for _ in 0..repetitions {
        for ua in &uas {
            let indices = crawler_agents::matching_crawlers(ua);
            if !indices.is_empty() {
                detected += 1;
            }
            if verbose {
                println!("{indices:?}\t{ua}");
            }
        }
    }

    let elapsed = duration.elapsed();
    println!("Lines: {}", repetitions * uas.len());
    println!("Crawlers: {detected}");
    println!("Total time: {elapsed:?}");
    println!(
        "{}µs / line",
        elapsed.as_micros() / (repetitions * uas.len()) as u128
    );

    Ok(())
}
