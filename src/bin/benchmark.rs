use clap::Parser;
use cpu_probe::core::hardware::CapabilitySnapshot;
use hdrhistogram::Histogram;
use rayon::prelude::*;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about = "Time snapshot construction", long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 10_000)]
    iterations: usize,

    /// Concurrent constructions for the determinism check
    #[arg(short, long, default_value_t = 64)]
    threads: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    println!("=== Benchmark: {} constructions ===", args.iterations);

    // 1. Sequential latency
    let mut hist = Histogram::<u64>::new(3)?;
    let start = Instant::now();
    for _ in 0..args.iterations {
        let t = Instant::now();
        let snapshot = CapabilitySnapshot::detect();
        hist.record(t.elapsed().as_nanos() as u64)?;
        std::hint::black_box(snapshot);
    }
    let duration = start.elapsed();

    println!("Total time: {:.2?}", duration);
    println!(
        "Latency (ns): p50={} p95={} p99={} max={}",
        hist.value_at_quantile(0.5),
        hist.value_at_quantile(0.95),
        hist.value_at_quantile(0.99),
        hist.max()
    );

    // 2. Concurrent constructions must all agree
    println!("Running {} concurrent constructions...", args.threads);
    let reference = CapabilitySnapshot::detect();
    let mismatches = (0..args.threads)
        .into_par_iter()
        .map(|_| CapabilitySnapshot::detect())
        .filter(|s| *s != reference)
        .count();

    if mismatches > 0 {
        eprintln!("Error: {} concurrent snapshots differed", mismatches);
        std::process::exit(1);
    }
    println!("All concurrent snapshots identical.");
    Ok(())
}
