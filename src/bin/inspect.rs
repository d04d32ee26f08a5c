use clap::Parser;
use cpu_probe::core::hardware::CapabilitySnapshot;
use cpu_probe::core::runtime::system_info;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Export the CPU capability snapshot as JSON", long_about = None)]
struct Args {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,

    /// Ignore CPU_PROBE_DISABLE and report the raw probe
    #[arg(long)]
    raw: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let snapshot = if args.raw {
        CapabilitySnapshot::detect()
    } else {
        system_info().clone()
    };

    match args.output {
        Some(path) => {
            snapshot.write_json(&path, args.pretty)?;
            eprintln!("Exported snapshot to {:?}", path);
        }
        None if args.pretty => println!("{}", snapshot.to_json_pretty()?),
        None => println!("{}", snapshot.to_json()?),
    }
    Ok(())
}
