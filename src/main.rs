use cpu_probe::core::diagnostics::{Diagnostics, HealthStatus};
use cpu_probe::core::hardware::CapabilitySnapshot;
use cpu_probe::core::runtime::{probe_each_core, system_info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== CPU Probe ===");

    // 1. Snapshot
    let snapshot = system_info();
    println!("\n[1] Identity");
    println!("    Vendor: {}", snapshot.vendor);
    println!("    Brand:  {:?}", snapshot.brand);

    println!("\n[2] Extensions");
    for (feature, enabled) in snapshot.extensions.iter() {
        println!("    {:<9} {}", feature.name(), if enabled { "yes" } else { "no" });
    }

    // 3. Diagnostics run against the unmasked probe
    println!("\n[3] Diagnostics");
    let raw = CapabilitySnapshot::detect();
    report("probe", Diagnostics::check(&raw));

    let cores = probe_each_core(|_| CapabilitySnapshot::detect());
    println!("    Probed {} cores", cores.len());
    report("cores", Diagnostics::check_cores(&cores));

    println!("\n=== Done ===");
    Ok(())
}

fn report(label: &str, status: HealthStatus) {
    match status {
        HealthStatus::Healthy => println!("    {}: healthy", label),
        HealthStatus::Inconsistent(findings) => {
            println!("    {}: inconsistent", label);
            for finding in findings {
                println!("    - {}", finding);
            }
        }
    }
}
