use bidgrid_core::duration::format_duration;
use bidgrid_strategy::semantic::DistanceDelay;
use bidgrid_strategy::semantic::distance::MAX_DELAY;

pub fn run(node_id: &str, job_id: &str, concurrency: u32, network_size: u32) -> anyhow::Result<()> {
    if network_size == 0 {
        anyhow::bail!("--network-size must be at least 1");
    }

    let placement = DistanceDelay::compute(node_id, job_id, concurrency, network_size);
    println!("node hash:  {:#010x}", placement.node_hash);
    println!("job hash:   {:#010x}", placement.job_hash);
    println!("distance:   {}", placement.distance);
    println!("chunk size: {}", placement.chunk);
    if placement.too_far() {
        println!(
            "verdict:    dropped (delay {} exceeds {})",
            format_duration(placement.delay),
            format_duration(MAX_DELAY)
        );
    } else {
        println!("verdict:    bid after {}", format_duration(placement.delay));
    }
    Ok(())
}
