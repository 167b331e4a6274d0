//! Example of detecting stops for a whole fleet in parallel.
//!
//! Run with: cargo run --example batch_detection --features parallel

use chrono::{Duration, TimeZone, Utc};
use std::time::Instant;
use stop_detector::{detect_stops_parallel, Fix, StopConfig, VehicleTrack};

fn main() {
    env_logger::init();

    println!("Batch Stop Detection Example\n");

    let t0 = Utc.with_ymd_and_hms(2017, 6, 8, 8, 0, 0).unwrap();

    // 200 buses, each halting at a few stops of varying length
    let tracks: Vec<VehicleTrack> = (0..200)
        .map(|v| {
            let mut lat = -23.50 - v as f64 * 0.002;
            let fixes = (0..720)
                .map(|i| {
                    // Every 60 fixes the bus halts for (v % 12) fixes
                    let halted = i % 60 < (v % 12) as i64;
                    if !halted {
                        lat -= 0.0002;
                    }
                    Fix::new(t0 + Duration::seconds(i * 10), lat, -46.63)
                })
                .collect();
            VehicleTrack::new(format!("bus-{}", v), fixes)
        })
        .collect();

    let total_fixes: usize = tracks.iter().map(|t| t.fixes.len()).sum();
    println!("Created {} vehicle tracks ({} fixes)\n", tracks.len(), total_fixes);

    let config = StopConfig::new(0.5, 60.0);

    let start = Instant::now();
    let results = detect_stops_parallel(&tracks, &config).expect("valid configuration");
    let elapsed = start.elapsed();

    println!("Detection completed in {:?}\n", elapsed);

    for result in results.iter().take(12) {
        println!("  {}: {} stops", result.vehicle_id, result.stop_count());
    }

    // Stats
    let total_stops: usize = results.iter().map(|r| r.stop_count()).sum();
    let busiest = results.iter().map(|r| r.stop_count()).max().unwrap_or(0);
    let without_stops = results.iter().filter(|r| r.stop_count() == 0).count();

    println!("\nStats:");
    println!("  Total stops: {}", total_stops);
    println!("  Most stops for one vehicle: {}", busiest);
    println!("  Vehicles without stops: {}", without_stops);
}
