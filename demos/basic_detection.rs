//! Basic example of detecting stops in one bus trajectory.
//!
//! Run with: cargo run --example basic_detection

use chrono::{Duration, TimeZone, Utc};
use stop_detector::{Fix, StopConfig, StopDetector};

fn main() {
    env_logger::init();

    let t0 = Utc.with_ymd_and_hms(2017, 6, 8, 8, 0, 0).unwrap();

    // A bus driving up Avenida Paulista, one fix every 10 seconds:
    // 2 minutes of traffic, a 90 second halt at a stop, then moving again
    let mut fixes = Vec::new();
    let mut lat = -23.5614;
    let mut lng = -46.6559;
    for i in 0..40 {
        let halted = (12..22).contains(&i);
        if !halted {
            lat += 0.0003;
            lng -= 0.0004;
        }
        fixes.push(Fix::with_payload(
            t0 + Duration::seconds(i * 10),
            lat,
            lng,
            format!("fix-{}", i),
        ));
    }

    let config = StopConfig::new(0.5, 60.0);
    let detector = StopDetector::new(config).expect("valid configuration");

    println!("Stop Detection Example\n");
    println!(
        "Config: max_average_speed={}m/s, min_time={}s, max_fix_gap={}s\n",
        config.max_average_speed, config.min_time, config.max_fix_gap
    );

    let report = detector.detect_with_stats(&fixes).expect("well-formed coordinates");

    for (i, stop) in report.segments.iter().enumerate() {
        println!("Stop {}:", i + 1);
        println!("   From: {} ({})", stop.start_time, stop.fixes[0].payload);
        println!("   To:   {} ({})", stop.end_time, stop.fixes[stop.len() - 1].payload);
        println!("   Duration: {:.0}s over {} fixes", stop.duration_seconds, stop.len());
        println!("   Distance: {:.1}m, average speed {:.2}m/s", stop.total_distance, stop.average_speed());
        if let Some(center) = stop.center() {
            println!("   Location: {:.5}, {:.5}", center.latitude, center.longitude);
        }
        match stop.to_line_string() {
            Some(line) => println!("   Geometry: {} points\n", line.0.len()),
            None => println!("   Geometry: not enough valid points\n"),
        }
    }

    println!(
        "Candidates: {}, emitted: {}, discarded as too short: {}",
        report.stats.candidates, report.stats.emitted, report.stats.discarded
    );
}
