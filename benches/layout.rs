use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use ulid::Ulid;

use daygrid::calendar::days_in_month;
use daygrid::dispatch::{Command, Dispatcher};
use daygrid::layout::{find_available_position, LayoutConfig};
use daygrid::model::EventDraft;
use daygrid::notify::ChangeHub;
use daygrid::store::Store;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

/// Pure first-fit search over increasingly crowded cells.
fn phase1_find_position() {
    for &n in &[0usize, 10, 100, 1000] {
        // Packed cell, so the search walks every slot.
        let tops: Vec<f64> = (0..n).map(|i| 4.0 + 40.0 * i as f64).collect();
        let rounds = 10_000;
        let start = Instant::now();
        let mut sink = 0.0;
        for _ in 0..rounds {
            sink += find_available_position(&tops, 36.0, 4.0).unwrap_or(0.0);
        }
        let elapsed = start.elapsed();
        println!(
            "  {n:>5} slots: {:.2}us per call (checksum {sink})",
            elapsed.as_secs_f64() * 1e6 / rounds as f64
        );
    }
}

/// Creates through the command queue, then full-month grid layouts.
async fn phase2_store(resources: usize, events_per_resource: usize) {
    let dir = std::env::temp_dir().join(format!("daygrid_bench_{}", Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();
    let store = Arc::new(
        Store::open(dir.join("calendar.wal"), Arc::new(ChangeHub::new()), LayoutConfig::default())
            .unwrap(),
    );
    let dispatcher = Dispatcher::spawn(store.clone());
    let month = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let days = days_in_month(month);

    let mut rids = Vec::with_capacity(resources);
    for i in 0..resources {
        let id = Ulid::new();
        dispatcher
            .submit(Command::CreateResource { id: Some(id), name: format!("Resource {i}") })
            .await
            .unwrap();
        rids.push(id);
    }

    let mut create = Vec::with_capacity(resources * events_per_resource);
    let start = Instant::now();
    for (r, &rid) in rids.iter().enumerate() {
        for e in 0..events_per_resource {
            let day = days[(r * 7 + e * 3) % days.len()];
            let draft = EventDraft::new(rid, format!("Job {e}"), day);
            let t = Instant::now();
            dispatcher
                .submit(Command::CreateEvent { id: None, draft })
                .await
                .unwrap();
            create.push(t.elapsed());
        }
    }
    let elapsed = start.elapsed();
    println!(
        "  {} events in {:.2}s = {:.0} ops/sec",
        create.len(),
        elapsed.as_secs_f64(),
        create.len() as f64 / elapsed.as_secs_f64()
    );
    print_latency("create_event", &mut create);

    let mut grid = Vec::new();
    for _ in 0..20 {
        let t = Instant::now();
        store.layout_month(month).await.unwrap();
        grid.push(t.elapsed());
    }
    print_latency("layout_month", &mut grid);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::main]
async fn main() {
    println!("=== daygrid layout benchmark ===");

    println!("\n[phase 1] find_available_position");
    phase1_find_position();

    println!("\n[phase 2] store: 15 resources x 200 events");
    phase2_store(15, 200).await;
}
