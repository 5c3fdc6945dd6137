// Maintenance utility: move closed scan records older than the retention window
// from the live table into the archive table.
//
// Usage:
//   cargo run --bin archive_scan_records -- [db_path] [after_days]
//
// Without after_days the `archive_after_days` setting (config_kv) is used.

use production_trace::db::default_db_path;
use production_trace::{logging, TraceApi};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let db_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default_db_path);
    let after_days = match args.next() {
        Some(raw) => Some(
            raw.trim()
                .parse::<i64>()
                .map_err(|e| format!("after_days 不是整数: {} ({})", raw, e))?,
        ),
        None => None,
    };

    let api = TraceApi::open(&db_path).await?;
    let moved = api.archive_closed_records(after_days, "archive_scan_records")?;

    println!("db={} archived={}", db_path, moved);
    Ok(())
}
