// Maintenance utility: import article configurations from a CSV / Excel sheet
// into the article_config table.
//
// Usage:
//   cargo run --bin import_article_configs -- <file> [db_path]
//
// Rejected rows are printed with their row number; valid rows are still imported.

use production_trace::db::{default_db_path, init_schema, open_sqlite_connection};
use production_trace::importer::ArticleConfigImporter;
use production_trace::logging;
use production_trace::repository::ArticleConfigRepository;
use std::sync::{Arc, Mutex};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let file = args
        .next()
        .ok_or("用法: import_article_configs <file> [db_path]")?;
    let db_path = args.next().unwrap_or_else(default_db_path);

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let repo = Arc::new(ArticleConfigRepository::new(Arc::new(Mutex::new(conn))));

    let report = ArticleConfigImporter::new(repo).import_file(&file)?;

    for err in &report.errors {
        eprintln!("row {}: {}", err.row, err.message);
    }
    println!(
        "file={} rows={} imported={} rejected={}",
        file,
        report.total_rows,
        report.imported,
        report.errors.len()
    );

    if report.is_clean() {
        Ok(())
    } else {
        Err(format!("{} 行被拒绝", report.errors.len()).into())
    }
}
