// ==========================================
// 物料配置导入集成测试
// ==========================================
// 测试目标: CSV 配置表 → article_config 表 → 注册表
// ==========================================

mod test_helpers;

use production_trace::importer::{ArticleConfigImporter, ImportError};
use production_trace::repository::ArticleConfigRepository;
use production_trace::{ContainerType, DateScheme, ScanSettings, TraceApi};
use std::io::Write;
use std::sync::Arc;
use tempfile::Builder;
use test_helpers::{create_test_db, open_shared_connection};

const HEADER: &str = "Workplace,Article Number,Display Name,Container Type,Box Capacity,\
Pallet Capacity,Expected Code Template,Date Ranges,Date Scheme,Hydra Process Codes";

#[test]
fn test_import_csv_and_load_registry() {
    let (_temp_db, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_shared_connection(&db_path).expect("Failed to open db");

    let mut csv_file = Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(csv_file, "{}", HEADER).unwrap();
    writeln!(csv_file, "WP1,ABC,支架,unit-box-pallet,2,4,ABC,3-7,ford,090;100").unwrap();
    writeln!(csv_file, "WP1,XYZ,盖板,unit-box,10,,XYZ,,,090").unwrap();
    writeln!(csv_file, "WP2,BAD,坏配置,unit-box,5,4,BAD,,,").unwrap();
    writeln!(csv_file, "WP1,ABC,重复,unit-box,2,,ABC,,,").unwrap();
    csv_file.flush().unwrap();

    let repo = Arc::new(ArticleConfigRepository::new(conn.clone()));
    let report = ArticleConfigImporter::new(repo.clone())
        .import_file(csv_file.path())
        .expect("import should succeed");

    assert_eq!(report.total_rows, 4);
    assert_eq!(report.imported, 2);
    assert!(!report.is_clean());
    let error_rows: Vec<usize> = report.errors.iter().map(|e| e.row).collect();
    assert_eq!(error_rows, vec![4, 5]);

    let api = TraceApi::from_connection(conn, ScanSettings::default()).unwrap();
    let registry = api.registry().unwrap();
    assert_eq!(registry.len(), 2);

    let abc = registry.lookup("WP1", "ABC").expect("ABC should be loaded");
    assert_eq!(abc.container_type, ContainerType::UnitBoxPallet);
    assert_eq!(abc.pallet_capacity, Some(4));
    assert_eq!(abc.date_scheme, DateScheme::Ford);
    assert_eq!(abc.date_validation_ranges.len(), 1);
    assert!(abc.hydra_process_codes.contains("100"));

    let xyz = registry.lookup("WP1", "XYZ").expect("XYZ should be loaded");
    assert_eq!(xyz.date_scheme, DateScheme::None);
    assert!(xyz.pallet_capacity.is_none());
}

#[test]
fn test_reimport_updates_existing_rows() {
    let (_temp_db, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_shared_connection(&db_path).expect("Failed to open db");
    let repo = Arc::new(ArticleConfigRepository::new(conn.clone()));
    let importer = ArticleConfigImporter::new(repo);

    let mut first = Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(first, "{}", HEADER).unwrap();
    writeln!(first, "WP1,XYZ,盖板,unit-box,10,,XYZ,,,090").unwrap();
    first.flush().unwrap();
    importer.import_file(first.path()).unwrap();

    let api = TraceApi::from_connection(conn, ScanSettings::default()).unwrap();

    let mut second = Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(second, "{}", HEADER).unwrap();
    writeln!(second, "WP1,XYZ,盖板,unit-box,12,,XYZ,,,090").unwrap();
    second.flush().unwrap();
    let report = importer.import_file(second.path()).unwrap();
    assert!(report.is_clean());

    // 重载前仍是旧配置
    assert_eq!(
        api.registry().unwrap().lookup("WP1", "XYZ").unwrap().box_capacity,
        10
    );
    assert_eq!(api.reload_articles().unwrap(), 1);
    assert_eq!(
        api.registry().unwrap().lookup("WP1", "XYZ").unwrap().box_capacity,
        12
    );
}

#[test]
fn test_missing_file_is_reported() {
    let (_temp_db, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_shared_connection(&db_path).expect("Failed to open db");
    let importer = ArticleConfigImporter::new(Arc::new(ArticleConfigRepository::new(conn)));

    assert!(matches!(
        importer.import_file("does_not_exist.csv"),
        Err(ImportError::FileNotFound(_))
    ));
}
