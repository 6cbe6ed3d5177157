// crates/gr_referencing/tests/authority.rs

//! 权威工厂集成测试

use std::sync::Arc;
use std::thread;

use gr_referencing::authority::{AnsiDialect, BracketDialect};
use gr_referencing::prelude::*;
use rusqlite::Connection;

/// 测试多线程请求同一代码得到同一实例
#[test]
fn test_concurrent_requests_share_instances() {
    let epsg = Arc::new(EpsgFactory::in_memory().unwrap());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let epsg = epsg.clone();
            thread::spawn(move || epsg.create_coordinate_reference_system("EPSG:4326").unwrap())
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for crs in &results[1..] {
        assert!(Arc::ptr_eq(crs, &results[0]));
    }
}

/// 测试独立请求的单位与 CRS 轴上的单位共享实例
#[test]
fn test_degree_is_shared() {
    let epsg = EpsgFactory::in_memory().unwrap();
    let degree = epsg.create_unit("9122").unwrap();
    let crs = epsg.create_coordinate_reference_system("4326").unwrap();
    let cs = crs.coordinate_system().unwrap();
    assert!(Arc::ptr_eq(&cs.axes[0].unit, &degree));
    assert_eq!(degree.kind, UnitKind::Angular);
}

#[test]
fn test_unknown_code_is_reported() {
    let epsg = EpsgFactory::in_memory().unwrap();
    let err = epsg.create_coordinate_reference_system("EPSG:999999").unwrap_err();
    assert!(matches!(err, ReferencingError::NoSuchAuthorityCode { .. }));
    // 失败不影响后续请求
    assert!(epsg.create_coordinate_reference_system("4326").is_ok());
}

/// 测试按类别未知的代码探测
#[test]
fn test_create_object_and_wkt() {
    let epsg = EpsgFactory::in_memory().unwrap();
    let object = epsg.create_object("32650").unwrap();
    assert_eq!(object.kind(), ObjectKind::Crs);
    let wkt = object.to_wkt();
    assert!(wkt.starts_with("PROJCS[\"WGS 84 / UTM zone 50N\""));
    assert!(wkt.contains("AUTHORITY[\"EPSG\", \"32650\"]"));

    let ellipsoid = epsg.create_object("7030").unwrap();
    assert_eq!(ellipsoid.kind(), ObjectKind::Ellipsoid);
    assert!(ellipsoid.describe().iter().any(|(name, _)| *name == "长半轴"));
}

#[test]
fn test_authority_codes_and_description() {
    let epsg = EpsgFactory::in_memory().unwrap();
    let codes = epsg.authority_codes(ObjectKind::Crs).unwrap();
    assert!(codes.iter().any(|c| c == "4326"));
    assert!(codes.iter().any(|c| c == "9705"));
    assert_eq!(epsg.description_text("7019").unwrap(), "GRS 1980");
}

/// 测试写入文件后按驱动重新打开
#[test]
fn test_file_database_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("epsg.db");
    EpsgDatabase::create_file(&path, &AnsiDialect::default()).unwrap();

    let url = path.to_str().unwrap();
    let epsg = EpsgFactory::open(url, "ansi").unwrap();
    assert!(epsg.is_available());
    let crs = epsg.create_coordinate_reference_system("3857").unwrap();
    assert_eq!(crs.kind_label(), "投影");

    // 表名与驱动不符时打开失败
    assert!(EpsgFactory::open(url, "sqlite").is_err());
}

#[test]
fn test_duplicate_rows_are_rejected() {
    let conn = Connection::open_in_memory().unwrap();
    EpsgDatabase::install(&conn, &BracketDialect).unwrap();
    conn.execute(
        "INSERT INTO [Ellipsoid] (ELLIPSOID_CODE, ELLIPSOID_NAME, SEMI_MAJOR_AXIS, UOM_CODE, INV_FLATTENING) \
         VALUES (7022, 'International 1924', 6378300.0, 9001, 297.0)",
        [],
    )
    .unwrap();
    let epsg = EpsgFactory::new(conn, Box::new(BracketDialect));
    let err = epsg.create_ellipsoid("7022").unwrap_err();
    assert!(matches!(err, ReferencingError::DuplicateDefinition { .. }));
}

#[test]
fn test_missing_semi_major_axis() {
    let conn = Connection::open_in_memory().unwrap();
    EpsgDatabase::install(&conn, &BracketDialect).unwrap();
    conn.execute(
        "INSERT INTO [Ellipsoid] (ELLIPSOID_CODE, ELLIPSOID_NAME, UOM_CODE, INV_FLATTENING) \
         VALUES (7999, 'Broken', 9001, 300.0)",
        [],
    )
    .unwrap();
    let epsg = EpsgFactory::new(conn, Box::new(BracketDialect));
    let err = epsg.create_ellipsoid("7999").unwrap_err();
    assert!(matches!(err, ReferencingError::MissingRequiredField { .. }));
}

/// 测试释放后查询报告底层故障
#[test]
fn test_dispose_then_query() {
    let epsg = EpsgFactory::in_memory().unwrap();
    epsg.dispose();
    assert!(!epsg.is_available());
    let err = epsg.create_datum("6326").unwrap_err();
    assert!(matches!(err, ReferencingError::FactoryFailure { .. }));
}
