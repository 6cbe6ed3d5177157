// crates/gr_referencing/tests/operations.rs

//! 坐标操作集成测试
//!
//! 使用内置权威库（内存 SQLite），覆盖
//! 权威库优先 → 独立推导 → 缓存 的完整工厂链。

use std::sync::Arc;

use gr_config::{CacheConfig, CachePolicy, EngineConfig};
use gr_referencing::geometry::transform_envelope_by_operation;
use gr_referencing::operation::buffered::cached;
use gr_referencing::operation::AccuracyEstimator;
use gr_referencing::prelude::*;

type Chain = AuthorityBackedFactory<Arc<EpsgFactory>, StandaloneOperationFactory>;

fn setup() -> (Arc<EpsgFactory>, Chain) {
    let epsg = Arc::new(EpsgFactory::in_memory().unwrap());
    let chain = AuthorityBackedFactory::new(epsg.clone(), StandaloneOperationFactory::new());
    (epsg, chain)
}

fn crs(epsg: &EpsgFactory, code: &str) -> Arc<CoordinateReferenceSystem> {
    epsg.create_coordinate_reference_system(code).unwrap()
}

fn apply(op: &CoordinateOperation, point: &[f64]) -> Vec<f64> {
    op.transform().unwrap().apply(point).unwrap()
}

/// 测试库中没有 4326→3857 的操作时退回到独立推导
#[test]
fn test_pseudo_mercator_falls_back_to_standalone() {
    let (epsg, chain) = setup();
    let source = crs(&epsg, "EPSG:4326");
    let target = crs(&epsg, "EPSG:3857");

    let op = chain.create_operation(&source, &target).unwrap();
    assert!(Arc::ptr_eq(op.source_crs().unwrap(), &source));
    assert!(Arc::ptr_eq(op.target_crs().unwrap(), &target));

    // 4326 的轴序为 纬度, 经度
    let xy = apply(&op, &[40.0, 116.0]);
    assert!((xy[0] - 12_913_060.932).abs() < 1e-2);
    assert!((xy[1] - 4_865_942.280).abs() < 1e-2);
}

#[test]
fn test_utm_zone_50() {
    let (epsg, chain) = setup();
    let op = chain
        .create_operation(&crs(&epsg, "4326"), &crs(&epsg, "32650"))
        .unwrap();
    let xy = apply(&op, &[40.0, 116.0]);
    assert!((xy[0] - 414_639.538).abs() < 1e-2);
    assert!((xy[1] - 4_428_236.065).abs() < 1e-2);

    let back = op.transform().unwrap().inverse().unwrap().apply(&xy).unwrap();
    assert!((back[0] - 40.0).abs() < 1e-8);
    assert!((back[1] - 116.0).abs() < 1e-8);
}

/// 测试同一 CRS 之间得到恒等操作
#[test]
fn test_identity_operation() {
    let (epsg, chain) = setup();
    let wgs84 = crs(&epsg, "4326");
    let op = chain.create_operation(&wgs84, &wgs84).unwrap();
    assert!(op.is_identity());
    assert_eq!(apply(&op, &[12.5, -3.25]), vec![12.5, -3.25]);
}

/// 测试权威库中的 Pulkovo 1942 → WGS 84 变换
#[test]
fn test_pulkovo_shift_from_database() {
    let (epsg, chain) = setup();
    let op = chain
        .create_operation(&crs(&epsg, "4284"), &crs(&epsg, "4326"))
        .unwrap();
    assert_eq!(op.object.identifiers[0].code, "1254");

    let out = apply(&op, &[55.75, 37.6167]);
    assert!((out[0] - 55.749966835).abs() < 1e-7);
    assert!((out[1] - 37.614787983).abs() < 1e-7);

    let estimator = AccuracyEstimator::default();
    assert!((estimator.accuracy(&op) - 6.0).abs() < 1e-12);
}

/// 测试只有反向记录时对操作求逆
#[test]
fn test_reversed_pair_is_inverted() {
    let (epsg, chain) = setup();
    let nad27 = crs(&epsg, "4267");
    let wgs84 = crs(&epsg, "4326");

    let forward = chain.create_operation(&nad27, &wgs84).unwrap();
    let shifted = apply(&forward, &[40.0, -100.0]);
    assert!((shifted[0] - 40.0000094828).abs() < 1e-8);
    assert!((shifted[1] + 100.0004176222).abs() < 1e-8);

    let reverse = chain.create_operation(&wgs84, &nad27).unwrap();
    assert!(Arc::ptr_eq(reverse.source_crs().unwrap(), &wgs84));
    assert!(Arc::ptr_eq(reverse.target_crs().unwrap(), &nad27));
    let back = apply(&reverse, &shifted);
    assert!((back[0] - 40.0).abs() < 1e-6);
    assert!((back[1] + 100.0).abs() < 1e-6);
}

/// 测试串联操作的精度为各步骤之和
#[test]
fn test_concatenated_operation_from_database() {
    let (epsg, chain) = setup();
    let op = chain
        .create_operation(&crs(&epsg, "4284"), &crs(&epsg, "4258"))
        .unwrap();
    assert_eq!(op.steps().len(), 2);
    assert!((AccuracyEstimator::default().accuracy(&op) - 7.0).abs() < 1e-12);

    let out = apply(&op, &[55.75, 37.6167]);
    assert!((out[0] - 55.749966835).abs() < 1e-7);
    assert!((out[1] - 37.614787983).abs() < 1e-7);
}

/// 测试缺少 Bursa-Wolf 参数时按配置决定是否省略基准面转换
#[test]
fn test_lenient_datum_shift() {
    let epsg = Arc::new(EpsgFactory::in_memory().unwrap());
    let paris = crs(&epsg, "4807");
    let wgs84 = crs(&epsg, "4326");

    let strict = StandaloneOperationFactory::new();
    let err = strict.create_operation(&paris, &wgs84).unwrap_err();
    assert!(matches!(err, ReferencingError::OperationNotFound { .. }));

    let config = EngineConfig {
        lenient_datum_shift: true,
        ..EngineConfig::default()
    };
    let lenient = StandaloneOperationFactory::from_config(&config);
    let op = lenient.create_operation(&paris, &wgs84).unwrap();
    let estimator = AccuracyEstimator::new(config.accuracy);
    assert!((estimator.accuracy(&op) - config.accuracy.datum_shift_omitted).abs() < 1e-12);
}

/// 测试 LRU 缓存命中返回同一个操作
#[test]
fn test_cache_hit_returns_same_operation() {
    let (epsg, chain) = setup();
    let source = crs(&epsg, "4326");
    let target = crs(&epsg, "32631");
    let factory = CachingOperationFactory::new(chain, 8);

    let first = factory.create_operation(&source, &target).unwrap();
    let second = factory.create_operation(&source, &target).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(factory.stats().hits(), 1);
    assert_eq!(factory.stats().misses(), 1);
}

#[test]
fn test_cached_by_policy() {
    let (epsg, chain) = setup();
    let config = CacheConfig {
        policy: CachePolicy::Soft,
        ..CacheConfig::default()
    };
    let factory = cached(chain, &config);
    let source = crs(&epsg, "4326");
    let target = crs(&epsg, "3395");
    let first = factory.create_operation(&source, &target).unwrap();
    let second = factory.create_operation(&source, &target).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

/// 测试包络经 UTM 操作变换后关联目标 CRS
#[test]
fn test_envelope_through_operation() {
    let (epsg, chain) = setup();
    let source = crs(&epsg, "4326");
    let target = crs(&epsg, "32650");
    let op = chain.create_operation(&source, &target).unwrap();

    let envelope = Envelope::from_corners(&[39.5, 116.0], &[40.5, 118.0])
        .unwrap()
        .with_crs(source.clone())
        .unwrap();
    let projected = transform_envelope_by_operation(&op, &envelope).unwrap();
    assert!(Arc::ptr_eq(projected.crs().unwrap(), &target));
    assert!(projected.minimum(0) < 500_000.0 && projected.maximum(0) > 500_000.0);
    assert!(projected.minimum(1) < 4_428_236.0 && projected.maximum(1) > 4_428_236.0);
}

/// 测试包络 CRS 与操作源不一致时报错
#[test]
fn test_envelope_crs_mismatch() {
    let (epsg, chain) = setup();
    let op = chain
        .create_operation(&crs(&epsg, "4326"), &crs(&epsg, "3857"))
        .unwrap();
    let envelope = Envelope::from_corners(&[0.0, 0.0], &[1.0, 1.0])
        .unwrap()
        .with_crs(crs(&epsg, "32650"))
        .unwrap();
    assert!(transform_envelope_by_operation(&op, &envelope).is_err());
}

#[test]
fn test_compound_to_engineering_is_not_found() {
    let (epsg, chain) = setup();
    let err = chain
        .create_operation(&crs(&epsg, "9705"), &crs(&epsg, "5800"))
        .unwrap_err();
    assert!(matches!(err, ReferencingError::OperationNotFound { .. }));
}
