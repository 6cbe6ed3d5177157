// crates/gr_referencing/src/prime_meridian.rs

//! 本初子午线

use std::fmt;
use std::sync::Arc;

use gr_foundation::float::approx_eq;

use crate::error::{ReferencingError, ReferencingResult};
use crate::identified::{arc_equals, Comparable, ComparisonMode, IdentifiedObject};
use crate::metadata::{self, Describe, PropertyDescriptor};
use crate::unit::{Unit, UnitKind};

/// 本初子午线：相对格林尼治的经度
#[derive(Debug, Clone)]
pub struct PrimeMeridian {
    /// 元数据
    pub object: IdentifiedObject,
    /// 相对格林尼治的经度（以 `unit` 表示）
    greenwich_longitude: f64,
    /// 角度单位
    unit: Arc<Unit>,
}

impl PrimeMeridian {
    /// 创建本初子午线，单位必须是角度单位
    pub fn new(
        object: IdentifiedObject,
        greenwich_longitude: f64,
        unit: Arc<Unit>,
    ) -> ReferencingResult<Self> {
        if unit.kind != UnitKind::Angular {
            return Err(ReferencingError::invalid_definition(format!(
                "本初子午线 \"{}\" 的单位 \"{}\" 不是角度单位",
                object.name,
                unit.name()
            )));
        }
        Ok(Self {
            object,
            greenwich_longitude,
            unit,
        })
    }

    /// 名称
    pub fn name(&self) -> &str {
        &self.object.name
    }

    /// 格林尼治子午线 (EPSG:8901)
    pub fn greenwich() -> Self {
        Self {
            object: IdentifiedObject::with_code("Greenwich", "EPSG", "8901"),
            greenwich_longitude: 0.0,
            unit: Arc::new(Unit::degree()),
        }
    }

    /// 相对格林尼治的经度（以本身单位表示）
    #[inline]
    pub fn greenwich_longitude(&self) -> f64 {
        self.greenwich_longitude
    }

    /// 相对格林尼治的经度（度）
    pub fn greenwich_longitude_degrees(&self) -> f64 {
        self.unit.to_base(self.greenwich_longitude).to_degrees()
    }

    /// 角度单位
    pub fn unit(&self) -> &Arc<Unit> {
        &self.unit
    }

    /// 是否为格林尼治
    pub fn is_greenwich(&self) -> bool {
        self.greenwich_longitude == 0.0
    }
}

impl Comparable for PrimeMeridian {
    fn equals(&self, other: &Self, mode: ComparisonMode) -> bool {
        let longitude = match mode {
            ComparisonMode::Strict => {
                self.greenwich_longitude == other.greenwich_longitude
                    && arc_equals(&self.unit, &other.unit, mode)
            }
            ComparisonMode::IgnoreMetadata => approx_eq(
                self.greenwich_longitude_degrees(),
                other.greenwich_longitude_degrees(),
                1e-10,
            ),
        };
        longitude && self.object.equals(&other.object, mode)
    }
}

impl PartialEq for PrimeMeridian {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, ComparisonMode::Strict)
    }
}

impl fmt::Display for PrimeMeridian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} {})", self.object.name, self.greenwich_longitude, self.unit)
    }
}

impl Describe for PrimeMeridian {
    const KIND: &'static str = "本初子午线";
    const PROPERTIES: &'static [PropertyDescriptor<Self>] = &[
        PropertyDescriptor { name: "名称", get: |p| Some(p.object.name.clone()) },
        PropertyDescriptor { name: "标识符", get: |p| metadata::identifiers(&p.object) },
        PropertyDescriptor { name: "格林尼治经度", get: |p| metadata::number(p.greenwich_longitude) },
        PropertyDescriptor { name: "单位", get: |p| Some(p.unit.name().to_string()) },
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 测试以百分度表示的巴黎子午线
    #[test]
    fn test_paris_in_grads() {
        let paris = PrimeMeridian::new(
            IdentifiedObject::with_code("Paris", "EPSG", "8903"),
            2.5969213,
            Arc::new(Unit::grad()),
        )
        .unwrap();
        assert!((paris.greenwich_longitude_degrees() - 2.337_229_17).abs() < 1e-7);
        assert!(!paris.is_greenwich());
        assert_eq!(paris.name(), "Paris");
    }

    #[test]
    fn test_describe() {
        let greenwich = PrimeMeridian::greenwich();
        assert_eq!(greenwich.property("名称").as_deref(), Some("Greenwich"));
        assert_eq!(greenwich.describe().len(), 4);
    }

    #[test]
    fn test_linear_unit_rejected() {
        let result = PrimeMeridian::new(IdentifiedObject::named("x"), 0.0, Arc::new(Unit::metre()));
        assert!(result.is_err());
    }
}
