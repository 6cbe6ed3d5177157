// crates/gr_referencing/src/authority/queries.rs

//! 查询目录
//!
//! 每种查询用途对应一条可移植 SQL，工厂按用途缓存改写后的文本，
//! 预编译语句由连接的语句缓存持有。

/// 权威库中的对象类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// 计量单位
    Unit,
    /// 椭球体
    Ellipsoid,
    /// 本初子午线
    PrimeMeridian,
    /// 基准面
    Datum,
    /// 坐标系
    CoordinateSystem,
    /// 坐标参考系统
    Crs,
    /// 坐标操作
    Operation,
}

impl ObjectKind {
    /// `create_object` 的探测顺序
    pub const LOOKUP_ORDER: [ObjectKind; 5] = [
        ObjectKind::Crs,
        ObjectKind::CoordinateSystem,
        ObjectKind::Datum,
        ObjectKind::Ellipsoid,
        ObjectKind::PrimeMeridian,
    ];

    /// 全部类别
    pub const ALL: [ObjectKind; 7] = [
        ObjectKind::Unit,
        ObjectKind::Ellipsoid,
        ObjectKind::PrimeMeridian,
        ObjectKind::Datum,
        ObjectKind::CoordinateSystem,
        ObjectKind::Crs,
        ObjectKind::Operation,
    ];

    /// 表名（可移植形式），同时是别名表中的 `OBJECT_TABLE_NAME`
    pub fn table(self) -> &'static str {
        match self {
            Self::Unit => "Unit of Measure",
            Self::Ellipsoid => "Ellipsoid",
            Self::PrimeMeridian => "Prime Meridian",
            Self::Datum => "Datum",
            Self::CoordinateSystem => "Coordinate System",
            Self::Crs => "Coordinate Reference System",
            Self::Operation => "Coordinate_Operation",
        }
    }

    /// 代码列
    pub fn code_column(self) -> &'static str {
        match self {
            Self::Unit => "UOM_CODE",
            Self::Ellipsoid => "ELLIPSOID_CODE",
            Self::PrimeMeridian => "PRIME_MERIDIAN_CODE",
            Self::Datum => "DATUM_CODE",
            Self::CoordinateSystem => "COORD_SYS_CODE",
            Self::Crs => "COORD_REF_SYS_CODE",
            Self::Operation => "COORD_OP_CODE",
        }
    }

    /// 名称列
    pub fn name_column(self) -> &'static str {
        match self {
            Self::Unit => "UNIT_OF_MEAS_NAME",
            Self::Ellipsoid => "ELLIPSOID_NAME",
            Self::PrimeMeridian => "PRIME_MERIDIAN_NAME",
            Self::Datum => "DATUM_NAME",
            Self::CoordinateSystem => "COORD_SYS_NAME",
            Self::Crs => "COORD_REF_SYS_NAME",
            Self::Operation => "COORD_OP_NAME",
        }
    }

    /// 错误信息中的类别名
    pub fn label(self) -> &'static str {
        match self {
            Self::Unit => "单位",
            Self::Ellipsoid => "椭球体",
            Self::PrimeMeridian => "本初子午线",
            Self::Datum => "基准面",
            Self::CoordinateSystem => "坐标系",
            Self::Crs => "坐标参考系统",
            Self::Operation => "坐标操作",
        }
    }
}

/// 查询用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryPurpose {
    /// 单位
    Unit,
    /// 椭球体
    Ellipsoid,
    /// 本初子午线
    PrimeMeridian,
    /// 基准面
    Datum,
    /// 坐标系
    CoordinateSystem,
    /// 坐标系的轴
    Axes,
    /// 坐标参考系统
    Crs,
    /// 坐标操作
    Operation,
    /// 操作方法
    Method,
    /// 操作参数值
    ParameterValues,
    /// 串联操作的步骤
    OperationPath,
    /// 按源/目标 CRS 查询操作
    OperationsBetween,
    /// 基准面到 WGS 84 的 Bursa-Wolf 操作
    BursaWolf,
    /// 有效范围
    Area,
    /// 别名
    Aliases,
    /// 某类对象是否存在该代码
    Exists(ObjectKind),
    /// 某类对象的名称
    Name(ObjectKind),
    /// 按名称查找代码
    CodeByName(ObjectKind),
    /// 某类对象的全部代码
    Codes(ObjectKind),
}

impl QueryPurpose {
    /// 可移植 SQL
    pub fn sql(self) -> String {
        match self {
            Self::Unit => "SELECT UNIT_OF_MEAS_NAME, UNIT_OF_MEAS_TYPE, TARGET_UOM_CODE, FACTOR_B, FACTOR_C, REMARKS \
                 FROM [Unit of Measure] WHERE UOM_CODE = ?1"
                .into(),
            Self::Ellipsoid => "SELECT ELLIPSOID_NAME, SEMI_MAJOR_AXIS, INV_FLATTENING, SEMI_MINOR_AXIS, UOM_CODE, REMARKS \
                 FROM [Ellipsoid] WHERE ELLIPSOID_CODE = ?1"
                .into(),
            Self::PrimeMeridian => "SELECT PRIME_MERIDIAN_NAME, GREENWICH_LONGITUDE, UOM_CODE, REMARKS \
                 FROM [Prime Meridian] WHERE PRIME_MERIDIAN_CODE = ?1"
                .into(),
            Self::Datum => "SELECT DATUM_NAME, DATUM_TYPE, ELLIPSOID_CODE, PRIME_MERIDIAN_CODE, DATUM_SCOPE, REMARKS \
                 FROM [Datum] WHERE DATUM_CODE = ?1"
                .into(),
            Self::CoordinateSystem => "SELECT COORD_SYS_NAME, COORD_SYS_TYPE, DIMENSION, REMARKS \
                 FROM [Coordinate System] WHERE COORD_SYS_CODE = ?1"
                .into(),
            Self::Axes => "SELECT n.COORD_AXIS_NAME, a.COORD_AXIS_ABBREVIATION, a.COORD_AXIS_ORIENTATION, a.UOM_CODE \
                 FROM [Coordinate Axis] a \
                 JOIN [Coordinate Axis Name] n ON a.COORD_AXIS_NAME_CODE = n.COORD_AXIS_NAME_CODE \
                 WHERE a.COORD_SYS_CODE = ?1 ORDER BY a.AXIS_ORDER"
                .into(),
            Self::Crs => "SELECT COORD_REF_SYS_NAME, COORD_REF_SYS_KIND, COORD_SYS_CODE, DATUM_CODE, \
                 SOURCE_GEOGCRS_CODE, PROJECTION_CONV_CODE, CMPD_HORIZCRS_CODE, CMPD_VERTCRS_CODE, \
                 AREA_OF_USE_CODE, CRS_SCOPE, REMARKS \
                 FROM [Coordinate Reference System] WHERE COORD_REF_SYS_CODE = ?1"
                .into(),
            Self::Operation => "SELECT COORD_OP_NAME, COORD_OP_TYPE, SOURCE_CRS_CODE, TARGET_CRS_CODE, \
                 COORD_TFM_VERSION, AREA_OF_USE_CODE, COORD_OP_SCOPE, COORD_OP_ACCURACY, \
                 COORD_OP_METHOD_CODE, REMARKS \
                 FROM [Coordinate_Operation] WHERE COORD_OP_CODE = ?1"
                .into(),
            Self::Method => "SELECT COORD_OP_METHOD_NAME, FORMULA, REMARKS \
                 FROM [Coordinate_Operation Method] WHERE COORD_OP_METHOD_CODE = ?1"
                .into(),
            Self::ParameterValues => "SELECT p.PARAMETER_NAME, v.PARAMETER_CODE, v.PARAMETER_VALUE, v.UOM_CODE \
                 FROM [Coordinate_Operation Parameter Value] v \
                 JOIN [Coordinate_Operation Parameter] p ON v.PARAMETER_CODE = p.PARAMETER_CODE \
                 LEFT JOIN [Coordinate_Operation Parameter Usage] u \
                   ON u.PARAMETER_CODE = v.PARAMETER_CODE AND u.COORD_OP_METHOD_CODE = v.COORD_OP_METHOD_CODE \
                 WHERE v.COORD_OP_CODE = ?1 AND v.COORD_OP_METHOD_CODE = ?2 \
                 ORDER BY u.SORT_ORDER, v.PARAMETER_CODE"
                .into(),
            Self::OperationPath => "SELECT SINGLE_OPERATION_CODE FROM [Coordinate_Operation Path] \
                 WHERE CONCAT_OPERATION_CODE = ?1 ORDER BY OP_PATH_STEP"
                .into(),
            Self::OperationsBetween => "SELECT COORD_OP_CODE FROM [Coordinate_Operation] \
                 WHERE SOURCE_CRS_CODE = ?1 AND TARGET_CRS_CODE = ?2 \
                 ORDER BY COALESCE(COORD_OP_ACCURACY, 999999), COORD_OP_CODE"
                .into(),
            Self::BursaWolf => "SELECT co.COORD_OP_CODE, co.COORD_OP_METHOD_CODE \
                 FROM [Coordinate_Operation] co \
                 JOIN [Coordinate Reference System] crs ON co.SOURCE_CRS_CODE = crs.COORD_REF_SYS_CODE \
                 WHERE crs.DATUM_CODE = ?1 AND co.TARGET_CRS_CODE = 4326 \
                   AND co.COORD_OP_METHOD_CODE IN (9603, 9606, 9607) \
                 ORDER BY COALESCE(co.COORD_OP_ACCURACY, 999999), co.COORD_OP_CODE"
                .into(),
            Self::Area => "SELECT AREA_NAME, AREA_OF_USE, AREA_SOUTH_BOUND_LAT, AREA_NORTH_BOUND_LAT, \
                 AREA_WEST_BOUND_LON, AREA_EAST_BOUND_LON FROM [Area] WHERE AREA_CODE = ?1"
                .into(),
            Self::Aliases => "SELECT a.ALIAS, n.NAMING_SYSTEM_NAME FROM [Alias] a \
                 LEFT JOIN [Naming System] n ON a.NAMING_SYSTEM_CODE = n.NAMING_SYSTEM_CODE \
                 WHERE a.OBJECT_TABLE_NAME = ?1 AND a.OBJECT_CODE = ?2 ORDER BY a.ALIAS_CODE"
                .into(),
            Self::Exists(kind) => format!(
                "SELECT 1 FROM [{}] WHERE {} = ?1",
                kind.table(),
                kind.code_column()
            ),
            Self::Name(kind) => format!(
                "SELECT {} FROM [{}] WHERE {} = ?1",
                kind.name_column(),
                kind.table(),
                kind.code_column()
            ),
            Self::CodeByName(kind) => format!(
                "SELECT {} FROM [{}] WHERE LOWER({}) = LOWER(?1)",
                kind.code_column(),
                kind.table(),
                kind.name_column()
            ),
            Self::Codes(kind) => format!(
                "SELECT DISTINCT {code} FROM [{}] ORDER BY {code}",
                kind.table(),
                code = kind.code_column()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_queries_use_kind_tables() {
        let sql = QueryPurpose::Exists(ObjectKind::Crs).sql();
        assert_eq!(sql, "SELECT 1 FROM [Coordinate Reference System] WHERE COORD_REF_SYS_CODE = ?1");
        assert!(QueryPurpose::Codes(ObjectKind::Unit).sql().contains("ORDER BY UOM_CODE"));
    }
}
