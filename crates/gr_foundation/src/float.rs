// crates/gr_foundation/src/float.rs

//! 浮点比较工具与数值常量
//!
//! 大地测量对象的"忽略元数据"比较需要容差比较；严格比较则按位比较
//! （NaN 与 NaN 视为相等，以便未定义的参数也能稳定比较）。

/// 默认绝对容差
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// 迭代算法默认最大迭代次数
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// 迭代算法默认收敛容差（弧度）
pub const DEFAULT_CONVERGENCE_TOL: f64 = 1e-12;

/// 绝对容差比较，两个 NaN 视为相等
#[inline]
#[must_use]
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    if a == b {
        // 覆盖同号无穷
        return true;
    }
    (a - b).abs() <= epsilon
}

/// 相对容差比较，适用于量级差异很大的参数（例如长半轴与扁率）
#[inline]
#[must_use]
pub fn relative_eq(a: f64, b: f64, relative: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs());
    (a - b).abs() <= relative * scale
}

/// 按位比较，NaN 视为相等
#[inline]
#[must_use]
pub fn bits_eq(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()) || a == b
}

/// 判断数值是否有限
#[inline]
#[must_use]
pub fn is_valid_f64(x: f64) -> bool {
    x.is_finite()
}
