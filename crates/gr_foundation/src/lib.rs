// crates/gr_foundation/src/lib.rs

//! GeoRef Foundation Layer
//!
//! 整个工作区共享的最底层抽象，不依赖任何地理领域概念。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `GrError`
//! - [`float`]: 浮点比较与数值常量
//!
//! # 示例
//!
//! ```
//! use gr_foundation::{float::approx_eq, GrError, GrResult};
//!
//! fn check(value: f64) -> GrResult<f64> {
//!     if value.is_finite() {
//!         Ok(value)
//!     } else {
//!         Err(GrError::invalid_input("非有限值"))
//!     }
//! }
//!
//! assert!(check(1.0).is_ok());
//! assert!(approx_eq(0.1 + 0.2, 0.3, 1e-12));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod float;

pub use error::{GrError, GrResult};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{GrError, GrResult};
    pub use crate::float::{approx_eq, bits_eq, relative_eq};
}
