// crates/gr_referencing/src/geometry/mod.rs

//! 位置与包络
//!
//! - [`DirectPosition`]：带可选 CRS 的 n 维点
//! - [`Envelope`]：n 维包络，有正常、空、null、无穷四种状态
//! - [`BoundingBox`]：二维矩形
//! - [`transform`]：基于采样的近似包络变换

pub mod envelope;
pub mod position;
pub mod rectangle;
pub mod transform;

pub use envelope::Envelope;
pub use position::DirectPosition;
pub use rectangle::BoundingBox;
pub use transform::{transform_envelope, transform_envelope_by_operation, transform_rectangle};
