//! Math primitives: `Vec2`/`Vec3`/`Vec4` and `Mat44`.
//!
//! All operations here are pure. `Mat44` is column-major, matching the
//! fixed-function GL convention the rest of the pipeline assumes.

mod mat;
mod vec;

pub use mat::Mat44;
pub use vec::{Vec2, Vec3, Vec4};

/// Vectors shorter than this are left unchanged by `normalize()` rather than
/// producing `NaN`/`inf`.
pub const NORMALIZE_EPSILON: f32 = 1e-6;
