//! Input/output helpers.
//!
//! - raw row normalization (`normalize`)
//! - CSV exports of points and weekly buckets (`export`)

pub mod export;
pub mod normalize;

pub use export::*;
pub use normalize::*;
