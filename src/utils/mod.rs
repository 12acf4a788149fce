mod plotting;
pub mod polars_utils;

pub use plotting::*;
