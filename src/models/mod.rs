//! Data models for historic chain requests and results
//!
//! This module contains the request parameters and option symbol encoding,
//! the decoded API documents, and the implied volatility table built from them.

mod chain;
mod option;

pub use chain::*;
pub use option::*;
