//! API client for the historic chains endpoint
//!
//! This module contains the concurrent per-strike fetcher.

mod historic;

pub use historic::{chain_headers, HistoricChainsClient};
