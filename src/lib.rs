//! # historic-iv
//!
//! Fetches the historic options-chain implied volatility of a window of strikes
//! around a central strike and turns it into a (date, strike, IV) table ready for
//! charting.
//!
//! ## Features
//!
//! - One concurrent request per strike against the historic chains endpoint,
//!   sharing a single connection pool per fetch
//! - Per-strike failure isolation: a failed request never aborts its siblings
//! - Flattening of the decoded documents into a chain table
//! - Line chart (one line per date) and Parquet export of the table
//! - Environment-based configuration with a runtime-injected API token
//!
//! ## Example
//!
//! ```rust,no_run
//! use historic_iv::api::HistoricChainsClient;
//! use historic_iv::config::Config;
//! use historic_iv::models::{ChainTable, OptionType, Presentation};
//!
//! #[tokio::main]
//! async fn main() -> historic_iv::error::Result<()> {
//!     let config = Config::from_env()?;
//!     config.init_logging()?;
//!
//!     let client = HistoricChainsClient::new(&config)?;
//!     let result = client.fetch_around("240419", OptionType::Call, 5100).await?;
//!
//!     match Presentation::from(ChainTable::flatten(&result)) {
//!         Presentation::Table(table) => {
//!             historic_iv::utils::plot_chain_table(&table, "Implied Volatility Across Dates", "iv.png")?
//!         }
//!         Presentation::NoData => eprintln!("No data found or error in fetching data."),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use api::HistoricChainsClient;
pub use config::Config;
pub use error::{ChainError, Result};
