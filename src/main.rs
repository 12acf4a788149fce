//! Fetch historic implied volatility around a central strike and chart it
//!
//! ```bash
//! CHAINS_API_TOKEN=... historic-iv 240419 C 5100
//! ```

use clap::Parser;
use historic_iv::api::HistoricChainsClient;
use historic_iv::config::Config;
use historic_iv::error::Result;
use historic_iv::models::{ChainTable, OptionType, Presentation};
use historic_iv::utils::{plot_chain_table, polars_utils};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(version, about = "Historic implied volatility across a strike window")]
struct Args {
    /// Expiry code (YYMMDD)
    #[arg(default_value = "240419")]
    expiry: String,

    /// Call or put (C or P)
    #[arg(default_value = "C")]
    option_type: OptionType,

    /// Central strike of the window
    #[arg(default_value_t = 5100)]
    central_strike: i64,

    /// Directory the chart and table are written to
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;
    config.init_logging()?;

    let central_strike = config.strike_bounds.check(args.central_strike)?;
    let client = HistoricChainsClient::new(&config)?;

    let result = client
        .fetch_around(&args.expiry, args.option_type, central_strike)
        .await?;
    for (strike, reason) in result.failures().take(5) {
        warn!("Strike {} failed: {}", strike, reason);
    }

    let table = match Presentation::from(ChainTable::flatten(&result)) {
        Presentation::Table(table) => table,
        Presentation::NoData => {
            error!("No data found or error in fetching data.");
            return Ok(());
        }
    };
    info!(
        "{} points across {} dates and {} strikes",
        table.len(),
        table.dates().len(),
        table.strikes().len()
    );

    if !args.output_dir.exists() {
        std::fs::create_dir_all(&args.output_dir)?;
    }

    let chart_path = args.output_dir.join("implied_volatility.png");
    plot_chain_table(&table, "Implied Volatility Across Dates", &chart_path)?;
    info!("Chart saved to {:?}", chart_path);

    let df = polars_utils::chain_table_to_dataframe(&table)?;
    let table_path = args.output_dir.join("implied_volatility.parquet");
    polars_utils::save_dataframe_to_parquet(&df, &table_path.to_string_lossy())?;
    info!("Table saved to {:?}", table_path);

    Ok(())
}
