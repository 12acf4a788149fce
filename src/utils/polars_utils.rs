use crate::error::{ChainError, Result};
use crate::models::ChainTable;
use polars::prelude::*;

pub const DATE_COLUMN: &str = "Date";
pub const STRIKE_COLUMN: &str = "Strike";
pub const IV_COLUMN: &str = "Implied Volatility";

/// Convert a chain table to a Polars DataFrame with one row per (date, strike)
pub fn chain_table_to_dataframe(table: &ChainTable) -> Result<DataFrame> {
    if table.is_empty() {
        return Err(ChainError::NoData);
    }

    let mut dates = Vec::with_capacity(table.len());
    let mut strikes = Vec::with_capacity(table.len());
    let mut ivs = Vec::with_capacity(table.len());

    for point in table.points() {
        dates.push(point.date);
        strikes.push(point.strike);
        ivs.push(point.implied_volatility);
    }

    let df = DataFrame::new(vec![
        Series::new(DATE_COLUMN, dates),
        Series::new(STRIKE_COLUMN, strikes),
        Series::new(IV_COLUMN, ivs),
    ])
    .map_err(|e| ChainError::DataFrameError(format!("Failed to create DataFrame: {}", e)))?;

    Ok(df)
}

/// Write a DataFrame to a Parquet file
pub fn save_dataframe_to_parquet(df: &DataFrame, path: &str) -> Result<()> {
    let file = std::fs::File::create(path)?;

    let mut df_mut = df.clone();
    ParquetWriter::new(file)
        .finish(&mut df_mut)
        .map_err(|e| ChainError::DataFrameError(format!("Failed to write Parquet: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FetchResult, HistoricChains};

    fn sample_table() -> ChainTable {
        let doc: HistoricChains = serde_json::from_value(serde_json::json!({
            "chains": [
                {"date": "2024-03-01", "implied_volatility": "0.18"},
                {"date": "2024-03-04", "implied_volatility": 0.19}
            ]
        }))
        .unwrap();
        let result: FetchResult = vec![(5100, Ok(doc))].into_iter().collect();
        ChainTable::flatten(&result)
    }

    #[test]
    fn dataframe_has_one_row_per_point() {
        let df = chain_table_to_dataframe(&sample_table()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.get_column_names(), vec![DATE_COLUMN, STRIKE_COLUMN, IV_COLUMN]);
    }

    #[test]
    fn empty_table_is_no_data() {
        assert!(matches!(
            chain_table_to_dataframe(&ChainTable::default()),
            Err(ChainError::NoData)
        ));
    }

    #[test]
    fn parquet_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chains.parquet");
        let df = chain_table_to_dataframe(&sample_table()).unwrap();
        save_dataframe_to_parquet(&df, path.to_str().unwrap()).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
