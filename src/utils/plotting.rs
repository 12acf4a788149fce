use crate::error::{ChainError, Result};
use crate::models::ChainTable;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

/// Strike (x) and implied volatility (y) ranges for a chain table chart.
///
/// The y axis always starts at zero and leaves 10% headroom above the largest IV.
pub fn chart_ranges(table: &ChainTable) -> Option<(Range<f64>, Range<f64>)> {
    let strikes = table.strikes();
    let min_strike = *strikes.first()? as f64;
    let max_strike = *strikes.last()? as f64;
    let max_iv = table.max_iv()?;

    let (strike_min, strike_max) = if max_strike > min_strike {
        (min_strike, max_strike)
    } else {
        (min_strike - 5.0, max_strike + 5.0)
    };
    let vol_max = if max_iv > 0.0 { max_iv * 1.1 } else { 1.0 };

    Some((strike_min..strike_max, 0.0..vol_max))
}

/// Line chart of implied volatility across strikes, one line per date
pub fn plot_chain_table<P: AsRef<Path>>(table: &ChainTable, title: &str, output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    let (strike_range, vol_range) = chart_ranges(table).ok_or(ChainError::NoData)?;
    let series = table.series_by_date();
    debug!("Plotting {} dates to {:?}", series.len(), output_path);

    let root = BitMapBackend::new(output_path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChainError::PlotError(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(strike_range, vol_range)
        .map_err(|e| ChainError::PlotError(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Strike Price")
        .y_desc("Implied Volatility (%)")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(|e| ChainError::PlotError(e.to_string()))?;

    let palette = colorous::TABLEAU10;
    for (i, (date, points)) in series.iter().enumerate() {
        let c = palette[i % palette.len()];
        let color = RGBColor(c.r, c.g, c.b);

        chart
            .draw_series(LineSeries::new(
                points.iter().map(|&(strike, iv)| (strike as f64, iv)),
                &color,
            ))
            .map_err(|e| ChainError::PlotError(e.to_string()))?
            .label(*date)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| ChainError::PlotError(e.to_string()))?;

    root.present()
        .map_err(|e| ChainError::PlotError(e.to_string()))?;

    Ok(())
}
