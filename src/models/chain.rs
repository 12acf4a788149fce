//! Historic chain documents and the implied volatility table built from them
//!
//! A fetch produces one [`FetchResult`] entry per strike; [`ChainTable::flatten`]
//! turns the successful entries into (date, strike, implied volatility) points.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Decoded body of `/api/historic_chains/<symbol>`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricChains {
    #[serde(default, deserialize_with = "usable_entries")]
    pub chains: Vec<ChainEntry>,
}

/// One day of history for a single option symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub date: String,
    // Note: API returns this as a string "0.18" as often as a number
    #[serde(default, deserialize_with = "lenient_f64")]
    pub implied_volatility: Option<f64>,
}

/// Decodes each chain entry on its own, dropping the ones without a string `date`.
fn usable_entries<'de, D>(deserializer: D) -> std::result::Result<Vec<ChainEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<ChainEntry>(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                trace!("Dropping chain entry: {}", e);
                None
            }
        })
        .collect())
}

/// Accepts a number, a numeric string, or null. Anything else becomes `None`.
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

/// Outcome of one strike's request: the document, or a description of what failed
pub type StrikeOutcome = std::result::Result<HistoricChains, String>;

/// Per-strike results of one fetch, keyed by strike
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    entries: BTreeMap<i64, StrikeOutcome>,
}

impl FetchResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, strike: i64) -> Option<&StrikeOutcome> {
        self.entries.get(&strike)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, i64, StrikeOutcome> {
        self.entries.iter()
    }

    /// Strikes whose request failed, with the error description
    pub fn failures(&self) -> impl Iterator<Item = (i64, &str)> {
        self.entries
            .iter()
            .filter_map(|(&strike, outcome)| outcome.as_ref().err().map(|e| (strike, e.as_str())))
    }

    /// Strikes whose request returned a document
    pub fn successes(&self) -> impl Iterator<Item = (i64, &HistoricChains)> {
        self.entries
            .iter()
            .filter_map(|(&strike, outcome)| outcome.as_ref().ok().map(|doc| (strike, doc)))
    }
}

impl FromIterator<(i64, StrikeOutcome)> for FetchResult {
    fn from_iter<I: IntoIterator<Item = (i64, StrikeOutcome)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FetchResult {
    type Item = (&'a i64, &'a StrikeOutcome);
    type IntoIter = btree_map::Iter<'a, i64, StrikeOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainPoint {
    pub date: String,
    pub strike: i64,
    pub implied_volatility: f64,
}

/// Implied volatility by (date, strike).
///
/// Rebuilt from scratch on every fetch. A (date, strike) pair seen twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainTable {
    points: BTreeMap<(String, i64), f64>,
}

impl ChainTable {
    /// Flatten a fetch into a table, skipping failed strikes and entries without a usable IV
    pub fn flatten(result: &FetchResult) -> Self {
        let mut points = BTreeMap::new();
        for (strike, document) in result.successes() {
            for entry in &document.chains {
                match entry.implied_volatility {
                    Some(iv) => {
                        points.insert((entry.date.clone(), strike), iv);
                    }
                    None => trace!("No implied volatility for {} on {}", strike, entry.date),
                }
            }
        }
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, date: &str, strike: i64) -> Option<f64> {
        self.points.get(&(date.to_string(), strike)).copied()
    }

    pub fn points(&self) -> impl Iterator<Item = ChainPoint> + '_ {
        self.points.iter().map(|((date, strike), &iv)| ChainPoint {
            date: date.clone(),
            strike: *strike,
            implied_volatility: iv,
        })
    }

    pub fn dates(&self) -> BTreeSet<&str> {
        self.points.keys().map(|(date, _)| date.as_str()).collect()
    }

    pub fn strikes(&self) -> BTreeSet<i64> {
        self.points.keys().map(|(_, strike)| *strike).collect()
    }

    pub fn max_iv(&self) -> Option<f64> {
        self.points.values().copied().reduce(f64::max)
    }

    /// One strike-ordered line per date, ready for charting
    pub fn series_by_date(&self) -> BTreeMap<&str, Vec<(i64, f64)>> {
        let mut series: BTreeMap<&str, Vec<(i64, f64)>> = BTreeMap::new();
        // keys are ordered by (date, strike), so each line comes out sorted by strike
        for ((date, strike), &iv) in &self.points {
            series.entry(date.as_str()).or_default().push((*strike, iv));
        }
        series
    }
}

/// What a presenter receives: rows to chart, or the explicit "no data" signal
#[derive(Debug, Clone, PartialEq)]
pub enum Presentation {
    Table(ChainTable),
    NoData,
}

impl From<ChainTable> for Presentation {
    fn from(table: ChainTable) -> Self {
        if table.is_empty() {
            Presentation::NoData
        } else {
            Presentation::Table(table)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> HistoricChains {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn implied_volatility_accepts_strings_numbers_and_null() {
        let parsed = doc(json!({
            "chains": [
                {"date": "2024-03-01", "implied_volatility": "0.18"},
                {"date": "2024-03-02", "implied_volatility": 0.2},
                {"date": "2024-03-03", "implied_volatility": null},
                {"date": "2024-03-04"},
                {"date": "2024-03-05", "implied_volatility": "n/a"},
                {"date": "2024-03-06", "implied_volatility": "0.21", "volume": 12}
            ]
        }));
        let ivs: Vec<_> = parsed.chains.iter().map(|c| c.implied_volatility).collect();
        assert_eq!(ivs, vec![Some(0.18), Some(0.2), None, None, None, Some(0.21)]);
    }

    #[test]
    fn missing_chains_is_empty() {
        assert!(doc(json!({})).chains.is_empty());
        assert!(doc(json!({"chains": null})).chains.is_empty());
    }

    #[test]
    fn entry_without_string_date_is_dropped_alone() {
        let parsed = doc(json!({
            "chains": [
                {"implied_volatility": 0.3},
                {"date": "2024-03-01", "implied_volatility": "0.18"},
                {"date": 20240304, "implied_volatility": 0.2},
                "garbage",
                {"date": "2024-03-05", "implied_volatility": 0.19}
            ]
        }));
        let dates: Vec<&str> = parsed.chains.iter().map(|c| c.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-05"]);
    }

    #[test]
    fn flatten_skips_errors_and_missing_ivs() {
        let result: FetchResult = vec![
            (
                5100,
                Ok(doc(json!({"chains": [
                    {"date": "2024-03-01", "implied_volatility": "0.18"},
                    {"date": "2024-03-02"},
                    {"date": "2024-03-03", "implied_volatility": 0.19}
                ]}))),
            ),
            (5105, Err("HTTP status server error (500)".to_string())),
        ]
        .into_iter()
        .collect();

        let table = ChainTable::flatten(&result);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("2024-03-01", 5100), Some(0.18));
        assert_eq!(table.get("2024-03-02", 5100), None);
        assert_eq!(table.get("2024-03-03", 5100), Some(0.19));
        assert!(table.strikes().iter().all(|&k| k == 5100));
    }

    #[test]
    fn flatten_is_idempotent_and_order_independent() {
        let a = (
            4000,
            Ok(doc(json!({"chains": [{"date": "d1", "implied_volatility": 0.3}]}))),
        );
        let b = (
            4005,
            Ok(doc(json!({"chains": [{"date": "d1", "implied_volatility": 0.31},
                                     {"date": "d2", "implied_volatility": 0.32}]}))),
        );
        let forward: FetchResult = vec![a.clone(), b.clone()].into_iter().collect();
        let backward: FetchResult = vec![b, a].into_iter().collect();

        let first = ChainTable::flatten(&forward);
        assert_eq!(first, ChainTable::flatten(&forward));
        assert_eq!(first, ChainTable::flatten(&backward));
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn duplicate_date_keeps_last_value() {
        let result: FetchResult = vec![(
            4000,
            Ok(doc(json!({"chains": [
                {"date": "d1", "implied_volatility": 0.3},
                {"date": "d1", "implied_volatility": 0.4}
            ]}))),
        )]
        .into_iter()
        .collect();
        let table = ChainTable::flatten(&result);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("d1", 4000), Some(0.4));
    }

    #[test]
    fn series_are_grouped_by_date_and_sorted_by_strike() {
        let result: FetchResult = vec![
            (4010, Ok(doc(json!({"chains": [{"date": "d1", "implied_volatility": 0.2}]})))),
            (4000, Ok(doc(json!({"chains": [{"date": "d1", "implied_volatility": 0.1},
                                              {"date": "d2", "implied_volatility": 0.5}]})))),
        ]
        .into_iter()
        .collect();
        let table = ChainTable::flatten(&result);
        let series = table.series_by_date();
        assert_eq!(series["d1"], vec![(4000, 0.1), (4010, 0.2)]);
        assert_eq!(series["d2"], vec![(4000, 0.5)]);
        assert_eq!(table.max_iv(), Some(0.5));
        assert_eq!(table.dates().into_iter().collect::<Vec<_>>(), vec!["d1", "d2"]);
    }

    #[test]
    fn empty_table_presents_no_data() {
        let all_failed: FetchResult = (0..3)
            .map(|i| (4000 + i * 5, Err("connection refused".to_string())))
            .collect();
        assert_eq!(all_failed.failures().count(), 3);
        let table = ChainTable::flatten(&all_failed);
        assert_eq!(Presentation::from(table), Presentation::NoData);
    }
}
