use crate::error::{ChainError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Expiry codes are two-digit year, month, day.
pub const EXPIRY_FORMAT: &str = "%y%m%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Letter used inside option symbols
    pub fn letter(&self) -> char {
        match self {
            OptionType::Call => 'C',
            OptionType::Put => 'P',
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

impl FromStr for OptionType {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "call" => Ok(OptionType::Call),
            "p" | "put" => Ok(OptionType::Put),
            other => Err(ChainError::ParseError(format!(
                "Unknown option type '{}', expected C or P",
                other
            ))),
        }
    }
}

/// Window of strikes requested around a central strike.
///
/// The window is half-open: `[central - half_width, central + half_width)`
/// walked in `step` increments, so the default yields 500 strikes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeWindow {
    pub half_width: i64,
    pub step: i64,
}

impl Default for StrikeWindow {
    fn default() -> Self {
        Self {
            half_width: 1250,
            step: 5,
        }
    }
}

impl StrikeWindow {
    /// Number of strikes the window produces
    pub fn len(&self) -> usize {
        if self.step <= 0 || self.half_width <= 0 {
            return 0;
        }
        let width = 2 * self.half_width as i128;
        let step = self.step as i128;
        usize::try_from((width + step - 1) / step).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Generate the strike sequence around `central`.
    ///
    /// The low end of the window may reach zero or below for small central strikes;
    /// those strikes are kept so the window always has [`len`](Self::len) entries.
    pub fn strikes_around(&self, central: i64) -> Result<Vec<i64>> {
        if central <= 0 {
            return Err(ChainError::InvalidParameters(format!(
                "Central strike must be positive, got {}",
                central
            )));
        }
        if self.step <= 0 {
            return Err(ChainError::InvalidParameters(format!(
                "Strike step must be positive, got {}",
                self.step
            )));
        }
        if self.half_width <= 0 {
            return Err(ChainError::InvalidParameters(format!(
                "Strike half width must be positive, got {}",
                self.half_width
            )));
        }

        let overflow = || {
            ChainError::InvalidParameters(format!(
                "Strike window of {} around {} overflows",
                self.half_width, central
            ))
        };
        let low = central.checked_sub(self.half_width).ok_or_else(overflow)?;
        let high = central.checked_add(self.half_width).ok_or_else(overflow)?;
        let step = usize::try_from(self.step).map_err(|_| overflow())?;

        let strikes: Vec<i64> = (low..high).step_by(step).collect();
        trace!(
            "Generated {} strikes from {} to {:?}",
            strikes.len(),
            low,
            strikes.last()
        );
        Ok(strikes)
    }
}

/// Accepted range for a user-entered central strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeBounds {
    pub min: i64,
    pub max: i64,
}

impl Default for StrikeBounds {
    fn default() -> Self {
        Self { min: 1000, max: 10000 }
    }
}

impl StrikeBounds {
    pub fn check(&self, central: i64) -> Result<i64> {
        if central < self.min || central > self.max {
            return Err(ChainError::InvalidParameters(format!(
                "Central strike {} outside of [{}, {}]",
                central, self.min, self.max
            )));
        }
        Ok(central)
    }
}

/// How option symbols are spelled for the historic chains endpoint.
///
/// A symbol is `product_code + expiry + type letter + strike_prefix + strike + strike_suffix`,
/// e.g. `SPXW240419C05100000`. The prefix is applied regardless of the
/// strike's magnitude.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolFormat {
    pub product_code: String,
    pub strike_prefix: String,
    pub strike_suffix: String,
}

impl Default for SymbolFormat {
    fn default() -> Self {
        Self {
            product_code: "SPXW".to_string(),
            strike_prefix: "0".to_string(),
            strike_suffix: "000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionSymbol(String);

impl OptionSymbol {
    pub fn new(format: &SymbolFormat, expiry: &str, option_type: OptionType, strike: i64) -> Self {
        OptionSymbol(format!(
            "{}{}{}{}{}{}",
            format.product_code,
            expiry,
            option_type.letter(),
            format.strike_prefix,
            strike,
            format.strike_suffix
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OptionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parameters for one fetch: an expiry, a side and the strikes to request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParameters {
    expiry: String,
    option_type: OptionType,
    strikes: Vec<i64>,
}

impl RequestParameters {
    /// Build parameters for the window around `central`
    pub fn new(
        expiry: &str,
        option_type: OptionType,
        central: i64,
        window: &StrikeWindow,
    ) -> Result<Self> {
        let strikes = window.strikes_around(central)?;
        Self::with_strikes(expiry, option_type, strikes)
    }

    /// Build parameters from an explicit strike sequence.
    ///
    /// The sequence must be non-empty and strictly increasing by a fixed step.
    pub fn with_strikes(expiry: &str, option_type: OptionType, strikes: Vec<i64>) -> Result<Self> {
        parse_expiry(expiry)?;

        if strikes.is_empty() {
            return Err(ChainError::InvalidParameters(
                "Strike sequence is empty".to_string(),
            ));
        }
        if let [first, second, ..] = strikes.as_slice() {
            let step = second.checked_sub(*first).unwrap_or(0);
            if step <= 0 {
                return Err(ChainError::InvalidParameters(format!(
                    "Strikes must be strictly increasing, got {} then {}",
                    first, second
                )));
            }
            if let Some(pair) = strikes.windows(2).find(|w| w[1].checked_sub(w[0]) != Some(step)) {
                return Err(ChainError::InvalidParameters(format!(
                    "Strikes must advance by a fixed step of {}, got {} then {}",
                    step, pair[0], pair[1]
                )));
            }
        }

        Ok(Self {
            expiry: expiry.to_string(),
            option_type,
            strikes,
        })
    }

    pub fn expiry(&self) -> &str {
        &self.expiry
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn strikes(&self) -> &[i64] {
        &self.strikes
    }

    /// Option symbol for one strike of this request
    pub fn symbol_for(&self, format: &SymbolFormat, strike: i64) -> OptionSymbol {
        OptionSymbol::new(format, &self.expiry, self.option_type, strike)
    }
}

/// Parse a `YYMMDD` expiry code into a calendar date
pub fn parse_expiry(expiry: &str) -> Result<NaiveDate> {
    if expiry.len() != 6 || !expiry.chars().all(|c| c.is_ascii_digit()) {
        return Err(ChainError::InvalidParameters(format!(
            "Expiry code must be six digits (YYMMDD), got '{}'",
            expiry
        )));
    }
    NaiveDate::parse_from_str(expiry, EXPIRY_FORMAT).map_err(|e| {
        ChainError::InvalidParameters(format!("Expiry code '{}' is not a date: {}", expiry, e))
    })
}
