use crate::config::{ChainsApiConfig, Config};
use crate::error::{ChainError, Result};
use crate::models::{
    FetchResult, HistoricChains, OptionSymbol, OptionType, RequestParameters, StrikeOutcome,
    StrikeWindow, SymbolFormat,
};
use futures::future::join_all;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE,
    ORIGIN, USER_AGENT,
};
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

const HISTORIC_CHAINS_PATH: &str = "api/historic_chains/";

/// Static headers sent with every historic chains request
pub fn chain_headers(config: &ChainsApiConfig) -> Result<HeaderMap> {
    let mut h = HeaderMap::new();
    h.insert(ACCEPT, HeaderValue::from_static("application/json"));
    h.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br, zstd"));
    h.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en"));

    let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token))
        .map_err(|_| ChainError::ConfigError("API token is not a valid header value".to_string()))?;
    auth.set_sensitive(true);
    h.insert(AUTHORIZATION, auth);

    h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    h.insert(ORIGIN, header_value("origin", &config.origin)?);
    h.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    h.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    h.insert("sec-fetch-site", HeaderValue::from_static("same-site"));
    h.insert(USER_AGENT, header_value("user agent", &config.user_agent)?);
    Ok(h)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ChainError::ConfigError(format!("Invalid {} header '{}': {}", name, value, e)))
}

/// Client for the historic chains endpoint.
///
/// Holds only immutable request settings. Each [`fetch`](Self::fetch) opens its own
/// connection pool, shares it across every strike of that call, and drops it on return.
/// Requests run on the caller's tokio runtime.
#[derive(Debug, Clone)]
pub struct HistoricChainsClient {
    headers: HeaderMap,
    base_url: Url,
    symbol: SymbolFormat,
    window: StrikeWindow,
}

impl HistoricChainsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut base_url = Url::parse(&config.api.base_url).map_err(|e| {
            ChainError::ConfigError(format!("Invalid base URL '{}': {}", config.api.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ChainError::ConfigError(format!(
                "Base URL '{}' cannot carry a path",
                config.api.base_url
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            headers: chain_headers(&config.api)?,
            base_url,
            symbol: config.symbol.clone(),
            window: config.window,
        })
    }

    pub fn symbol_format(&self) -> &SymbolFormat {
        &self.symbol
    }

    pub fn window(&self) -> &StrikeWindow {
        &self.window
    }

    /// URL of the historic chain for one option symbol
    pub fn endpoint(&self, symbol: &OptionSymbol) -> Result<Url> {
        self.base_url
            .join(&format!("{}{}", HISTORIC_CHAINS_PATH, symbol))
            .map_err(|e| ChainError::ParseError(format!("Failed to build URL for {}: {}", symbol, e)))
    }

    /// Build parameters from the configured window and fetch them.
    ///
    /// Only invalid parameters are reported as an error, before any request is made.
    pub async fn fetch_around(
        &self,
        expiry: &str,
        option_type: OptionType,
        central_strike: i64,
    ) -> Result<FetchResult> {
        let params = RequestParameters::new(expiry, option_type, central_strike, &self.window)?;
        Ok(self.fetch(&params).await)
    }

    /// Fetch the historic chain of every strike in `params` concurrently.
    ///
    /// Never fails as a whole: every strike gets an entry, holding either the decoded
    /// document or a description of its own failure.
    pub async fn fetch(&self, params: &RequestParameters) -> FetchResult {
        info!(
            "Fetching historic chains for {} {} strikes {:?}..{:?} ({} requests)",
            params.expiry(),
            params.option_type(),
            params.strikes().first(),
            params.strikes().last(),
            params.strikes().len()
        );
        let started = Instant::now();

        let session = match self.open_session() {
            Ok(session) => session,
            Err(e) => {
                warn!("Could not open HTTP session: {}", e);
                let reason = e.to_string();
                return params
                    .strikes()
                    .iter()
                    .map(|&strike| (strike, Err(reason.clone())))
                    .collect();
            }
        };

        let requests = params.strikes().iter().map(|&strike| {
            let symbol = params.symbol_for(&self.symbol, strike);
            let session = &session;
            async move {
                let outcome = if strike <= 0 {
                    Err(format!("Strike {} is not positive, no request sent", strike))
                } else {
                    match self.endpoint(&symbol) {
                        Ok(url) => fetch_strike(session, url).await,
                        Err(e) => Err(e.to_string()),
                    }
                };
                match &outcome {
                    Ok(doc) => debug!("{}: {} chain entries", symbol, doc.chains.len()),
                    Err(e) => warn!("{}: {}", symbol, e),
                }
                (strike, outcome)
            }
        });

        let result: FetchResult = join_all(requests).await.into_iter().collect();
        drop(session);

        info!(
            "Fetched {} strikes in {:.2?}: {} succeeded, {} failed",
            result.len(),
            started.elapsed(),
            result.successes().count(),
            result.failures().count()
        );
        result
    }

    fn open_session(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .default_headers(self.headers.clone())
            .build()
            .map_err(|e| ChainError::RequestError(format!("Failed to build HTTP client: {}", e)))
    }
}

async fn fetch_strike(session: &reqwest::Client, url: Url) -> StrikeOutcome {
    let resp = session
        .get(url)
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    let resp = resp
        .error_for_status()
        .map_err(|e| format!("Request failed: {}", e))?;

    resp.json::<HistoricChains>()
        .await
        .map_err(|e| format!("Failed to parse historic chains: {}", e))
}
