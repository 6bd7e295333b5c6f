use super::util::with_retry;
use crate::core::price::{PriceObservation, PriceSource};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";
const RETRIES: usize = 1;
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Daily share values from the `real_assets/{id}/days` endpoint.
pub struct FintualProvider {
    base_url: String,
    client: reqwest::Client,
}

impl FintualProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fundgain/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn fetch_days(&self, fund_id: &str, query: &str) -> Result<Vec<PriceObservation>> {
        let url = format!("{}/{}/days?{}", self.base_url, fund_id, query);
        debug!("Requesting share values from {}", url);

        let response = with_retry(|| self.client.get(&url).send(), RETRIES, RETRY_DELAY)
            .await
            .with_context(|| format!("Request failed for fund: {fund_id} URL: {url}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for fund: {}",
                response.status(),
                fund_id
            ));
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for fund: {fund_id}"))?;

        let observations = parse_days(&text)
            .with_context(|| format!("Failed to parse price response for fund: {fund_id}"))?;
        debug!(count = observations.len(), "Received share values");
        Ok(observations)
    }
}

#[async_trait]
impl PriceSource for FintualProvider {
    #[instrument(name = "FintualDay", skip(self), fields(fund_id = %fund_id, date = %date))]
    async fn fetch_day(&self, fund_id: &str, date: NaiveDate) -> Result<Vec<PriceObservation>> {
        let query = format!("date={}", date.format(DATE_FORMAT));
        self.fetch_days(fund_id, &query).await
    }

    #[instrument(name = "FintualRange", skip(self), fields(fund_id = %fund_id, from = %from, to = %to))]
    async fn fetch_range(
        &self,
        fund_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceObservation>> {
        let query = format!(
            "from_date={}&to_date={}",
            from.format(DATE_FORMAT),
            to.format(DATE_FORMAT)
        );
        self.fetch_days(fund_id, &query).await
    }
}

#[derive(Debug, Deserialize)]
struct DaysResponse {
    #[serde(default)]
    data: Option<Vec<DayEntry>>,
}

#[derive(Debug, Deserialize)]
struct DayEntry {
    attributes: DayAttributes,
}

#[derive(Debug, Deserialize)]
struct DayAttributes {
    date: NaiveDate,
    price: SharePrice,
}

/// The API sends prices either as JSON numbers or as decimal strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SharePrice {
    Number(f64),
    Text(String),
}

impl SharePrice {
    fn value(&self) -> Option<f64> {
        let value = match self {
            SharePrice::Number(n) => *n,
            SharePrice::Text(s) => s.trim().parse().ok()?,
        };
        (value.is_finite() && value >= 0.0).then_some(value)
    }
}

/// Observations in response order. An absent or null `data` array means no
/// observations.
fn parse_days(body: &str) -> Result<Vec<PriceObservation>> {
    let response: DaysResponse = serde_json::from_str(body)?;
    let observations = response
        .data
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| {
            let DayAttributes { date, price } = entry.attributes;
            match price.value() {
                Some(price) => Some(PriceObservation { date, price }),
                None => {
                    warn!(%date, price = ?price, "Skipping invalid share value");
                    None
                }
            }
        })
        .collect();
    Ok(observations)
}
