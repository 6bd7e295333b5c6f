//! Resolves the share value of a fund on a given date.
//!
//! A lookup first asks the source for the exact day. When the series has a gap
//! there (weekends, holidays, missing reports) it searches symmetric windows of
//! growing width around the date and takes the closest observation from the
//! first window that has any. Every outcome, including "not found", is cached
//! for the lifetime of the resolver.

use crate::core::cache::Cache;
use crate::core::price::{HistoricalPriceProvider, PriceObservation, PriceSource};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tracing::{debug, instrument, warn};

pub const DEFAULT_MAX_SEARCH: u32 = 50;
pub const DEFAULT_WINDOW_STEP_DAYS: u32 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceKey {
    pub fund_id: String,
    pub date: NaiveDate,
}

impl PriceKey {
    pub fn new(fund_id: &str, date: NaiveDate) -> Self {
        Self {
            fund_id: fund_id.to_string(),
            date,
        }
    }
}

pub struct PriceResolver<S: PriceSource> {
    source: S,
    cache: Cache<PriceKey, Option<f64>>,
    max_search: u32,
    window_step_days: u32,
}

impl<S: PriceSource> PriceResolver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: Cache::new(),
            max_search: DEFAULT_MAX_SEARCH,
            window_step_days: DEFAULT_WINDOW_STEP_DAYS,
        }
    }

    /// Overrides the number of widening rounds and the half-width added per round.
    pub fn with_search(mut self, max_search: u32, window_step_days: u32) -> Self {
        self.max_search = max_search;
        self.window_step_days = window_step_days;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &Cache<PriceKey, Option<f64>> {
        &self.cache
    }

    #[instrument(name = "ResolvePrice", skip(self), fields(fund_id = %fund_id, date = %target_date))]
    pub async fn resolve(&self, fund_id: &str, target_date: NaiveDate) -> Option<f64> {
        let key = PriceKey::new(fund_id, target_date);
        if let Some(cached) = self.cache.get(&key).await {
            return cached;
        }

        let resolved = self.search(fund_id, target_date).await;
        if resolved.is_none() {
            warn!(
                fund_id,
                date = %target_date,
                "No price found for fund near date"
            );
        }

        self.cache.put(key, resolved).await;
        resolved
    }

    async fn search(&self, fund_id: &str, target_date: NaiveDate) -> Option<f64> {
        let exact = observations_or_empty(
            self.source.fetch_day(fund_id, target_date).await,
            fund_id,
        );
        if let Some(first) = exact.first() {
            debug!(price = first.price, "Exact day price found");
            return Some(first.price);
        }

        for round in 1..=self.max_search {
            let span = Duration::days(i64::from(self.window_step_days) * i64::from(round));
            let (Some(from), Some(to)) = (
                target_date.checked_sub_signed(span),
                target_date.checked_add_signed(span),
            ) else {
                break;
            };

            let window = observations_or_empty(
                self.source.fetch_range(fund_id, from, to).await,
                fund_id,
            );
            if let Some(nearest) = nearest_observation(&window, target_date) {
                debug!(
                    round,
                    %from,
                    %to,
                    observed = %nearest.date,
                    price = nearest.price,
                    "Nearest price found in window"
                );
                return Some(nearest.price);
            }
        }

        None
    }
}

#[async_trait]
impl<S: PriceSource> HistoricalPriceProvider for PriceResolver<S> {
    async fn price_on(&self, fund_id: &str, date: NaiveDate) -> Option<f64> {
        self.resolve(fund_id, date).await
    }
}

/// Observation closest to `target`. Equally close observations resolve to the
/// one listed first.
pub fn nearest_observation(
    observations: &[PriceObservation],
    target: NaiveDate,
) -> Option<&PriceObservation> {
    observations
        .iter()
        .min_by_key(|obs| obs.date.signed_duration_since(target).num_days().abs())
}

fn observations_or_empty(
    result: Result<Vec<PriceObservation>>,
    fund_id: &str,
) -> Vec<PriceObservation> {
    match result {
        Ok(observations) => observations,
        Err(e) => {
            warn!(fund_id, error = %e, "Price lookup failed, treating as no data");
            Vec::new()
        }
    }
}
