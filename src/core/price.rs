//! Pricing abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single published share value for a fund.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub price: f64,
}

/// Remote series of daily share values, addressed by an opaque fund identifier.
///
/// An empty vector means the source has no observation for the requested
/// dates. Errors cover transport failures and bodies that could not be decoded.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_day(&self, fund_id: &str, date: NaiveDate) -> Result<Vec<PriceObservation>>;

    async fn fetch_range(
        &self,
        fund_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceObservation>>;
}

/// Best available share value of a fund on a date. `None` when nothing could
/// be found.
#[async_trait]
pub trait HistoricalPriceProvider: Send + Sync {
    async fn price_on(&self, fund_id: &str, date: NaiveDate) -> Option<f64>;
}
