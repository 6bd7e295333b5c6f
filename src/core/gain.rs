//! Gain of a weighted fund portfolio held between two dates, and selection of
//! the best performing portfolio.
use crate::core::config::Portfolio;
use crate::core::price::HistoricalPriceProvider;
use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GainError {
    #[error("Unknown fund '{label}': no identifier configured")]
    UnknownFund { label: String },
    #[error("Could not get the share value of fund '{label}' on {date}")]
    UnresolvedPrice { label: String, date: NaiveDate },
    #[error("Share value of fund '{label}' is zero on {date}")]
    ZeroStartPrice { label: String, date: NaiveDate },
}

/// Holding period and amount shared by every portfolio in a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Investment {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioOutcome {
    pub index: usize,
    pub gain: Result<f64, GainError>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestPortfolio {
    pub index: usize,
    pub gain: f64,
}

/// Net profit of `portfolio` when `initial_amount` is split by weight at the
/// start date and valued at the end date.
///
/// Fails as a whole when any fund cannot be priced on either date; no partial
/// gain is ever returned.
pub async fn compute_gain(
    portfolio: &Portfolio,
    investment: &Investment,
    fund_ids: &HashMap<String, String>,
    prices: &(dyn HistoricalPriceProvider + Send + Sync),
) -> Result<f64, GainError> {
    let initial_amount = investment.initial_amount;
    let mut final_amount = initial_amount;

    for (label, weight) in portfolio.allocations() {
        let fund_id = fund_ids.get(label).ok_or_else(|| GainError::UnknownFund {
            label: label.clone(),
        })?;

        let start_price = prices
            .price_on(fund_id, investment.start_date)
            .await
            .ok_or_else(|| GainError::UnresolvedPrice {
                label: label.clone(),
                date: investment.start_date,
            })?;
        let end_price = prices
            .price_on(fund_id, investment.end_date)
            .await
            .ok_or_else(|| GainError::UnresolvedPrice {
                label: label.clone(),
                date: investment.end_date,
            })?;

        if start_price == 0.0 {
            return Err(GainError::ZeroStartPrice {
                label: label.clone(),
                date: investment.start_date,
            });
        }

        let growth_rate = end_price / start_price;
        let allocated = initial_amount * weight;
        debug!(
            fund = %label,
            fund_id = %fund_id,
            start_price,
            end_price,
            growth_rate,
            "Fund growth"
        );
        final_amount += allocated * growth_rate - allocated;
    }

    Ok(final_amount - initial_amount)
}

/// Computes the gain of every portfolio in order. `update_callback` is called
/// once per portfolio, after its gain is known.
pub async fn evaluate_portfolios(
    portfolios: &[Portfolio],
    investment: &Investment,
    fund_ids: &HashMap<String, String>,
    prices: &(dyn HistoricalPriceProvider + Send + Sync),
    update_callback: &(dyn Fn()),
) -> Vec<PortfolioOutcome> {
    let mut outcomes = Vec::with_capacity(portfolios.len());
    for (index, portfolio) in portfolios.iter().enumerate() {
        let gain = compute_gain(portfolio, investment, fund_ids, prices).await;
        if let Err(e) = &gain {
            warn!(portfolio = index + 1, error = %e, "Portfolio gain could not be computed");
        }
        outcomes.push(PortfolioOutcome { index, gain });
        update_callback();
    }
    outcomes
}

/// Portfolio with the strictly greatest positive gain. The first one wins
/// ties; failed portfolios never qualify.
pub fn select_best(outcomes: &[PortfolioOutcome]) -> Option<BestPortfolio> {
    let mut best_gain = 0.0;
    let mut best = None;
    for outcome in outcomes {
        if let Ok(gain) = outcome.gain
            && gain > best_gain
        {
            best_gain = gain;
            best = Some(BestPortfolio {
                index: outcome.index,
                gain,
            });
        }
    }
    best
}
