//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod gain;
pub mod log;
pub mod price;
pub mod resolver;

// Re-export main types for cleaner imports
pub use gain::{BestPortfolio, GainError, Investment, PortfolioOutcome};
pub use price::{HistoricalPriceProvider, PriceObservation, PriceSource};
pub use resolver::PriceResolver;
