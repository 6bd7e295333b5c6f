use super::ui;
use crate::core::config::Portfolio;
use crate::core::gain::{self, BestPortfolio, Investment, PortfolioOutcome};
use crate::core::price::HistoricalPriceProvider;
use comfy_table::{Cell, Table};
use std::collections::HashMap;
use tracing::info;

pub async fn run(
    portfolios: &[Portfolio],
    investment: &Investment,
    fund_ids: &HashMap<String, String>,
    prices: &(dyn HistoricalPriceProvider + Send + Sync),
) -> Option<BestPortfolio> {
    info!(
        count = portfolios.len(),
        start = %investment.start_date,
        end = %investment.end_date,
        amount = investment.initial_amount,
        "Comparing portfolios"
    );

    if portfolios.is_empty() {
        println!("No portfolios to compare.");
        return None;
    }

    let pb = ui::new_progress_bar(portfolios.len() as u64);
    let outcomes =
        gain::evaluate_portfolios(portfolios, investment, fund_ids, prices, &|| pb.inc(1)).await;
    pb.finish_and_clear();

    let best = gain::select_best(&outcomes);

    println!(
        "\n{} {} to {}, {} invested",
        ui::style_text("Portfolios", ui::StyleType::Title),
        investment.start_date.format("%d/%m/%Y"),
        investment.end_date.format("%d/%m/%Y"),
        ui::format_money(investment.initial_amount)
    );
    println!("{}", outcomes_table(portfolios, &outcomes, best));
    println!("{}", summary_line(best));

    best
}

fn outcomes_table(
    portfolios: &[Portfolio],
    outcomes: &[PortfolioOutcome],
    best: Option<BestPortfolio>,
) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Allocation"),
        ui::header_cell("Gain"),
    ]);

    for (portfolio, outcome) in portfolios.iter().zip(outcomes) {
        let is_best = best.is_some_and(|b| b.index == outcome.index);
        let gain_cell = match &outcome.gain {
            Ok(gain) => ui::gain_cell(*gain, is_best),
            Err(e) => ui::failure_cell(&e.to_string()),
        };
        table.add_row(vec![
            Cell::new(outcome.index + 1),
            Cell::new(describe_allocation(portfolio)),
            gain_cell,
        ]);
    }
    table
}

fn describe_allocation(portfolio: &Portfolio) -> String {
    portfolio
        .allocations()
        .map(|(label, weight)| format!("{label} {:.0}%", weight * 100.0))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Final verdict, with the portfolio number counted from 1.
pub fn summary_line(best: Option<BestPortfolio>) -> String {
    match best {
        Some(best) => format!(
            "{} #{} with a gain of {}",
            ui::style_text("Best portfolio is", ui::StyleType::TotalLabel),
            best.index + 1,
            ui::style_text(&ui::format_money(best.gain), ui::StyleType::TotalValue)
        ),
        None => ui::style_text(
            "Could not determine the portfolio with the highest gain.",
            ui::StyleType::Error,
        ),
    }
}
