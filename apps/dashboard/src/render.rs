//! Plain-text rendering of the dashboard.

use std::fmt::Write as _;

use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use stockfolio_core::constants::DISPLAY_DECIMAL_PRECISION;
use stockfolio_core::portfolio::allocation::AllocationSlice;
use stockfolio_core::portfolio::holdings::{HoldingView, HoldingsSummary};
use stockfolio_core::portfolio::sort::{SortDirection, SortField, SortState};
use stockfolio_core::portfolios::Portfolio;

const BAR_WIDTH: usize = 30;

/// Leading columns that are left-aligned; the rest are numeric.
const TEXT_COLUMNS: usize = 2;

/// Table columns, in display order. `None` marks columns that cannot be sorted.
const COLUMNS: [(&str, Option<SortField>, usize); 9] = [
    ("Symbol", Some(SortField::Symbol), 8),
    ("Name", None, 20),
    ("Shares", Some(SortField::Shares), 10),
    ("Avg Cost", Some(SortField::Cost), 11),
    ("Price", Some(SortField::Price), 11),
    ("Value", Some(SortField::Value), 13),
    ("Gain", Some(SortField::Gain), 12),
    ("Gain %", Some(SortField::GainPercent), 9),
    ("Weight", None, 8),
];

pub fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(DISPLAY_DECIMAL_PRECISION))
}

/// Formats a ratio (0.2) as a percentage (20.00%).
pub fn percent(ratio: Decimal) -> String {
    format!(
        "{:.2}%",
        (ratio * Decimal::ONE_HUNDRED).round_dp(DISPLAY_DECIMAL_PRECISION)
    )
}

fn signed(text: String, value: Decimal) -> String {
    if value.is_sign_positive() && !value.is_zero() {
        format!("+{}", text)
    } else {
        text
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

fn header(sort: &SortState) -> String {
    let mut line = String::new();
    for (i, (label, field, width)) in COLUMNS.into_iter().enumerate() {
        let label = match field {
            Some(field) if field == sort.field => {
                let arrow = match sort.direction {
                    SortDirection::Asc => '^',
                    SortDirection::Desc => 'v',
                };
                format!("{} {}", label, arrow)
            }
            _ => label.to_string(),
        };
        if i < TEXT_COLUMNS {
            let _ = write!(line, "{:<width$} ", label, width = width);
        } else {
            let _ = write!(line, "{:>width$} ", label, width = width);
        }
    }
    line.trim_end().to_string()
}

fn row(holding: &HoldingView) -> String {
    let price = if holding.has_price {
        money(holding.current_price)
    } else {
        "n/a".to_string()
    };
    let cells = [
        truncate(&holding.symbol, 8),
        truncate(&holding.name, 20),
        holding.shares.normalize().to_string(),
        money(holding.average_cost),
        price,
        money(holding.market_value),
        signed(money(holding.unrealized_gain), holding.unrealized_gain),
        signed(percent(holding.unrealized_gain_pct), holding.unrealized_gain_pct),
        percent(holding.weight),
    ];

    let mut line = String::new();
    for (i, ((_, _, width), cell)) in COLUMNS.iter().zip(cells.iter()).enumerate() {
        if i < TEXT_COLUMNS {
            let _ = write!(line, "{:<width$} ", cell, width = *width);
        } else {
            let _ = write!(line, "{:>width$} ", cell, width = *width);
        }
    }
    line.trim_end().to_string()
}

/// Holdings table with totals, and the missing-price warning when relevant.
pub fn render_holdings(summary: &HoldingsSummary, sort: &SortState) -> String {
    let mut out = String::new();
    if summary.holdings.is_empty() {
        out.push_str("No holdings yet.\n");
        return out;
    }

    let head = header(sort);
    let _ = writeln!(out, "{}", head);
    let _ = writeln!(out, "{}", "-".repeat(head.len()));
    for holding in &summary.holdings {
        let _ = writeln!(out, "{}", row(holding));
    }
    let _ = writeln!(out, "{}", "-".repeat(head.len()));

    let totals = &summary.totals;
    let _ = writeln!(
        out,
        "Total value {}   Cost basis {}   Gain {} ({})",
        money(totals.market_value),
        money(totals.book_value),
        signed(money(totals.unrealized_gain), totals.unrealized_gain),
        signed(percent(totals.unrealized_gain_pct), totals.unrealized_gain_pct),
    );

    if summary.missing_price_data {
        let _ = writeln!(
            out,
            "Warning: no current price for {}. Their market value counts as 0.",
            summary.missing_price_symbols.join(", ")
        );
    }
    out
}

/// Horizontal bar chart of the allocation slices.
pub fn render_allocation(slices: &[AllocationSlice]) -> String {
    let mut out = String::new();
    if slices.is_empty() {
        return out;
    }

    let label_width = slices
        .iter()
        .map(|s| s.symbol.chars().count())
        .max()
        .unwrap_or(0)
        .max(6);
    let _ = writeln!(out, "Allocation");
    for slice in slices {
        let fraction = slice.percentage.to_f64().unwrap_or(0.0) / 100.0;
        let filled = ((fraction * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
        let _ = writeln!(
            out,
            "{:<label_width$} {}{} {:>7}%",
            slice.symbol,
            "#".repeat(filled),
            ".".repeat(BAR_WIDTH - filled),
            format!("{:.2}", slice.percentage),
            label_width = label_width
        );
    }
    out
}

pub fn render_portfolios(portfolios: &[Portfolio], selected_id: &str) -> String {
    let mut out = String::new();
    for portfolio in portfolios {
        let marker = if portfolio.id == selected_id { '>' } else { ' ' };
        let default = if portfolio.is_default { " (default)" } else { "" };
        let _ = writeln!(out, "{} {}{}", marker, portfolio.name, default);
    }
    out
}

pub fn render_dashboard(
    portfolio: &Portfolio,
    portfolios: &[Portfolio],
    summary: &HoldingsSummary,
    allocation: &[AllocationSlice],
    sort: &SortState,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Portfolios");
    out.push_str(&render_portfolios(portfolios, &portfolio.id));
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", portfolio.name);
    if let Some(description) = portfolio.description.as_deref() {
        let _ = writeln!(out, "{}", description);
    }
    let _ = writeln!(out);
    out.push_str(&render_holdings(summary, sort));
    if !allocation.is_empty() {
        let _ = writeln!(out);
        out.push_str(&render_allocation(allocation));
    }
    out
}
