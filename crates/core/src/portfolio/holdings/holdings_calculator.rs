use log::{debug, warn};
use rust_decimal::Decimal;

use super::holdings_model::{
    Holding, HoldingView, HoldingsSummary, NormalizedHolding, PortfolioTotals,
};
use crate::constants::{RATIO_PRECISION, UNKNOWN_SYMBOL};

/// Applies every default a holding needs before it can be valued or sorted.
///
/// The current price is read from the nested security first and falls back to
/// the flat `currentPrice` field. When both are present and disagree the nested
/// value wins.
pub fn normalize_holding(holding: &Holding) -> NormalizedHolding {
    let security = holding.security.as_ref();

    let nested_price = security.and_then(|s| s.current_price);
    if let (Some(nested), Some(flat)) = (nested_price, holding.current_price) {
        if nested != flat {
            debug!(
                "Holding {}: security price {} differs from flat price {}, using security price",
                holding.id, nested, flat
            );
        }
    }
    let price = nested_price.or(holding.current_price);

    NormalizedHolding {
        id: holding.id.clone(),
        security_id: security.map(|s| s.id.clone()),
        symbol: security
            .map(|s| s.symbol.clone())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string()),
        name: security.and_then(|s| s.name.clone()).unwrap_or_default(),
        shares: holding.shares.unwrap_or(Decimal::ZERO),
        average_cost: holding.average_cost.unwrap_or(Decimal::ZERO),
        current_price: price.unwrap_or(Decimal::ZERO),
        has_price: price.is_some(),
    }
}

/// Computes market value, book value and unrealized gain for one holding.
///
/// Weight is left at zero; it depends on the whole portfolio and is filled in
/// by [`calculate_holdings`]. A value too large for `Decimal` counts as zero.
pub fn derive_holding(normalized: NormalizedHolding) -> HoldingView {
    let market_value = normalized
        .shares
        .checked_mul(normalized.current_price)
        .unwrap_or_else(|| overflowed(&normalized.id, "market value"));
    let book_value = normalized
        .shares
        .checked_mul(normalized.average_cost)
        .unwrap_or_else(|| overflowed(&normalized.id, "book value"));
    let unrealized_gain = market_value
        .checked_sub(book_value)
        .unwrap_or_else(|| overflowed(&normalized.id, "unrealized gain"));

    HoldingView {
        id: normalized.id,
        security_id: normalized.security_id,
        symbol: normalized.symbol,
        name: normalized.name,
        shares: normalized.shares,
        average_cost: normalized.average_cost,
        current_price: normalized.current_price,
        has_price: normalized.has_price,
        market_value,
        book_value,
        unrealized_gain,
        unrealized_gain_pct: ratio(unrealized_gain, book_value),
        weight: Decimal::ZERO,
    }
}

/// Normalizes and values every holding of a portfolio.
///
/// Holdings without a price are valued at zero and reported through
/// `missing_price_data`; they never fail the calculation.
pub fn calculate_holdings(holdings: &[Holding]) -> HoldingsSummary {
    let mut views: Vec<HoldingView> = holdings
        .iter()
        .map(|h| derive_holding(normalize_holding(h)))
        .collect();

    let mut totals = PortfolioTotals::default();
    for view in &views {
        match (
            totals.market_value.checked_add(view.market_value),
            totals.book_value.checked_add(view.book_value),
        ) {
            (Some(market_value), Some(book_value)) => {
                totals.market_value = market_value;
                totals.book_value = book_value;
            }
            _ => warn!(
                "Holding {}: portfolio totals overflow, leaving it out of the totals",
                view.id
            ),
        }
    }
    totals.unrealized_gain = totals
        .market_value
        .checked_sub(totals.book_value)
        .unwrap_or_else(|| overflowed("totals", "unrealized gain"));
    totals.unrealized_gain_pct = ratio(totals.unrealized_gain, totals.book_value);

    for view in views.iter_mut() {
        view.weight = ratio(view.market_value, totals.market_value);
    }

    let missing_price_symbols: Vec<String> = views
        .iter()
        .filter(|v| !v.has_price)
        .map(|v| v.symbol.clone())
        .collect();
    let missing_price_data = !missing_price_symbols.is_empty();
    if missing_price_data {
        warn!(
            "{} of {} holdings have no current price: {}",
            missing_price_symbols.len(),
            views.len(),
            missing_price_symbols.join(", ")
        );
    }

    HoldingsSummary {
        holdings: views,
        totals,
        missing_price_data,
        missing_price_symbols,
    }
}

fn overflowed(id: &str, what: &str) -> Decimal {
    warn!("Holding {}: {} overflows, counting it as 0", id, what);
    Decimal::ZERO
}

/// `numerator / denominator`, or zero when the denominator is zero.
fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator
        .checked_div(denominator)
        .map(|r| r.round_dp(RATIO_PRECISION))
        .unwrap_or(Decimal::ZERO)
}
