use log::warn;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::allocation_model::AllocationSlice;
use crate::constants::DISPLAY_DECIMAL_PRECISION;
use crate::portfolio::holdings::HoldingsSummary;

/// Groups holdings by symbol and sizes each group against total market value.
///
/// Slices are sorted by value descending, then by symbol.
pub fn allocation_by_symbol(summary: &HoldingsSummary) -> Vec<AllocationSlice> {
    let total = summary.totals.market_value;

    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, AllocationSlice> = HashMap::new();
    for holding in &summary.holdings {
        let slice = grouped.entry(holding.symbol.clone()).or_insert_with(|| {
            order.push(holding.symbol.clone());
            AllocationSlice {
                symbol: holding.symbol.clone(),
                name: holding.name.clone(),
                value: Decimal::ZERO,
                percentage: Decimal::ZERO,
            }
        });
        match slice.value.checked_add(holding.market_value) {
            Some(value) => slice.value = value,
            None => warn!("Allocation for {} overflows, skipping {}", holding.symbol, holding.id),
        }
    }

    let mut slices: Vec<AllocationSlice> = order
        .into_iter()
        .filter_map(|symbol| grouped.remove(&symbol))
        .map(|mut slice| {
            if !total.is_zero() {
                slice.percentage = slice
                    .value
                    .checked_div(total)
                    .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
                    .map(|pct| pct.round_dp(DISPLAY_DECIMAL_PRECISION))
                    .unwrap_or(Decimal::ZERO);
            }
            slice
        })
        .collect();

    slices.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.symbol.cmp(&b.symbol)));
    slices
}
