//! Tests for holding normalization and derived values.

#[cfg(test)]
mod tests {
    use crate::portfolio::holdings::{
        calculate_holdings, derive_holding, normalize_holding, Holding,
    };
    use crate::securities::Security;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn security(symbol: &str, price: Option<Decimal>) -> Security {
        Security {
            id: format!("sec-{}", symbol),
            symbol: symbol.to_string(),
            name: Some(format!("{} Inc.", symbol)),
            exchange: None,
            currency: Some("USD".to_string()),
            current_price: price,
        }
    }

    fn holding(
        id: &str,
        symbol: &str,
        shares: Decimal,
        average_cost: Decimal,
        price: Option<Decimal>,
    ) -> Holding {
        Holding {
            id: id.to_string(),
            portfolio_id: Some("p1".to_string()),
            security: Some(security(symbol, price)),
            shares: Some(shares),
            average_cost: Some(average_cost),
            current_price: None,
        }
    }

    #[test]
    fn test_gain_and_loss_example() {
        let holdings = vec![
            holding("h1", "AAPL", dec!(10), dec!(100), Some(dec!(120))),
            holding("h2", "MSFT", dec!(5), dec!(50), Some(dec!(40))),
        ];

        let summary = calculate_holdings(&holdings);
        let values: Vec<Decimal> = summary.holdings.iter().map(|h| h.market_value).collect();
        let gains: Vec<Decimal> = summary
            .holdings
            .iter()
            .map(|h| h.unrealized_gain)
            .collect();
        let pcts: Vec<Decimal> = summary
            .holdings
            .iter()
            .map(|h| h.unrealized_gain_pct)
            .collect();

        assert_eq!(values, vec![dec!(1200), dec!(200)]);
        assert_eq!(gains, vec![dec!(200), dec!(-50)]);
        assert_eq!(pcts, vec![dec!(0.2), dec!(-0.2)]);
        assert!(!summary.missing_price_data);
    }

    #[test]
    fn test_totals_and_weights() {
        let holdings = vec![
            holding("h1", "AAPL", dec!(10), dec!(100), Some(dec!(120))),
            holding("h2", "MSFT", dec!(5), dec!(50), Some(dec!(40))),
        ];

        let summary = calculate_holdings(&holdings);
        assert_eq!(summary.totals.market_value, dec!(1400));
        assert_eq!(summary.totals.book_value, dec!(1250));
        assert_eq!(summary.totals.unrealized_gain, dec!(150));
        assert_eq!(summary.totals.unrealized_gain_pct, dec!(0.12));

        assert_eq!(summary.holdings[0].weight, dec!(0.8571));
        assert_eq!(summary.holdings[1].weight, dec!(0.1429));
    }

    #[test]
    fn test_missing_security_uses_defaults() {
        let orphan = Holding {
            id: "h9".to_string(),
            portfolio_id: None,
            security: None,
            shares: Some(dec!(3)),
            average_cost: Some(dec!(10)),
            current_price: None,
        };

        let normalized = normalize_holding(&orphan);
        assert_eq!(normalized.symbol, "N/A");
        assert_eq!(normalized.name, "");
        assert_eq!(normalized.current_price, Decimal::ZERO);
        assert!(!normalized.has_price);
        assert!(normalized.security_id.is_none());

        let view = derive_holding(normalized);
        assert_eq!(view.market_value, Decimal::ZERO);
        assert_eq!(view.book_value, dec!(30));
        assert_eq!(view.unrealized_gain, dec!(-30));
        assert_eq!(view.unrealized_gain_pct, dec!(-1));
    }

    #[test]
    fn test_missing_numeric_fields_default_to_zero() {
        let sparse = Holding {
            id: "h3".to_string(),
            security: Some(security("TSLA", Some(dec!(250)))),
            ..Default::default()
        };

        let view = derive_holding(normalize_holding(&sparse));
        assert_eq!(view.shares, Decimal::ZERO);
        assert_eq!(view.average_cost, Decimal::ZERO);
        assert_eq!(view.market_value, Decimal::ZERO);
        assert_eq!(view.book_value, Decimal::ZERO);
        assert_eq!(view.unrealized_gain_pct, Decimal::ZERO);
        assert!(view.has_price);
    }

    #[test]
    fn test_zero_book_value_reports_zero_percent() {
        // Shares received at no cost: positive gain, zero book value
        let gifted = holding("h4", "GIFT", dec!(8), dec!(0), Some(dec!(15)));

        let view = derive_holding(normalize_holding(&gifted));
        assert_eq!(view.book_value, Decimal::ZERO);
        assert_eq!(view.unrealized_gain, dec!(120));
        assert_eq!(view.unrealized_gain_pct, Decimal::ZERO);
    }

    #[test]
    fn test_missing_price_flags_portfolio_without_failing() {
        let holdings = vec![
            holding("h1", "AAPL", dec!(10), dec!(100), Some(dec!(120))),
            holding("h2", "NEWCO", dec!(2), dec!(30), None),
        ];

        let summary = calculate_holdings(&holdings);
        assert_eq!(summary.holdings.len(), 2);
        assert!(summary.missing_price_data);
        assert_eq!(summary.missing_price_symbols, vec!["NEWCO".to_string()]);
        assert_eq!(summary.holdings[1].market_value, Decimal::ZERO);
        assert_eq!(summary.holdings[1].unrealized_gain, dec!(-60));
    }

    #[test]
    fn test_flat_price_used_when_security_has_none() {
        let mut flat = holding("h5", "VTI", dec!(4), dec!(200), None);
        flat.current_price = Some(dec!(210));

        let normalized = normalize_holding(&flat);
        assert!(normalized.has_price);
        assert_eq!(normalized.current_price, dec!(210));
    }

    #[test]
    fn test_security_price_wins_over_flat_price() {
        let mut both = holding("h6", "VTI", dec!(4), dec!(200), Some(dec!(220)));
        both.current_price = Some(dec!(210));

        let normalized = normalize_holding(&both);
        assert_eq!(normalized.current_price, dec!(220));
    }

    #[test]
    fn test_blank_symbol_falls_back_to_placeholder() {
        let blank = holding("h7", "  ", dec!(1), dec!(1), Some(dec!(1)));
        assert_eq!(normalize_holding(&blank).symbol, "N/A");
    }

    #[test]
    fn test_empty_portfolio() {
        let summary = calculate_holdings(&[]);
        assert!(summary.holdings.is_empty());
        assert_eq!(summary.totals.market_value, Decimal::ZERO);
        assert_eq!(summary.totals.unrealized_gain_pct, Decimal::ZERO);
        assert!(!summary.missing_price_data);
    }

    #[test]
    fn test_holding_deserializes_partial_payload() {
        let json = r#"{
            "id": "h8",
            "shares": 12.5,
            "averageCost": 40,
            "security": { "id": "s1", "symbol": "KO", "currentPrice": 61.3 }
        }"#;
        let parsed: Holding = serde_json::from_str(json).unwrap();
        let view = derive_holding(normalize_holding(&parsed));
        assert_eq!(view.symbol, "KO");
        assert_eq!(view.market_value, dec!(766.25));
        assert_eq!(view.book_value, dec!(500));
    }

    #[test]
    fn test_overflowing_market_value_counts_as_zero() {
        let json = r#"{
            "id": "h9",
            "shares": 1000000000000000,
            "averageCost": 1,
            "currentPrice": 100000000000000
        }"#;
        let huge: Holding = serde_json::from_str(json).unwrap();
        let summary = calculate_holdings(&[
            huge,
            holding("h1", "AAPL", dec!(10), dec!(100), Some(dec!(120))),
        ]);

        let big = &summary.holdings[0];
        assert_eq!(big.market_value, Decimal::ZERO);
        assert_eq!(big.book_value, dec!(1000000000000000));
        assert_eq!(big.unrealized_gain, dec!(-1000000000000000));
        assert_eq!(summary.totals.market_value, dec!(1200));
        assert_eq!(summary.holdings[1].weight, dec!(1));
    }

    #[test]
    fn test_totals_overflow_skips_the_overflowing_holding() {
        let summary = calculate_holdings(&[
            holding("h1", "BIG", Decimal::MAX, dec!(1), Some(dec!(1))),
            holding("h2", "BIG", Decimal::MAX, dec!(1), Some(dec!(1))),
        ]);

        assert_eq!(summary.holdings.len(), 2);
        assert_eq!(summary.totals.market_value, Decimal::MAX);
        assert_eq!(summary.totals.book_value, Decimal::MAX);
        assert_eq!(summary.totals.unrealized_gain, Decimal::ZERO);
        assert_eq!(summary.holdings[1].weight, dec!(1));
    }
}
