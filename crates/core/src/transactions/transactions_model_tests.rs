//! Tests for transaction models.

#[cfg(test)]
mod tests {
    use crate::errors::Error;
    use crate::transactions::{Transaction, TransactionInput, TransactionType};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn input(shares: rust_decimal::Decimal, price: rust_decimal::Decimal) -> TransactionInput {
        TransactionInput {
            transaction_type: TransactionType::Buy,
            shares,
            price_per_share: price,
            fees: None,
            transaction_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            notes: None,
        }
    }

    #[test]
    fn test_transaction_type_wire_format() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Buy).unwrap(),
            "\"BUY\""
        );
        assert_eq!(
            serde_json::from_str::<TransactionType>("\"SELL\"").unwrap(),
            TransactionType::Sell
        );
    }

    #[test]
    fn test_transaction_deserializes_backend_payload() {
        let json = r#"{
            "id": "t1",
            "holdingId": "h1",
            "transactionType": "BUY",
            "shares": 10,
            "pricePerShare": 101.25,
            "fees": 4.95,
            "transactionDate": "2024-02-29"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.shares, dec!(10));
        assert_eq!(tx.price_per_share, dec!(101.25));
        assert_eq!(
            tx.transaction_date,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_validate_rejects_non_positive_shares() {
        let err = input(dec!(0), dec!(10)).validate().unwrap_err();
        match err {
            Error::Validation(v) => assert!(v.field_errors().contains_key("shares")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_negative_price_and_fees() {
        assert!(input(dec!(1), dec!(-0.01)).validate().is_err());

        let mut with_fees = input(dec!(1), dec!(10));
        with_fees.fees = Some(dec!(-1));
        assert!(with_fees.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_zero_price() {
        assert!(input(dec!(3), dec!(0)).validate().is_ok());
    }
}
