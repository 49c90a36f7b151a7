//! Tests for portfolio models.

#[cfg(test)]
mod tests {
    use crate::portfolios::{Portfolio, PortfolioInput};

    #[test]
    fn test_portfolio_deserializes_backend_payload() {
        let json = r#"{
            "id": "p1",
            "userId": "u1",
            "name": "Retirement",
            "isDefault": true,
            "createdAt": "2024-03-01T10:00:00"
        }"#;
        let portfolio: Portfolio = serde_json::from_str(json).unwrap();
        assert_eq!(portfolio.name, "Retirement");
        assert!(portfolio.is_default);
        assert_eq!(portfolio.user_id.as_deref(), Some("u1"));
        assert!(portfolio.description.is_none());
    }

    #[test]
    fn test_is_default_defaults_to_false() {
        let portfolio: Portfolio = serde_json::from_str(r#"{"id":"p2","name":"Play"}"#).unwrap();
        assert!(!portfolio.is_default);
    }

    #[test]
    fn test_portfolio_input_requires_name() {
        let input = PortfolioInput {
            name: "   ".to_string(),
            ..Default::default()
        };
        assert!(input.validate().is_err());

        let input = PortfolioInput {
            name: "Growth".to_string(),
            ..Default::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_portfolio_input_serializes_camel_case() {
        let input = PortfolioInput {
            name: "Growth".to_string(),
            description: None,
            is_default: true,
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["isDefault"], true);
        assert!(value.get("description").is_none());
    }
}
