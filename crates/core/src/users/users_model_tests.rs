//! Tests for user models and authentication payloads.

#[cfg(test)]
mod tests {
    use crate::errors::{Error, ValidationError};
    use crate::users::{LoginRequest, RegisterRequest, User};

    fn user(first: Option<&str>, last: Option<&str>) -> User {
        User {
            id: "u1".to_string(),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
        }
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        assert_eq!(user(Some("Jane"), Some("Doe")).display_name(), "Jane Doe");
        assert_eq!(user(Some("Jane"), None).display_name(), "Jane");
        assert_eq!(user(None, Some("Doe")).display_name(), "jdoe");
        assert_eq!(user(Some(""), Some("")).display_name(), "jdoe");
    }

    #[test]
    fn test_user_deserializes_without_optional_fields() {
        let parsed: User = serde_json::from_str(r#"{"id":"7","username":"sam"}"#).unwrap();
        assert_eq!(parsed.id, "7");
        assert_eq!(parsed.email, "");
        assert!(parsed.first_name.is_none());
    }

    #[test]
    fn test_login_request_requires_both_fields() {
        let request = LoginRequest {
            username: "  ".to_string(),
            password: "secret".to_string(),
        };
        match request.validate() {
            Err(Error::Validation(ValidationError::MissingField(field))) => {
                assert_eq!(field, "username")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_register_request_rejects_malformed_email() {
        let request = RegisterRequest {
            username: "sam".to_string(),
            email: "not-an-email".to_string(),
            password: "secret".to_string(),
            first_name: None,
            last_name: None,
        };
        let err = request.validate().unwrap_err();
        match err {
            Error::Validation(v) => {
                assert_eq!(
                    v.field_errors().get("email").map(String::as_str),
                    Some("must be a valid email address")
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
