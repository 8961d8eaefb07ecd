//! Wire types shared by the joyeria client crates.
//!
//! Field names follow the REST backend's JSON (Spanish, camelCase); Rust
//! identifiers stay English.

pub mod confirm;
pub mod order;
pub mod user;

pub use confirm::{AssumeNo, AssumeYes, Confirm, Outcome};
pub use order::{Order, OrderStatus, StatusChange};
pub use user::{LoginRequest, LoginResponse, Role, User, UserForm, UserProfile};

/// Error returned when a string does not name a known enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_kind_and_value() {
        let err = "auditor".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), r#"unknown role: "auditor""#);
    }
}
