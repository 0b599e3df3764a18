//! External order tokens and their translation to internal order keys.
//!
//! The payment gateway lives in its own identifier domain. Internal
//! [`OrderId`]s only cross that boundary as `ORD_<id>` tokens, and tokens
//! coming back are shape-checked before they are trusted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::OrderId;

/// Raised when a token does not have the `ORD_<positive integer>` shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed order token '{token}': {reason}")]
pub struct MalformedToken {
    pub token: String,
    pub reason: &'static str,
}

impl MalformedToken {
    fn new(token: impl Into<String>, reason: &'static str) -> Self {
        Self {
            token: token.into(),
            reason,
        }
    }
}

/// Order identifier understood by the payment gateway.
///
/// Only constructible through [`OrderToken::parse`] or
/// [`IdTranslator::to_token`], so a value of this type always has a valid
/// shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderToken(String);

impl OrderToken {
    /// Validates a raw token string.
    pub fn parse(raw: &str) -> Result<Self, MalformedToken> {
        IdTranslator::decode(raw)?;
        Ok(Self(raw.to_string()))
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderToken {
    type Error = MalformedToken;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        IdTranslator::decode(&raw)?;
        Ok(Self(raw))
    }
}

impl From<OrderToken> for String {
    fn from(token: OrderToken) -> Self {
        token.0
    }
}

impl AsRef<str> for OrderToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Stateless translation between [`OrderId`] and [`OrderToken`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IdTranslator;

impl IdTranslator {
    pub const PREFIX: &'static str = "ORD_";

    /// Encodes an internal order key, e.g. `123` → `ORD_123`.
    pub fn to_token(order_id: OrderId) -> Result<OrderToken, MalformedToken> {
        if !order_id.is_valid() {
            return Err(MalformedToken::new(
                order_id.to_string(),
                "order key must be positive",
            ));
        }
        Ok(OrderToken(format!("{}{}", Self::PREFIX, order_id)))
    }

    /// Decodes a token that already passed shape validation.
    pub fn to_order_id(token: &OrderToken) -> OrderId {
        // OrderToken construction guarantees the shape.
        Self::decode(token.as_str()).unwrap_or(OrderId::new(0))
    }

    /// Validates and decodes a raw token string, e.g. `ORD_123` → `123`.
    pub fn resolve(raw: &str) -> Result<(OrderToken, OrderId), MalformedToken> {
        let order_id = Self::decode(raw)?;
        Ok((OrderToken(raw.to_string()), order_id))
    }

    fn decode(raw: &str) -> Result<OrderId, MalformedToken> {
        if raw.is_empty() {
            return Err(MalformedToken::new(raw, "token is empty"));
        }
        let digits = raw
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| MalformedToken::new(raw, "missing ORD_ prefix"))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MalformedToken::new(raw, "suffix must be a decimal number"));
        }
        let value: i64 = digits
            .parse()
            .map_err(|_| MalformedToken::new(raw, "suffix is out of range"))?;
        let order_id = OrderId::new(value);
        if !order_id.is_valid() {
            return Err(MalformedToken::new(raw, "order key must be positive"));
        }
        Ok(order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_prefix() {
        let token = IdTranslator::to_token(OrderId::new(123)).unwrap();
        assert_eq!(token.as_str(), "ORD_123");
        assert_eq!(IdTranslator::to_order_id(&token), OrderId::new(123));
    }

    #[test]
    fn resolve_returns_token_and_key() {
        let (token, id) = IdTranslator::resolve("ORD_9").unwrap();
        assert_eq!(token.as_str(), "ORD_9");
        assert_eq!(id, OrderId::new(9));
    }

    #[test]
    fn rejects_non_positive_keys() {
        assert!(IdTranslator::to_token(OrderId::new(0)).is_err());
        assert!(IdTranslator::resolve("ORD_0").is_err());
    }

    #[test]
    fn rejects_malformed_tokens() {
        for raw in [
            "",
            "ORD_",
            "123",
            "ord_12",
            "ORD_12a",
            "ORD_-4",
            "ORD_+4",
            "ORD_20251110_053149_194252",
            "ORD_99999999999999999999",
        ] {
            let err = IdTranslator::resolve(raw).unwrap_err();
            assert_eq!(err.token, raw);
        }
    }

    #[test]
    fn deserialize_validates_shape() {
        let token: OrderToken = serde_json::from_str("\"ORD_5\"").unwrap();
        assert_eq!(token.as_str(), "ORD_5");
        assert!(serde_json::from_str::<OrderToken>("\"TXN_5\"").is_err());
    }
}
