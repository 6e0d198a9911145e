// Decimal helpers for base-unit amounts. Amounts never pass through floating point.
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};

use crate::error::OpportunityError;

/// Precision used when neither the opportunity asset nor its underlying asset is known
pub const FALLBACK_PRECISION: u32 = 1;

pub fn parse_amount(value: &str) -> Result<BigDecimal, OpportunityError> {
    BigDecimal::from_str(value.trim()).map_err(|_| OpportunityError::InvalidAmount(value.to_string()))
}

/// Parse a decimal string, treating absent or unparseable input as zero
pub fn bn_or_zero(value: Option<&str>) -> BigDecimal {
    value
        .and_then(|v| BigDecimal::from_str(v.trim()).ok())
        .unwrap_or_else(BigDecimal::zero)
}

/// `amount / 10^precision`, computed exactly by shifting the scale
pub fn from_base_unit(amount: &BigDecimal, precision: u32) -> BigDecimal {
    let (digits, scale) = amount.as_bigint_and_exponent();
    BigDecimal::new(digits, scale + i64::from(precision))
}

pub fn is_positive(amount: &BigDecimal) -> bool {
    *amount > BigDecimal::zero()
}

/// Plain (non-scientific) representation without trailing zeros
pub fn format_amount(amount: &BigDecimal) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }
    amount.normalized().to_plain_string()
}

/// Serde adapter: amounts travel as decimal strings
pub mod amount_string {
    use bigdecimal::BigDecimal;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(amount: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_amount(amount))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigDecimal, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_amount(&raw).map_err(D::Error::custom)
    }
}

/// Serde adapter for lists of decimal strings
pub mod amount_string_vec {
    use bigdecimal::BigDecimal;
    use serde::{Deserialize, Deserializer, Serializer, de::Error, ser::SerializeSeq};

    pub fn serialize<S: Serializer>(amounts: &[BigDecimal], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(amounts.len()))?;
        for amount in amounts {
            seq.serialize_element(&super::format_amount(amount))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<BigDecimal>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|value| super::parse_amount(value).map_err(D::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_base_unit_is_exact() {
        let amount = parse_amount("1000000000000000000").unwrap();
        assert_eq!(format_amount(&from_base_unit(&amount, 18)), "1");

        let odd = parse_amount("123456789012345678901234567").unwrap();
        assert_eq!(format_amount(&from_base_unit(&odd, 18)), "123456789.012345678901234567");
    }

    #[test]
    fn format_amount_has_no_exponent() {
        assert_eq!(format_amount(&parse_amount("2500000000000000000000").unwrap()), "2500000000000000000000");
        assert_eq!(format_amount(&parse_amount("0.000000000000000001").unwrap()), "0.000000000000000001");
        assert_eq!(format_amount(&parse_amount("2.50").unwrap()), "2.5");
        assert_eq!(format_amount(&parse_amount("0.000").unwrap()), "0");
    }

    #[test]
    fn bn_or_zero_defaults() {
        assert!(bn_or_zero(None).is_zero());
        assert!(bn_or_zero(Some("not a number")).is_zero());
        assert_eq!(bn_or_zero(Some("42")), BigDecimal::from(42));
    }
}
