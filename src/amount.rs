use crate::error::{AppError, AppResult};
use rust_decimal::Decimal;
use std::fmt;

/// Decimal precision of the distributed token.
pub const TOKEN_DECIMALS: u32 = 18;

/// A per-transfer token amount, parsed once from the operator's decimal input
/// and carried as the exact integer count of smallest units. The conversion is
/// pure integer scaling on the decimal mantissa; binary floating point is
/// never involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    display: Decimal,
    base_units: u128,
}

impl TokenAmount {
    pub fn parse(input: &str) -> AppResult<Self> {
        let display = Decimal::from_str_exact(input.trim())
            .map_err(|e| AppError::InvalidAmount(format!("{}: {}", input, e)))?;

        if display <= Decimal::ZERO {
            return Err(AppError::InvalidAmount(format!(
                "{} must be a positive amount",
                input
            )));
        }

        // Trailing zeros carry no value; "1.50" scales like "1.5".
        let normalized = display.normalize();
        if normalized.scale() > TOKEN_DECIMALS {
            return Err(AppError::InvalidAmount(format!(
                "{} has more than {} fractional digits",
                input, TOKEN_DECIMALS
            )));
        }

        let mantissa = normalized.mantissa() as u128;
        let base_units = 10u128
            .checked_pow(TOKEN_DECIMALS - normalized.scale())
            .and_then(|factor| mantissa.checked_mul(factor))
            .ok_or_else(|| {
                AppError::InvalidAmount(format!("{} overflows the smallest-unit range", input))
            })?;

        Ok(Self {
            display,
            base_units,
        })
    }

    /// The amount in the token's smallest unit (amount * 10^18).
    pub fn base_units(&self) -> u128 {
        self.base_units
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_amount_is_exact() {
        let amount = TokenAmount::parse("100").unwrap();
        assert_eq!(amount.base_units(), 100 * 10u128.pow(18));
    }

    #[test]
    fn test_fractional_amounts_are_exact() {
        assert_eq!(
            TokenAmount::parse("1.5").unwrap().base_units(),
            15 * 10u128.pow(17)
        );
        assert_eq!(
            TokenAmount::parse("0.000000000000000001").unwrap().base_units(),
            1
        );
        // Trailing zeros do not count against the precision limit.
        assert_eq!(
            TokenAmount::parse("2.500000000000000000").unwrap().base_units(),
            25 * 10u128.pow(17)
        );
    }

    #[test]
    fn test_too_many_fractional_digits_is_an_error() {
        let result = TokenAmount::parse("1.0000000000000000001");
        assert!(matches!(result, Err(AppError::InvalidAmount(_))));
    }

    #[test]
    fn test_rejects_non_positive_and_garbage() {
        assert!(TokenAmount::parse("0").is_err());
        assert!(TokenAmount::parse("-3").is_err());
        assert!(TokenAmount::parse("ten").is_err());
        assert!(TokenAmount::parse("").is_err());
    }

    #[test]
    fn test_display_round_trips_operator_input() {
        assert_eq!(TokenAmount::parse("10").unwrap().to_string(), "10");
        assert_eq!(TokenAmount::parse("0.25").unwrap().to_string(), "0.25");
    }
}
