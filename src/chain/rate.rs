//! PKR ↔ native-unit conversion
//!
//! Loans are stored in whole PKR. The chain only ever sees wei, derived with
//! the configured PKR-to-native rate at the moment call parameters are built.

use std::str::FromStr;

use alloy::primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::ChainError;

const WEI_PER_NATIVE: u64 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeRate {
    pkr_to_native: Decimal,
}

impl ExchangeRate {
    pub fn new(pkr_to_native: Decimal) -> Self {
        Self { pkr_to_native }
    }

    /// Whole PKR to wei, rounded down
    pub fn to_native(&self, amount_pkr: i64) -> Result<U256, ChainError> {
        let overflow = || ChainError::InvalidInput(format!("Amount {} is too large", amount_pkr));

        if amount_pkr < 0 {
            return Err(ChainError::InvalidInput("Amount must be positive".to_string()));
        }

        let wei = Decimal::from(amount_pkr)
            .checked_mul(self.pkr_to_native)
            .and_then(|native| native.checked_mul(Decimal::from(WEI_PER_NATIVE)))
            .ok_or_else(overflow)?
            .floor()
            .to_u128()
            .ok_or_else(overflow)?;

        Ok(U256::from(wei))
    }

    /// Wei back to whole PKR, rounded down
    pub fn from_native(&self, wei: U256) -> Result<i64, ChainError> {
        let out_of_range = || ChainError::InvalidInput(format!("Amount {} wei is out of range", wei));

        let wei = Decimal::from_str(&wei.to_string()).map_err(|_| out_of_range())?;

        wei.checked_div(Decimal::from(WEI_PER_NATIVE))
            .and_then(|native| native.checked_div(self.pkr_to_native))
            .ok_or_else(out_of_range)?
            .floor()
            .to_i64()
            .ok_or_else(out_of_range)
    }
}
