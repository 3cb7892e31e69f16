use num_bigint::BigInt;
use num_rational::BigRational;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdkError};
use crate::models::AssetAmount;

/// A non-negative rational written as `[numerator, denominator]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "(u64, u64)", into = "(u64, u64)")]
pub struct Fraction {
    pub numerator: u64,
    pub denominator: u64,
}

impl Fraction {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub const fn whole(value: u64) -> Self {
        Self::new(value, 1)
    }

    pub fn to_rational(&self) -> Result<BigRational> {
        if self.denominator == 0 {
            return Err(SdkError::InvalidFeeSchedule(format!(
                "{}/{} has a zero denominator",
                self.numerator, self.denominator
            )));
        }
        Ok(BigRational::new(
            BigInt::from(self.numerator),
            BigInt::from(self.denominator),
        ))
    }
}

impl From<(u64, u64)> for Fraction {
    fn from((numerator, denominator): (u64, u64)) -> Self {
        Self::new(numerator, denominator)
    }
}

impl From<Fraction> for (u64, u64) {
    fn from(f: Fraction) -> Self {
        (f.numerator, f.denominator)
    }
}

/// Fees that accompany one built order, or a whole routed order after aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeeSummary {
    /// Ledger fee, only known once the surrounding transaction is balanced.
    pub cardano_tx_fee: Option<AssetAmount>,
    pub deposit: AssetAmount,
    pub scooper_fee: AssetAmount,
    pub liquidity: Option<AssetAmount>,
    pub referral: Option<AssetAmount>,
}

impl FeeSummary {
    pub fn new(deposit: AssetAmount, scooper_fee: AssetAmount) -> Self {
        Self {
            cardano_tx_fee: None,
            deposit,
            scooper_fee,
            liquidity: None,
            referral: None,
        }
    }

    pub fn with_referral(&self, referral: Option<AssetAmount>) -> Self {
        Self {
            referral,
            ..self.clone()
        }
    }

    pub fn with_liquidity(&self, liquidity: Option<AssetAmount>) -> Self {
        Self {
            liquidity,
            ..self.clone()
        }
    }

    pub fn with_cardano_tx_fee(&self, fee: AssetAmount) -> Self {
        Self {
            cardano_tx_fee: Some(fee),
            ..self.clone()
        }
    }
}

/// A referral payment requested by an integrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferralFee {
    pub destination: String,
    pub payment: AssetAmount,
    #[serde(default)]
    pub fee_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedReferralFee {
    pub destination: String,
    pub payment: AssetAmount,
    pub fee_label: Option<String>,
}
